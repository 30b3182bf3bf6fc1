//! Pick the redirect target out of raw response header lines.

/// Returns the `Location` value of the last response in `lines`.
///
/// Header lines from an interim response (e.g. `100 Continue`) precede the
/// final status line, so only lines after the last status line count.
pub(crate) fn location_header(lines: &[String]) -> Option<String> {
    let start = lines
        .iter()
        .rposition(|l| l.starts_with("HTTP/"))
        .map(|i| i + 1)
        .unwrap_or(0);

    lines[start..].iter().find_map(|line| {
        let (name, value) = line.trim().split_once(':')?;
        if !name.trim().eq_ignore_ascii_case("location") {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// True once `lines` ends with the blank line closing a final (non-1xx)
/// response's header block. Interim `1xx` blocks do not count.
pub(crate) fn final_headers_complete(lines: &[String]) -> bool {
    if !lines.last().is_some_and(|l| l.is_empty()) {
        return false;
    }
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("HTTP/"))
        .and_then(|status| status.split_whitespace().nth(1))
        .is_some_and(|code| !code.starts_with('1'))
}
