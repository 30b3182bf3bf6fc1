//! Registry of named URL transforms referenced by domain rules.

use url::Url;

/// A transform rewrites the URL in place before parameter stripping.
/// An `Err` means the rewrite target was unusable and the cleaning pass
/// falls back to the original URL.
pub type TransformFn = fn(&mut Url) -> Result<(), url::ParseError>;

#[derive(Clone, Copy)]
pub struct NamedTransform {
    pub name: &'static str,
    pub apply: TransformFn,
}

impl std::fmt::Debug for NamedTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NamedTransform").field(&self.name).finish()
    }
}

const REGISTRY: &[NamedTransform] = &[NamedTransform {
    name: "googleRedirect",
    apply: google_redirect,
}];

/// Look up a transform by the name used in the catalog.
pub fn lookup(name: &str) -> Option<NamedTransform> {
    REGISTRY.iter().find(|t| t.name == name).copied()
}

/// Names of every registered transform.
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|t| t.name)
}

/// `https://www.google.com/url?q=<target>` → `<target>`.
///
/// Reads `url` first, then `q`; the first non-empty value wins.
fn google_redirect(url: &mut Url) -> Result<(), url::ParseError> {
    if url.path() != "/url" {
        return Ok(());
    }
    let target = first_non_empty(url, "url").or_else(|| first_non_empty(url, "q"));
    if let Some(target) = target {
        *url = Url::parse(&target)?;
    }
    Ok(())
}

fn first_non_empty(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(name: &str, input: &str) -> Result<String, url::ParseError> {
        let mut url = Url::parse(input).unwrap();
        (lookup(name).unwrap().apply)(&mut url)?;
        Ok(url.to_string())
    }

    #[test]
    fn google_redirect_prefers_url_param() {
        let out = apply(
            "googleRedirect",
            "https://www.google.com/url?url=https://a.example/&q=https://b.example/",
        )
        .unwrap();
        assert_eq!(out, "https://a.example/");
    }

    #[test]
    fn google_redirect_falls_back_to_q() {
        let out = apply(
            "googleRedirect",
            "https://www.google.com/url?url=&q=https://b.example/x",
        )
        .unwrap();
        assert_eq!(out, "https://b.example/x");
    }

    #[test]
    fn google_redirect_ignores_other_paths() {
        let out = apply("googleRedirect", "https://www.google.com/search?q=rust").unwrap();
        assert_eq!(out, "https://www.google.com/search?q=rust");
    }

    #[test]
    fn google_redirect_relative_target_is_error() {
        assert!(apply("googleRedirect", "https://www.google.com/url?q=/relative").is_err());
    }

    #[test]
    fn registry_lists_names() {
        assert!(names().any(|n| n == "googleRedirect"));
        assert!(lookup("unknown").is_none());
    }
}
