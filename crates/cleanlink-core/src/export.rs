//! CSV export of cleaned links.

use serde::{Deserialize, Serialize};

pub const CSV_HEADER: &str = "original,cleaned,final";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    pub original: String,
    pub cleaned: String,
    #[serde(rename = "final")]
    pub final_url: String,
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Header plus one quoted row per entry, newline-separated, no trailing newline.
pub fn create_csv(rows: &[CsvRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(&quote(&row.original));
        out.push(',');
        out.push_str(&quote(&row.cleaned));
        out.push(',');
        out.push_str(&quote(&row.final_url));
    }
    out
}
