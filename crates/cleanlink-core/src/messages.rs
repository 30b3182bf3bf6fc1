//! Request/response envelope for the message service.
//!
//! Wire shape: `{"kind": "SCAN_LINKS", "payload": {...}}` in,
//! `{"ok": true, "data": ...}` or `{"ok": false, "errorCode": ..., "message": ...}` out.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SettingsPatch;
use crate::scan::{LinkScanResult, LinkSummary};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlsPayload {
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchHistoryPayload {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyLicensePayload {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    ScanLinks(UrlsPayload),
    CleanLinks(UrlsPayload),
    BulkClean(UrlsPayload),
    ExpandShort(UrlsPayload),
    SaveHistory(Vec<LinkScanResult>),
    FetchHistory(FetchHistoryPayload),
    ClearHistory,
    VerifyLicense(VerifyLicensePayload),
    UpdateSettings(SettingsPatch),
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("unknown message kind: {0}")]
    UnknownKind(String),
    #[error("invalid payload for {kind}: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct Envelope {
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Decode `payload`; an absent payload reads as the type's default.
fn payload<T: DeserializeOwned + Default>(kind: &'static str, value: Value) -> Result<T, RequestError> {
    if value.is_null() {
        return Ok(T::default());
    }
    required(kind, value)
}

fn required<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T, RequestError> {
    serde_json::from_value(value).map_err(|source| RequestError::InvalidPayload { kind, source })
}

impl Request {
    pub fn from_json(line: &str) -> Result<Self, RequestError> {
        let envelope: Envelope = serde_json::from_str(line).map_err(RequestError::Malformed)?;
        Self::from_parts(&envelope.kind, envelope.payload)
    }

    pub fn from_parts(kind: &str, value: Value) -> Result<Self, RequestError> {
        Ok(match kind {
            "SCAN_LINKS" => Request::ScanLinks(payload("SCAN_LINKS", value)?),
            "CLEAN_LINKS" => Request::CleanLinks(payload("CLEAN_LINKS", value)?),
            "BULK_CLEAN" => Request::BulkClean(payload("BULK_CLEAN", value)?),
            "EXPAND_SHORT" => Request::ExpandShort(payload("EXPAND_SHORT", value)?),
            "SAVE_HISTORY" => Request::SaveHistory(required("SAVE_HISTORY", value)?),
            "FETCH_HISTORY" => Request::FetchHistory(payload("FETCH_HISTORY", value)?),
            "CLEAR_HISTORY" => Request::ClearHistory,
            "VERIFY_LICENSE" => Request::VerifyLicense(required("VERIFY_LICENSE", value)?),
            "UPDATE_SETTINGS" => Request::UpdateSettings(payload("UPDATE_SETTINGS", value)?),
            other => return Err(RequestError::UnknownKind(other.to_string())),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Request::ScanLinks(_) => "SCAN_LINKS",
            Request::CleanLinks(_) => "CLEAN_LINKS",
            Request::BulkClean(_) => "BULK_CLEAN",
            Request::ExpandShort(_) => "EXPAND_SHORT",
            Request::SaveHistory(_) => "SAVE_HISTORY",
            Request::FetchHistory(_) => "FETCH_HISTORY",
            Request::ClearHistory => "CLEAR_HISTORY",
            Request::VerifyLicense(_) => "VERIFY_LICENSE",
            Request::UpdateSettings(_) => "UPDATE_SETTINGS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PermissionDenied,
    Timeout,
    Network,
    Validation,
    UnsupportedPage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            ok: true,
            data: None,
            error_code: None,
            message: None,
        }
    }

    pub fn with_data<T: Serialize>(ok: bool, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(v) => Self {
                ok,
                data: Some(v),
                error_code: None,
                message: None,
            },
            Err(e) => Self::error(ErrorCode::Validation, format!("serialize response: {e}")),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error_code: Some(code),
            message: Some(message.into()),
        }
    }
}

impl From<RequestError> for Response {
    fn from(e: RequestError) -> Self {
        Response::error(ErrorCode::Validation, e.to_string())
    }
}

/// `data` of the scan-family responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanData {
    pub links: Vec<LinkScanResult>,
    pub summary: LinkSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}
