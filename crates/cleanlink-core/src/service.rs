//! Message service: one entry point dispatching every [`Request`] kind.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, CleanlinkConfig, Settings};
use crate::export::create_csv;
use crate::history::{HistoryStore, MAX_HISTORY};
use crate::license::{LicenseState, LicenseVerifier};
use crate::messages::{ErrorCode, Request, Response, ScanData, UrlsPayload};
use crate::resolver::Resolver;
use crate::rules::RulesConfig;
use crate::scan::{expand_links, process_links, CleanContext, LinkScanResult, LinkSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanKind {
    Scan,
    Clean,
    Bulk,
    Expand,
}

pub struct Service {
    config: CleanlinkConfig,
    config_path: Option<PathBuf>,
    rules: Arc<RulesConfig>,
    resolver: Resolver,
    history: HistoryStore,
    license_path: Option<PathBuf>,
    verifier: LicenseVerifier,
}

impl Service {
    pub fn new(
        config: CleanlinkConfig,
        rules: Arc<RulesConfig>,
        resolver: Resolver,
        history: HistoryStore,
    ) -> Self {
        let verifier = LicenseVerifier::from_config(&config.license);
        Self {
            config,
            config_path: None,
            rules,
            resolver,
            history,
            license_path: None,
            verifier,
        }
    }

    /// Service persisting to the user's XDG config, history and license state.
    pub fn for_user(config: CleanlinkConfig, rules: Arc<RulesConfig>) -> Result<Self> {
        let config_path = config::config_path()?;
        let history = HistoryStore::open_default()?;
        Ok(Self::new(config, rules, Resolver::default(), history)
            .with_config_path(config_path)
            .with_license_path(LicenseState::default_path()?))
    }

    /// Persist settings updates to this config file.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Persist license verification results to this file.
    pub fn with_license_path(mut self, path: PathBuf) -> Self {
        self.license_path = Some(path);
        self
    }

    pub fn settings(&self) -> Settings {
        self.config.settings
    }

    /// Handle one request. Never fails: internal errors become error responses.
    pub async fn handle(&mut self, request: Request) -> Response {
        let kind = request.kind();
        tracing::debug!("message {}", kind);
        match self.dispatch(request).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("message {} failed: {:#}", kind, e);
                Response::error(error_code(&e), format!("{e:#}"))
            }
        }
    }

    /// Decode and handle one JSON message.
    pub async fn handle_json(&mut self, line: &str) -> Response {
        match Request::from_json(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::debug!("rejected message: {}", e);
                e.into()
            }
        }
    }

    async fn dispatch(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::ScanLinks(p) => self.handle_scan(ScanKind::Scan, p).await,
            Request::CleanLinks(p) => self.handle_scan(ScanKind::Clean, p).await,
            Request::BulkClean(p) => self.handle_scan(ScanKind::Bulk, p).await,
            Request::ExpandShort(p) => self.handle_scan(ScanKind::Expand, p).await,
            Request::SaveHistory(links) => {
                self.record_history(links, false).await?;
                Ok(Response::ok())
            }
            Request::FetchHistory(p) => {
                let history = self.history.clone();
                let limit = p.limit.unwrap_or(MAX_HISTORY);
                let items = blocking(move || history.list(limit)).await?;
                Ok(Response::with_data(true, &items))
            }
            Request::ClearHistory => {
                let history = self.history.clone();
                blocking(move || history.clear()).await?;
                Ok(Response::ok())
            }
            Request::VerifyLicense(p) => {
                let state = self.verifier.verify_now(&p.code);
                if let Some(path) = self.license_path.clone() {
                    let saved = state.clone();
                    blocking(move || saved.save_to_path(&path)).await?;
                }
                tracing::info!("license check: {:?}", state.status);
                Ok(Response::with_data(state.is_valid(), &state))
            }
            Request::UpdateSettings(patch) => {
                self.config.settings = self.config.settings.merged(patch);
                if let Some(path) = self.config_path.clone() {
                    let cfg = self.config.clone();
                    blocking(move || config::save_at(&path, &cfg).context("save settings")).await?;
                }
                Ok(Response::with_data(true, &self.config.settings))
            }
        }
    }

    async fn handle_scan(&mut self, kind: ScanKind, payload: UrlsPayload) -> Result<Response> {
        if payload.urls.is_empty() {
            return Ok(Response::error(ErrorCode::Validation, "no urls supplied"));
        }
        if !payload.urls.iter().any(|u| is_web_url(u)) {
            return Ok(Response::error(
                ErrorCode::UnsupportedPage,
                "no http(s) links to process",
            ));
        }
        let ctx = CleanContext::from_config(&self.config);
        let mut links = process_links(&payload.urls, &ctx, &self.rules);
        if ctx.settings.expand_short || kind == ScanKind::Expand {
            links = expand_links(links, &self.rules, &self.resolver, &self.config.resolver).await;
        }
        let summary = LinkSummary::of(&links);
        tracing::info!(
            "{:?}: {} links, {} changed, {} ignored",
            kind,
            summary.detected,
            summary.changed,
            summary.ignored
        );

        let mut csv = None;
        match kind {
            ScanKind::Clean => self.record_history(links.clone(), false).await?,
            ScanKind::Bulk => {
                self.record_history(links.clone(), true).await?;
                let rows: Vec<_> = links.iter().map(LinkScanResult::to_csv_row).collect();
                csv = Some(create_csv(&rows));
            }
            ScanKind::Scan | ScanKind::Expand => {}
        }

        Ok(Response::with_data(
            true,
            &ScanData {
                links,
                summary,
                csv,
            },
        ))
    }

    async fn record_history(&self, links: Vec<LinkScanResult>, bulk: bool) -> Result<()> {
        let history = self.history.clone();
        let settings = self.config.settings;
        blocking(move || history.record(&links, bulk, &settings)).await?;
        Ok(())
    }
}

/// Run file I/O on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("blocking task panicked")?
}

fn is_web_url(raw: &str) -> bool {
    url::Url::parse(raw.trim()).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Classify a handler failure by the first I/O error in its chain.
fn error_code(e: &anyhow::Error) -> ErrorCode {
    let io = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<std::io::Error>());
    match io.map(std::io::Error::kind) {
        Some(std::io::ErrorKind::PermissionDenied) => ErrorCode::PermissionDenied,
        Some(std::io::ErrorKind::TimedOut) => ErrorCode::Timeout,
        _ => ErrorCode::Network,
    }
}
