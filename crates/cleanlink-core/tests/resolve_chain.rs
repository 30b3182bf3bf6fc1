//! Integration test: resolve redirect chains against a local HTTP server
//! through the real curl transport.

mod common;

use cleanlink_core::config::ResolverConfig;
use cleanlink_core::resolver::{FailureReason, ResolutionOutcome, Resolver, MAX_HOPS};
use cleanlink_core::rules::RulesConfig;
use cleanlink_core::scan::{expand_links, process_links, CleanContext, NOTE_EXPAND_TIMEOUT};
use std::time::{Duration, Instant};

const HOP_TIMEOUT: Duration = Duration::from_millis(500);

#[test]
fn short_chain_resolves_to_final_url() {
    let base = common::redirect_server::start();
    let outcome = Resolver::default().resolve(&format!("{}/hop/3", base), HOP_TIMEOUT);
    assert_eq!(
        outcome,
        ResolutionOutcome::Resolved {
            final_url: format!("{}/hop/0", base)
        }
    );
}

#[test]
fn chain_longer_than_hop_limit_stops_at_limit() {
    let base = common::redirect_server::start();
    let outcome = Resolver::default().resolve(&format!("{}/hop/9", base), HOP_TIMEOUT);
    assert_eq!(
        outcome.final_url(),
        Some(format!("{}/hop/{}", base, 9 - MAX_HOPS).as_str())
    );
}

#[test]
fn head_rejected_falls_back_to_get() {
    let base = common::redirect_server::start();
    let outcome = Resolver::default().resolve(&format!("{}/nohead/1", base), HOP_TIMEOUT);
    assert_eq!(outcome.final_url(), Some(format!("{}/hop/0", base).as_str()));
}

#[test]
fn get_fallback_settles_without_reading_slow_body() {
    let base = common::redirect_server::start();
    let url = format!("{}/slow-body/0", base);
    let started = Instant::now();
    let outcome = Resolver::default().resolve(&url, HOP_TIMEOUT);
    assert_eq!(outcome.final_url(), Some(url.as_str()));
    assert!(started.elapsed() < common::redirect_server::TRICKLE);
}

#[test]
fn get_fallback_follows_redirect_with_slow_body() {
    let base = common::redirect_server::start();
    let started = Instant::now();
    let outcome = Resolver::default().resolve(&format!("{}/slow-body/2", base), HOP_TIMEOUT);
    assert_eq!(outcome.final_url(), Some(format!("{}/hop/0", base).as_str()));
    assert!(started.elapsed() < common::redirect_server::TRICKLE);
}

#[test]
fn empty_location_ends_at_current_url() {
    let base = common::redirect_server::start();
    let url = format!("{}/empty-location", base);
    let outcome = Resolver::default().resolve(&url, HOP_TIMEOUT);
    assert_eq!(outcome.final_url(), Some(url.as_str()));
}

#[test]
fn stalled_hop_times_out_without_final_url() {
    let base = common::redirect_server::start();
    let started = Instant::now();
    let outcome = Resolver::default().resolve(&format!("{}/stall/2", base), HOP_TIMEOUT);
    assert_eq!(outcome.reason(), Some(FailureReason::Timeout));
    assert!(outcome.final_url().is_none());
    assert!(started.elapsed() < common::redirect_server::STALL);
}

#[test]
fn unreachable_host_is_an_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let outcome = Resolver::default().resolve(&format!("http://127.0.0.1:{}/", port), HOP_TIMEOUT);
    assert_eq!(outcome.reason(), Some(FailureReason::Error));
}

#[tokio::test]
async fn batch_expansion_mixes_success_and_timeout() {
    let base = common::redirect_server::start();
    let rules = RulesConfig::from_toml_str(r#"short_domains = ["127.0.0.1"]"#).unwrap();
    let links = process_links(
        &[format!("{}/hop/2", base), format!("{}/stall/0", base)],
        &CleanContext::default(),
        &rules,
    );
    let cfg = ResolverConfig {
        timeout_ms: 500,
        max_concurrent: 2,
    };
    let out = expand_links(links, &rules, &Resolver::default(), &cfg).await;
    assert_eq!(out[0].expanded.as_deref(), Some(format!("{}/hop/0", base).as_str()));
    assert_eq!(out[1].notes.as_deref(), Some(NOTE_EXPAND_TIMEOUT));
}
