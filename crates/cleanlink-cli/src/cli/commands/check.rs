//! `cleanlink check <URL>` – explain how a URL would be treated.

use anyhow::Result;
use cleanlink_core::config::CleanlinkConfig;
use cleanlink_core::rules::{clean, RulesConfig};
use cleanlink_core::scan::CleanContext;
use cleanlink_core::sensitivity::{is_sensitive, needs_expansion};

pub fn run_check(cfg: &CleanlinkConfig, rules: &RulesConfig, url: &str) -> Result<()> {
    let ctx = CleanContext::from_config(cfg);
    let yes_no = |b: bool| if b { "yes" } else { "no" };

    println!("{:<12} {}", "url", url);
    println!("{:<12} {}", "site-blocked", yes_no(ctx.is_blocked(url)));
    println!("{:<12} {}", "sensitive", yes_no(is_sensitive(url, rules)));
    println!("{:<12} {}", "short-link", yes_no(needs_expansion(url, rules)));
    for rule in rules.domain_rules_for(url) {
        println!("{:<12} {}", "domain-rule", rule.pattern());
    }

    let result = clean(url, rules);
    println!("{:<12} {}", "cleaned", result.cleaned);
    for diff in &result.removed {
        println!(
            "{:<12} {} ({:?}) = {}",
            "removed",
            diff.key,
            diff.reason,
            diff.value.as_deref().unwrap_or("")
        );
    }
    if !result.preserved.is_empty() {
        println!("{:<12} {}", "preserved", result.preserved.join(", "));
    }
    Ok(())
}
