//! Rule-based URL cleaning.
//!
//! A [`RulesConfig`] catalog (built-in or loaded from TOML) drives the
//! [`clean`] pass, which removes tracking parameters in a fixed order:
//! domain rules (with optional transforms), then generic trackers, then
//! tracking fragments.

mod catalog;
mod engine;
pub mod transform;

pub use catalog::{CatalogError, CatalogFile, DomainRule, DomainRuleSpec, RulesConfig};
pub use engine::{clean, CleanDiff, CleanReason, CleanResult, FRAGMENT_KEY};
