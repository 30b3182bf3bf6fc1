pub mod config;
pub mod logging;

pub mod export;
pub mod history;
pub mod license;
pub mod messages;
pub mod resolver;
pub mod rules;
pub mod scan;
pub mod sensitivity;
pub mod service;
