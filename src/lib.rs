//! Directory size alerting.
//!
//! Walks each configured directory tree, compares its total size with a
//! per-directory threshold, and mails one aggregated report when any
//! threshold is exceeded. Meant to be run periodically by an external
//! scheduler; each invocation is a single, stateless run.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod monitor;
pub mod output;
pub mod report;
pub mod scanner;
pub mod units;
