//! Logger bootstrap
//!
//! log4rs reads its appenders from the configured YAML file. When that file is
//! missing or broken the service still logs, through env_logger and `RUST_LOG`.
//! `LogContext` carries the submission/destination MDC values that the log4rs
//! pattern prints.

use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use chrono::Utc;
use futures::future::poll_fn;
use log::warn;

use crate::config::LoggingConfig;

/// Which logger ended up installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerKind {
    Log4rs,
    EnvLogger,
}

pub fn init(config: &LoggingConfig) -> LoggerKind {
    let mut rejected = None;
    if Path::new(&config.config_file).exists() {
        match log4rs::init_file(&config.config_file, Default::default()) {
            Ok(()) => return LoggerKind::Log4rs,
            Err(e) => rejected = Some(e),
        }
    }

    // A logger may already be installed (tests); keep it
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
    if let Some(e) = rejected {
        warn!("Invalid log configuration {}: {}, falling back to env_logger", config.config_file, e);
    }
    LoggerKind::EnvLogger
}

/// MDC key naming the submission a log line belongs to
pub const SUBMISSION_KEY: &str = "submission";
/// MDC key naming the destination path being synced
pub const DESTINATION_KEY: &str = "destination";

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Unique id for one submission: UTC timestamp plus a process-wide sequence
pub fn next_submission_id() -> String {
    let sequence = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{:04}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ"), sequence)
}

/// MDC values attached to one future
///
/// log-mdc is thread local and a worker thread interleaves many requests, so
/// the values are installed around every poll of the future rather than once.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    entries: Vec<(&'static str, String)>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.entries.push((key, value.into()));
        self
    }

    /// Install the values until the guard drops, restoring what was there before
    pub fn enter(&self) -> log_mdc::ExtendGuard {
        log_mdc::extend_scoped(self.entries.iter().map(|(key, value)| (*key, value.as_str())))
    }

    /// Run `future` with the values installed during each of its polls
    pub async fn scope<F: Future>(&self, future: F) -> F::Output {
        let mut future = Box::pin(future);
        poll_fn(|cx| {
            let _entered = self.enter();
            future.as_mut().poll(cx)
        })
        .await
    }
}
