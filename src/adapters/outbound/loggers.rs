use crate::domains::logger::{DomainLogger, DynLogger, FileLogger};
use std::sync::Arc;

/// Forwards dispatch reports to `tracing`.
struct TracingLogger;

impl DomainLogger for TracingLogger {
    fn info(&self, msg: &str) {
        tracing::info!(target: "dispatch", "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "dispatch", "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "dispatch", "{}", msg);
    }
}

struct NoopLogger;

impl DomainLogger for NoopLogger {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Fans every message out to each wrapped logger in order.
pub struct MultiLogger {
    sinks: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(sinks: Vec<DynLogger>) -> Self {
        Self { sinks }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.error(msg));
    }
}

pub fn init_tracing_logger() -> DynLogger {
    Arc::new(TracingLogger)
}

/// Used as the default in tests.
pub fn init_noop_logger() -> DynLogger {
    Arc::new(NoopLogger)
}

/// Tracing output plus a `fast_log` file when `file_path` is given. Falls back
/// to tracing alone if the file logger cannot be installed.
pub fn init_dispatch_logger(file_path: Option<&str>) -> DynLogger {
    let tracing_logger = init_tracing_logger();
    let Some(path) = file_path else {
        return tracing_logger;
    };
    match FileLogger::init(path) {
        Ok(()) => Arc::new(MultiLogger::new(vec![tracing_logger, Arc::new(FileLogger)])),
        Err(e) => {
            tracing::warn!("Failed to initialize file logger at {}: {}", path, e);
            tracing_logger
        }
    }
}
