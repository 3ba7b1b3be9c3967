use std::time::Duration;

/// Timeout and logging settings for a [`MonitoredClient`](super::MonitoredClient).
///
/// The default has no timeout, no slow-query threshold, and truncates logged
/// SQL to 200 bytes.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Per-statement deadline. `None` means wait forever.
    pub query_timeout: Option<Duration>,
    /// Statements slower than this are logged at warn level.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL to this many bytes. `None` logs it whole.
    pub max_sql_length: Option<usize>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            slow_query_threshold: None,
            max_sql_length: Some(200),
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail statements that run longer than `timeout` with
    /// [`ChainError::Timeout`](crate::ChainError::Timeout).
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Log SQL text in full.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Whether `elapsed` crosses the slow-query threshold.
    pub fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_query_threshold
            .is_some_and(|threshold| elapsed > threshold)
    }

    /// `sql` as it appears in log events.
    pub fn display_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", super::truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}
