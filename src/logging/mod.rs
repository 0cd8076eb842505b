//! Output control and diagnostic logging
//!
//! This module provides the [`Logger`] for user-visible output (notifications,
//! warnings, command echo) and [`init_tracing`] for the diagnostic event stream.
//! Internals log through `tracing`; the logger only prints what a user should see.

use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the diagnostic filter directive
pub const LOG_ENV: &str = "DOCKER_WORKBENCH_LOG";

/// Install the global `tracing` subscriber
///
/// `DOCKER_WORKBENCH_LOG` wins over the verbosity flag when set.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "docker_workbench=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Option<Instant>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
        }
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {} ===", title);
        }
    }

    pub fn verbose(&self, message: &str) {
        tracing::debug!("{}", message);
        if self.verbose && !self.quiet {
            println!("📝 {}", message);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("✅ {}", message);
        }
    }

    /// Warning message, shown even in quiet mode
    pub fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
        eprintln!("⚠️  WARNING: {}", message);
    }

    /// Error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    /// Step information
    pub fn step(&self, message: &str) {
        if !self.quiet {
            println!("▶️  {}", message);
        }
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        tracing::trace!("{}", message);
        if self.verbose && !self.quiet {
            println!("   {}", message);
        }
    }

    /// Raw value output (digests, URLs), never decorated so it can be piped
    pub fn value(&self, value: &str) {
        println!("{}", value);
    }

    /// Format duration in human-readable format
    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{:.1}s", duration.as_secs_f64())
        } else if secs < 3600 {
            format!("{}m{:02}s", secs / 60, secs % 60)
        } else {
            format!("{}h{:02}m{:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }

    pub fn elapsed_time(&self) -> String {
        match self.start_time {
            Some(start_time) => self.format_duration(start_time.elapsed()),
            None => "Unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        let logger = Logger::new_quiet();
        assert_eq!(logger.format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(logger.format_duration(Duration::from_secs(61)), "1m01s");
        assert_eq!(logger.format_duration(Duration::from_secs(3661)), "1h01m01s");
    }

    #[test]
    fn test_quiet_logger_flags() {
        let logger = Logger::new_quiet();
        assert!(logger.quiet);
        assert!(!logger.verbose);
    }
}
