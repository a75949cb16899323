//! `[log]` section
//!
//! What the distributor logs at each level:
//!
//! - `error`: sustained backpressure, output writer failures
//! - `warn`: records missing the routing attribute, skipped input lines
//! - `info`: startup, channel set rebuilds, periodic metrics, run summary
//! - `debug`/`trace`: per-record rejections and property changes
//!
//! Records routed to stdout share the stream with nothing else, so logs go
//! to stderr unless configured otherwise.

use serde::Deserialize;

/// Minimum level for distributor diagnostics
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    /// Startup, rebuilds and summaries (default)
    #[default]
    Info,
    /// Missing routing attributes and skipped lines
    Warn,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Line format of log events
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    /// One JSON object per event, for log shippers
    Json,
}

/// Where log events are written
///
/// Any string other than `stdout` or `stderr` is a file path, opened in
/// append mode.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    #[serde(untagged)]
    File(String),
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "warn"
/// format = "json"
/// output = "logs/distributor.log"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default: info
    pub level: LogLevel,

    /// Default: console
    pub format: LogFormat,

    /// Default: stderr
    pub output: LogOutput,
}

impl LogConfig {
    pub fn is_json(&self) -> bool {
        self.format == LogFormat::Json
    }

    /// Filter directive to install: a `--log-level` value wins over `level`
    ///
    /// The command-line value may be any `EnvFilter` directive, such as
    /// `distributor_routing=debug`.
    pub fn directive<'a>(&self, cli_level: Option<&'a str>) -> &'a str {
        cli_level.unwrap_or_else(|| self.level.as_str())
    }

    /// Whether log events would land on stdout
    ///
    /// The run command refuses this combination when routed records are
    /// also written to stdout.
    pub fn writes_to_stdout(&self) -> bool {
        self.output == LogOutput::Stdout
    }

    /// File path when logging to a file
    pub fn file_path(&self) -> Option<&str> {
        match &self.output {
            LogOutput::File(path) => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_stdout_free() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.output, LogOutput::Stderr);
        assert!(!config.writes_to_stdout());
        assert!(!config.is_json());
        assert_eq!(config.file_path(), None);
    }

    #[test]
    fn test_quiet_json_to_file() {
        let config: LogConfig = toml::from_str(
            r#"
level = "warn"
format = "json"
output = "/var/log/distributor/routing.log"
"#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Warn);
        assert!(config.is_json());
        assert_eq!(config.file_path(), Some("/var/log/distributor/routing.log"));
        assert!(!config.writes_to_stdout());
    }

    #[test]
    fn test_stdout_output_detected() {
        let config: LogConfig = toml::from_str(r#"output = "stdout""#).unwrap();
        assert!(config.writes_to_stdout());
        assert_eq!(config.file_path(), None);
    }

    #[test]
    fn test_directive_prefers_cli() {
        let config = LogConfig {
            level: LogLevel::Error,
            ..Default::default()
        };
        assert_eq!(config.directive(None), "error");
        assert_eq!(
            config.directive(Some("distributor_routing=debug")),
            "distributor_routing=debug"
        );
    }

    #[test]
    fn test_level_names_round_trip() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            let toml = format!("level = \"{}\"", level.as_str());
            let config: LogConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config.level, level);
        }
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(toml::from_str::<LogConfig>(r#"level = "verbose""#).is_err());
    }
}
