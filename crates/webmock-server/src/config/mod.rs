//! Configuration types for the webmock server.
//!
//! Settings come from an optional YAML file, then command-line flags (or
//! their environment variables) override individual values.

mod listen;
mod logging;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use listen::ListenConfig;
pub use logging::{LogFormat, LoggingConfig};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Control API listener (Set / Get / Done)
    pub control: ListenConfig,
    /// Mock plane listener (canned responses)
    pub http: ListenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values supplied on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub control_host: Option<String>,
    pub control_port: Option<u16>,
    pub http_host: Option<String>,
    pub http_port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Merge an optional config file with command-line overrides and validate
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, anyhow::Error> {
        let mut config = match path {
            Some(path) => Self::from_file(path).map_err(|e| {
                anyhow::anyhow!("failed to load config file {}: {e}", path.display())
            })?,
            None => {
                let (Some(control_port), Some(http_port)) =
                    (overrides.control_port, overrides.http_port)
                else {
                    anyhow::bail!(
                        "--control-port and --http-port are required when no config file is given"
                    );
                };
                Config {
                    control: ListenConfig::new(listen::default_host(), control_port),
                    http: ListenConfig::new(listen::default_host(), http_port),
                    logging: LoggingConfig::default(),
                }
            }
        };

        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(host) = overrides.control_host {
            self.control.host = host;
        }
        if let Some(port) = overrides.control_port {
            self.control.port = port;
        }
        if let Some(host) = overrides.http_host {
            self.http.host = host;
        }
        if let Some(port) = overrides.http_port {
            self.http.port = port;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.control.port != 0
            && self.control.port == self.http.port
            && self.control.host == self.http.host
        {
            anyhow::bail!(
                "Control API and mock HTTP listener cannot share {}:{}",
                self.control.host,
                self.control.port
            );
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            anyhow::bail!("Invalid log level directive: '{}'", self.logging.level);
        }

        Ok(())
    }
}
