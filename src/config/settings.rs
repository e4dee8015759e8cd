use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the master's listener, the broker internals and logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub master: MasterSettings,
    pub broker: BrokerSettings,
    pub logging: LoggingSettings,
}

/// Address the master listens on.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MasterSettings {
    pub host: String,
    pub port: u16,
}

impl MasterSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Per-connection limits.
///
/// `max_frame_bytes` caps one inbound line; a longer line is a protocol error.
/// `write_timeout_ms` caps one socket write; a peer that stalls past it is
/// cut off from further deliveries.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerSettings {
    pub max_frame_bytes: usize,
    pub write_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub master: Option<PartialMasterSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialMasterSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub max_frame_bytes: Option<usize>,
    pub write_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master: MasterSettings {
                host: "0.0.0.0".to_string(),
                port: 12345,
            },
            broker: BrokerSettings {
                max_frame_bytes: 1024 * 1024,
                write_timeout_ms: 5000,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Merges `partial` over the defaults field by field.
    pub fn merged(partial: PartialSettings) -> Self {
        let default = Settings::default();

        Settings {
            master: MasterSettings {
                host: partial
                    .master
                    .as_ref()
                    .and_then(|m| m.host.clone())
                    .unwrap_or(default.master.host),
                port: partial
                    .master
                    .as_ref()
                    .and_then(|m| m.port)
                    .unwrap_or(default.master.port),
            },
            broker: BrokerSettings {
                max_frame_bytes: partial
                    .broker
                    .as_ref()
                    .and_then(|b| b.max_frame_bytes)
                    .unwrap_or(default.broker.max_frame_bytes),
                write_timeout_ms: partial
                    .broker
                    .as_ref()
                    .and_then(|b| b.write_timeout_ms)
                    .unwrap_or(default.broker.write_timeout_ms),
            },
            logging: LoggingSettings {
                level: partial
                    .logging
                    .as_ref()
                    .and_then(|l| l.level.clone())
                    .unwrap_or(default.logging.level),
            },
        }
    }
}
