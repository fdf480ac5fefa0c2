use crate::adapters::outbound::{DEFAULT_HASH_COST, HASH_COST_RANGE};
use crate::domains::identity::{DEFAULT_OTP_DIGITS, DEFAULT_OTP_TTL_MINUTES};
use crate::domains::task_assignment::DEFAULT_NEAREST_WORKERS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub assignment: AssignmentConfig,
    pub otp: OtpConfig,
    pub password: PasswordConfig,
    pub storage: StorageConfig,
    pub postgres: PostgresConfig,
    pub kafka: KafkaConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentConfig {
    /// How many nearby workers a new task is offered to.
    pub nearest_workers: usize,
    pub worker_role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    pub digits: u32,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// bcrypt work factor.
    pub hash_cost: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the JSON Lines audit log. In memory when unset.
    pub event_log_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub enabled: bool,
    pub brokers: Vec<String>,
    pub client_id: String,
    pub realtime_topic: String,
    pub message_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub file: Option<String>,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overlaid by the TOML file when it exists, overlaid by
    /// `GIG_DISPATCH__SECTION__KEY` environment variables.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())?;
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("GIG_DISPATCH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("kafka.brokers")
                    .try_parsing(true),
            )
            .build()?;
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.assignment.nearest_workers == 0 {
            anyhow::bail!("assignment.nearest_workers must be at least 1");
        }
        if self.assignment.worker_role.trim().is_empty() {
            anyhow::bail!("assignment.worker_role must not be empty");
        }
        if self.otp.ttl_minutes <= 0 {
            anyhow::bail!("otp.ttl_minutes must be positive");
        }
        if !HASH_COST_RANGE.contains(&self.password.hash_cost) {
            anyhow::bail!(
                "password.hash_cost must be between {} and {}",
                HASH_COST_RANGE.start(),
                HASH_COST_RANGE.end()
            );
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assignment: AssignmentConfig {
                nearest_workers: DEFAULT_NEAREST_WORKERS,
                worker_role: "Gig Worker".to_string(),
            },
            otp: OtpConfig {
                digits: DEFAULT_OTP_DIGITS,
                ttl_minutes: DEFAULT_OTP_TTL_MINUTES,
            },
            password: PasswordConfig {
                hash_cost: DEFAULT_HASH_COST,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                event_log_dir: None,
            },
            postgres: PostgresConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "gig_dispatch".to_string(),
                username: "postgres".to_string(),
                password: "password".to_string(),
                max_connections: 10,
            },
            kafka: KafkaConfig {
                enabled: false,
                brokers: vec!["localhost:9092".to_string()],
                client_id: "gig-dispatch".to_string(),
                realtime_topic: "task-notifications".to_string(),
                message_timeout_ms: 5000,
            },
            logging: LoggingConfig::default(),
        }
    }
}
