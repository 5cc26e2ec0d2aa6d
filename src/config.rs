//! Configuration types for media-depot

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Storage layout configuration (artifact directory, snapshot directory, delivery)
///
/// Groups settings related to where artifacts land on disk and how they are
/// served back. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Directory where downloaded artifacts are stored (default: "storage")
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Directory for the shutdown task snapshot (default: "logs")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Chunk size in bytes for streaming delivery (default: 8192)
    #[serde(default = "default_delivery_chunk_size")]
    pub delivery_chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            log_dir: default_log_dir(),
            delivery_chunk_size: default_delivery_chunk_size(),
        }
    }
}

/// Expiry sweeper configuration
///
/// The sweeper is a coarse liveness guard: it ages out tasks whose executor
/// crashed or hung, so clients polling them eventually see a terminal status.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpiryConfig {
    /// How often the sweeper scans the registry (default: 5 minutes)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    pub sweep_interval: Duration,

    /// Age past which a non-terminal task is marked Expired (default: 1 hour)
    #[serde(default = "default_max_task_age", with = "duration_serde")]
    pub max_task_age: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
            max_task_age: default_max_task_age(),
        }
    }
}

/// Retry configuration for transient transfer failures
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,

    /// Upper bound on a provider-requested rate-limit wait (default: 5 minutes)
    ///
    /// Providers occasionally demand pathological waits; the honored delay is
    /// never longer than this cap, and attempts stay bounded by `max_attempts`.
    #[serde(default = "default_max_rate_limit_delay", with = "duration_serde")]
    pub max_rate_limit_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: true,
            max_rate_limit_delay: default_max_rate_limit_delay(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for MediaDepot
///
/// Fields are organized into logical sub-configs:
/// - [`storage`](StorageConfig) — artifact and snapshot directories, delivery chunking
/// - [`expiry`](ExpiryConfig) — sweeper cadence and staleness threshold
/// - [`retry`](RetryConfig) — transfer retry policy
/// - [`api`](ApiConfig) — REST API server settings
///
/// Storage and expiry fields are flattened for a flat JSON format; individual
/// fields are also accessible via convenience accessors on `Config`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Storage layout settings
    #[serde(flatten)]
    pub storage: StorageConfig,

    /// Expiry sweeper settings
    #[serde(flatten)]
    pub expiry: ExpiryConfig,

    /// Transfer retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

// Convenience accessors — allow call sites to use `config.storage_dir()` etc.
// without reaching through the sub-config structs.
impl Config {
    /// Artifact storage directory
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage.storage_dir
    }

    /// Snapshot/log directory
    pub fn log_dir(&self) -> &PathBuf {
        &self.storage.log_dir
    }

    /// Where the shutdown task snapshot is written
    pub fn snapshot_path(&self) -> PathBuf {
        self.storage.log_dir.join("tasks_state.json")
    }
}

// Default value functions
fn default_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_delivery_chunk_size() -> usize {
    8192
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(300) // 5 minutes
}

fn default_max_task_age() -> Duration {
    Duration::from_secs(3600) // 1 hour
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_rate_limit_delay() -> Duration {
    Duration::from_secs(300)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
