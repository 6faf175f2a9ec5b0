use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Endpoints for both transports. Defaults match the deployment the
/// feed aggregator publishes on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Host running the subscription manager.
    #[serde(default = "default_control_host")]
    pub control_host: String,
    /// Control port; datagrams sourced from it are subscription acks.
    #[serde(default = "default_control_port")]
    pub control_port: u16,
    /// Local port the consumer binds for acks and data alike.
    #[serde(default = "default_local_port")]
    pub local_port: u16,
    /// Path of the shared-memory ring buffer segment.
    #[serde(default = "default_shm_path")]
    pub shm_path: PathBuf,
}

fn default_control_host() -> String {
    "10.11.4.97".to_string()
}

fn default_control_port() -> u16 {
    9080
}

fn default_local_port() -> u16 {
    9088
}

fn default_shm_path() -> PathBuf {
    PathBuf::from("/dev/shm/msg_queue")
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            control_host: default_control_host(),
            control_port: default_control_port(),
            local_port: default_local_port(),
            shm_path: default_shm_path(),
        }
    }
}

impl FeedConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
