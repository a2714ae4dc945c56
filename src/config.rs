use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TrackerError};
use crate::feed::poll::PollTarget;
use crate::reducer::DEFAULT_GAP_THRESHOLD;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    #[default]
    Poll,
    Push,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TrackerConfig {
    pub mode: FeedMode,
    pub bind_addr: String,
    pub poll_interval_ms: u64,
    pub gap_threshold: i64,
    /// XML element holding one point record.
    pub point_element: String,
    pub targets: Vec<PollTarget>,
    pub push_url: String,
    pub reconnect_delay_ms: u64,
    pub auto_center: bool,
    pub predict: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::Poll,
            bind_addr: "0.0.0.0:8080".to_string(),
            poll_interval_ms: 10_000,
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            point_element: "balloonOne".to_string(),
            targets: Vec::new(),
            push_url: "ws://localhost:5000/events".to_string(),
            reconnect_delay_ms: 2_000,
            auto_center: false,
            predict: false,
        }
    }
}

impl TrackerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let mut cfg: Self = serde_json::from_str(data)?;
        if let Ok(addr) = std::env::var("BIND_ADDR") {
            cfg.bind_addr = addr;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(TrackerError::Config("poll_interval_ms must be > 0".into()));
        }
        if self.gap_threshold <= 0 {
            return Err(TrackerError::Config("gap_threshold must be > 0".into()));
        }
        if self.mode == FeedMode::Poll && self.targets.is_empty() {
            return Err(TrackerError::Config("poll mode needs at least one target".into()));
        }
        let mut seen = HashSet::new();
        for t in &self.targets {
            if !seen.insert(t.id.as_str()) {
                return Err(TrackerError::Config(format!("duplicate target id '{}'", t.id)));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// `TRACKER_CONFIG` wins; otherwise the first candidate that exists.
pub fn resolve_config_path() -> PathBuf {
    pick_config_path(
        std::env::var_os("TRACKER_CONFIG").map(PathBuf::from),
        Path::new("."),
    )
}

/// An explicit path wins; otherwise the first of `tracker.json` and
/// `config/tracker.json` under `root` that exists. When neither does,
/// `tracker.json` is returned and `load` reports it missing.
fn pick_config_path(explicit: Option<PathBuf>, root: &Path) -> PathBuf {
    if let Some(p) = explicit {
        return p;
    }
    ["tracker.json", "config/tracker.json"]
        .into_iter()
        .map(|c| root.join(c))
        .find(|c| c.exists())
        .unwrap_or_else(|| root.join("tracker.json"))
}
