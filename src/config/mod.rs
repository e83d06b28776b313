// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default log level (`error` .. `trace`), overridden by `--debug`/`--trace`
    pub log_level: String,

    /// Run a simulated candidate through the pipeline
    pub demo_mode: bool,

    /// Session store server configuration
    pub server: ServerConfig,

    /// Detection thresholds
    pub detection: DetectionConfig,

    /// Frame loop configuration
    pub monitor: MonitorConfig,

    /// Event delivery configuration
    pub delivery: DeliveryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            demo_mode: false,
            server: ServerConfig::default(),
            detection: DetectionConfig::default(),
            monitor: MonitorConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Parsed `log_level`; unknown names fall back to `info`
    pub fn log_level(&self) -> Level {
        self.log_level.trim().parse().unwrap_or(Level::INFO)
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("invigilator"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Session store server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Number of most recent events listed in the PDF report
    pub report_window: usize,

    /// Maximum characters per PDF log line
    pub report_line_width: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            report_window: 30,
            report_line_width: 90,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// No face for longer than this emits `absence-10s`
    pub absence_threshold_ms: u64,

    /// Sustained gaze diversion longer than this emits `focus-away-5s`
    pub focus_away_threshold_ms: u64,

    /// |EMA| above this counts as looking away (fraction of face width)
    pub gaze_threshold: f64,

    /// Weight of the newest sample in the gaze EMA
    pub gaze_smoothing: f64,

    /// Minimum object confidence (exclusive)
    pub object_confidence: f64,

    /// Minimum spacing between object scans
    pub object_interval_ms: u64,

    /// Minimum spacing between object scans in reduced-resource mode
    pub object_interval_reduced_ms: u64,

    /// Object classes treated as suspicious
    pub suspicious_objects: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            absence_threshold_ms: 10_000,
            focus_away_threshold_ms: 5_000,
            gaze_threshold: 0.12,
            gaze_smoothing: 0.2,
            object_confidence: 0.8,
            object_interval_ms: 1_200,
            object_interval_reduced_ms: 3_500,
            suspicious_objects: [
                "cell phone",
                "book",
                "laptop",
                "keyboard",
                "mouse",
                "bottle",
                "charger",
                "camera",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Reduced-resource mode: lower frame rate, sparser inference
    pub performance_mode: bool,

    /// Run the object model
    pub objects_enabled: bool,

    /// Face inference on every Nth frame in reduced-resource mode
    pub face_every_reduced: u64,

    /// Face inference on every Nth frame otherwise
    pub face_every: u64,

    /// Capture frame rate in reduced-resource mode
    pub frame_rate_reduced: u32,

    /// Capture frame rate otherwise
    pub frame_rate: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            performance_mode: true,
            objects_enabled: false,
            face_every_reduced: 4,
            face_every: 2,
            frame_rate_reduced: 12,
            frame_rate: 24,
        }
    }
}

impl MonitorConfig {
    pub fn face_stride(&self) -> u64 {
        let n = if self.performance_mode {
            self.face_every_reduced
        } else {
            self.face_every
        };
        n.max(1)
    }

    pub fn frame_interval(&self) -> Duration {
        let fps = if self.performance_mode {
            self.frame_rate_reduced
        } else {
            self.frame_rate
        };
        Duration::from_millis(1000 / u64::from(fps.max(1)))
    }
}

/// Event delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Session store base URL
    pub server_url: String,

    /// Pending queue flush period
    pub flush_interval_secs: u64,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Name sent when opening a session
    pub candidate_name: Option<String>,

    /// File holding the last-known session id
    pub storage_path: PathBuf,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:4000/api".to_string(),
            flush_interval_secs: 5,
            request_timeout_secs: 10,
            candidate_name: Some("Candidate".to_string()),
            storage_path: dirs::data_dir()
                .map(|d| d.join("invigilator"))
                .unwrap_or_else(|| PathBuf::from("./data"))
                .join("session_id"),
        }
    }
}

impl DeliveryConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.server.port, 4000);

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.detection.suspicious_objects.len(), 8);
        assert_eq!(loaded.delivery.flush_interval_secs, 5);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.report_window, 30);
        assert_eq!(config.detection.gaze_threshold, 0.12);
    }

    #[test]
    fn test_log_level_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().log_level(), Level::DEBUG);

        std::fs::write(&path, "log_level = \"loud\"\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().log_level(), Level::INFO);
        assert_eq!(Config::default().log_level(), Level::INFO);
    }

    #[test]
    fn test_monitor_cadence() {
        let mut monitor = MonitorConfig::default();
        assert_eq!(monitor.face_stride(), 4);
        assert_eq!(monitor.frame_interval(), Duration::from_millis(83));

        monitor.performance_mode = false;
        assert_eq!(monitor.face_stride(), 2);
        assert_eq!(monitor.frame_interval(), Duration::from_millis(41));
    }
}
