//! Runtime configuration loaded from a JSON file
//!
//! Every field has a sensible default so a missing or partial file still
//! yields a working setup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// MQTT remote-control settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "specfall".to_string()
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// FFT size of the upstream stage; each tile shows half of it
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Visible scrollback rows per tile
    #[serde(default = "default_lines")]
    pub waterfall_lines: usize,
    /// Scroll speed: spectrum rows ingested per second
    #[serde(default = "default_rows_per_second")]
    pub rows_per_second: f32,
    /// Name of the startup theme
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Optional MQTT remote control; absent means disabled
    #[serde(default)]
    pub mqtt: Option<MqttConfig>,
}

fn default_fft_size() -> usize {
    2048
}

fn default_lines() -> usize {
    512
}

fn default_rows_per_second() -> f32 {
    60.0
}

fn default_theme() -> String {
    "default".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            waterfall_lines: default_lines(),
            rows_per_second: default_rows_per_second(),
            theme: default_theme(),
            mqtt: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&json).map_err(|e| e.to_string())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }
}
