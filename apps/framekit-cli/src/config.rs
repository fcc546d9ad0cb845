// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use framekit_core::{FrameDefaults, ImageFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Log level for filtering messages.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Log output format options.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Plain text format (faster, lower CPU overhead)
    #[default]
    Text,
    /// JSON format (structured, better for log aggregation)
    Json,
}

/// Logging configuration. Logs go to stderr so stdout stays machine-readable.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
}

/// A service instance by registry kind and its JSON parameters.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq)]
pub struct ServiceSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl ServiceSpec {
    pub fn new(kind: &str, params: serde_json::Value) -> Self {
        Self { kind: kind.to_string(), params: Some(params) }
    }
}

/// One track: a producer, optionally cut, followed by filters.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq)]
pub struct TrackConfig {
    pub producer: ServiceSpec,
    #[serde(default)]
    pub filters: Vec<ServiceSpec>,
    /// First producer position used by this track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_point: Option<i64>,
    /// Last producer position used by this track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_point: Option<i64>,
}

const fn default_frames() -> i64 {
    25
}

const fn default_threads() -> usize {
    4
}

fn default_out_dir() -> String {
    "./out".to_string()
}

const fn default_image_format() -> ImageFormat {
    ImageFormat::Rgb24
}

const fn default_true() -> bool {
    true
}

const fn default_waveform_height() -> usize {
    64
}

fn default_tracks() -> Vec<TrackConfig> {
    vec![
        TrackConfig {
            producer: ServiceSpec::new("video::color", serde_json::json!({ "color": "#1e90ff" })),
            filters: vec![ServiceSpec::new("video::brightness", serde_json::json!({ "level": 0.8 }))],
            in_point: None,
            out_point: None,
        },
        TrackConfig {
            producer: ServiceSpec::new("audio::tone", serde_json::json!({ "frequency_hz": 440.0 })),
            filters: vec![ServiceSpec::new("audio::gain", serde_json::json!({ "gain": 0.5 }))],
            in_point: None,
            out_point: None,
        },
    ]
}

fn default_transition() -> ServiceSpec {
    ServiceSpec::new("core::mix", serde_json::json!({ "mix": 0.5 }))
}

/// What to render and where.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct RenderConfig {
    /// Number of frames, starting at position 0.
    #[serde(default = "default_frames")]
    pub frames: i64,
    /// Maximum frames rendered concurrently.
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Output directory for `.ppm`/`.pgm` files.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
    /// Pixel format requested from the chain before writing (rgb24 is written as PPM).
    #[serde(default = "default_image_format")]
    pub image_format: ImageFormat,
    /// Also write a waveform image per frame.
    #[serde(default = "default_true")]
    pub waveform: bool,
    #[serde(default = "default_waveform_height")]
    pub waveform_height: usize,
    /// Tracks, combined left to right by `transition`.
    #[serde(default = "default_tracks")]
    pub tracks: Vec<TrackConfig>,
    #[serde(default = "default_transition")]
    pub transition: ServiceSpec,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            threads: default_threads(),
            out_dir: default_out_dir(),
            image_format: default_image_format(),
            waveform: true,
            waveform_height: default_waveform_height(),
            tracks: default_tracks(),
            transition: default_transition(),
        }
    }
}

/// Root configuration for the framekit CLI.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,

    /// Process-wide frame defaults (test card size, fps, silence shape).
    #[serde(default)]
    pub frame: FrameDefaults,

    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub file_missing: Option<String>,
}

/// Loads the configuration from defaults, a TOML file, and `FK_` environment variables.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file exists but contains invalid TOML syntax
/// - Environment variables are set but contain invalid values
pub fn load(config_path: &str) -> Result<ConfigLoadResult, Box<figment::Error>> {
    let mut figment =
        Figment::new().merge(figment::providers::Serialized::defaults(Config::default()));

    let mut file_missing = None;

    // Try to load the config file, but don't fail if it doesn't exist
    if std::path::Path::new(config_path).exists() {
        figment = figment.merge(Toml::file(config_path));
    } else {
        file_missing = Some(config_path.to_string());
    }

    let config: Config =
        figment.merge(Env::prefixed("FK_").split("__")).extract().map_err(Box::new)?;

    Ok(ConfigLoadResult { config, file_missing })
}

/// Generates the default configuration as a pretty-printed TOML string.
///
/// # Errors
///
/// Returns an error if the default configuration cannot be serialized to TOML.
pub fn generate_default() -> Result<String, toml::ser::Error> {
    let default_config = Config::default();
    toml::to_string_pretty(&default_config)
}
