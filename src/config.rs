use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid site config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown log level `{0}`")]
    LogLevel(String),
}

/// Tunables for every page behavior.
///
/// Every field has a default, so a JSON document only needs the keys it
/// overrides:
///
/// ```json
/// { "scroll": { "header_offset": 64 }, "log_level": "debug" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub log_level: String,
    pub selectors: Selectors,
    pub scroll: ScrollConfig,
    pub reveal: RevealConfig,
    pub particles: ParticleConfig,
    pub contact: ContactConfig,
    pub banner: BannerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            selectors: Selectors::default(),
            scroll: ScrollConfig::default(),
            reveal: RevealConfig::default(),
            particles: ParticleConfig::default(),
            contact: ContactConfig::default(),
            banner: BannerConfig::default(),
        }
    }
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn log_level(&self) -> Result<log::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}

/// CSS selectors describing the markup the behaviors attach to.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Selectors {
    pub nav_link: String,
    pub header: String,
    pub nav_menu: String,
    pub back_to_top: String,
    pub section: String,
    pub contact_form: String,
    pub submit_button: String,
    pub image: String,
    pub animated_cards: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            nav_link: ".nav-link".to_string(),
            header: ".header".to_string(),
            nav_menu: ".nav-menu".to_string(),
            back_to_top: "#back-to-top".to_string(),
            section: ".section".to_string(),
            contact_form: "#contact-form".to_string(),
            submit_button: ".submit-btn".to_string(),
            image: "img".to_string(),
            animated_cards: ".research-card, .publication-card".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Height of the fixed header subtracted from anchor targets
    pub header_offset: f64,
    /// Scroll offset past which the back-to-top control shows
    pub back_to_top_threshold: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            header_offset: 80.0,
            back_to_top_threshold: 300.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RevealConfig {
    pub threshold: f64,
    /// Sections trigger this many pixels before reaching the viewport bottom edge
    pub bottom_margin_px: f64,
    pub animation: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            bottom_margin_px: 50.0,
            animation: "fadeInUp 0.8s ease forwards".to_string(),
        }
    }
}

impl RevealConfig {
    pub fn root_margin(&self) -> String {
        format!("0px 0px -{}px 0px", self.bottom_margin_px)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub max_count: usize,
    /// One particle per this many pixels of viewport width
    pub pixels_per_particle: f64,
    pub min_duration_secs: f32,
    pub max_duration_secs: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_count: 50,
            pixels_per_particle: 100.0,
            min_duration_secs: 3.0,
            max_duration_secs: 7.0,
            min_opacity: 0.1,
            max_opacity: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactConfig {
    pub submit_delay_ms: u64,
    pub pending_label: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            submit_delay_ms: 1500,
            pending_label: "Sending...".to_string(),
        }
    }
}

impl ContactConfig {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BannerConfig {
    /// Time on screen before the exit animation starts
    pub display_ms: u64,
    /// Length of the exit animation before removal
    pub exit_ms: u64,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            display_ms: 5000,
            exit_ms: 300,
        }
    }
}

impl BannerConfig {
    pub fn display(&self) -> Duration {
        Duration::from_millis(self.display_ms)
    }

    pub fn exit(&self) -> Duration {
        Duration::from_millis(self.exit_ms)
    }
}
