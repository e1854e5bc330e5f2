//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the page
//! controllers. Nothing in the core reads environment variables; binaries read them and
//! hand the result over, which keeps timer-driven tests deterministic.
//!
//! Every field has a default, so an empty (or absent) YAML file yields the stock demo
//! timings:
//!
//! ```yaml
//! stream:
//!   per_char_ms: 5
//!   unit_pause_ms: 5
//!   status_delay_ms: 6000
//!   redirect_delay_ms: 10000
//!   closing_remark: status_box   # or: inline
//! form:
//!   autosave_interval_ms: 5000
//! intake:
//!   max_files: 20
//! ```

use crate::{VeritasError, VeritasResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use veritas_files::IntakeLimits;

/// Where the closing remark of an analysis entry is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosingRemark {
    /// Separate status region, updated after a fixed delay while the stream runs.
    #[default]
    StatusBox,
    /// Final unit of the main stream.
    Inline,
}

/// Whether progressive reveals are shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPreference {
    #[default]
    Full,
    Reduced,
}

impl MotionPreference {
    /// Maps an environment flag (`1`, `true`, `yes`, `reduce`) to a preference.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "reduce" | "reduced") => {
                MotionPreference::Reduced
            }
            _ => MotionPreference::Full,
        }
    }

    pub fn is_reduced(self) -> bool {
        self == MotionPreference::Reduced
    }
}

/// Timing of the streaming renderer and the loading page.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamTiming {
    pub per_char_ms: u64,
    pub unit_pause_ms: u64,
    pub status_delay_ms: u64,
    pub redirect_delay_ms: u64,
    pub closing_remark: ClosingRemark,
}

impl Default for StreamTiming {
    fn default() -> Self {
        Self {
            per_char_ms: 5,
            unit_pause_ms: 5,
            status_delay_ms: 6_000,
            redirect_delay_ms: 10_000,
            closing_remark: ClosingRemark::StatusBox,
        }
    }
}

impl StreamTiming {
    pub fn per_char(&self) -> Duration {
        Duration::from_millis(self.per_char_ms)
    }

    pub fn unit_pause(&self) -> Duration {
        Duration::from_millis(self.unit_pause_ms)
    }

    pub fn status_delay(&self) -> Duration {
        Duration::from_millis(self.status_delay_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

/// Timing of the intake form.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormTiming {
    pub autosave_interval_ms: u64,
    pub saved_notice_ms: u64,
    pub draft_max_age_hours: i64,
    pub upload_step_ms: u64,
    pub submit_delay_ms: u64,
}

impl Default for FormTiming {
    fn default() -> Self {
        Self {
            autosave_interval_ms: 5_000,
            saved_notice_ms: 2_000,
            draft_max_age_hours: 24,
            upload_step_ms: 50,
            submit_delay_ms: 1_000,
        }
    }
}

impl FormTiming {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_millis(self.autosave_interval_ms)
    }

    pub fn saved_notice(&self) -> Duration {
        Duration::from_millis(self.saved_notice_ms)
    }

    pub fn draft_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.draft_max_age_hours)
    }

    pub fn upload_step(&self) -> Duration {
        Duration::from_millis(self.upload_step_ms)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub stream: StreamTiming,
    pub form: FormTiming,
    pub intake: IntakeLimits,
    pub results_delay_ms: u64,
    pub motion: MotionPreference,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            stream: StreamTiming::default(),
            form: FormTiming::default(),
            intake: IntakeLimits::default(),
            results_delay_ms: 1_500,
            motion: MotionPreference::Full,
        }
    }
}

impl CoreConfig {
    /// Parse configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> VeritasResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(VeritasError::YamlDeserialization)
    }

    /// Load configuration from an optional YAML file.
    ///
    /// With no path, the defaults are used.
    pub fn load(path: Option<&Path>) -> VeritasResult<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(VeritasError::ConfigRead)?;
                Self::from_yaml_str(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn results_delay(&self) -> Duration {
        Duration::from_millis(self.results_delay_ms)
    }

    /// Same configuration with every delay removed. Used for instant (non-interactive)
    /// runs such as the REST surface.
    pub fn instant(mut self) -> Self {
        self.stream.per_char_ms = 0;
        self.stream.unit_pause_ms = 0;
        self.stream.status_delay_ms = 0;
        self.stream.redirect_delay_ms = 0;
        self.form.upload_step_ms = 0;
        self.form.submit_delay_ms = 0;
        self.results_delay_ms = 0;
        self
    }
}

/// Resolve the directory holding the file-backed stores.
///
/// An override wins; otherwise the default `.veritas` directory relative to the current
/// working directory is used.
pub fn resolve_state_dir(override_dir: Option<PathBuf>) -> PathBuf {
    override_dir
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(crate::constants::DEFAULT_STATE_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let cfg = CoreConfig::from_yaml_str("").unwrap();
        assert_eq!(cfg.stream, StreamTiming::default());
        assert_eq!(cfg.form.autosave_interval(), Duration::from_secs(5));
        assert_eq!(cfg.results_delay(), Duration::from_millis(1_500));
        assert_eq!(cfg.intake.max_files, 20);
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let cfg = CoreConfig::from_yaml_str(
            "stream:\n  per_char_ms: 4\n  closing_remark: inline\nmotion: reduced\n",
        )
        .unwrap();
        assert_eq!(cfg.stream.per_char(), Duration::from_millis(4));
        assert_eq!(cfg.stream.unit_pause(), Duration::from_millis(5));
        assert_eq!(cfg.stream.closing_remark, ClosingRemark::Inline);
        assert!(cfg.motion.is_reduced());
        assert_eq!(cfg.results_delay_ms, 1_500);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let result = CoreConfig::from_yaml_str("stream: [1, 2");
        assert!(matches!(result, Err(VeritasError::YamlDeserialization(_))));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = CoreConfig::load(Some(Path::new("/definitely/not/here.yaml")));
        assert!(matches!(result, Err(VeritasError::ConfigRead(_))));
    }

    #[test]
    fn test_motion_flag() {
        assert_eq!(MotionPreference::from_flag(Some("1")), MotionPreference::Reduced);
        assert_eq!(MotionPreference::from_flag(Some("TRUE")), MotionPreference::Reduced);
        assert_eq!(MotionPreference::from_flag(Some("0")), MotionPreference::Full);
        assert_eq!(MotionPreference::from_flag(None), MotionPreference::Full);
    }

    #[test]
    fn test_instant_clears_delays() {
        let cfg = CoreConfig::load(None).unwrap().instant();
        assert_eq!(cfg.stream.per_char_ms, 0);
        assert_eq!(cfg.results_delay_ms, 0);
        assert_eq!(cfg.form.autosave_interval_ms, 5_000);
    }

    #[test]
    fn test_state_dir_override() {
        assert_eq!(resolve_state_dir(None), PathBuf::from(".veritas"));
        assert_eq!(
            resolve_state_dir(Some(PathBuf::from("/tmp/v"))),
            PathBuf::from("/tmp/v")
        );
    }
}
