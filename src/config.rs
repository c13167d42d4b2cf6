use std::path::PathBuf;

use crate::error::ConfigError;
use crate::status::ArmingStatus;

/// Configuration for the Home Guardian application loaded from environment variables.
///
/// All values come from the environment so the monitor can run unchanged in a
/// container; only the camera directory is required.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file holding sensors, arming status and alarm status.
    /// Environment variable: `STATE_FILE`
    pub state_file: PathBuf,

    /// The file including label names per class.
    ///
    /// One label per line; one of them must be `cat`.
    /// Environment variable: `LABEL_FILE`
    pub label_file: PathBuf,

    /// The YOLO/Darknet model config file, usually with a .cfg extension.
    /// Environment variable: `MODEL_CFG`
    pub model_cfg: PathBuf,

    /// The model weights file.
    /// Environment variable: `WEIGHTS_FILE`
    pub weights: PathBuf,

    /// The objectness threshold for object detection (0.0 to 1.0).
    /// Environment variable: `OBJECTNESS_THRESHOLD`
    pub objectness_threshold: f32,

    /// Minimum confidence, in percent, for a detection to count as a cat.
    /// Environment variable: `CAT_CONFIDENCE_THRESHOLD`
    pub cat_confidence_threshold: f32,

    /// Directory of camera frames, read in name order and cycled.
    /// Environment variable: `CAMERA_DIR`
    pub camera_dir: PathBuf,

    /// Directory where annotated snapshots of cat sightings are written.
    /// Environment variable: `OUTPUT_DIR`
    pub output_dir: PathBuf,

    /// Whether to flip frames vertically, for cameras mounted upside-down.
    /// Environment variable: `FLIP_IMAGE`
    pub flip_image: bool,

    /// Arming status to apply at startup. When unset the stored status is kept.
    /// Environment variable: `ARMING_STATUS`
    pub arming_status: Option<ArmingStatus>,

    /// Seconds between camera frames, at least 1.
    /// Environment variable: `CAMERA_INTERVAL_SECONDS`
    pub camera_interval_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot be parsed:
    /// - `STATE_FILE`: State file path (default: "./security_state.json")
    /// - `LABEL_FILE`: Path to the label file (default: "./labels.txt")
    /// - `MODEL_CFG`: Path to the model config file (default: "./model.cfg")
    /// - `WEIGHTS_FILE`: Path to the weights file (default: "./model/model.weights")
    /// - `OBJECTNESS_THRESHOLD`: Objectness threshold (default: "0.5")
    /// - `CAT_CONFIDENCE_THRESHOLD`: Cat confidence in percent (default: "50.0")
    /// - `CAMERA_DIR`: Camera frame directory (required)
    /// - `OUTPUT_DIR`: Snapshot directory (default: "./output")
    /// - `FLIP_IMAGE`: Whether to flip frames vertically (default: "false")
    /// - `ARMING_STATUS`: DISARMED, ARMED_HOME or ARMED_AWAY (optional)
    /// - `CAMERA_INTERVAL_SECONDS`: Delay between frames (default: "5")
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let state_file = PathBuf::from(var_or("STATE_FILE", "./security_state.json"));
        let label_file = PathBuf::from(var_or("LABEL_FILE", "./labels.txt"));
        let model_cfg = PathBuf::from(var_or("MODEL_CFG", "./model.cfg"));
        let weights = PathBuf::from(var_or("WEIGHTS_FILE", "./model/model.weights"));
        let output_dir = PathBuf::from(var_or("OUTPUT_DIR", "./output"));

        let objectness_threshold = parse_value::<f32>(
            "OBJECTNESS_THRESHOLD",
            &var_or("OBJECTNESS_THRESHOLD", "0.5"),
        )?;
        if !(0.0..=1.0).contains(&objectness_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "OBJECTNESS_THRESHOLD".to_string(),
                value: objectness_threshold.to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }

        let default_confidence = constants::CAT_CONFIDENCE_THRESHOLD.to_string();
        let cat_confidence_threshold = parse_value::<f32>(
            "CAT_CONFIDENCE_THRESHOLD",
            &var_or("CAT_CONFIDENCE_THRESHOLD", &default_confidence),
        )?;
        if !(0.0..=100.0).contains(&cat_confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "CAT_CONFIDENCE_THRESHOLD".to_string(),
                value: cat_confidence_threshold.to_string(),
                reason: "must be a percentage between 0 and 100".to_string(),
            });
        }

        let camera_dir = lookup("CAMERA_DIR")
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnvVar {
                var_name: "CAMERA_DIR".to_string(),
            })?;

        let flip_image = parse_value::<bool>("FLIP_IMAGE", &var_or("FLIP_IMAGE", "false"))?;

        let arming_status = lookup("ARMING_STATUS")
            .filter(|value| !value.trim().is_empty())
            .map(|value| parse_value::<ArmingStatus>("ARMING_STATUS", &value))
            .transpose()?;

        let default_interval = constants::DEFAULT_CAMERA_INTERVAL_SECONDS.to_string();
        let camera_interval_seconds = parse_value::<u64>(
            "CAMERA_INTERVAL_SECONDS",
            &var_or("CAMERA_INTERVAL_SECONDS", &default_interval),
        )?;
        if camera_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "CAMERA_INTERVAL_SECONDS".to_string(),
                value: camera_interval_seconds.to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Config {
            state_file,
            label_file,
            model_cfg,
            weights,
            objectness_threshold,
            cat_confidence_threshold,
            camera_dir,
            output_dir,
            flip_image,
            arming_status,
            camera_interval_seconds,
        })
    }
}

fn parse_value<T>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Application constants used throughout the system.
pub mod constants {
    /// Confidence, in percent, a detection needs to count as a cat.
    pub const CAT_CONFIDENCE_THRESHOLD: f32 = 50.0;

    /// Class label the detector looks for.
    pub const CAT_LABEL: &str = "cat";

    /// Darknet detection threshold passed to the network.
    pub const DETECTION_THRESHOLD: f32 = 0.25;

    /// Darknet hierarchical threshold.
    pub const HIERARCHY_THRESHOLD: f32 = 0.5;

    /// Non-maximum suppression threshold.
    pub const NMS_THRESHOLD: f32 = 0.45;

    pub const DEFAULT_CAMERA_INTERVAL_SECONDS: u64 = 5;

    /// Delay before retrying after a failed frame, in seconds.
    pub const RETRY_DELAY_SECONDS: u64 = 15;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_camera_dir() {
        let config = Config::load_from(lookup(&[("CAMERA_DIR", "/frames")])).unwrap();
        assert_eq!(config.camera_dir, PathBuf::from("/frames"));
        assert_eq!(config.state_file, PathBuf::from("./security_state.json"));
        assert_eq!(config.cat_confidence_threshold, 50.0);
        assert_eq!(config.objectness_threshold, 0.5);
        assert_eq!(config.camera_interval_seconds, 5);
        assert!(!config.flip_image);
        assert_eq!(config.arming_status, None);
    }

    #[test]
    fn test_missing_camera_dir_is_an_error() {
        let err = Config::load_from(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar { var_name } if var_name == "CAMERA_DIR"));
    }

    #[test]
    fn test_parses_arming_status_and_overrides() {
        let config = Config::load_from(lookup(&[
            ("CAMERA_DIR", "frames"),
            ("ARMING_STATUS", "armed_home"),
            ("FLIP_IMAGE", "true"),
            ("CAT_CONFIDENCE_THRESHOLD", "75"),
            ("CAMERA_INTERVAL_SECONDS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.arming_status, Some(ArmingStatus::ArmedHome));
        assert!(config.flip_image);
        assert_eq!(config.cat_confidence_threshold, 75.0);
        assert_eq!(config.camera_interval_seconds, 2);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_status = Config::load_from(lookup(&[
            ("CAMERA_DIR", "frames"),
            ("ARMING_STATUS", "sort of armed"),
        ]));
        assert!(matches!(bad_status, Err(ConfigError::InvalidValue { .. })));

        let bad_threshold = Config::load_from(lookup(&[
            ("CAMERA_DIR", "frames"),
            ("CAT_CONFIDENCE_THRESHOLD", "150"),
        ]));
        assert!(matches!(bad_threshold, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_rejects_zero_camera_interval() {
        let err = Config::load_from(lookup(&[
            ("CAMERA_DIR", "frames"),
            ("CAMERA_INTERVAL_SECONDS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field, .. } if field == "CAMERA_INTERVAL_SECONDS"
        ));
    }
}
