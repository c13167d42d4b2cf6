//! Home Guardian - a home security controller with camera-based cat detection.
//!
//! This library tracks door, window and motion sensors, an arming mode and a
//! camera feed, and derives an alarm status from their combined state.
//!
//! # Core Components
//!
//! * [`service`] - The alarm decision engine
//! * [`repository`] - Persistence of sensors, arming status and alarm status
//! * [`classifier`] - Cat detection using YOLO/Darknet
//! * [`camera`] - Camera frames read from a directory of captures
//! * [`listener`] - Observer interface for alarm and camera events
//! * [`alerts`] - Listener that reports events through the log
//! * [`config`] - Configuration from environment variables
//! * [`error`] - Error types
//!
//! # Quick Start
//!
//! ```ignore
//! use home_guardian::*;
//!
//! let repository = JsonFileSecurityRepository::open("security_state.json")?;
//! let detector = CatDetector::new(model_cfg, weights, labels, 0.5)?;
//! let mut service = SecurityService::new(repository, detector);
//!
//! service.add_status_listener(std::sync::Arc::new(AlertListener::new()));
//! service.add_sensor(Sensor::new("front door", SensorType::Door))?;
//! service.set_arming_status(ArmingStatus::ArmedAway)?;
//! ```

pub mod alerts;
pub mod camera;
pub mod classifier;
pub mod config;
pub mod error;
pub mod listener;
pub mod repository;
pub mod sensor;
pub mod service;
pub mod status;

// Re-export commonly used types for convenience
pub use alerts::AlertListener;
pub use camera::CameraFeed;
pub use classifier::{CatDetector, Detection, ImageClassifier};
pub use config::Config;
pub use error::HomeGuardianError;
pub use listener::StatusListener;
pub use repository::{
    InMemorySecurityRepository, JsonFileSecurityRepository, SecurityRepository, SecurityState,
};
pub use sensor::{Sensor, SensorType};
pub use service::SecurityService;
pub use status::{AlarmStatus, ArmingStatus};
