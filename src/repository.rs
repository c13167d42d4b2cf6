use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RepositoryError;
use crate::sensor::Sensor;
use crate::status::{AlarmStatus, ArmingStatus};

/// Persistence boundary for the security service.
///
/// Reads are infallible and must observe every write made earlier through
/// the same repository. Writes may fail when the backing store does.
pub trait SecurityRepository {
    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError>;

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError>;

    /// Persist the active flag of a tracked sensor. Untracked sensors are
    /// ignored and do not join the set.
    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError>;

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError>;

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError>;

    /// All tracked sensors, ordered by name then type.
    fn get_sensors(&self) -> Vec<Sensor>;

    fn get_alarm_status(&self) -> AlarmStatus;

    fn get_arming_status(&self) -> ArmingStatus;
}

/// Snapshot of everything the repository tracks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityState {
    #[serde(default)]
    pub sensors: BTreeSet<Sensor>,
    #[serde(default)]
    pub alarm_status: AlarmStatus,
    #[serde(default)]
    pub arming_status: ArmingStatus,
}

impl SecurityState {
    fn add_sensor(&mut self, sensor: Sensor) -> bool {
        self.sensors.insert(sensor)
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> bool {
        self.sensors.remove(sensor)
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> bool {
        if self.sensors.remove(sensor) {
            self.sensors.insert(sensor.clone());
            true
        } else {
            false
        }
    }
}

/// Repository that keeps state in memory only.
#[derive(Debug, Default)]
pub struct InMemorySecurityRepository {
    state: SecurityState,
}

impl InMemorySecurityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SecurityState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &SecurityState {
        &self.state
    }
}

impl SecurityRepository for InMemorySecurityRepository {
    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError> {
        self.state.add_sensor(sensor);
        Ok(())
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        self.state.remove_sensor(sensor);
        Ok(())
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        self.state.update_sensor(sensor);
        Ok(())
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError> {
        self.state.alarm_status = status;
        Ok(())
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError> {
        self.state.arming_status = status;
        Ok(())
    }

    fn get_sensors(&self) -> Vec<Sensor> {
        self.state.sensors.iter().cloned().collect()
    }

    fn get_alarm_status(&self) -> AlarmStatus {
        self.state.alarm_status
    }

    fn get_arming_status(&self) -> ArmingStatus {
        self.state.arming_status
    }
}

/// Repository backed by a JSON file.
///
/// The whole state is loaded once at construction and rewritten after every
/// change, so reads never touch the disk.
#[derive(Debug)]
pub struct JsonFileSecurityRepository {
    path: PathBuf,
    state: SecurityState,
}

impl JsonFileSecurityRepository {
    /// Open the repository at `path`, starting from an empty state if the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file does not contain valid security state
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let state = Self::load_state(&path)?;
        debug!(
            "Loaded security state from {}: {} sensor(s), {}, {}",
            path.display(),
            state.sensors.len(),
            state.arming_status,
            state.alarm_status
        );
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &SecurityState {
        &self.state
    }

    fn load_state(path: &Path) -> Result<SecurityState, RepositoryError> {
        if !path.exists() {
            return Ok(SecurityState::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| RepositoryError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if contents.trim().is_empty() {
            return Ok(SecurityState::default());
        }

        serde_json::from_str(&contents).map_err(|e| RepositoryError::Corrupted {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn save(&self) -> Result<(), RepositoryError> {
        let write_failed = |reason: String| RepositoryError::WriteFailed {
            path: self.path.display().to_string(),
            reason,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
        }

        let json =
            serde_json::to_string_pretty(&self.state).map_err(|e| write_failed(e.to_string()))?;

        // Write a sibling file and rename it over the state file, so a crash
        // mid-write never leaves a truncated state file behind.
        let staging = self.staging_path();
        fs::write(&staging, json).map_err(|e| write_failed(e.to_string()))?;
        fs::rename(&staging, &self.path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            write_failed(e.to_string())
        })
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SecurityRepository for JsonFileSecurityRepository {
    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError> {
        if self.state.add_sensor(sensor) {
            self.save()?;
        }
        Ok(())
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        if self.state.remove_sensor(sensor) {
            self.save()?;
        }
        Ok(())
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        if self.state.update_sensor(sensor) {
            self.save()?;
        }
        Ok(())
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError> {
        self.state.alarm_status = status;
        self.save()
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError> {
        self.state.arming_status = status;
        self.save()
    }

    fn get_sensors(&self) -> Vec<Sensor> {
        self.state.sensors.iter().cloned().collect()
    }

    fn get_alarm_status(&self) -> AlarmStatus {
        self.state.alarm_status
    }

    fn get_arming_status(&self) -> ArmingStatus {
        self.state.arming_status
    }
}
