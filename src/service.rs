use image::DynamicImage;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::classifier::ImageClassifier;
use crate::config::constants;
use crate::error::Result;
use crate::listener::StatusListener;
use crate::repository::SecurityRepository;
use crate::sensor::Sensor;
use crate::status::{AlarmStatus, ArmingStatus};

/// The alarm decision engine.
///
/// Receives sensor activation changes, arming changes and camera frames,
/// and derives the alarm status from them with a fixed set of rules:
///
/// * Disarming always clears the alarm.
/// * Arming resets every sensor to inactive.
/// * While armed, an active sensor moves `NO_ALARM` to `PENDING_ALARM` and
///   `PENDING_ALARM` to `ALARM`. A sensor that reports active again while the
///   alarm is pending counts as confirmation.
/// * When the last active sensor goes inactive, a pending alarm is cleared.
///   A full alarm is never cleared by sensors.
/// * A cat on camera while armed at home raises the alarm; a frame without a
///   cat clears it when no sensor is active.
///
/// Every operation runs to completion on the caller's stack, including
/// repository writes and listener callbacks. Collaborator failures are
/// returned as-is and writes made before the failure are not undone.
pub struct SecurityService<R, C>
where
    R: SecurityRepository,
    C: ImageClassifier,
{
    repository: R,
    classifier: C,
    listeners: Vec<Arc<dyn StatusListener>>,
    cat_detected: bool,
    confidence_threshold: f32,
}

impl<R, C> SecurityService<R, C>
where
    R: SecurityRepository,
    C: ImageClassifier,
{
    pub fn new(repository: R, classifier: C) -> Self {
        Self {
            repository,
            classifier,
            listeners: Vec::new(),
            cat_detected: false,
            confidence_threshold: constants::CAT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Change the arming mode and apply its side effects.
    pub fn set_arming_status(&mut self, status: ArmingStatus) -> Result<()> {
        info!("Arming status set to {}", status);

        if status == ArmingStatus::Disarmed {
            self.set_alarm_status(AlarmStatus::NoAlarm)?;
        } else {
            for mut sensor in self.repository.get_sensors() {
                sensor.set_active(false);
                self.repository.update_sensor(&sensor)?;
            }
            self.notify_sensor_status_changed();
        }

        if self.cat_detected && status == ArmingStatus::ArmedHome {
            self.set_alarm_status(AlarmStatus::Alarm)?;
        }

        self.repository.set_arming_status(status)?;
        Ok(())
    }

    /// Record a sensor's new activation state and update the alarm.
    ///
    /// The caller's sensor is updated in place and persisted. A sensor that
    /// was never added is updated but does not join the tracked set.
    pub fn change_sensor_activation_status(
        &mut self,
        sensor: &mut Sensor,
        active: bool,
    ) -> Result<()> {
        // The tracked copy wins over the caller's, which may predate an arming reset.
        let was_active = self
            .repository
            .get_sensors()
            .iter()
            .find(|tracked| tracked.same_sensor(sensor))
            .map_or(sensor.get_active(), Sensor::get_active);
        let armed = self.repository.get_arming_status().is_armed();

        if armed {
            if active {
                self.handle_sensor_activated()?;
            } else if was_active {
                self.handle_sensor_deactivated(sensor)?;
            }
        } else {
            debug!(
                "System disarmed, sensor {} change ignored for alarm",
                sensor.get_name()
            );
        }

        sensor.set_active(active);
        self.repository.update_sensor(sensor)?;
        if was_active != active {
            self.notify_sensor_status_changed();
        }
        Ok(())
    }

    fn handle_sensor_activated(&mut self) -> Result<()> {
        match self.repository.get_alarm_status() {
            AlarmStatus::NoAlarm => self.set_alarm_status(AlarmStatus::PendingAlarm),
            AlarmStatus::PendingAlarm => self.set_alarm_status(AlarmStatus::Alarm),
            AlarmStatus::Alarm => Ok(()),
        }
    }

    fn handle_sensor_deactivated(&mut self, sensor: &Sensor) -> Result<()> {
        if self.repository.get_alarm_status() != AlarmStatus::PendingAlarm {
            return Ok(());
        }

        let others_active = self
            .repository
            .get_sensors()
            .iter()
            .any(|other| other.get_active() && !other.same_sensor(sensor));

        if others_active {
            Ok(())
        } else {
            self.set_alarm_status(AlarmStatus::NoAlarm)
        }
    }

    /// Classify a camera frame and update the alarm from the result.
    pub fn process_image(&mut self, image: &DynamicImage) -> Result<()> {
        let contains_cat = self
            .classifier
            .image_contains_cat(image, self.confidence_threshold)?;
        self.cat_detected = contains_cat;

        for listener in self.listener_snapshot() {
            listener.cat_detected(contains_cat);
        }

        if contains_cat && self.repository.get_arming_status() == ArmingStatus::ArmedHome {
            self.set_alarm_status(AlarmStatus::Alarm)?;
        } else if !contains_cat && !self.any_sensor_active() {
            self.set_alarm_status(AlarmStatus::NoAlarm)?;
        }

        Ok(())
    }

    /// Set the alarm status directly, persist it and notify listeners.
    ///
    /// Listeners are notified even when the status does not change.
    pub fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()> {
        self.repository.set_alarm_status(status)?;
        for listener in self.listener_snapshot() {
            listener.notify(status);
        }
        Ok(())
    }

    /// Register a listener. Registering the same handle twice has no effect.
    pub fn add_status_listener(&mut self, listener: Arc<dyn StatusListener>) {
        if !self.listeners.iter().any(|l| same_listener(l, &listener)) {
            self.listeners.push(listener);
        }
    }

    pub fn remove_status_listener(&mut self, listener: &Arc<dyn StatusListener>) {
        self.listeners.retain(|l| !same_listener(l, listener));
    }

    pub fn add_sensor(&mut self, sensor: Sensor) -> Result<()> {
        self.repository.add_sensor(sensor)?;
        Ok(())
    }

    pub fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.repository.remove_sensor(sensor)?;
        Ok(())
    }

    pub fn get_alarm_status(&self) -> AlarmStatus {
        self.repository.get_alarm_status()
    }

    pub fn get_arming_status(&self) -> ArmingStatus {
        self.repository.get_arming_status()
    }

    pub fn get_sensors(&self) -> Vec<Sensor> {
        self.repository.get_sensors()
    }

    /// Result of the most recent `process_image` call.
    pub fn is_cat_detected(&self) -> bool {
        self.cat_detected
    }

    pub fn get_confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Update the cat confidence threshold, in percent (0.0 to 100.0).
    /// Non-finite values are ignored and the current threshold is kept.
    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        if !threshold.is_finite() {
            warn!(
                "Ignoring confidence threshold {}, keeping {}",
                threshold, self.confidence_threshold
            );
            return;
        }
        self.confidence_threshold = threshold.clamp(0.0, 100.0);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn any_sensor_active(&self) -> bool {
        self.repository.get_sensors().iter().any(Sensor::get_active)
    }

    // Each event notifies the listeners registered when it started.
    fn listener_snapshot(&self) -> Vec<Arc<dyn StatusListener>> {
        self.listeners.clone()
    }

    fn notify_sensor_status_changed(&self) {
        for listener in self.listener_snapshot() {
            listener.sensor_status_changed();
        }
    }
}

fn same_listener(a: &Arc<dyn StatusListener>, b: &Arc<dyn StatusListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
