use log::{debug, info, warn};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::listener::StatusListener;
use crate::status::AlarmStatus;

/// Status listener that reports security events through the log.
///
/// Alarms and cat sightings are logged at `warn` so they stand out in the
/// default `info` output; everything else is informational.
pub struct AlertListener {
    alarm_count: AtomicU32,
    last_status: Mutex<Option<AlarmStatus>>,
}

impl AlertListener {
    pub fn new() -> Self {
        Self {
            alarm_count: AtomicU32::new(0),
            last_status: Mutex::new(None),
        }
    }

    /// Number of `ALARM` notifications seen so far.
    pub fn get_alarm_count(&self) -> u32 {
        self.alarm_count.load(Ordering::SeqCst)
    }

    /// The most recent alarm status this listener was told about.
    pub fn get_last_status(&self) -> Option<AlarmStatus> {
        *self
            .last_status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Build the log line for an alarm status notification.
    ///
    /// # Arguments
    ///
    /// * `previous` - Last status this listener saw, if any
    /// * `status` - The status just set
    pub fn format_status_message(previous: Option<AlarmStatus>, status: AlarmStatus) -> String {
        match previous {
            Some(previous) if previous != status => format!(
                "Alarm status changed from {} to {}: {}",
                previous,
                status,
                status.description()
            ),
            Some(_) => format!("Alarm status remains {}", status),
            None => format!("Alarm status is {}: {}", status, status.description()),
        }
    }
}

impl Default for AlertListener {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusListener for AlertListener {
    fn notify(&self, status: AlarmStatus) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let previous = {
            let mut last = self
                .last_status
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            last.replace(status)
        };
        let message = Self::format_status_message(previous, status);

        match status {
            AlarmStatus::Alarm => {
                let count = self.alarm_count.fetch_add(1, Ordering::SeqCst) + 1;
                warn!("{}: {} (alarm #{})", timestamp, message, count);
            }
            AlarmStatus::PendingAlarm | AlarmStatus::NoAlarm => {
                info!("{}: {}", timestamp, message);
            }
        }
    }

    fn cat_detected(&self, cat_detected: bool) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        if cat_detected {
            warn!("{}: Cat detected on camera", timestamp);
        } else {
            debug!("{}: No cat in camera frame", timestamp);
        }
    }

    fn sensor_status_changed(&self) {
        debug!("Sensor states changed");
    }
}
