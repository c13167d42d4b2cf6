use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator-selected arming mode.
///
/// Controls whether sensor and camera events are allowed to raise the alarm.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmingStatus {
    #[default]
    Disarmed,
    ArmedHome,
    ArmedAway,
}

impl ArmingStatus {
    /// All arming modes, in display order.
    pub const ALL: [ArmingStatus; 3] = [
        ArmingStatus::Disarmed,
        ArmingStatus::ArmedHome,
        ArmingStatus::ArmedAway,
    ];

    /// Human-readable label for the mode.
    pub fn description(&self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "Disarmed",
            ArmingStatus::ArmedHome => "Armed - At Home",
            ArmingStatus::ArmedAway => "Armed - Away",
        }
    }

    /// Whether sensor activity can raise the alarm in this mode.
    pub fn is_armed(&self) -> bool {
        !matches!(self, ArmingStatus::Disarmed)
    }

    /// The tag used in configuration and the state file.
    pub fn as_tag(&self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "DISARMED",
            ArmingStatus::ArmedHome => "ARMED_HOME",
            ArmingStatus::ArmedAway => "ARMED_AWAY",
        }
    }
}

impl fmt::Display for ArmingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

impl FromStr for ArmingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase().replace('-', "_");
        ArmingStatus::ALL
            .into_iter()
            .find(|status| status.as_tag() == tag)
            .ok_or_else(|| {
                format!(
                    "expected one of DISARMED, ARMED_HOME, ARMED_AWAY, got '{}'",
                    s
                )
            })
    }
}

/// The derived danger level of the home.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    #[default]
    NoAlarm,
    PendingAlarm,
    Alarm,
}

impl AlarmStatus {
    pub const ALL: [AlarmStatus; 3] = [
        AlarmStatus::NoAlarm,
        AlarmStatus::PendingAlarm,
        AlarmStatus::Alarm,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "Cool and Good",
            AlarmStatus::PendingAlarm => "I'm in Danger...",
            AlarmStatus::Alarm => "Awooga!",
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "NO_ALARM",
            AlarmStatus::PendingAlarm => "PENDING_ALARM",
            AlarmStatus::Alarm => "ALARM",
        }
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arming_status_parses_tags() {
        assert_eq!("ARMED_HOME".parse(), Ok(ArmingStatus::ArmedHome));
        assert_eq!("armed-away".parse(), Ok(ArmingStatus::ArmedAway));
        assert_eq!(" disarmed ".parse(), Ok(ArmingStatus::Disarmed));
        assert!("armed".parse::<ArmingStatus>().is_err());
    }

    #[test]
    fn test_only_disarmed_is_unarmed() {
        assert!(!ArmingStatus::Disarmed.is_armed());
        assert!(ArmingStatus::ArmedHome.is_armed());
        assert!(ArmingStatus::ArmedAway.is_armed());
    }

    #[test]
    fn test_status_serializes_as_tag() {
        let json = serde_json::to_string(&AlarmStatus::PendingAlarm).unwrap();
        assert_eq!(json, "\"PENDING_ALARM\"");

        let status: ArmingStatus = serde_json::from_str("\"ARMED_AWAY\"").unwrap();
        assert_eq!(status, ArmingStatus::ArmedAway);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ArmingStatus::default(), ArmingStatus::Disarmed);
        assert_eq!(AlarmStatus::default(), AlarmStatus::NoAlarm);
    }
}
