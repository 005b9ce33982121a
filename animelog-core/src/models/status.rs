//! Per-user tracking status for anime and manga entries

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Shared behavior of the anime and manga status enums.
///
/// Statuses are stored as their display string so rows stay readable.
pub trait TrackingStatus:
    Copy + Default + fmt::Debug + fmt::Display + FromStr<Err = ValidationError> + Send + Sync
{
    fn as_str(&self) -> &'static str;
}

/// Watch status of a tracked anime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WatchStatus {
    Watching,
    Completed,
    Dropped,
    #[default]
    #[serde(rename = "Plan to Watch")]
    PlanToWatch,
}

impl TrackingStatus for WatchStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Watching => "Watching",
            Self::Completed => "Completed",
            Self::Dropped => "Dropped",
            Self::PlanToWatch => "Plan to Watch",
        }
    }
}

impl FromStr for WatchStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Watching" => Ok(Self::Watching),
            "Completed" => Ok(Self::Completed),
            "Dropped" => Ok(Self::Dropped),
            "Plan to Watch" => Ok(Self::PlanToWatch),
            other => Err(ValidationError::InvalidVariant {
                field: "userStatus",
                value: other.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for WatchStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read status of a tracked manga
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReadStatus {
    Reading,
    Completed,
    Dropped,
    #[default]
    #[serde(rename = "Plan to Read")]
    PlanToRead,
}

impl TrackingStatus for ReadStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "Reading",
            Self::Completed => "Completed",
            Self::Dropped => "Dropped",
            Self::PlanToRead => "Plan to Read",
        }
    }
}

impl FromStr for ReadStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Reading" => Ok(Self::Reading),
            "Completed" => Ok(Self::Completed),
            "Dropped" => Ok(Self::Dropped),
            "Plan to Read" => Ok(Self::PlanToRead),
            other => Err(ValidationError::InvalidVariant {
                field: "userStatus",
                value: other.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for ReadStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_planned() {
        assert_eq!(WatchStatus::default(), WatchStatus::PlanToWatch);
        assert_eq!(ReadStatus::default(), ReadStatus::PlanToRead);
    }

    #[test]
    fn parses_display_strings() {
        assert_eq!("Plan to Watch".parse::<WatchStatus>().unwrap(), WatchStatus::PlanToWatch);
        assert_eq!(" Reading ".parse::<ReadStatus>().unwrap(), ReadStatus::Reading);
    }

    #[test]
    fn rejects_cross_kind_status() {
        let err = "Reading".parse::<WatchStatus>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVariant { .. }));
        assert!("Watching".parse::<ReadStatus>().is_err());
    }

    #[test]
    fn serde_uses_display_strings() {
        let json = serde_json::to_string(&WatchStatus::PlanToWatch).unwrap();
        assert_eq!(json, "\"Plan to Watch\"");
        let status: ReadStatus = serde_json::from_str("\"Plan to Read\"").unwrap();
        assert_eq!(status, ReadStatus::PlanToRead);
    }
}
