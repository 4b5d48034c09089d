// Data models for outbound hand-detection notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the notification sent to the external service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub machine_code: String,
    pub operator_id: i64,
    pub operator_name: String,
    #[serde(with = "unix_seconds")]
    pub working_time: DateTime<Utc>,
}

/// The constant part of every notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadTemplate {
    pub machine_code: String,
    pub operator_id: i64,
    pub operator_name: String,
}

impl Default for PayloadTemplate {
    fn default() -> Self {
        Self {
            machine_code: "MCL001_MC001".to_string(),
            operator_id: 12,
            operator_name: "Nguyen Van A".to_string(),
        }
    }
}

impl PayloadTemplate {
    /// Fill in the dispatch time
    pub fn stamp(&self, working_time: DateTime<Utc>) -> NotificationPayload {
        NotificationPayload {
            machine_code: self.machine_code.clone(),
            operator_id: self.operator_id,
            operator_name: self.operator_name.clone(),
            working_time,
        }
    }
}

/// `working_time` goes over the wire as fractional Unix seconds.
mod unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        let seconds = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9;
        serializer.serialize_f64(seconds)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        if !seconds.is_finite() {
            return Err(de::Error::custom(format!("timestamp is not finite: {}", seconds)));
        }
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(whole as i64, nanos)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", seconds)))
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DispatchError::Timeout(e.to_string())
        } else {
            DispatchError::Transport(e.to_string())
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
