//! Financial Aid Request Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Review state of an aid request
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "aid_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AidStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for AidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AidStatus::Pending => "pending",
            AidStatus::Approved => "approved",
            AidStatus::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// A student's application for financial aid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AidRequest {
    pub id: Uuid,
    pub student_id: Uuid,
    /// Requested amount in whole currency units
    pub amount: i64,
    pub purpose: String,
    pub status: AidStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a new aid request; status always starts as pending
#[derive(Debug, Clone)]
pub struct NewAidRequest {
    pub student_id: Uuid,
    pub amount: i64,
    pub purpose: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_pending() {
        assert_eq!(AidStatus::default(), AidStatus::Pending);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&AidStatus::Approved).unwrap(),
            "\"approved\""
        );
        let status: AidStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(status, AidStatus::Rejected);
        assert!(serde_json::from_str::<AidStatus>("\"cancelled\"").is_err());
    }
}
