use crate::common::{DomainError, DomainResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(DomainError::validation(format!("Unknown task status '{}'", other))),
        }
    }
}

/// A worker chosen for a task at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedWorker {
    pub worker_id: String,
    pub email: String,
    pub distance_km: f64,
}

/// A worker that answered a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRef {
    pub worker_id: String,
    pub email: String,
}

/// Payload for creating a task. Coordinates are optional here so a missing
/// location is reported as a validation error instead of a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub company_id: String,
    pub description: Option<String>,
    pub shop_name: Option<String>,
    pub incentive: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub deadline: Option<String>,
}

/// Partial update of a task. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub shop_name: Option<String>,
    pub incentive: Option<f64>,
    pub deadline: Option<String>,
    pub status: Option<TaskStatus>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.shop_name.is_none()
            && self.incentive.is_none()
            && self.deadline.is_none()
            && self.status.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}

/// Parse a deadline given either as an RFC 3339 timestamp or a plain date.
pub fn parse_deadline(raw: &str) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&midnight));
    }
    Err(DomainError::validation("Invalid deadline format"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_supported_deadline_formats() {
        let d = parse_deadline("2025-03-01").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2025, 3, 1));

        let d = parse_deadline("2025-03-01T10:30:00Z").unwrap();
        assert_eq!(d.to_rfc3339(), "2025-03-01T10:30:00+00:00");

        assert!(parse_deadline("2025-03-01T10:30:00").is_ok());
    }

    #[test]
    fn rejects_garbage_deadline() {
        assert!(matches!(parse_deadline("next tuesday"), Err(DomainError::Validation { .. })));
        assert!(matches!(parse_deadline("2025-13-40"), Err(DomainError::Validation { .. })));
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }
}
