use super::geo::GeoPoint;
use super::types::{SelectedWorker, TaskStatus, WorkerRef};
use crate::common::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field values changed by an update, already validated and parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub shop_name: Option<String>,
    pub incentive: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskEvent {
    TaskCreated {
        task_id: String,
        company_id: String,
        title: String,
        description: Option<String>,
        shop_name: Option<String>,
        incentive: Option<f64>,
        location: GeoPoint,
        deadline: Option<DateTime<Utc>>,
        timestamp: DateTime<Utc>,
    },
    WorkersSelected {
        task_id: String,
        workers: Vec<SelectedWorker>,
        timestamp: DateTime<Utc>,
    },
    TaskUpdated {
        task_id: String,
        changes: TaskChanges,
        timestamp: DateTime<Utc>,
    },
    TaskAccepted {
        task_id: String,
        worker: WorkerRef,
        timestamp: DateTime<Utc>,
    },
    TaskRejected {
        task_id: String,
        worker: WorkerRef,
        timestamp: DateTime<Utc>,
    },
    TaskDeleted {
        task_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for TaskEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TaskEvent::TaskCreated { .. } => "TaskCreated",
            TaskEvent::WorkersSelected { .. } => "WorkersSelected",
            TaskEvent::TaskUpdated { .. } => "TaskUpdated",
            TaskEvent::TaskAccepted { .. } => "TaskAccepted",
            TaskEvent::TaskRejected { .. } => "TaskRejected",
            TaskEvent::TaskDeleted { .. } => "TaskDeleted",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            TaskEvent::TaskCreated { task_id, .. } => task_id,
            TaskEvent::WorkersSelected { task_id, .. } => task_id,
            TaskEvent::TaskUpdated { task_id, .. } => task_id,
            TaskEvent::TaskAccepted { task_id, .. } => task_id,
            TaskEvent::TaskRejected { task_id, .. } => task_id,
            TaskEvent::TaskDeleted { task_id, .. } => task_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TaskEvent::TaskCreated { timestamp, .. } => *timestamp,
            TaskEvent::WorkersSelected { timestamp, .. } => *timestamp,
            TaskEvent::TaskUpdated { timestamp, .. } => *timestamp,
            TaskEvent::TaskAccepted { timestamp, .. } => *timestamp,
            TaskEvent::TaskRejected { timestamp, .. } => *timestamp,
            TaskEvent::TaskDeleted { timestamp, .. } => *timestamp,
        }
    }
}
