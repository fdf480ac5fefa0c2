use super::aggregate::Task;
use super::filters::TaskFilter;
use super::geo::GeoPoint;
use super::selector::WorkerLocation;
use crate::common::DomainResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Worker record as returned by the directory. Coordinates may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: String,
    pub email: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl WorkerRecord {
    /// The worker's location snapshot, if both coordinates are set.
    pub fn location(&self) -> Option<WorkerLocation> {
        GeoPoint::from_parts(self.latitude, self.longitude).map(|location| WorkerLocation {
            worker_id: self.id.clone(),
            email: self.email.clone(),
            location,
        })
    }
}

/// Push message broadcast when a new task appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeNotification {
    pub title: String,
    pub message: String,
    pub task_id: String,
}

impl RealtimeNotification {
    pub fn new_task(task: &Task) -> Self {
        Self {
            title: "New Task Available".to_string(),
            message: format!("Task: {} is available!", task.title),
            task_id: task.id.clone(),
        }
    }
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> DomainResult<()>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Task>>;
    /// Replace the stored document, provided it is still at `expected_version`.
    /// A stale version is a `Conflict` and leaves the stored document untouched.
    async fn update(&self, task: &Task, expected_version: u64) -> DomainResult<()>;
    /// Returns false when no task with that id exists, `Conflict` when the
    /// stored task has moved past `expected_version`.
    async fn delete(&self, id: &str, expected_version: u64) -> DomainResult<bool>;
    async fn find_by_filter(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>>;
}

#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    async fn find_workers_by_role(&self, role: &str) -> DomainResult<Vec<WorkerRecord>>;
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_email(&self, recipients: &[String], task: &Task) -> Result<(), String>;
    async fn send_realtime(&self, payload: &RealtimeNotification) -> Result<(), String>;
}
