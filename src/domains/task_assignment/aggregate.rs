use super::events::{TaskChanges, TaskEvent};
use super::geo::GeoPoint;
use super::selector::RankedWorker;
use super::types::{parse_deadline, NewTask, SelectedWorker, TaskPatch, TaskStatus, WorkerRef};
use crate::common::{AggregateRoot, DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub shop_name: Option<String>,
    pub incentive: Option<f64>,
    pub company_id: String,
    #[serde(flatten)]
    pub location: GeoPoint,
    pub deadline: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub selected_workers: Vec<SelectedWorker>,
    pub accepted_by_workers: Vec<WorkerRef>,
    pub rejected_by_workers: Vec<WorkerRef>,
    pub workers_selected_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<TaskEvent>,
}

impl Task {
    /// Validate a creation payload and build a pending task.
    ///
    /// Nothing is persisted here; a returned error means no task document
    /// should be written.
    pub fn create(id: String, new_task: NewTask) -> DomainResult<Self> {
        if new_task.title.trim().is_empty() {
            return Err(DomainError::validation("Task title is required"));
        }
        if new_task.company_id.trim().is_empty() {
            return Err(DomainError::validation("Task company is required"));
        }
        let location = GeoPoint::from_parts(new_task.latitude, new_task.longitude).ok_or_else(|| {
            DomainError::validation("Task location (latitude and longitude) is required")
        })?;
        if !location.is_in_range() {
            return Err(DomainError::validation("Task location is outside valid coordinate ranges"));
        }
        let deadline = new_task.deadline.as_deref().map(parse_deadline).transpose()?;
        if let Some(incentive) = new_task.incentive {
            if !incentive.is_finite() || incentive < 0.0 {
                return Err(DomainError::validation("Incentive must be a non-negative amount"));
            }
        }

        let now = Utc::now();
        let mut task = Self {
            id: id.clone(),
            title: String::new(),
            description: None,
            shop_name: None,
            incentive: None,
            company_id: String::new(),
            location,
            deadline: None,
            status: TaskStatus::Pending,
            selected_workers: Vec::new(),
            accepted_by_workers: Vec::new(),
            rejected_by_workers: Vec::new(),
            workers_selected_at: None,
            deleted: false,
            created_at: now,
            updated_at: now,
            version: 0,
            uncommitted_events: Vec::new(),
        };

        task.raise(TaskEvent::TaskCreated {
            task_id: id,
            company_id: new_task.company_id,
            title: new_task.title,
            description: new_task.description,
            shop_name: new_task.shop_name,
            incentive: new_task.incentive,
            location,
            deadline,
            timestamp: now,
        })?;
        Ok(task)
    }

    /// Record the nearest workers. Allowed once per task.
    pub fn record_selected_workers(&mut self, nearest: &[RankedWorker]) -> DomainResult<()> {
        if self.workers_selected_at.is_some() {
            return Err(DomainError::conflict(format!(
                "Workers for task {} were already selected",
                self.id
            )));
        }
        let workers = nearest
            .iter()
            .map(|r| SelectedWorker {
                worker_id: r.worker.worker_id.clone(),
                email: r.worker.email.clone(),
                distance_km: r.distance_km,
            })
            .collect();

        self.raise(TaskEvent::WorkersSelected {
            task_id: self.id.clone(),
            workers,
            timestamp: Utc::now(),
        })
    }

    pub fn apply_patch(&mut self, patch: TaskPatch) -> DomainResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let deadline = patch.deadline.as_deref().map(parse_deadline).transpose()?;
        let location = match (patch.latitude, patch.longitude) {
            (None, None) => None,
            (lat, lon) => {
                let point = GeoPoint::from_parts(
                    lat.or(Some(self.location.latitude)),
                    lon.or(Some(self.location.longitude)),
                )
                .filter(GeoPoint::is_in_range)
                .ok_or_else(|| DomainError::validation("Task location is outside valid coordinate ranges"))?;
                Some(point)
            }
        };
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(DomainError::validation("Task title cannot be empty"));
            }
        }

        self.raise(TaskEvent::TaskUpdated {
            task_id: self.id.clone(),
            changes: TaskChanges {
                title: patch.title,
                description: patch.description,
                shop_name: patch.shop_name,
                incentive: patch.incentive,
                deadline,
                status: patch.status,
                location,
            },
            timestamp: Utc::now(),
        })
    }

    pub fn accept(&mut self, email: &str) -> DomainResult<()> {
        let worker = self.selected_worker_ref(email)?;
        if self.has_accepted(email) {
            return Err(DomainError::conflict(format!(
                "Worker {} already accepted task {}",
                email, self.id
            )));
        }
        self.raise(TaskEvent::TaskAccepted {
            task_id: self.id.clone(),
            worker,
            timestamp: Utc::now(),
        })
    }

    pub fn reject(&mut self, email: &str) -> DomainResult<()> {
        let worker = self.selected_worker_ref(email)?;
        if self.has_rejected(email) {
            return Err(DomainError::conflict(format!(
                "Worker {} already rejected task {}",
                email, self.id
            )));
        }
        self.raise(TaskEvent::TaskRejected {
            task_id: self.id.clone(),
            worker,
            timestamp: Utc::now(),
        })
    }

    pub fn mark_deleted(&mut self) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::not_found("Task", self.id.clone()));
        }
        self.raise(TaskEvent::TaskDeleted {
            task_id: self.id.clone(),
            timestamp: Utc::now(),
        })
    }

    pub fn is_selected(&self, email: &str) -> bool {
        self.selected_workers.iter().any(|w| w.email == email)
    }

    pub fn has_accepted(&self, email: &str) -> bool {
        self.accepted_by_workers.iter().any(|w| w.email == email)
    }

    pub fn has_rejected(&self, email: &str) -> bool {
        self.rejected_by_workers.iter().any(|w| w.email == email)
    }

    /// Selected for this task and has not answered yet.
    pub fn awaits_answer_from(&self, email: &str) -> bool {
        self.is_selected(email) && !self.has_accepted(email) && !self.has_rejected(email)
    }

    pub fn selected_emails(&self) -> Vec<String> {
        self.selected_workers.iter().map(|w| w.email.clone()).collect()
    }

    fn selected_worker_ref(&self, email: &str) -> DomainResult<WorkerRef> {
        self.selected_workers
            .iter()
            .find(|w| w.email == email)
            .map(|w| WorkerRef {
                worker_id: w.worker_id.clone(),
                email: w.email.clone(),
            })
            .ok_or_else(|| DomainError::not_found("Selected worker", format!("{} on task {}", email, self.id)))
    }
}

impl AggregateRoot for Task {
    type Event = TaskEvent;

    const AGGREGATE_TYPE: &'static str = "Task";

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        match event {
            TaskEvent::TaskCreated {
                task_id,
                company_id,
                title,
                description,
                shop_name,
                incentive,
                location,
                deadline,
                timestamp,
            } => {
                self.id = task_id.clone();
                self.company_id = company_id.clone();
                self.title = title.clone();
                self.description = description.clone();
                self.shop_name = shop_name.clone();
                self.incentive = *incentive;
                self.location = *location;
                self.deadline = *deadline;
                self.status = TaskStatus::Pending;
                self.created_at = *timestamp;
                self.updated_at = *timestamp;
            }
            TaskEvent::WorkersSelected { workers, timestamp, .. } => {
                self.selected_workers = workers.clone();
                self.workers_selected_at = Some(*timestamp);
                self.updated_at = *timestamp;
            }
            TaskEvent::TaskUpdated { changes, timestamp, .. } => {
                if let Some(title) = &changes.title {
                    self.title = title.clone();
                }
                if let Some(description) = &changes.description {
                    self.description = Some(description.clone());
                }
                if let Some(shop_name) = &changes.shop_name {
                    self.shop_name = Some(shop_name.clone());
                }
                if let Some(incentive) = changes.incentive {
                    self.incentive = Some(incentive);
                }
                if let Some(deadline) = changes.deadline {
                    self.deadline = Some(deadline);
                }
                if let Some(status) = changes.status {
                    self.status = status;
                }
                if let Some(location) = changes.location {
                    self.location = location;
                }
                self.updated_at = *timestamp;
            }
            TaskEvent::TaskAccepted { worker, timestamp, .. } => {
                self.rejected_by_workers.retain(|w| w.email != worker.email);
                if !self.has_accepted(&worker.email) {
                    self.accepted_by_workers.push(worker.clone());
                }
                self.updated_at = *timestamp;
            }
            TaskEvent::TaskRejected { worker, timestamp, .. } => {
                self.accepted_by_workers.retain(|w| w.email != worker.email);
                if !self.has_rejected(&worker.email) {
                    self.rejected_by_workers.push(worker.clone());
                }
                self.updated_at = *timestamp;
            }
            TaskEvent::TaskDeleted { timestamp, .. } => {
                self.deleted = true;
                self.updated_at = *timestamp;
            }
        }
        self.version += 1;
        Ok(())
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    fn add_event(&mut self, event: Self::Event) {
        self.uncommitted_events.push(event);
    }
}
