use super::aggregate::Task;
use super::selector::RankedWorker;
use super::types::{TaskStatus, WorkerRef};
use serde::{Deserialize, Serialize};

/// Nearest worker as reported back to the company that posted the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestWorkerSummary {
    pub email: String,
    pub distance: String,
}

impl From<&RankedWorker> for NearestWorkerSummary {
    fn from(ranked: &RankedWorker) -> Self {
        Self {
            email: ranked.worker.email.clone(),
            distance: format!("{:.2} km", ranked.distance_km),
        }
    }
}

/// Result of the task-creation flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreated {
    pub task: Task,
    pub nearest_workers: Vec<NearestWorkerSummary>,
    pub workers_notified: usize,
}

/// Which workers answered a task, for company dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponses {
    pub task_id: String,
    pub title: String,
    pub status: TaskStatus,
    pub accepted_by: Vec<WorkerRef>,
    pub rejected_by: Vec<WorkerRef>,
}

impl From<&Task> for TaskResponses {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
            accepted_by: task.accepted_by_workers.clone(),
            rejected_by: task.rejected_by_workers.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyTaskSummary {
    pub company_id: String,
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl CompanyTaskSummary {
    pub fn new(company_id: String) -> Self {
        Self {
            company_id,
            ..Default::default()
        }
    }

    pub fn apply_task(&mut self, task: &Task) {
        if task.company_id != self.company_id || task.deleted {
            return;
        }
        self.total += 1;
        match task.status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
        }
    }

    pub fn from_tasks<'a>(company_id: String, tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut summary = Self::new(company_id);
        for task in tasks {
            summary.apply_task(task);
        }
        summary
    }
}
