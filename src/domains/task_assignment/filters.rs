use super::aggregate::Task;
use super::types::TaskStatus;
use serde::{Deserialize, Serialize};

/// Predicates understood by every `TaskRepository`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskFilter {
    All,
    ByCompany(String),
    ByCompanyAndStatus(String, TaskStatus),
    /// Company tasks that at least one worker accepted.
    AcceptedForCompany(String),
    /// Company tasks that at least one worker rejected.
    RejectedForCompany(String),
    /// Company tasks with any worker response.
    RespondedForCompany(String),
    /// Pending company tasks nobody has accepted yet.
    OpenForCompany(String),
    /// Tasks the worker was selected for and has not answered.
    AwaitingWorker(String),
    AcceptedByWorker(String),
    RejectedByWorker(String),
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if task.deleted {
            return false;
        }
        match self {
            TaskFilter::All => true,
            TaskFilter::ByCompany(company) => task.company_id == *company,
            TaskFilter::ByCompanyAndStatus(company, status) => {
                task.company_id == *company && task.status == *status
            }
            TaskFilter::AcceptedForCompany(company) => {
                task.company_id == *company && !task.accepted_by_workers.is_empty()
            }
            TaskFilter::RejectedForCompany(company) => {
                task.company_id == *company && !task.rejected_by_workers.is_empty()
            }
            TaskFilter::RespondedForCompany(company) => {
                task.company_id == *company
                    && (!task.accepted_by_workers.is_empty() || !task.rejected_by_workers.is_empty())
            }
            TaskFilter::OpenForCompany(company) => {
                task.company_id == *company
                    && task.status == TaskStatus::Pending
                    && task.accepted_by_workers.is_empty()
            }
            TaskFilter::AwaitingWorker(email) => task.awaits_answer_from(email),
            TaskFilter::AcceptedByWorker(email) => task.has_accepted(email),
            TaskFilter::RejectedByWorker(email) => task.has_rejected(email),
        }
    }
}
