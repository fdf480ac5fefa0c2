use super::audit::commit_events;
use crate::common::{ApplicationResult, DomainError, EventMetadata, EventStore};
use crate::config::AssignmentConfig;
use crate::domains::identity::{normalize_email, UserRepository};
use crate::domains::logger::DynLogger;
use crate::domains::task_assignment::{
    select_nearest, CompanyTaskSummary, NearestWorkerSummary, NewTask, NotificationDispatcher,
    RankedWorker, RealtimeNotification, Task, TaskCreated, TaskFilter, TaskPatch, TaskRepository,
    TaskResponses, TaskStatus, WorkerDirectory, WorkerLocation, WorkerRecord,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SOURCE: &str = "TaskService";

/// Attempts for one accept/reject before a version conflict is surfaced.
const ANSWER_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy)]
enum Answer {
    Accept,
    Reject,
}

pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    workers: Arc<dyn WorkerDirectory>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
    event_store: Arc<dyn EventStore>,
    logger: DynLogger,
    settings: AssignmentConfig,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        workers: Arc<dyn WorkerDirectory>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
        event_store: Arc<dyn EventStore>,
        logger: DynLogger,
        settings: AssignmentConfig,
    ) -> Self {
        Self {
            tasks,
            workers,
            users,
            notifier,
            event_store,
            logger,
            settings,
        }
    }

    /// Create a task, pick the nearest workers and notify them.
    pub async fn create_task(&self, new_task: NewTask) -> ApplicationResult<TaskCreated> {
        let mut task = Task::create(Uuid::new_v4().to_string(), new_task)?;
        self.tasks.create(&task).await?;
        let stored_version = task.version;
        info!(task_id = %task.id, company_id = %task.company_id, "task created");

        let pool = self.workers.find_workers_by_role(&self.settings.worker_role).await?;
        let candidates = eligible_workers(&pool);
        debug!(
            task_id = %task.id,
            pool = pool.len(),
            eligible = candidates.len(),
            "ranking workers by distance"
        );

        let nearest = select_nearest(&task.location, &candidates, self.settings.nearest_workers);
        task.record_selected_workers(&nearest)?;
        self.tasks.update(&task, stored_version).await?;
        commit_events(self.event_store.as_ref(), &mut task, EventMetadata::from_source(SOURCE)).await?;

        self.report_nearest(&task, &nearest);
        let workers_notified = self.notify_selected(&task, &nearest).await;

        Ok(TaskCreated {
            nearest_workers: nearest.iter().map(NearestWorkerSummary::from).collect(),
            workers_notified,
            task,
        })
    }

    fn report_nearest(&self, task: &Task, nearest: &[RankedWorker]) {
        if nearest.is_empty() {
            self.logger
                .warn(&format!("No gig workers with a location found for task {}", task.id));
            return;
        }
        self.logger
            .info(&format!("Nearest gig workers for task {} ({}):", task.id, task.title));
        for (index, ranked) in nearest.iter().enumerate() {
            self.logger.info(&format!(
                "{}. Email: {}, Distance: {:.2} km",
                index + 1,
                ranked.worker.email,
                ranked.distance_km
            ));
        }
    }

    /// Returns how many workers were emailed. Delivery failures are logged,
    /// never propagated; the task already exists at this point.
    async fn notify_selected(&self, task: &Task, nearest: &[RankedWorker]) -> usize {
        if nearest.is_empty() {
            return 0;
        }
        let recipients = task.selected_emails();
        let notified = match self.notifier.send_email(&recipients, task).await {
            Ok(()) => recipients.len(),
            Err(e) => {
                warn!(task_id = %task.id, "failed to email selected workers: {}", e);
                self.logger
                    .error(&format!("Email notification for task {} failed: {}", task.id, e));
                0
            }
        };

        if let Err(e) = self.notifier.send_realtime(&RealtimeNotification::new_task(task)).await {
            warn!(task_id = %task.id, "failed to publish realtime notification: {}", e);
        }
        notified
    }

    pub async fn get_task(&self, id: &str) -> ApplicationResult<Task> {
        self.load(id).await
    }

    /// Update task fields. The selected workers are left as they are.
    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> ApplicationResult<Task> {
        let mut task = self.load(id).await?;
        let loaded_version = task.version;
        task.apply_patch(patch)?;
        self.tasks.update(&task, loaded_version).await?;
        commit_events(self.event_store.as_ref(), &mut task, EventMetadata::from_source(SOURCE)).await?;
        info!(task_id = %task.id, status = task.status.as_str(), "task updated");
        Ok(task)
    }

    pub async fn delete_task(&self, id: &str) -> ApplicationResult<()> {
        let mut task = self.load(id).await?;
        let loaded_version = task.version;
        task.mark_deleted()?;
        if !self.tasks.delete(id, loaded_version).await? {
            return Err(DomainError::not_found("Task", id).into());
        }
        commit_events(self.event_store.as_ref(), &mut task, EventMetadata::from_source(SOURCE)).await?;
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    pub async fn accept_task(&self, id: &str, worker_email: &str) -> ApplicationResult<Task> {
        self.answer(id, worker_email, Answer::Accept).await
    }

    pub async fn reject_task(&self, id: &str, worker_email: &str) -> ApplicationResult<Task> {
        self.answer(id, worker_email, Answer::Reject).await
    }

    /// Apply one worker's answer against the latest stored task. A concurrent
    /// answer from another worker makes the write stale; reload and reapply.
    async fn answer(&self, id: &str, worker_email: &str, answer: Answer) -> ApplicationResult<Task> {
        let email = normalize_email(worker_email);
        let mut attempt = 1;
        loop {
            let mut task = self.load(id).await?;
            let loaded_version = task.version;
            match answer {
                Answer::Accept => task.accept(&email)?,
                Answer::Reject => task.reject(&email)?,
            }

            match self.tasks.update(&task, loaded_version).await {
                Ok(()) => {}
                Err(DomainError::Conflict { reason }) if attempt < ANSWER_ATTEMPTS => {
                    debug!(task_id = %id, worker = %email, attempt, "retrying answer: {}", reason);
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            commit_events(
                self.event_store.as_ref(),
                &mut task,
                EventMetadata::from_source(SOURCE).with_actor(email.clone()),
            )
            .await?;
            info!(task_id = %id, worker = %email, ?answer, "worker answered task");
            return Ok(task);
        }
    }

    /// Tasks offered to the worker that they have not answered yet.
    pub async fn assignable_tasks_for_worker(&self, worker_email: &str) -> ApplicationResult<Vec<Task>> {
        let email = required_email(worker_email)?;
        self.find(TaskFilter::AwaitingWorker(email)).await
    }

    pub async fn accepted_tasks_for_worker(&self, worker_email: &str) -> ApplicationResult<Vec<Task>> {
        let email = required_email(worker_email)?;
        self.find(TaskFilter::AcceptedByWorker(email)).await
    }

    pub async fn rejected_tasks_for_worker(&self, worker_email: &str) -> ApplicationResult<Vec<Task>> {
        let email = required_email(worker_email)?;
        self.find(TaskFilter::RejectedByWorker(email)).await
    }

    pub async fn tasks_for_company(&self, company_email: &str) -> ApplicationResult<Vec<Task>> {
        let company = self.company_id(company_email).await?;
        self.find(TaskFilter::ByCompany(company)).await
    }

    pub async fn accepted_tasks_for_company(&self, company_email: &str) -> ApplicationResult<Vec<Task>> {
        let company = self.company_id(company_email).await?;
        self.find(TaskFilter::AcceptedForCompany(company)).await
    }

    pub async fn rejected_tasks_for_company(&self, company_email: &str) -> ApplicationResult<Vec<Task>> {
        let company = self.company_id(company_email).await?;
        self.find(TaskFilter::RejectedForCompany(company)).await
    }

    /// Company tasks with at least one answer, and who gave it.
    pub async fn responded_tasks_for_company(
        &self,
        company_email: &str,
    ) -> ApplicationResult<Vec<TaskResponses>> {
        let company = self.company_id(company_email).await?;
        let tasks = self.find(TaskFilter::RespondedForCompany(company)).await?;
        Ok(tasks.iter().map(TaskResponses::from).collect())
    }

    pub async fn finished_tasks_for_company(&self, company_email: &str) -> ApplicationResult<Vec<Task>> {
        let company = self.company_id(company_email).await?;
        self.find(TaskFilter::ByCompanyAndStatus(company, TaskStatus::Completed))
            .await
    }

    /// Pending company tasks that no worker has accepted yet.
    pub async fn open_tasks_for_company(&self, company_email: &str) -> ApplicationResult<Vec<Task>> {
        let company = self.company_id(company_email).await?;
        self.find(TaskFilter::OpenForCompany(company)).await
    }

    pub async fn company_task_summary(&self, company_email: &str) -> ApplicationResult<CompanyTaskSummary> {
        let company = self.company_id(company_email).await?;
        let tasks = self.find(TaskFilter::ByCompany(company.clone())).await?;
        Ok(CompanyTaskSummary::from_tasks(company, &tasks))
    }

    async fn load(&self, id: &str) -> ApplicationResult<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .filter(|t| !t.deleted)
            .ok_or_else(|| DomainError::not_found("Task", id).into())
    }

    async fn find(&self, filter: TaskFilter) -> ApplicationResult<Vec<Task>> {
        Ok(self.tasks.find_by_filter(&filter).await?)
    }

    async fn company_id(&self, company_email: &str) -> ApplicationResult<String> {
        let email = required_email(company_email)?;
        let company = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::not_found("Company", email))?;
        Ok(company.id)
    }
}

/// Workers with both coordinates set. Everyone else is skipped silently.
fn eligible_workers(pool: &[WorkerRecord]) -> Vec<WorkerLocation> {
    pool.iter().filter_map(WorkerRecord::location).collect()
}

fn required_email(email: &str) -> Result<String, DomainError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(DomainError::validation("Email is required"));
    }
    Ok(email)
}
