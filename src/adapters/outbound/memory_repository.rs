use crate::common::{AggregateRoot, DomainError, DomainResult};
use crate::domains::identity::{normalize_email, Role, User, UserRepository};
use crate::domains::task_assignment::{Task, TaskFilter, TaskRepository, WorkerDirectory, WorkerRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Copy as a document store would keep it: state only, no pending events.
fn stored<A: AggregateRoot>(aggregate: &A) -> A {
    let mut copy = aggregate.clone();
    copy.mark_events_as_committed();
    copy
}

fn stale(kind: &str, id: &str, expected: u64, found: u64) -> DomainError {
    DomainError::conflict(format!(
        "{} {} was modified concurrently (expected version {}, found {})",
        kind, id, expected, found
    ))
}

/// Task documents kept in insertion order, as a document store would return them.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &Task) -> DomainResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(DomainError::conflict(format!("Task {} already exists", task.id)));
        }
        tasks.push(stored(task));
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn update(&self, task: &Task, expected_version: u64) -> DomainResult<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) if slot.version != expected_version => {
                Err(stale("Task", &task.id, expected_version, slot.version))
            }
            Some(slot) => {
                *slot = stored(task);
                Ok(())
            }
            None => Err(DomainError::not_found("Task", task.id.clone())),
        }
    }

    async fn delete(&self, id: &str, expected_version: u64) -> DomainResult<bool> {
        let mut tasks = self.tasks.write().await;
        let Some(index) = tasks.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        if tasks[index].version != expected_version {
            return Err(stale("Task", id, expected_version, tasks[index].version));
        }
        tasks.remove(index);
        Ok(true)
    }

    async fn find_by_filter(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().filter(|t| filter.matches(t)).cloned().collect())
    }
}

/// User documents keyed by id, with an email index.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<UserTables>,
}

#[derive(Debug, Default)]
struct UserTables {
    by_id: HashMap<String, User>,
    email_index: HashMap<String, String>,
    // registration order, so directory queries are stable
    order: Vec<String>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> DomainResult<()> {
        let mut inner = self.inner.write().await;
        let email = normalize_email(&user.email);
        if inner.email_index.contains_key(&email) {
            return Err(DomainError::conflict("Email already registered"));
        }
        inner.email_index.insert(email, user.id.clone());
        inner.order.push(user.id.clone());
        inner.by_id.insert(user.id.clone(), stored(user));
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .email_index
            .get(&normalize_email(email))
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.by_id.get(id).cloned())
    }

    async fn update(&self, user: &User, expected_version: u64) -> DomainResult<()> {
        let mut inner = self.inner.write().await;
        match inner.by_id.get(&user.id) {
            None => return Err(DomainError::not_found("User", user.id.clone())),
            Some(current) if current.version != expected_version => {
                return Err(stale("User", &user.id, expected_version, current.version));
            }
            Some(_) => {}
        }
        inner.by_id.insert(user.id.clone(), stored(user));
        Ok(())
    }
}

#[async_trait]
impl WorkerDirectory for InMemoryUserRepository {
    async fn find_workers_by_role(&self, role: &str) -> DomainResult<Vec<WorkerRecord>> {
        let role: Role = role.parse()?;
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.by_id.get(id))
            .filter(|u| u.role == role)
            .map(|u| WorkerRecord {
                id: u.id.clone(),
                email: u.email.clone(),
                latitude: u.latitude,
                longitude: u.longitude,
            })
            .collect())
    }
}
