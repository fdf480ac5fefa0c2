use crate::common::{DomainError, DomainResult};
use crate::config::PostgresConfig;
use crate::domains::identity::{normalize_email, Role, User, UserRepository};
use crate::domains::task_assignment::{Task, TaskFilter, TaskRepository, TaskStatus, WorkerDirectory, WorkerRecord};
use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use serde_json::json;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        company_id TEXT NOT NULL,
        status TEXT NOT NULL,
        version BIGINT NOT NULL,
        document JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_tasks_company_id
    ON tasks(company_id, status);

    CREATE INDEX IF NOT EXISTS idx_tasks_document
    ON tasks USING GIN (document jsonb_path_ops);

    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL,
        version BIGINT NOT NULL DEFAULT 0,
        document JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    );

    ALTER TABLE users ADD COLUMN IF NOT EXISTS version BIGINT NOT NULL DEFAULT 0;

    CREATE INDEX IF NOT EXISTS idx_users_role
    ON users(role);
"#;

fn persistence(context: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::Persistence(format!("{}: {}", context, e))
}

/// Build a connection pool from configuration.
pub fn create_pool(config: &PostgresConfig) -> Result<Pool, String> {
    let mut pg_config = Config::new();
    pg_config.host = Some(config.host.clone());
    pg_config.port = Some(config.port);
    pg_config.dbname = Some(config.database.clone());
    pg_config.user = Some(config.username.clone());
    pg_config.password = Some(config.password.clone());
    pg_config.pool = Some(PoolConfig::new(config.max_connections as usize));

    pg_config
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| format!("Failed to create PostgreSQL pool: {}", e))
}

/// Create the task and user tables if they do not exist yet.
pub async fn initialize_schema(pool: &Pool) -> Result<(), String> {
    let client = pool
        .get()
        .await
        .map_err(|e| format!("Failed to get database connection: {}", e))?;

    client
        .batch_execute(SCHEMA)
        .await
        .map_err(|e| format!("Failed to initialize database schema: {}", e))
}

/// A conditional write touched no rows: tell a missing row from a stale version.
async fn missing_or_stale(
    client: &deadpool_postgres::Object,
    table: &str,
    kind: &'static str,
    id: &str,
    expected_version: u64,
) -> DomainResult<DomainError> {
    let query = format!("SELECT version FROM {} WHERE id = $1", table);
    let row = client
        .query_opt(query.as_str(), &[&id])
        .await
        .map_err(|e| persistence("Failed to read version", e))?;

    Ok(match row {
        Some(row) => DomainError::conflict(format!(
            "{} {} was modified concurrently (expected version {}, found {})",
            kind,
            id,
            expected_version,
            row.get::<_, i64>(0)
        )),
        None => DomainError::not_found(kind, id),
    })
}

type SqlParams = Vec<Box<dyn ToSql + Sync + Send>>;

/// Translate a filter into a WHERE clause over the `tasks` table.
fn task_filter_sql(filter: &TaskFilter) -> (String, SqlParams) {
    fn contains(field: &str, email: &str) -> serde_json::Value {
        let mut doc = serde_json::Map::new();
        doc.insert(field.to_string(), json!([{ "email": email }]));
        serde_json::Value::Object(doc)
    }

    match filter {
        TaskFilter::All => ("TRUE".to_string(), vec![]),
        TaskFilter::ByCompany(company) => ("company_id = $1".to_string(), vec![Box::new(company.clone())]),
        TaskFilter::ByCompanyAndStatus(company, status) => (
            "company_id = $1 AND status = $2".to_string(),
            vec![Box::new(company.clone()), Box::new(status.as_str().to_string())],
        ),
        TaskFilter::AcceptedForCompany(company) => (
            "company_id = $1 AND jsonb_array_length(document->'accepted_by_workers') > 0".to_string(),
            vec![Box::new(company.clone())],
        ),
        TaskFilter::RejectedForCompany(company) => (
            "company_id = $1 AND jsonb_array_length(document->'rejected_by_workers') > 0".to_string(),
            vec![Box::new(company.clone())],
        ),
        TaskFilter::RespondedForCompany(company) => (
            "company_id = $1 AND (jsonb_array_length(document->'accepted_by_workers') > 0 \
             OR jsonb_array_length(document->'rejected_by_workers') > 0)"
                .to_string(),
            vec![Box::new(company.clone())],
        ),
        TaskFilter::OpenForCompany(company) => (
            "company_id = $1 AND status = $2 AND jsonb_array_length(document->'accepted_by_workers') = 0"
                .to_string(),
            vec![
                Box::new(company.clone()),
                Box::new(TaskStatus::Pending.as_str().to_string()),
            ],
        ),
        TaskFilter::AwaitingWorker(email) => (
            "document @> $1 AND NOT document @> $2 AND NOT document @> $3".to_string(),
            vec![
                Box::new(contains("selected_workers", email)),
                Box::new(contains("accepted_by_workers", email)),
                Box::new(contains("rejected_by_workers", email)),
            ],
        ),
        TaskFilter::AcceptedByWorker(email) => (
            "document @> $1".to_string(),
            vec![Box::new(contains("accepted_by_workers", email))],
        ),
        TaskFilter::RejectedByWorker(email) => (
            "document @> $1".to_string(),
            vec![Box::new(contains("rejected_by_workers", email))],
        ),
    }
}

pub struct PostgresTaskRepository {
    pool: Pool,
}

impl PostgresTaskRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> DomainResult<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| persistence("Failed to get database connection", e))
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, task: &Task) -> DomainResult<()> {
        let client = self.client().await?;
        let document = serde_json::to_value(task)?;

        let inserted = client
            .execute(
                "INSERT INTO tasks (id, company_id, status, version, document, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (id) DO NOTHING",
                &[
                    &task.id,
                    &task.company_id,
                    &task.status.as_str(),
                    &(task.version as i64),
                    &document,
                    &task.created_at,
                    &task.updated_at,
                ],
            )
            .await
            .map_err(|e| persistence("Failed to insert task", e))?;

        if inserted == 0 {
            return Err(DomainError::conflict(format!("Task {} already exists", task.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Task>> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT document FROM tasks WHERE id = $1", &[&id])
            .await
            .map_err(|e| persistence("Failed to load task", e))?;

        match row {
            Some(row) => Ok(Some(serde_json::from_value(row.get::<_, serde_json::Value>(0))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, task: &Task, expected_version: u64) -> DomainResult<()> {
        let client = self.client().await?;
        let document = serde_json::to_value(task)?;

        let updated = client
            .execute(
                "UPDATE tasks SET company_id = $2, status = $3, version = $4, document = $5, updated_at = $6
                 WHERE id = $1 AND version = $7",
                &[
                    &task.id,
                    &task.company_id,
                    &task.status.as_str(),
                    &(task.version as i64),
                    &document,
                    &task.updated_at,
                    &(expected_version as i64),
                ],
            )
            .await
            .map_err(|e| persistence("Failed to update task", e))?;

        if updated == 0 {
            return Err(missing_or_stale(&client, "tasks", "Task", &task.id, expected_version).await?);
        }
        Ok(())
    }

    async fn delete(&self, id: &str, expected_version: u64) -> DomainResult<bool> {
        let client = self.client().await?;
        let deleted = client
            .execute(
                "DELETE FROM tasks WHERE id = $1 AND version = $2",
                &[&id, &(expected_version as i64)],
            )
            .await
            .map_err(|e| persistence("Failed to delete task", e))?;

        if deleted > 0 {
            return Ok(true);
        }
        match missing_or_stale(&client, "tasks", "Task", id, expected_version).await? {
            DomainError::NotFound { .. } => Ok(false),
            stale => Err(stale),
        }
    }

    async fn find_by_filter(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>> {
        let client = self.client().await?;
        let (clause, params) = task_filter_sql(filter);
        let query = format!(
            "SELECT document FROM tasks WHERE {} ORDER BY created_at, id",
            clause
        );
        let refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = client
            .query(query.as_str(), &refs)
            .await
            .map_err(|e| persistence("Failed to query tasks", e))?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            let task: Task = serde_json::from_value(row.get::<_, serde_json::Value>(0))?;
            tasks.push(task);
        }
        Ok(tasks)
    }
}

pub struct PostgresUserRepository {
    pool: Pool,
}

impl PostgresUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> DomainResult<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| persistence("Failed to get database connection", e))
    }

    async fn find_one(&self, query: &str, key: &str) -> DomainResult<Option<User>> {
        let client = self.client().await?;
        let row = client
            .query_opt(query, &[&key])
            .await
            .map_err(|e| persistence("Failed to load user", e))?;

        match row {
            Some(row) => Ok(Some(serde_json::from_value(row.get::<_, serde_json::Value>(0))?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> DomainResult<()> {
        let client = self.client().await?;
        let document = serde_json::to_value(user)?;

        let inserted = client
            .execute(
                "INSERT INTO users (id, email, role, version, document, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT DO NOTHING",
                &[
                    &user.id,
                    &normalize_email(&user.email),
                    &user.role.as_str(),
                    &(user.version as i64),
                    &document,
                    &user.created_at,
                    &user.updated_at,
                ],
            )
            .await
            .map_err(|e| persistence("Failed to insert user", e))?;

        if inserted == 0 {
            return Err(DomainError::conflict("Email already registered"));
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        self.find_one("SELECT document FROM users WHERE email = $1", &normalize_email(email))
            .await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        self.find_one("SELECT document FROM users WHERE id = $1", id).await
    }

    async fn update(&self, user: &User, expected_version: u64) -> DomainResult<()> {
        let client = self.client().await?;
        let document = serde_json::to_value(user)?;

        let updated = client
            .execute(
                "UPDATE users SET role = $2, version = $3, document = $4, updated_at = $5
                 WHERE id = $1 AND version = $6",
                &[
                    &user.id,
                    &user.role.as_str(),
                    &(user.version as i64),
                    &document,
                    &user.updated_at,
                    &(expected_version as i64),
                ],
            )
            .await
            .map_err(|e| persistence("Failed to update user", e))?;

        if updated == 0 {
            return Err(missing_or_stale(&client, "users", "User", &user.id, expected_version).await?);
        }
        Ok(())
    }
}

#[async_trait]
impl WorkerDirectory for PostgresUserRepository {
    async fn find_workers_by_role(&self, role: &str) -> DomainResult<Vec<WorkerRecord>> {
        let role: Role = role.parse()?;
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT document FROM users WHERE role = $1 ORDER BY created_at, id",
                &[&role.as_str()],
            )
            .await
            .map_err(|e| persistence("Failed to query workers", e))?;

        let mut workers = Vec::with_capacity(rows.len());
        for row in rows {
            let user: User = serde_json::from_value(row.get::<_, serde_json::Value>(0))?;
            workers.push(WorkerRecord {
                id: user.id,
                email: user.email,
                latitude: user.latitude,
                longitude: user.longitude,
            });
        }
        Ok(workers)
    }
}
