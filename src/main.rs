use gig_dispatch::adapters::inbound::{FileEventStore, InMemoryEventStore};
use gig_dispatch::adapters::outbound::{
    create_pool, init_dispatch_logger, initialize_schema, InMemoryTaskRepository,
    InMemoryUserRepository, KafkaNotificationDispatcher, LoggingNotificationDispatcher,
    BcryptPasswordHasher, PostgresTaskRepository, PostgresUserRepository,
};
use gig_dispatch::application::{AuthService, ProfileService, TaskService};
use gig_dispatch::common::EventStore;
use gig_dispatch::config::StorageBackend;
use gig_dispatch::domains::identity::{OtpGenerator, OtpSender, UserRepository};
use gig_dispatch::domains::task_assignment::{NotificationDispatcher, TaskRepository, WorkerDirectory};
use gig_dispatch::Config;
use std::error::Error;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // the logging sender writes message bodies, passcodes included, at debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gig_dispatch::adapters::outbound::notifications=debug"));
    // fast_log owns the `log` facade, so tracing is installed without the log bridge
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting gig dispatch");

    let config = Config::load("config.toml")?;
    info!("Configuration loaded successfully");
    info!("Storage backend: {:?}", config.storage.backend);

    let (tasks, users, workers): (Arc<dyn TaskRepository>, Arc<dyn UserRepository>, Arc<dyn WorkerDirectory>) =
        match config.storage.backend {
            StorageBackend::Memory => {
                let users = Arc::new(InMemoryUserRepository::new());
                let tasks: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
                let directory: Arc<dyn WorkerDirectory> = users.clone();
                (tasks, users as Arc<dyn UserRepository>, directory)
            }
            StorageBackend::Postgres => {
                info!("PostgreSQL host: {}", config.postgres.host);
                let pool = create_pool(&config.postgres)?;
                initialize_schema(&pool).await?;
                let users = Arc::new(PostgresUserRepository::new(pool.clone()));
                let tasks: Arc<dyn TaskRepository> = Arc::new(PostgresTaskRepository::new(pool));
                let directory: Arc<dyn WorkerDirectory> = users.clone();
                (tasks, users as Arc<dyn UserRepository>, directory)
            }
        };

    let event_store: Arc<dyn EventStore> = match &config.storage.event_log_dir {
        Some(dir) => Arc::new(FileEventStore::new(dir.as_str())),
        None => Arc::new(InMemoryEventStore::new()),
    };

    let otp_sender: Arc<dyn OtpSender> = Arc::new(LoggingNotificationDispatcher::new());
    let notifier: Arc<dyn NotificationDispatcher> = if config.kafka.enabled {
        match KafkaNotificationDispatcher::new(&config.kafka) {
            Ok(dispatcher) => {
                info!("Kafka brokers: {:?}", config.kafka.brokers);
                Arc::new(dispatcher)
            }
            Err(e) => {
                error!("Kafka unavailable, realtime notifications will only be logged: {}", e);
                Arc::new(LoggingNotificationDispatcher::new())
            }
        }
    } else {
        Arc::new(LoggingNotificationDispatcher::new())
    };

    let logger = init_dispatch_logger(config.logging.file.as_deref());

    let _task_service = TaskService::new(
        tasks,
        workers,
        users.clone(),
        notifier,
        event_store.clone(),
        logger,
        config.assignment.clone(),
    );
    let _auth_service = AuthService::new(
        users.clone(),
        Arc::new(BcryptPasswordHasher::new(config.password.hash_cost)),
        otp_sender,
        event_store.clone(),
        OtpGenerator::new(config.otp.digits, config.otp.ttl_minutes),
    );
    let _profile_service = ProfileService::new(users, event_store);

    info!("Gig dispatch started successfully");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down gig dispatch");

    Ok(())
}
