use gig_dispatch::adapters::inbound::{FileEventStore, InMemoryEventStore};
use gig_dispatch::adapters::outbound::*;
use gig_dispatch::common::*;
use gig_dispatch::domains::identity::{
    OtpPurpose, PasswordHasher, Registration, Role, User, UserRepository,
};
use gig_dispatch::domains::task_assignment::{
    GeoPoint, NewTask, RankedWorker, Task, TaskFilter, TaskRepository, WorkerDirectory,
    WorkerLocation,
};
use tempfile::tempdir;

fn task(id: &str, company: &str) -> Task {
    let mut task = Task::create(
        id.to_string(),
        NewTask {
            title: format!("Task {}", id),
            company_id: company.to_string(),
            latitude: Some(1.0),
            longitude: Some(1.0),
            ..NewTask::default()
        },
    )
    .unwrap();
    let ranked = RankedWorker {
        worker: WorkerLocation {
            worker_id: "w1".to_string(),
            email: "w1@example.com".to_string(),
            location: GeoPoint::new(1.0, 1.0),
        },
        distance_km: 0.0,
    };
    task.record_selected_workers(&[ranked]).unwrap();
    task
}

fn user(email: &str, role: Role, location: Option<(f64, f64)>) -> User {
    User::register(
        uuid::Uuid::new_v4().to_string(),
        Registration {
            name: "Someone".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
            latitude: location.map(|l| l.0),
            longitude: location.map(|l| l.1),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_in_memory_task_repository_filters() {
    let repo = InMemoryTaskRepository::new();
    let mut first = task("t1", "c1");
    let second = task("t2", "c1");
    let other = task("t3", "c2");
    repo.create(&first).await.unwrap();
    repo.create(&second).await.unwrap();
    repo.create(&other).await.unwrap();

    assert!(repo.create(&first).await.is_err());

    first.accept("w1@example.com").unwrap();
    repo.update(&first, 2).await.unwrap();

    let company = repo
        .find_by_filter(&TaskFilter::ByCompany("c1".to_string()))
        .await
        .unwrap();
    assert_eq!(company.len(), 2);
    assert_eq!(company[0].id, "t1");

    let accepted = repo
        .find_by_filter(&TaskFilter::AcceptedByWorker("w1@example.com".to_string()))
        .await
        .unwrap();
    assert_eq!(accepted.len(), 1);

    let awaiting = repo
        .find_by_filter(&TaskFilter::AwaitingWorker("w1@example.com".to_string()))
        .await
        .unwrap();
    let ids: Vec<&str> = awaiting.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t2", "t3"]);

    assert!(repo.delete("t2", 2).await.unwrap());
    assert!(!repo.delete("t2", 2).await.unwrap());
    assert!(repo.find_by_id("t2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_in_memory_task_repository_refuses_stale_versions() {
    let repo = InMemoryTaskRepository::new();
    let original = task("t1", "c1");
    repo.create(&original).await.unwrap();

    let mut first = repo.find_by_id("t1").await.unwrap().unwrap();
    let mut second = first.clone();
    first.accept("w1@example.com").unwrap();
    second.reject("w1@example.com").unwrap();

    repo.update(&first, 2).await.unwrap();
    let stale = repo.update(&second, 2).await;
    assert!(matches!(stale, Err(DomainError::Conflict { .. })));

    // the losing write left nothing behind
    let stored = repo.find_by_id("t1").await.unwrap().unwrap();
    assert_eq!(stored.version, 3);
    assert_eq!(stored.accepted_by_workers.len(), 1);
    assert!(stored.rejected_by_workers.is_empty());

    assert!(matches!(
        repo.delete("t1", 2).await,
        Err(DomainError::Conflict { .. })
    ));
    assert!(repo.find_by_id("t1").await.unwrap().is_some());

    let missing = task("nope", "c1");
    assert!(matches!(
        repo.update(&missing, 2).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_in_memory_user_repository_refuses_stale_versions() {
    let repo = InMemoryUserRepository::new();
    let registered = user("v@example.com", Role::GigWorker, Some((1.0, 2.0)));
    repo.create(&registered).await.unwrap();

    let loaded = repo.find_by_email("v@example.com").await.unwrap().unwrap();
    let expected = loaded.committed_version();
    let mut moved = loaded.clone();
    moved
        .update_profile(None, Some(3.0), Some(4.0))
        .unwrap();
    let mut renamed = loaded;
    renamed
        .update_profile(Some("Renamed".to_string()), None, None)
        .unwrap();

    repo.update(&moved, expected).await.unwrap();
    assert!(matches!(
        repo.update(&renamed, expected).await,
        Err(DomainError::Conflict { .. })
    ));

    let stored = repo.find_by_email("v@example.com").await.unwrap().unwrap();
    assert_eq!(stored.latitude, Some(3.0));
    assert_eq!(stored.name, "Someone");
}

#[tokio::test]
async fn test_in_memory_user_repository_as_worker_directory() {
    let repo = InMemoryUserRepository::new();
    repo.create(&user("b@example.com", Role::GigWorker, Some((1.0, 2.0))))
        .await
        .unwrap();
    repo.create(&user("company@example.com", Role::Company, Some((1.0, 2.0))))
        .await
        .unwrap();
    repo.create(&user("a@example.com", Role::GigWorker, None))
        .await
        .unwrap();

    let duplicate = repo
        .create(&user("B@Example.com", Role::GigWorker, None))
        .await;
    assert!(matches!(duplicate, Err(DomainError::Conflict { .. })));

    let workers = repo.find_workers_by_role("Gig Worker").await.unwrap();
    let emails: Vec<&str> = workers.iter().map(|w| w.email.as_str()).collect();
    assert_eq!(emails, vec!["b@example.com", "a@example.com"]);
    assert!(workers[0].location().is_some());
    assert!(workers[1].location().is_none());

    assert!(repo.find_workers_by_role("Admin").await.is_err());
    assert!(repo.find_by_email(" B@EXAMPLE.COM ").await.unwrap().is_some());
}

#[tokio::test]
async fn test_in_memory_event_store() {
    let store = InMemoryEventStore::new();
    let mut t = task("t1", "c1");
    let envelopes = t
        .pending_envelopes(&EventMetadata::from_source("test").with_actor("tester"))
        .unwrap();

    store.append_events("t1", 0, envelopes).await.unwrap();
    t.mark_events_as_committed();
    assert_eq!(store.len().await, 2);

    // a stale writer is refused
    let stale = t.pending_envelopes(&EventMetadata::from_source("test")).unwrap();
    assert!(store.append_events("t1", 0, stale).await.is_err());

    let events = store.load_events("t1", 1).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "WorkersSelected");
    assert_eq!(events[0].metadata.actor.as_deref(), Some("tester"));

    let created = store.load_events_by_type("TaskCreated", None).await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].aggregate_version, 1);
}

#[tokio::test]
async fn test_file_event_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let t = task("t1", "c1");
    let envelopes = t.pending_envelopes(&EventMetadata::from_source("test")).unwrap();

    FileEventStore::new(dir.path())
        .append_events("t1", 0, envelopes)
        .await
        .unwrap();

    let reopened = FileEventStore::new(dir.path());
    let events = reopened.load_events("t1", 0).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].aggregate_version, 2);

    let mut u = user("x@example.com", Role::Company, None);
    u.issue_otp("123456", OtpPurpose::Registration, chrono::Utc::now())
        .unwrap();
    let user_events = u.pending_envelopes(&EventMetadata::from_source("test")).unwrap();
    reopened.append_events(&u.id, 0, user_events).await.unwrap();

    let issued = reopened.load_events_by_type("OtpIssued", None).await.unwrap();
    assert_eq!(issued.len(), 1);
    // only the digest is logged
    assert!(!issued[0].event_data.to_string().contains("123456"));
}

#[test]
fn test_password_hasher_roundtrip() {
    let hasher = BcryptPasswordHasher::new(4);
    let stored = hasher.hash("correct horse").unwrap();
    assert!(stored.starts_with("$2b$04$"));
    assert!(hasher.verify("correct horse", &stored));
    assert!(!hasher.verify("wrong horse", &stored));

    // stored hashes carry their own cost
    let other = BcryptPasswordHasher::new(5);
    assert!(other.verify("correct horse", &stored));
    assert!(hasher.hash("").is_err());
}

#[test]
fn test_logging_dispatcher_accepts_notifications() {
    use gig_dispatch::domains::identity::OtpSender;
    use gig_dispatch::domains::task_assignment::{NotificationDispatcher, RealtimeNotification};

    let dispatcher = LoggingNotificationDispatcher::new();
    let t = task("t1", "c1");

    tokio_test::block_on(async {
        dispatcher
            .send_email(&["w1@example.com".to_string()], &t)
            .await
            .unwrap();
        dispatcher
            .send_realtime(&RealtimeNotification::new_task(&t))
            .await
            .unwrap();
        dispatcher
            .send_otp("w1@example.com", "123456", OtpPurpose::PasswordReset)
            .await
            .unwrap();
    });

    let email = render_task_email(&["w1@example.com".to_string()], &t);
    assert!(email.body.contains("Task id: t1"));
}
