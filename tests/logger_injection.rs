use gig_dispatch::adapters::outbound::{init_noop_logger, MultiLogger};
use gig_dispatch::domains::logger::{DomainLogger, DynLogger};
use std::sync::{Arc, Mutex};

struct Capture {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Capture {
    fn new() -> Self { Self { messages: Arc::new(Mutex::new(Vec::new())) } }
}

impl DomainLogger for Capture {
    fn info(&self, msg: &str) { self.messages.lock().unwrap().push(format!("INFO:{}", msg)); }
    fn warn(&self, msg: &str) { self.messages.lock().unwrap().push(format!("WARN:{}", msg)); }
    fn error(&self, msg: &str) { self.messages.lock().unwrap().push(format!("ERR:{}", msg)); }
}

#[test]
fn test_multi_logger_fans_out() {
    let first = Arc::new(Capture::new());
    let second = Arc::new(Capture::new());
    let multi = MultiLogger::new(vec![
        first.clone() as DynLogger,
        init_noop_logger(),
        second.clone() as DynLogger,
    ]);

    multi.info("one");
    multi.warn("two");
    multi.error("three");

    for capture in [&first, &second] {
        let msgs = capture.messages.lock().unwrap();
        assert_eq!(msgs.as_slice(), ["INFO:one", "WARN:two", "ERR:three"]);
    }
}

#[tokio::test]
async fn test_task_service_reports_nearest_workers() {
    use gig_dispatch::adapters::inbound::InMemoryEventStore;
    use gig_dispatch::adapters::outbound::{
        InMemoryTaskRepository, InMemoryUserRepository, LoggingNotificationDispatcher,
    };
    use gig_dispatch::application::TaskService;
    use gig_dispatch::domains::identity::{Registration, Role, User, UserRepository};
    use gig_dispatch::domains::task_assignment::NewTask;

    let capture = Arc::new(Capture::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let worker = User::register(
        "w1".to_string(),
        Registration {
            name: "Worker".to_string(),
            email: "worker@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::GigWorker,
            latitude: Some(0.0),
            longitude: Some(0.1),
        },
    )
    .unwrap();
    users.create(&worker).await.unwrap();

    let service = TaskService::new(
        Arc::new(InMemoryTaskRepository::new()),
        users.clone(),
        users,
        Arc::new(LoggingNotificationDispatcher::new()),
        Arc::new(InMemoryEventStore::new()),
        capture.clone(),
        gig_dispatch::Config::default().assignment,
    );

    service
        .create_task(NewTask {
            title: "Pick up parcel".to_string(),
            company_id: "c1".to_string(),
            latitude: Some(0.0),
            longitude: Some(0.0),
            ..NewTask::default()
        })
        .await
        .unwrap();

    let msgs = capture.messages.lock().unwrap();
    assert!(msgs.iter().any(|m| m.starts_with("INFO:Nearest gig workers")));
    assert!(msgs
        .iter()
        .any(|m| m == "INFO:1. Email: worker@example.com, Distance: 11.12 km"));
}

#[test]
fn test_noop_logger_accepts_calls() {
    let noop = init_noop_logger();
    noop.info("ignored");
    noop.warn("ignored-warn");
    noop.error("ignored-err");
}
