use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use khazna::prelude::*;
use khazna::{Injectable, interface};

// === Types for tests ===

#[interface]
trait Logger: Send + Sync {
    fn line(&self, message: &str) -> String;
}

#[derive(Injectable)]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn line(&self, message: &str) -> String {
        format!("[console] {message}")
    }
}

#[derive(Injectable)]
struct Database {
    #[inject(default = String::from("sqlite::memory:"))]
    dsn: String,
}

#[derive(Injectable)]
struct UserRepo {
    db: Arc<Database>,
}

#[derive(Injectable)]
struct UserService {
    repo: Arc<UserRepo>,
    logger: Arc<dyn Logger>,
}

#[derive(Injectable)]
struct Mailer {
    host: String,
    #[inject(default = 25)]
    port: u16,
    retries: Option<u8>,
    logger: Option<Arc<dyn Logger>>,
}

#[derive(Injectable)]
#[injectable(singleton)]
struct EventBus {
    #[inject(skip)]
    sent: AtomicUsize,
}

#[derive(Injectable)]
struct AppInfo {
    #[inject(id = "app.name")]
    name: String,
}

#[derive(Injectable)]
struct RetryPolicy {
    #[inject(id = "mail.retries")]
    retries: Option<u8>,
}

#[derive(Injectable)]
struct Cyclic {
    partner: Arc<Partner>,
}

#[derive(Injectable)]
struct Partner {
    cyclic: Arc<Cyclic>,
}

fn container() -> Container {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("khazna_container=debug")
        .try_init();

    Container::new()
}

fn bind_logger(container: &Container) {
    container.bind(
        "dyn Logger",
        Factory::upcast::<ConsoleLogger, dyn Logger>("ConsoleLogger", |logger| logger),
    );
}

// === Tests ===

#[test]
fn derived_classes_are_discovered() {
    let container = container();

    for class in ["ConsoleLogger", "Database", "UserRepo", "UserService", "dyn Logger"] {
        assert!(container.knows_class(class), "{class} should be discovered");
    }
    assert!(!container.has("UserService"));
}

#[test]
fn resolves_object_graph_without_bindings() {
    let container = container();
    bind_logger(&container);

    let service = container.resolve::<UserService>("UserService").unwrap();
    assert_eq!(service.repo.db.dsn, "sqlite::memory:");
    assert_eq!(service.logger.line("hi"), "[console] hi");
}

#[test]
fn unbound_interface_is_not_instantiable() {
    let container = container();

    let err = container.make("UserService").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Container);
    assert_eq!(
        err.to_string(),
        "Target [dyn Logger] is not instantiable while building [UserService]."
    );
}

#[test]
fn defaults_and_overrides_fill_primitive_fields() {
    let container = container();

    let err = container.make("Mailer").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvableDependency);

    let mailer = container
        .resolve_with::<Mailer>("Mailer", Parameters::new().with("host", String::from("smtp.local")))
        .unwrap();
    assert_eq!(mailer.host, "smtp.local");
    assert_eq!(mailer.port, 25);
    assert_eq!(mailer.retries, None);
    assert!(mailer.logger.is_none());

    let mailer = container
        .resolve_with::<Mailer>(
            "Mailer",
            Parameters::new().at(0, String::from("mx")).with("port", 587_u16).with("retries", 2_u8),
        )
        .unwrap();
    assert_eq!((mailer.host.as_str(), mailer.port, mailer.retries), ("mx", 587, Some(2)));
}

#[test]
fn nullable_dependency_picks_up_binding() {
    let container = container();
    bind_logger(&container);

    let mailer = container
        .resolve_with::<Mailer>("Mailer", Parameters::new().with("host", String::from("h")))
        .unwrap();
    assert_eq!(mailer.logger.as_ref().map(|l| l.line("x")), Some(String::from("[console] x")));
}

#[test]
fn singleton_attribute_caches_under_class_name() {
    let container = container();

    let first = container.resolve::<EventBus>("EventBus").unwrap();
    first.sent.fetch_add(1, Ordering::SeqCst);

    assert!(container.has("EventBus"));
    let second = container.resolve::<EventBus>("EventBus").unwrap();
    assert_eq!(second.sent.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn explicit_identifier_on_field() {
    let container = container();

    let err = container.make("AppInfo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    container.instance("app.name", Instance::of(String::from("khazna")));
    assert_eq!(container.resolve::<AppInfo>("AppInfo").unwrap().name, "khazna");
}

#[test]
fn optional_field_with_unbound_identifier_is_none() {
    let container = container();

    let policy = container.resolve::<RetryPolicy>("RetryPolicy").unwrap();
    assert_eq!(policy.retries, None);

    container.instance("mail.retries", Instance::of(4_u8));
    assert_eq!(container.resolve::<RetryPolicy>("RetryPolicy").unwrap().retries, Some(4));
}

#[test]
fn derived_cycle_fails_fast() {
    let container = container();

    match container.make("Cyclic") {
        Err(KhaznaError::CircularDependency(err)) => {
            assert_eq!(err.chain, vec!["Cyclic", "Partner", "Cyclic"]);
        }
        other => panic!("Expected CircularDependency, got: {other:?}"),
    }
}

#[test]
fn aliases_reach_derived_classes() {
    let container = container();
    container.alias("repo", "users").alias("users", "UserRepo");

    let repo = container.resolve::<UserRepo>("repo").unwrap();
    assert_eq!(repo.db.dsn, "sqlite::memory:");

    container.remove_alias("UserRepo");
    assert!(matches!(container.make("users"), Err(KhaznaError::NotFound(_))));
    assert!(matches!(container.make("repo"), Err(KhaznaError::NotFound(_))));
    assert!(container.bindings().aliases.contains_key("repo"));
}

#[test]
fn builder_class_registration_without_discovery() {
    let container = Container::builder()
        .discover(false)
        .class::<Database>()
        .class::<UserRepo>()
        .build();

    assert!(container.resolve::<UserRepo>("UserRepo").is_ok());
    assert!(!container.knows_class("UserService"));
    assert_eq!(container.make("UserService").unwrap_err().kind(), ErrorKind::NotFound);
}
