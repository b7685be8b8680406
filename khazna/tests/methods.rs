use std::sync::Arc;

use khazna::prelude::*;
use khazna::{Injectable, factory_methods, interface};

#[interface]
trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[derive(Injectable)]
struct Ledger {
    #[inject(default = String::from("main"))]
    book: String,
}

#[derive(Injectable)]
struct ReportFactory {
    #[inject(default = String::from("report"))]
    prefix: String,
}

#[factory_methods]
impl ReportFactory {
    fn daily(&self, ledger: Arc<Ledger>, #[inject(default = 1)] day: u32) -> String {
        format!("{}:{}:{}", self.prefix, ledger.book, day)
    }

    pub fn limited(&self, #[inject(id = "report.limit")] limit: u32) -> std::result::Result<u32, String> {
        if limit > 10 {
            Err(format!("limit {limit} is too high"))
        } else {
            Ok(limit)
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(FixedClock(1_700_000_000))
    }

    #[allow(dead_code)]
    fn unrelated() -> Self {
        Self { prefix: String::new() }
    }
}

struct ReportProvider;

impl Provider for ReportProvider {
    fn register(&self, container: &Container) {
        container
            .bind("report.daily", ("ReportFactory", "daily"))
            .bind("report.limited", ("ReportFactory", "limited"))
            .singleton("dyn Clock", ("ReportFactory", "clock"))
            .alias("clock", "dyn Clock");
    }
}

fn container() -> Container {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("khazna_container=debug")
        .try_init();

    Container::builder().provider(ReportProvider).build()
}

#[test]
fn private_method_is_callable_through_binding() {
    let container = container();

    let report = container.resolve::<String>("report.daily").unwrap();
    assert_eq!(*report, "report:main:1");
}

#[test]
fn method_arguments_accept_overrides() {
    let container = container();

    let report = container
        .resolve_with::<String>("report.daily", Parameters::new().with("day", 5_u32))
        .unwrap();
    assert_eq!(*report, "report:main:5");

    let report = container
        .resolve_with::<String>("report.daily", Parameters::new().at(1, 9_u32))
        .unwrap();
    assert_eq!(*report, "report:main:9");
}

#[test]
fn fallible_method_reports_construction_failure() {
    let container = container();

    let err = container.make("report.limited").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    container.instance("report.limit", Instance::of(3_u32));
    assert_eq!(*container.resolve::<u32>("report.limited").unwrap(), 3);

    container.instance("report.limit", Instance::of(30_u32));
    match container.make("report.limited") {
        Err(KhaznaError::ConstructionFailed { id, source }) => {
            assert_eq!(id, "ReportFactory::limited");
            assert_eq!(source.to_string(), "limit 30 is too high");
        }
        other => panic!("Expected ConstructionFailed, got: {other:?}"),
    }
}

#[test]
fn shared_return_is_resolvable_as_trait_object() {
    let container = container();

    let first = container.resolve::<dyn Clock>("clock").unwrap();
    let second = container.resolve::<dyn Clock>("dyn Clock").unwrap();

    assert_eq!(first.now(), 1_700_000_000);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn unknown_method_is_reported() {
    let container = container();
    container.bind("report.weekly", ("ReportFactory", "weekly"));

    let err = container.make("report.weekly").unwrap_err();
    assert_eq!(err.to_string(), "Method [ReportFactory::weekly] does not exist");
}

#[test]
fn snapshot_lists_provider_bindings() {
    let container = container();
    let snapshot = container.bindings();

    assert_eq!(snapshot.bindings.len(), 3);
    assert_eq!(snapshot.aliases.get("clock").map(String::as_str), Some("dyn Clock"));
}
