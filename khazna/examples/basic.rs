//! Basic example of the Khazna DI container.

use std::sync::Arc;

use khazna::prelude::*;
use khazna::{Injectable, factory_methods, interface};

// === Define your traits and types ===

#[interface]
trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

#[derive(Injectable)]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

#[derive(Injectable)]
#[injectable(singleton)]
struct Database {
    #[inject(id = "config.database_url")]
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

#[derive(Injectable)]
struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

#[derive(Injectable)]
struct UserService {
    repo: Arc<UserRepository>,
    logger: Arc<dyn Logger>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

#[derive(Injectable)]
struct Greeter {
    #[inject(default = String::from("Hello"))]
    greeting: String,
}

#[factory_methods]
impl Greeter {
    fn greet(&self, name: String) -> String {
        format!("{}, {name}!", self.greeting)
    }
}

fn main() -> khazna::Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("khazna_container=debug")
        .init();

    // Classes are discovered from the derives; only the wiring is left.
    let container = Container::new();

    container.instance(
        "config.database_url",
        Instance::of(String::from("postgres://localhost/myapp")),
    );
    container
        .singleton(
            "dyn Logger",
            Factory::upcast::<ConsoleLogger, dyn Logger>("ConsoleLogger", |logger| logger),
        )
        .alias("users", "UserService")
        .bind("greeting", ("Greeter", "greet"));

    let service = container.resolve::<UserService>("users")?;
    println!("{}", service.get_user(42));

    // Database is self-registering: the second service shares it.
    let again = container.resolve::<UserService>("UserService")?;
    println!("Database shared: {}", Arc::ptr_eq(&service.repo.db, &again.repo.db));

    let greeting = container.resolve_with::<String>(
        "greeting",
        Parameters::new().with("name", String::from("Khazna")),
    )?;
    println!("{greeting}");

    match container.make("Mailer") {
        Ok(_) => println!("unexpected"),
        Err(err) => println!("Expected error ({:?}): {err}", err.kind()),
    }

    println!("{}", container.bindings());

    Ok(())
}
