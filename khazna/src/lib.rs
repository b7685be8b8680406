//! # Khazna — Dependency Injection Container for Rust
//!
//! A string-keyed service container: bind identifiers to classes,
//! factories, methods or values, and let the container construct whole
//! object graphs from constructor metadata.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use khazna::prelude::*;
//! use khazna::{Injectable, interface};
//!
//! #[interface]
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! #[derive(Injectable)]
//! struct ConsoleLogger;
//!
//! #[derive(Injectable)]
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let container = Container::new();
//! container.bind("dyn Logger", Factory::new(|_, _| {
//!     Ok(Instance::shared(Arc::new(ConsoleLogger) as Arc<dyn Logger>))
//! }));
//!
//! let service: Arc<UserService> = container.resolve("UserService")?;
//! ```

pub use khazna_container::*;
pub use khazna_macros::{Injectable, factory_methods, interface};
pub use khazna_support::*;
