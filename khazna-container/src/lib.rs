//! Core container implementation for Khazna DI.

pub mod binding;
pub mod catalog;
pub mod container;
pub mod error;
pub mod instance;
pub mod provider;
pub mod reflect;
pub mod registry;
pub mod resolver;
pub mod settings;

pub use binding::{Concrete, Factory, Lifetime};
pub use container::{Container, ContainerBuilder, prelude};
pub use error::{ErrorKind, KhaznaError, Result};
pub use instance::{Instance, Parameters};
pub use provider::Provider;
pub use reflect::{Injectable, SelfRegistering, class_name};
pub use resolver::{Resolver, resolve};
pub use settings::ContainerSettings;

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
