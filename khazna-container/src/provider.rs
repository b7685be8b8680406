//! Provider trait — a module of related bindings.
//!
//! Providers group related registrations together so an application can
//! split its wiring by domain instead of one giant setup block.
//!
//! # Examples
//! ```rust
//! use khazna_container::prelude::*;
//!
//! struct MailProvider;
//!
//! impl Provider for MailProvider {
//!     fn register(&self, container: &Container) {
//!         container.instance("mail.host", Instance::of(String::from("smtp.local")));
//!         container.alias("smtp", "mail.host");
//!     }
//! }
//!
//! let container = Container::builder().discover(false).provider(MailProvider).build();
//! assert!(container.has("smtp"));
//! ```

use crate::container::Container;

/// A module that registers related bindings into a container.
///
/// Runs once, right after [`ContainerBuilder::build`](crate::container::ContainerBuilder::build)
/// creates the container, or whenever it is passed to
/// [`Container::register_provider`].
pub trait Provider: Send + Sync {
    /// Register bindings, aliases and classes.
    fn register(&self, container: &Container);

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Factory;
    use crate::instance::Instance;
    use crate::reflect::ClassDescriptor;

    struct Clock {
        zone: String,
    }

    struct TimeProvider;

    impl Provider for TimeProvider {
        fn register(&self, container: &Container) {
            container
                .register_class(ClassDescriptor::of::<Clock>().constructor(vec![], |_| {
                    Ok(Instance::of(Clock { zone: "UTC".into() }))
                }))
                .singleton_self("Clock")
                .bind("now", Factory::value(|| 1_700_000_000_u64))
                .alias("time", "now");
        }
    }

    struct NamedProvider;

    impl Provider for NamedProvider {
        fn register(&self, _container: &Container) {}

        fn name(&self) -> &str {
            "named"
        }
    }

    #[test]
    fn provider_registers_bindings() {
        let container = Container::builder().discover(false).provider(TimeProvider).build();

        assert!(container.has("Clock"));
        assert!(container.has("time"));
        assert_eq!(container.resolve::<Clock>("Clock").unwrap().zone, "UTC");
        assert_eq!(*container.resolve::<u64>("time").unwrap(), 1_700_000_000);
    }

    #[test]
    fn provider_can_run_after_build() {
        let container = Container::builder().discover(false).build();
        assert!(!container.has("now"));

        container.register_provider(&TimeProvider);
        assert!(container.has("now"));
    }

    #[test]
    fn provider_has_name() {
        assert!(TimeProvider.name().contains("TimeProvider"));
        assert_eq!(NamedProvider.name(), "named");
    }
}
