//! # The Container — heart of Khazna
//!
//! The dependency injection container: bindings keyed by string
//! identifiers, resolved recursively against class descriptors.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container ──make(id)──> Resolution
//!                                  │                        │
//!                               Registry  <── aliases ──────┤
//!                             ClassCatalog <── descriptors ─┘
//! ```
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use khazna_container::prelude::*;
//!
//! struct Config { url: String }
//! struct Database { url: String }
//!
//! let container = Container::builder()
//!     .discover(false)
//!     .descriptor(ClassDescriptor::of::<Database>().constructor(
//!         vec![Parameter::class::<Config>("config", 0)],
//!         |args| {
//!             let config = args.shared::<Config>(0)?;
//!             Ok(Instance::of(Database { url: config.url.clone() }))
//!         },
//!     ))
//!     .build();
//!
//! container.instance("Config", Instance::of(Config { url: "postgres://localhost".into() }));
//! container.singleton_self("Database");
//!
//! let db: Arc<Database> = container.resolve("Database").unwrap();
//! assert_eq!(db.url, "postgres://localhost");
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::binding::{Concrete, Lifetime};
use crate::catalog::ClassCatalog;
use crate::error::Result;
use crate::instance::{Instance, Parameters};
use crate::provider::Provider;
use crate::reflect::{ClassDescriptor, Injectable, MethodDescriptor};
use crate::registry::{BindingsSnapshot, Registry};
use crate::resolver::{Resolution, downcast};
use crate::settings::ContainerSettings;

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`].
///
/// The builder decides which classes the container knows about and runs
/// [`Provider`] modules once the container exists. Bindings themselves
/// can be added and replaced at any time on the container.
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .max_depth(64)
///     .class::<UserService>()
///     .provider(DatabaseProvider)
///     .build();
/// ```
pub struct ContainerBuilder {
    settings: ContainerSettings,
    classes: Vec<ClassDescriptor>,
    methods: Vec<MethodDescriptor>,
    providers: Vec<Box<dyn Provider>>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            settings: ContainerSettings::default(),
            classes: Vec::new(),
            methods: Vec::new(),
            providers: Vec::new(),
        }
    }

    /// Replace all settings.
    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Collect classes submitted by the derive macros (on by default).
    pub fn discover(mut self, discover: bool) -> Self {
        self.settings.discover = discover;
        self
    }

    /// Limit nested constructions per `make`.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.settings.max_depth = max_depth;
        self
    }

    /// Register an [`Injectable`] class explicitly.
    pub fn class<T: Injectable>(self) -> Self {
        self.descriptor(T::descriptor())
    }

    /// Register a hand-written class descriptor.
    pub fn descriptor(mut self, descriptor: ClassDescriptor) -> Self {
        self.classes.push(descriptor);
        self
    }

    /// Register a hand-written method descriptor.
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a [`Provider`] module, run when the container is built.
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Build the container.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Container {
        let mut catalog = if self.settings.discover {
            ClassCatalog::discover()
        } else {
            ClassCatalog::new()
        };
        for descriptor in self.classes {
            catalog.register(descriptor);
        }
        for method in self.methods {
            catalog.register_method(method);
        }

        info!(
            classes = catalog.len(),
            providers = self.providers.len(),
            "Building container"
        );

        let container = Container {
            registry: RwLock::new(Registry::new()),
            catalog: RwLock::new(catalog),
            settings: self.settings,
        };

        for provider in &self.providers {
            container.register_provider(provider.as_ref());
        }

        container
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Thread-safe dependency injection container.
///
/// Every method takes `&self`; the registry and catalog are guarded
/// internally and never locked while user code runs.
pub struct Container {
    registry: RwLock<Registry>,
    catalog: RwLock<ClassCatalog>,
    settings: ContainerSettings,
}

impl Container {
    /// Container with default settings and discovered classes.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    // ── Bindings ──

    /// Bind `id` to `concrete`, or to itself when `concrete` is `None`.
    ///
    /// Replaces any previous binding for `id`.
    pub fn bind_with(&self, id: &str, concrete: Option<Concrete>, singleton: bool) -> &Self {
        let concrete = concrete.unwrap_or_else(|| Concrete::Class(id.to_string()));
        let binding = concrete.into_binding(Lifetime::from_shared(singleton));
        self.registry.write().bind(id, binding);
        self
    }

    /// Bind `id` to a class, factory, method pair or literal value.
    ///
    /// ```rust,ignore
    /// container
    ///     .bind("logger", "ConsoleLogger")
    ///     .bind("report", ("ReportFactory", "create"))
    ///     .bind("pi", Instance::of(2.5_f64));
    /// ```
    pub fn bind(&self, id: &str, concrete: impl Into<Concrete>) -> &Self {
        self.bind_with(id, Some(concrete.into()), false)
    }

    /// Bind `id` to its own class.
    pub fn bind_self(&self, id: &str) -> &Self {
        self.bind_with(id, None, false)
    }

    /// Like [`bind`](Self::bind), but the first produced value is reused.
    pub fn singleton(&self, id: &str, concrete: impl Into<Concrete>) -> &Self {
        self.bind_with(id, Some(concrete.into()), true)
    }

    /// Bind `id` to its own class as a singleton.
    pub fn singleton_self(&self, id: &str) -> &Self {
        self.bind_with(id, None, true)
    }

    /// Store a pre-built instance under the alias-resolved `id`.
    ///
    /// When the aliases of `id` form a cycle the instance is stored under
    /// `id` itself and a warning is logged.
    pub fn instance(&self, id: &str, instance: Instance) -> Instance {
        let mut registry = self.registry.write();
        let canonical = match registry.resolve_alias(id) {
            Ok(canonical) => canonical,
            Err(err) => {
                warn!(id, error = %err, "Storing instance under the unresolved identifier");
                id.to_string()
            }
        };
        registry.bind(canonical, Concrete::Value(instance.clone()).into_binding(Lifetime::Singleton));
        instance
    }

    /// Make `alias` resolve to `target`.
    pub fn alias(&self, alias: &str, target: &str) -> &Self {
        self.registry.write().alias(alias, target);
        self
    }

    /// Remove every alias pointing at `target`.
    pub fn remove_alias(&self, target: &str) {
        self.registry.write().remove_alias(target);
    }

    /// Remove the binding for `id`. Aliases pointing at it are kept.
    pub fn remove_binding(&self, id: &str) {
        self.registry.write().remove_binding(id);
    }

    /// `true` iff a binding exists for the alias-resolved `id`.
    pub fn has(&self, id: &str) -> bool {
        self.registry.read().has(id)
    }

    // ── Resolution ──

    /// Make `id` without overrides.
    pub fn get(&self, id: &str) -> Result<Instance> {
        self.make(id)
    }

    /// Make `id` without overrides.
    pub fn make(&self, id: &str) -> Result<Instance> {
        self.make_with(id, Parameters::new())
    }

    /// Make `id`, preferring `parameters` over automatic resolution for
    /// its own constructor or factory.
    pub fn make_with(&self, id: &str, parameters: Parameters) -> Result<Instance> {
        debug!(id, overrides = parameters.len(), "make");
        Resolution::new(self).make_id(id, parameters)
    }

    /// Make `id` and downcast it.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.resolve("Database")?;
    /// ```
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self, id: &str) -> Result<Arc<T>> {
        self.resolve_with(id, Parameters::new())
    }

    /// Make `id` with overrides and downcast it.
    pub fn resolve_with<T: ?Sized + Send + Sync + 'static>(
        &self,
        id: &str,
        parameters: Parameters,
    ) -> Result<Arc<T>> {
        let instance = self.make_with(id, parameters)?;
        downcast(id, &instance)
    }

    /// Construct `class` from its descriptor, ignoring any binding for it.
    pub fn build(&self, class: &str) -> Result<Instance> {
        Resolution::new(self).build(class)
    }

    // ── Classes ──

    /// Register a class descriptor after construction.
    pub fn register_class(&self, descriptor: ClassDescriptor) -> &Self {
        self.catalog.write().register(descriptor);
        self
    }

    /// Register a method descriptor after construction.
    pub fn register_method(&self, method: MethodDescriptor) -> &Self {
        self.catalog.write().register_method(method);
        self
    }

    /// Run a [`Provider`] module against this container.
    pub fn register_provider(&self, provider: &dyn Provider) -> &Self {
        debug!(provider = provider.name(), "Registering provider");
        provider.register(self);
        self
    }

    /// `true` if a class descriptor is registered under `class`.
    pub fn knows_class(&self, class: &str) -> bool {
        self.catalog.read().contains(class)
    }

    // ── Diagnostics ──

    /// Read-only snapshot of bindings and aliases.
    pub fn bindings(&self) -> BindingsSnapshot {
        self.registry.read().snapshot()
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    pub(crate) fn registry(&self) -> &RwLock<Registry> {
        &self.registry
    }

    pub(crate) fn catalog(&self) -> &RwLock<ClassCatalog> {
        &self.catalog
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.registry.read().len())
            .field("classes", &self.catalog.read().len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::binding::{Concrete, Factory, Lifetime};
    pub use crate::error::{ErrorKind, KhaznaError, Result};
    pub use crate::instance::{Instance, Parameters};
    pub use crate::provider::Provider;
    pub use crate::reflect::{
        Arguments, ClassDescriptor, Injectable, MethodDescriptor, Parameter, SelfRegistering,
        Visibility, class_name,
    };
    pub use crate::resolver::{Resolver, resolve};
    pub use crate::settings::ContainerSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
