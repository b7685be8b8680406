//! Class catalog — the container's stand-in for runtime reflection.
//!
//! Holds the [`ClassDescriptor`]s of every class the container can build
//! and the [`MethodDescriptor`]s method bindings can call. Classes
//! generated by the proc-macros are collected from `inventory` once per
//! process; hand-written descriptors are added with
//! [`ClassCatalog::register`].

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::reflect::{ClassDescriptor, ClassEntry, MethodDescriptor, MethodEntry};

static DISCOVERED: Lazy<ClassCatalog> = Lazy::new(|| {
    let mut catalog = ClassCatalog::new();

    for entry in inventory::iter::<ClassEntry> {
        catalog.register(entry.describe());
    }
    for entry in inventory::iter::<MethodEntry> {
        catalog.register_method(entry.describe());
    }

    debug!(
        classes = catalog.classes.len(),
        methods = catalog.method_count(),
        "Discovered registered classes"
    );
    catalog
});

/// Descriptors known to one container.
#[derive(Debug, Clone, Default)]
pub struct ClassCatalog {
    classes: HashMap<String, Arc<ClassDescriptor>>,
    methods: HashMap<TypeId, HashMap<String, Arc<MethodDescriptor>>>,
}

impl ClassCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding every class and method submitted by
    /// `#[derive(Injectable)]`, `#[interface]` and `#[factory_methods]`.
    pub fn discover() -> Self {
        DISCOVERED.clone()
    }

    /// Adds or replaces a class.
    pub fn register(&mut self, descriptor: ClassDescriptor) {
        if self.classes.contains_key(descriptor.name()) {
            warn!(class = descriptor.name(), "Replacing class descriptor with the same name");
        }
        debug!(class = descriptor.name(), kind = ?descriptor.kind(), "Registered class");
        self.classes
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
    }

    /// Adds or replaces a method.
    pub fn register_method(&mut self, method: MethodDescriptor) {
        debug!(class = method.class(), method = method.name(), "Registered method");
        self.methods
            .entry(method.owner())
            .or_default()
            .insert(method.name().to_string(), Arc::new(method));
    }

    /// Class registered under `name`.
    pub fn class(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(name).cloned()
    }

    /// Method `name` of the type identified by `owner`.
    pub fn method(&self, owner: TypeId, name: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods
            .get(&owner)
            .and_then(|methods| methods.get(name))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Names of all registered classes.
    pub fn class_names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn method_count(&self) -> usize {
        self.methods.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use crate::reflect::Visibility;

    struct Mailer;

    fn mailer() -> ClassDescriptor {
        ClassDescriptor::of::<Mailer>().constructor(vec![], |_| Ok(Instance::of(Mailer)))
    }

    #[test]
    fn register_and_lookup_class() {
        let mut catalog = ClassCatalog::new();
        catalog.register(mailer());

        assert!(catalog.contains("Mailer"));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.class("Mailer").unwrap().is_instantiable());
        assert!(catalog.class("Nope").is_none());
    }

    #[test]
    fn methods_are_keyed_by_owner_type() {
        let mut catalog = ClassCatalog::new();
        catalog.register_method(MethodDescriptor::new::<Mailer, _>(
            "send",
            Visibility::Private,
            vec![],
            |_, _| Ok(Instance::of(true)),
        ));

        let method = catalog.method(TypeId::of::<Mailer>(), "send").unwrap();
        assert_eq!(method.class(), "Mailer");
        assert_eq!(method.visibility(), Visibility::Private);
        assert!(catalog.method(TypeId::of::<String>(), "send").is_none());
    }

    #[test]
    fn discover_without_submissions_is_usable() {
        // This crate submits nothing, so discovery only has to not fail.
        let catalog = ClassCatalog::discover();
        assert!(!catalog.contains("Mailer"));
    }
}
