//! Type-erased values handed out by the container.
//!
//! An [`Instance`] always stores an `Arc<T>` behind `dyn Any`, so the same
//! representation serves concrete structs, scalars and trait objects:
//!
//! ```
//! use std::sync::Arc;
//! use khazna_container::instance::Instance;
//!
//! trait Greeter: Send + Sync { fn hi(&self) -> &'static str; }
//! struct English;
//! impl Greeter for English { fn hi(&self) -> &'static str { "hi" } }
//!
//! let number = Instance::of(1.1_f64);
//! assert_eq!(number.cloned::<f64>(), Some(1.1));
//!
//! let greeter = Instance::shared(Arc::new(English) as Arc<dyn Greeter>);
//! assert_eq!(greeter.get::<dyn Greeter>().unwrap().hi(), "hi");
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::reflect::SelfRegistering;

/// A shared, type-erased value.
///
/// Cloning is cheap and keeps identity: clones compare equal under
/// [`Instance::ptr_eq`].
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
    self_registering: bool,
}

impl Instance {
    /// Wraps an owned value.
    pub fn of<T: Send + Sync + 'static>(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// Wraps an already shared value. `T` may be a trait object.
    pub fn shared<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            self_registering: false,
        }
    }

    /// Wraps a value that asks to be cached under its own identifier.
    pub fn of_self_registering<T: SelfRegistering>(value: T) -> Self {
        Self::of(value).with_self_registering(true)
    }

    pub(crate) fn with_self_registering(mut self, enabled: bool) -> Self {
        self.self_registering = enabled;
        self
    }

    /// Returns the stored value if it was stored as `T`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Returns a clone of the stored value if it was stored as `T`.
    pub fn cloned<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.get::<T>().map(|value| T::clone(&value))
    }

    /// `true` if the value was stored as `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// [`TypeId`] of the stored `T`.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full type name of the stored `T`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `true` if the value requested caching under its own identifier.
    pub fn is_self_registering(&self) -> bool {
        self.self_registering
    }

    /// `true` if both handles point at the same value.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name)
            .field("self_registering", &self.self_registering)
            .finish()
    }
}

/// Caller-supplied overrides for one `make` call.
///
/// Overrides are matched against parameters by name first, then by
/// position.
///
/// ```
/// use khazna_container::instance::Parameters;
///
/// let params = Parameters::new().with("port", 8080_u16).at(0, "localhost".to_string());
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Parameters {
    named: HashMap<String, Instance>,
    positional: HashMap<usize, Instance>,
}

impl Parameters {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the parameter called `name`.
    pub fn with<T: Send + Sync + 'static>(self, name: impl Into<String>, value: T) -> Self {
        self.with_instance(name, Instance::of(value))
    }

    /// Overrides the parameter called `name` with an existing instance.
    pub fn with_instance(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    /// Overrides the parameter at `position`.
    pub fn at<T: Send + Sync + 'static>(self, position: usize, value: T) -> Self {
        self.at_instance(position, Instance::of(value))
    }

    /// Overrides the parameter at `position` with an existing instance.
    pub fn at_instance(mut self, position: usize, value: Instance) -> Self {
        self.positional.insert(position, value);
        self
    }

    /// Override supplied under `name`.
    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.named.get(name)
    }

    /// Override supplied at `position`.
    pub fn get_at(&self, position: usize) -> Option<&Instance> {
        self.positional.get(&position)
    }

    /// Override for a parameter, by name first and then by position.
    pub fn lookup(&self, name: &str, position: usize) -> Option<&Instance> {
        self.get(name).or_else(|| self.get_at(position))
    }

    pub fn len(&self) -> usize {
        self.named.len() + self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut positions: Vec<_> = self.positional.keys().collect();
        positions.sort();
        let mut names: Vec<_> = self.named.keys().collect();
        names.sort();

        f.debug_struct("Parameters")
            .field("named", &names)
            .field("positional", &positions)
            .finish()
    }
}
