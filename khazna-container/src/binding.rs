//! Bindings — recipes for producing the instance behind an identifier.
//!
//! A [`Binding`] is what the registry stores; a [`Concrete`] is what callers
//! pass to `bind`. Lifetimes decide whether the first produced value is
//! kept:
//! - [`Lifetime::Transient`] — build on every `make`
//! - [`Lifetime::Singleton`] — build once, then hand out the cached value

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::instance::Instance;
use crate::reflect::{Arguments, Parameter};
use crate::resolver::Resolver;

/// How long a produced instance lives.
///
/// # Examples
/// ```
/// use khazna_container::binding::Lifetime;
///
/// assert!(Lifetime::Singleton.is_cached());
/// assert!(!Lifetime::Transient.is_cached());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// New instance on every `make`.
    #[default]
    Transient,
    /// One instance, cached in the registry after the first `make`.
    Singleton,
}

impl Lifetime {
    pub fn from_shared(shared: bool) -> Self {
        if shared {
            Lifetime::Singleton
        } else {
            Lifetime::Transient
        }
    }

    /// Returns `true` if this lifetime caches instances.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Transient => write!(f, "Transient"),
            Lifetime::Singleton => write!(f, "Singleton"),
        }
    }
}

/// Type alias for factory functions.
///
/// A factory receives a [`Resolver`] (to make unrelated identifiers on
/// demand) and its resolved declared parameters.
pub type FactoryFn = Arc<dyn Fn(&mut dyn Resolver, Arguments) -> Result<Instance> + Send + Sync>;

/// A producer function with declared parameters.
///
/// Declared parameters are resolved exactly like constructor parameters,
/// so factories get dependency injection too.
///
/// ```
/// use std::sync::Arc;
/// use khazna_container::binding::Factory;
/// use khazna_container::instance::Instance;
/// use khazna_container::reflect::Parameter;
///
/// struct Pool;
/// struct Cache { pool: Arc<Pool> }
///
/// let factory = Factory::with_params(
///     vec![Parameter::class::<Pool>("pool", 0)],
///     |_, args| Ok(Instance::of(Cache { pool: args.shared::<Pool>(0)? })),
/// );
/// assert_eq!(factory.parameters().len(), 1);
/// ```
#[derive(Clone)]
pub struct Factory {
    parameters: Arc<[Parameter]>,
    call: FactoryFn,
}

impl Factory {
    /// Factory without declared parameters.
    pub fn new<F>(call: F) -> Self
    where
        F: Fn(&mut dyn Resolver, Arguments) -> Result<Instance> + Send + Sync + 'static,
    {
        Self::with_params(Vec::new(), call)
    }

    /// Factory whose `parameters` are injected.
    pub fn with_params<F>(parameters: Vec<Parameter>, call: F) -> Self
    where
        F: Fn(&mut dyn Resolver, Arguments) -> Result<Instance> + Send + Sync + 'static,
    {
        Self {
            parameters: parameters.into(),
            call: Arc::new(call),
        }
    }

    /// Factory returning a fresh value from a plain closure.
    pub fn value<T, F>(produce: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(move |_, _| Ok(Instance::of(produce())))
    }

    /// Factory presenting the instance made for `class` as another type,
    /// usually a trait object.
    ///
    /// ```rust,ignore
    /// container.bind(
    ///     "dyn Logger",
    ///     Factory::upcast::<ConsoleLogger, dyn Logger>("ConsoleLogger", |logger| logger),
    /// );
    /// ```
    pub fn upcast<T, U>(class: impl Into<String>, cast: fn(Arc<T>) -> Arc<U>) -> Self
    where
        T: Send + Sync + 'static,
        U: ?Sized + Send + Sync + 'static,
    {
        let class = class.into();
        Self::new(move |resolver, _| {
            let concrete = crate::resolver::resolve::<T>(resolver, &class)?;
            Ok(Instance::shared(cast(concrete)))
        })
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, resolver: &mut dyn Resolver, args: Arguments) -> Result<Instance> {
        (self.call)(resolver, args)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A stored binding.
///
/// An identifier without a binding is built directly from its class.
#[derive(Clone, Debug)]
pub enum Binding {
    /// Make another identifier (or build this one when it names itself).
    Class { concrete: String, lifetime: Lifetime },
    /// Invoke a factory.
    Factory { factory: Factory, lifetime: Lifetime },
    /// Make `target`, then call `method` on it.
    Method {
        target: String,
        method: String,
        lifetime: Lifetime,
    },
    /// A pre-built value, returned as is.
    Instance(Instance),
}

impl Binding {
    pub fn lifetime(&self) -> Lifetime {
        match self {
            Binding::Class { lifetime, .. }
            | Binding::Factory { lifetime, .. }
            | Binding::Method { lifetime, .. } => *lifetime,
            Binding::Instance(_) => Lifetime::Singleton,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.lifetime().is_cached()
    }
}

/// What an identifier is bound to, as passed to `bind`.
///
/// ```
/// use khazna_container::binding::{Concrete, Factory};
/// use khazna_container::instance::Instance;
///
/// let class: Concrete = "ConsoleLogger".into();
/// let method: Concrete = ("ReportFactory", "create").into();
/// let value: Concrete = Instance::of(1.1_f64).into();
/// let factory: Concrete = Factory::value(|| 7_u32).into();
/// # let _ = (class, method, value, factory);
/// ```
#[derive(Clone, Debug)]
pub enum Concrete {
    /// A class or another identifier.
    Class(String),
    Factory(Factory),
    /// `(target identifier, method name)`
    Method(String, String),
    /// A literal value.
    Value(Instance),
}

impl Concrete {
    pub(crate) fn into_binding(self, lifetime: Lifetime) -> Binding {
        match self {
            Concrete::Class(concrete) => Binding::Class { concrete, lifetime },
            Concrete::Factory(factory) => Binding::Factory { factory, lifetime },
            Concrete::Method(target, method) => Binding::Method {
                target,
                method,
                lifetime,
            },
            Concrete::Value(instance) => Binding::Instance(instance),
        }
    }
}

impl From<&str> for Concrete {
    fn from(class: &str) -> Self {
        Concrete::Class(class.to_string())
    }
}

impl From<String> for Concrete {
    fn from(class: String) -> Self {
        Concrete::Class(class)
    }
}

impl From<Factory> for Concrete {
    fn from(factory: Factory) -> Self {
        Concrete::Factory(factory)
    }
}

impl From<Instance> for Concrete {
    fn from(instance: Instance) -> Self {
        Concrete::Value(instance)
    }
}

impl<T: Into<String>, M: Into<String>> From<(T, M)> for Concrete {
    fn from((target, method): (T, M)) -> Self {
        Concrete::Method(target.into(), method.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_display() {
        assert_eq!(format!("{}", Lifetime::Singleton), "Singleton");
        assert_eq!(format!("{}", Lifetime::Transient), "Transient");
        assert_eq!(Lifetime::from_shared(true), Lifetime::Singleton);
        assert_eq!(Lifetime::default(), Lifetime::Transient);
    }

    #[test]
    fn concrete_values_become_instance_bindings() {
        let binding = Concrete::from(Instance::of(3_u8)).into_binding(Lifetime::Transient);

        match binding {
            Binding::Instance(instance) => assert_eq!(instance.cloned::<u8>(), Some(3)),
            other => panic!("Expected Instance, got: {other:?}"),
        }
    }

    #[test]
    fn method_pairs_keep_lifetime() {
        let binding = Concrete::from(("Reports", "daily")).into_binding(Lifetime::Singleton);

        match &binding {
            Binding::Method { target, method, .. } => {
                assert_eq!(target, "Reports");
                assert_eq!(method, "daily");
            }
            other => panic!("Expected Method, got: {other:?}"),
        }
        assert!(binding.is_singleton());
    }

    #[test]
    fn class_binding_is_transient_by_default() {
        let binding = Concrete::from("Mailer").into_binding(Lifetime::default());
        assert!(!binding.is_singleton());
    }
}
