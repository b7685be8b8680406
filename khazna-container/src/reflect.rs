//! Class metadata — what the container knows about constructible types.
//!
//! Rust has no runtime reflection, so every type the container can build
//! describes itself with a [`ClassDescriptor`]: its constructor
//! [`Parameter`]s in declaration order and a function turning resolved
//! [`Arguments`] into an [`Instance`]. Methods callable through method
//! bindings are described by [`MethodDescriptor`].
//!
//! Descriptors are usually generated by `#[derive(Injectable)]`,
//! `#[interface]` and `#[factory_methods]`, which submit a [`ClassEntry`]
//! or [`MethodEntry`] to be discovered when a container is created. They
//! can also be written by hand:
//!
//! ```
//! use std::sync::Arc;
//! use khazna_container::instance::Instance;
//! use khazna_container::reflect::{ClassDescriptor, Parameter};
//!
//! struct Database;
//! struct Repo { db: Arc<Database>, table: String }
//!
//! let descriptor = ClassDescriptor::of::<Repo>().constructor(
//!     vec![
//!         Parameter::class::<Database>("db", 0),
//!         Parameter::new("table", 1).with_default(|| Instance::of(String::from("users"))),
//!     ],
//!     |args| {
//!         Ok(Instance::of(Repo {
//!             db: args.shared::<Database>(0)?,
//!             table: args.cloned::<String>(1)?,
//!         }))
//!     },
//! );
//!
//! assert_eq!(descriptor.name(), "Repo");
//! assert_eq!(descriptor.parameters().len(), 2);
//! ```

use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use khazna_support::rendering::shorten_type_name;

use crate::error::{KhaznaError, Result};
use crate::instance::Instance;

/// Identifier under which type `T` is known to the container.
///
/// This is the type name without module paths: `UserService`,
/// `dyn Logger`, `Arc<Config>`.
pub fn class_name<T: ?Sized>() -> String {
    shorten_type_name(type_name::<T>())
}

/// Implemented by types that can describe how to construct themselves.
///
/// Usually derived with `#[derive(Injectable)]`.
pub trait Injectable: Send + Sync + 'static {
    fn descriptor() -> ClassDescriptor;
}

/// Marker for types whose instances are cached under their own identifier
/// the first time they are built without overrides.
pub trait SelfRegistering: Send + Sync + 'static {}

// ═══════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════

/// Default value of a parameter.
#[derive(Clone)]
pub enum DefaultValue {
    /// An explicit "no value" (the parameter is nullable).
    Null,
    /// Produced on demand.
    Value(Arc<dyn Fn() -> Instance + Send + Sync>),
}

impl DefaultValue {
    fn produce(&self) -> Option<Instance> {
        match self {
            DefaultValue::Null => None,
            DefaultValue::Value(make) => Some(make()),
        }
    }
}

/// One declared parameter of a constructor, factory or method.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    position: usize,
    hint: Option<String>,
    default: Option<DefaultValue>,
    optional: bool,
}

impl Parameter {
    /// A parameter without a type hint.
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
            hint: None,
            default: None,
            optional: false,
        }
    }

    /// A parameter hinted with the class of `T`.
    pub fn class<T: ?Sized>(name: impl Into<String>, position: usize) -> Self {
        Self::new(name, position).hinted(class_name::<T>())
    }

    /// Sets the identifier to resolve this parameter from.
    pub fn hinted(mut self, identifier: impl Into<String>) -> Self {
        self.hint = Some(identifier.into());
        self
    }

    /// Sets a default value. Parameters with defaults are optional.
    pub fn with_default<F>(mut self, default: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Value(Arc::new(default)));
        self.optional = true;
        self
    }

    /// Defaults to "no value".
    pub fn nullable(mut self) -> Self {
        self.default = Some(DefaultValue::Null);
        self.optional = true;
        self
    }

    /// Marks the parameter optional without giving it a default.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Produces the default, `None` for a null default.
    ///
    /// Only meaningful when [`has_default`](Self::has_default) is `true`.
    pub fn default_value(&self) -> Option<Instance> {
        self.default.as_ref().and_then(DefaultValue::produce)
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("hint", &self.hint)
            .field("has_default", &self.default.is_some())
            .field("optional", &self.optional)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Arguments
// ═══════════════════════════════════════════

/// Resolved argument list, one slot per declared parameter.
///
/// `None` slots hold the "no value" placeholder of optional parameters.
pub struct Arguments {
    owner: String,
    names: Vec<String>,
    values: Vec<Option<Instance>>,
}

impl Arguments {
    pub(crate) fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, name: &str, value: Option<Instance>) {
        self.names.push(name.to_string());
        self.values.push(value);
    }

    /// Raw slot at `position`.
    pub fn instance(&self, position: usize) -> Option<&Instance> {
        self.values.get(position).and_then(Option::as_ref)
    }

    /// Shared value at `position`; fails on a missing value or wrong type.
    pub fn shared<T: ?Sized + Send + Sync + 'static>(&self, position: usize) -> Result<Arc<T>> {
        self.optional_shared(position)?
            .ok_or_else(|| self.mismatch::<T>(position, "no value"))
    }

    /// Owned copy of the value at `position`.
    pub fn cloned<T: Clone + Send + Sync + 'static>(&self, position: usize) -> Result<T> {
        self.shared::<T>(position).map(|value| T::clone(&value))
    }

    /// Like [`shared`](Self::shared), but a "no value" slot yields `None`.
    pub fn optional_shared<T: ?Sized + Send + Sync + 'static>(
        &self,
        position: usize,
    ) -> Result<Option<Arc<T>>> {
        match self.values.get(position) {
            None | Some(None) => Ok(None),
            Some(Some(instance)) => instance
                .get::<T>()
                .map(Some)
                .ok_or_else(|| self.mismatch::<T>(position, instance.type_name())),
        }
    }

    /// Like [`cloned`](Self::cloned), but a "no value" slot yields `None`.
    pub fn optional_cloned<T: Clone + Send + Sync + 'static>(
        &self,
        position: usize,
    ) -> Result<Option<T>> {
        Ok(self
            .optional_shared::<T>(position)?
            .map(|value| T::clone(&value)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn mismatch<T: ?Sized>(&self, position: usize, actual: &'static str) -> KhaznaError {
        let parameter = self
            .names
            .get(position)
            .map(String::as_str)
            .unwrap_or("?");

        tracing::warn!(
            owner = %self.owner,
            parameter,
            expected = type_name::<T>(),
            actual,
            "Argument type mismatch"
        );

        KhaznaError::TypeMismatch {
            target: format!("{}::${}", self.owner, parameter),
            expected: type_name::<T>(),
            actual,
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("owner", &self.owner)
            .field("names", &self.names)
            .field("values", &self.values)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Classes
// ═══════════════════════════════════════════

pub type ConstructorFn = Arc<dyn Fn(Arguments) -> Result<Instance> + Send + Sync>;

pub type MethodFn = Arc<dyn Fn(&Instance, Arguments) -> Result<Instance> + Send + Sync>;

/// Whether a class can be built directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Concrete,
    Abstract,
    Interface,
}

/// A constructor: parameters plus the function that consumes them.
#[derive(Clone)]
pub struct Constructor {
    parameters: Vec<Parameter>,
    build: ConstructorFn,
}

impl Constructor {
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, args: Arguments) -> Result<Instance> {
        (self.build)(args)
    }
}

/// Everything the container knows about one class.
#[derive(Clone)]
pub struct ClassDescriptor {
    name: String,
    type_id: Option<TypeId>,
    kind: ClassKind,
    self_registering: bool,
    constructor: Option<Constructor>,
}

impl ClassDescriptor {
    /// Concrete class named after `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::named(class_name::<T>(), ClassKind::Concrete).typed(TypeId::of::<T>())
    }

    /// Concrete class named after `T` whose built instances are cached
    /// under the class identifier.
    pub fn of_self_registering<T: SelfRegistering>() -> Self {
        Self::of::<T>().self_registering(true)
    }

    /// Interface named after `T` (normally a `dyn Trait`).
    pub fn interface<T: ?Sized + 'static>() -> Self {
        Self::named(class_name::<T>(), ClassKind::Interface).typed(TypeId::of::<T>())
    }

    /// Abstract class named after `T`.
    pub fn abstract_of<T: ?Sized + 'static>() -> Self {
        Self::named(class_name::<T>(), ClassKind::Abstract).typed(TypeId::of::<T>())
    }

    /// Descriptor with an explicit name and no backing Rust type.
    pub fn named(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            type_id: None,
            kind,
            self_registering: false,
            constructor: None,
        }
    }

    fn typed(mut self, type_id: TypeId) -> Self {
        self.type_id = Some(type_id);
        self
    }

    /// Sets the constructor.
    pub fn constructor<F>(mut self, parameters: Vec<Parameter>, build: F) -> Self
    where
        F: Fn(Arguments) -> Result<Instance> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor {
            parameters,
            build: Arc::new(build),
        });
        self
    }

    /// Marks built instances as self-registering.
    pub fn self_registering(mut self, enabled: bool) -> Self {
        self.self_registering = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Concrete classes with a constructor can be built.
    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Concrete && self.constructor.is_some()
    }

    pub fn is_self_registering(&self) -> bool {
        self.self_registering
    }

    pub fn constructor_ref(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// Constructor parameters, empty when there is no constructor.
    pub fn parameters(&self) -> &[Parameter] {
        self.constructor
            .as_ref()
            .map(Constructor::parameters)
            .unwrap_or(&[])
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("self_registering", &self.self_registering)
            .field("parameters", &self.parameters())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Methods
// ═══════════════════════════════════════════

/// Visibility of a described method. Both can be invoked by method bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
}

/// A method callable through a method binding.
#[derive(Clone)]
pub struct MethodDescriptor {
    owner: TypeId,
    class: String,
    name: String,
    visibility: Visibility,
    parameters: Vec<Parameter>,
    invoke: MethodFn,
}

impl MethodDescriptor {
    /// Describes method `name` on `T`.
    pub fn new<T: ?Sized + 'static, F>(
        name: impl Into<String>,
        visibility: Visibility,
        parameters: Vec<Parameter>,
        invoke: F,
    ) -> Self
    where
        F: Fn(&Instance, Arguments) -> Result<Instance> + Send + Sync + 'static,
    {
        Self {
            owner: TypeId::of::<T>(),
            class: class_name::<T>(),
            name: name.into(),
            visibility,
            parameters,
            invoke: Arc::new(invoke),
        }
    }

    pub fn owner(&self) -> TypeId {
        self.owner
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, receiver: &Instance, args: Arguments) -> Result<Instance> {
        (self.invoke)(receiver, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("class", &self.class)
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Looks up the receiver of a method call.
///
/// Used by generated method wrappers.
pub fn receiver<T: Send + Sync + 'static>(instance: &Instance) -> Result<Arc<T>> {
    instance.get::<T>().ok_or_else(|| KhaznaError::TypeMismatch {
        target: class_name::<T>(),
        expected: type_name::<T>(),
        actual: instance.type_name(),
    })
}

// ═══════════════════════════════════════════
// Compile-time registration
// ═══════════════════════════════════════════

/// A class submitted for discovery.
pub struct ClassEntry {
    describe: fn() -> ClassDescriptor,
}

impl ClassEntry {
    pub const fn new(describe: fn() -> ClassDescriptor) -> Self {
        Self { describe }
    }

    pub fn describe(&self) -> ClassDescriptor {
        (self.describe)()
    }
}

/// A method submitted for discovery.
pub struct MethodEntry {
    describe: fn() -> MethodDescriptor,
}

impl MethodEntry {
    pub const fn new(describe: fn() -> MethodDescriptor) -> Self {
        Self { describe }
    }

    pub fn describe(&self) -> MethodDescriptor {
        (self.describe)()
    }
}

inventory::collect!(ClassEntry);
inventory::collect!(MethodEntry);

#[cfg(test)]
mod tests {
    use super::*;

    struct Engine;

    trait Wheel: Send + Sync {}

    struct Car {
        engine: Arc<Engine>,
        doors: u8,
    }

    fn args(values: Vec<(&str, Option<Instance>)>) -> Arguments {
        let mut args = Arguments::new("Car");
        for (name, value) in values {
            args.push(name, value);
        }
        args
    }

    #[test]
    fn class_names_are_short() {
        assert_eq!(class_name::<Engine>(), "Engine");
        assert_eq!(class_name::<dyn Wheel>(), "dyn Wheel");
        assert_eq!(class_name::<String>(), "String");
    }

    #[test]
    fn class_parameter_is_hinted() {
        let param = Parameter::class::<Engine>("engine", 0);
        assert_eq!(param.hint(), Some("Engine"));
        assert!(!param.is_optional());
        assert!(!param.has_default());
    }

    #[test]
    fn defaults_make_parameters_optional() {
        let param = Parameter::new("doors", 1).with_default(|| Instance::of(4_u8));
        assert!(param.is_optional());
        assert_eq!(param.default_value().and_then(|i| i.cloned::<u8>()), Some(4));

        let nullable = Parameter::new("spare", 2).nullable();
        assert!(nullable.has_default());
        assert!(nullable.default_value().is_none());
    }

    #[test]
    fn descriptor_builds_instance() {
        let descriptor = ClassDescriptor::of::<Car>().constructor(
            vec![
                Parameter::class::<Engine>("engine", 0),
                Parameter::new("doors", 1),
            ],
            |args| {
                Ok(Instance::of(Car {
                    engine: args.shared::<Engine>(0)?,
                    doors: args.cloned::<u8>(1)?,
                }))
            },
        );

        assert!(descriptor.is_instantiable());
        assert_eq!(descriptor.type_id(), Some(TypeId::of::<Car>()));

        let ctor = descriptor.constructor_ref().unwrap();
        let car = ctor
            .invoke(args(vec![
                ("engine", Some(Instance::of(Engine))),
                ("doors", Some(Instance::of(2_u8))),
            ]))
            .unwrap();

        let car = car.get::<Car>().unwrap();
        assert_eq!(car.doors, 2);
        let _engine: &Engine = &car.engine;
    }

    struct Garage;

    impl SelfRegistering for Garage {}

    #[test]
    fn marker_trait_sets_self_registering() {
        assert!(ClassDescriptor::of_self_registering::<Garage>().is_self_registering());
        assert!(!ClassDescriptor::of::<Garage>().is_self_registering());
    }

    #[test]
    fn interfaces_are_not_instantiable() {
        let descriptor = ClassDescriptor::interface::<dyn Wheel>();
        assert_eq!(descriptor.name(), "dyn Wheel");
        assert!(!descriptor.is_instantiable());
        assert!(descriptor.parameters().is_empty());
    }

    #[test]
    fn wrong_argument_type_is_reported() {
        let args = args(vec![("doors", Some(Instance::of("four".to_string())))]);

        match args.cloned::<u8>(0) {
            Err(KhaznaError::TypeMismatch { target, .. }) => assert_eq!(target, "Car::$doors"),
            other => panic!("Expected TypeMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn null_slot_is_none_for_optional_accessors() {
        let args = args(vec![("spare", None)]);

        assert!(args.optional_shared::<Engine>(0).unwrap().is_none());
        assert!(args.optional_cloned::<u8>(0).unwrap().is_none());
        assert!(args.shared::<Engine>(0).is_err());
    }

    #[test]
    fn receiver_checks_type() {
        let engine = Instance::of(Engine);
        assert!(receiver::<Engine>(&engine).is_ok());
        assert!(receiver::<Car>(&engine).is_err());
    }
}
