//! Resolution — turning an identifier into an instance.
//!
//! One [`Resolution`] exists per top-level `make` call. It carries the
//! build stack (identifiers currently under construction, outermost
//! first) and the stack of override frames, one per nested `make`. Both
//! are threaded through the recursion explicitly, so concurrent calls on
//! the same container never see each other's state.
//!
//! # Algorithm
//! ```text
//! make(id, overrides)
//!   ├─ follow aliases            → canonical id
//!   ├─ Instance binding?         → return it
//!   ├─ canonical on build stack? → CircularDependency
//!   ├─ dispatch on binding       → build / make / factory / method
//!   └─ singleton or self-registering → cache in registry
//! ```

use std::sync::Arc;

use khazna_support::rendering::{shorten_type_name, suggest_similar};
use once_cell::sync::Lazy;
use tracing::{debug, trace, warn};

use crate::binding::Binding;
use crate::container::Container;
use crate::error::{
    CircularDependencyError, KhaznaError, NotFoundError, NotInstantiableError, Result,
    UnresolvableDependencyError,
};
use crate::instance::{Instance, Parameters};
use crate::reflect::{Arguments, ClassKind, Parameter};

/// Handle factories use to resolve identifiers on demand.
///
/// Calls made through the handle share the build stack of the call that
/// invoked the factory (so cycles are still caught) but start with no
/// overrides. The overrides of the invoking call stay readable through
/// [`parameters`](Resolver::parameters).
pub trait Resolver {
    /// Makes `id` with the given overrides.
    fn make_with(&mut self, id: &str, parameters: Parameters) -> Result<Instance>;

    /// Makes `id` without overrides.
    fn make(&mut self, id: &str) -> Result<Instance> {
        self.make_with(id, Parameters::new())
    }

    /// Identifiers currently under construction, outermost first.
    fn build_stack(&self) -> &[String];

    /// Overrides supplied to the call being resolved, including those no
    /// declared parameter consumed.
    fn parameters(&self) -> &Parameters;
}

/// Resolve a typed dependency from a [`Resolver`].
///
/// Use this inside factory closures:
///
/// ```rust,ignore
/// Factory::new(|r, _| {
///     let db: Arc<Database> = khazna_container::resolver::resolve(r, "Database")?;
///     Ok(Instance::of(UserRepo { db }))
/// })
/// ```
pub fn resolve<T: ?Sized + Send + Sync + 'static>(
    resolver: &mut dyn Resolver,
    id: &str,
) -> Result<Arc<T>> {
    let instance = resolver.make(id)?;
    downcast(id, &instance)
}

pub(crate) fn downcast<T: ?Sized + Send + Sync + 'static>(
    id: &str,
    instance: &Instance,
) -> Result<Arc<T>> {
    instance.get::<T>().ok_or_else(|| {
        warn!(id, expected = std::any::type_name::<T>(), actual = instance.type_name(), "Type mismatch");
        KhaznaError::TypeMismatch {
            target: id.to_string(),
            expected: std::any::type_name::<T>(),
            actual: instance.type_name(),
        }
    })
}

static NO_OVERRIDES: Lazy<Parameters> = Lazy::new(Parameters::new);

/// State of one top-level resolution.
pub(crate) struct Resolution<'c> {
    container: &'c Container,
    build_stack: Vec<String>,
    overrides: Vec<Parameters>,
}

impl<'c> Resolution<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            build_stack: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Resolves `id` through aliases and bindings.
    pub(crate) fn make_id(&mut self, id: &str, parameters: Parameters) -> Result<Instance> {
        let (canonical, found) = {
            let registry = self.container.registry().read();
            let canonical = registry.resolve_alias(id)?;
            let found = registry.get_revision(&canonical);
            (canonical, found)
        };

        if let Some((Binding::Instance(instance), _)) = &found {
            trace!(id, canonical = %canonical, "Returning stored instance");
            return Ok(instance.clone());
        }

        self.guard(&canonical)?;
        trace!(id, canonical = %canonical, overrides = parameters.len(), "Resolving");

        self.overrides.push(parameters);
        let result = self.dispatch(&canonical, found.as_ref().map(|(binding, _)| binding));
        let parameters = self.overrides.pop().unwrap_or_default();
        let instance = result?;

        let singleton = found.as_ref().is_some_and(|(binding, _)| binding.is_singleton());
        if singleton || (parameters.is_empty() && instance.is_self_registering()) {
            let observed = found.as_ref().map(|(_, revision)| *revision);
            if self
                .container
                .registry()
                .write()
                .cache(&canonical, instance.clone(), observed)
            {
                debug!(id = %canonical, "Stored shared instance");
            }
        }

        Ok(instance)
    }

    fn dispatch(&mut self, canonical: &str, binding: Option<&Binding>) -> Result<Instance> {
        match binding {
            None => self.build(canonical),
            Some(Binding::Instance(instance)) => Ok(instance.clone()),
            Some(Binding::Class { concrete, .. }) if concrete == canonical => self.build(canonical),
            Some(Binding::Class { concrete, .. }) => {
                let parameters = self.overrides.last().cloned().unwrap_or_default();
                self.within(canonical, |this| this.make_id(concrete, parameters))
            }
            Some(Binding::Method { target, .. }) if target == canonical => self.build(canonical),
            Some(Binding::Method { target, method, .. }) => {
                if target.is_empty() || method.is_empty() {
                    return Err(KhaznaError::InvalidBinding {
                        id: canonical.to_string(),
                        reason: "method binding needs both a target and a method name".into(),
                    });
                }
                self.within(canonical, |this| this.call_method(target, method))
            }
            Some(Binding::Factory { factory, .. }) => self.within(canonical, |this| {
                let args = this.resolve_parameters(canonical, factory.parameters())?;
                factory.invoke(this, args)
            }),
        }
    }

    /// Builds `class` from its descriptor, ignoring bindings for it.
    pub(crate) fn build(&mut self, class: &str) -> Result<Instance> {
        let found = self.container.catalog().read().class(class);
        let Some(descriptor) = found else {
            return Err(self.not_found(class));
        };

        let constructor = match (descriptor.kind(), descriptor.constructor_ref()) {
            (ClassKind::Concrete, Some(constructor)) => constructor.clone(),
            _ => {
                debug!(class, stack = ?self.build_stack, "Target is not instantiable");
                return Err(KhaznaError::NotInstantiable(NotInstantiableError {
                    target: class.to_string(),
                    build_stack: self.build_stack.clone(),
                }));
            }
        };

        self.guard(class)?;
        let instance = self.within(class, |this| {
            let args = this.resolve_parameters(class, constructor.parameters())?;
            constructor.invoke(args)
        })?;

        let self_registering = instance.is_self_registering() || descriptor.is_self_registering();
        Ok(instance.with_self_registering(self_registering))
    }

    fn call_method(&mut self, target: &str, method: &str) -> Result<Instance> {
        let receiver = self.make_id(target, Parameters::new())?;

        let descriptor = self
            .container
            .catalog()
            .read()
            .method(receiver.type_id(), method)
            .ok_or_else(|| KhaznaError::MethodNotFound {
                class: shorten_type_name(receiver.type_name()),
                method: method.to_string(),
            })?;

        trace!(class = descriptor.class(), method, visibility = ?descriptor.visibility(), "Invoking method");
        let args = self.resolve_parameters(descriptor.class(), descriptor.parameters())?;
        descriptor.invoke(&receiver, args)
    }

    /// Produces the argument list for `parameters` of `owner`.
    fn resolve_parameters(&mut self, owner: &str, parameters: &[Parameter]) -> Result<Arguments> {
        let mut args = Arguments::new(owner);
        for parameter in parameters {
            let value = self.resolve_parameter(owner, parameter)?;
            args.push(parameter.name(), value);
        }
        Ok(args)
    }

    fn resolve_parameter(&mut self, owner: &str, parameter: &Parameter) -> Result<Option<Instance>> {
        let supplied = self
            .overrides
            .last()
            .and_then(|frame| frame.lookup(parameter.name(), parameter.position()))
            .cloned();
        if let Some(value) = supplied {
            return Ok(Some(value));
        }

        if let Some(hint) = parameter.hint() {
            return match self.make_id(hint, Parameters::new()) {
                Ok(instance) => Ok(Some(instance)),
                Err(err) if parameter.has_default() && err.allows_default_fallback() => {
                    debug!(owner, parameter = parameter.name(), error = %err, "Falling back to default");
                    Ok(parameter.default_value())
                }
                Err(err) => Err(err),
            };
        }

        if parameter.has_default() {
            return Ok(parameter.default_value());
        }
        if parameter.is_optional() {
            return Ok(None);
        }

        Err(KhaznaError::UnresolvableDependency(UnresolvableDependencyError {
            parameter: parameter.name().to_string(),
            position: parameter.position(),
            declaring: owner.to_string(),
        }))
    }

    /// Fails fast on cycles and runaway depth.
    fn guard(&self, id: &str) -> Result<()> {
        if let Some(start) = self.build_stack.iter().position(|entry| entry == id) {
            let mut chain = self.build_stack[start..].to_vec();
            chain.push(id.to_string());
            warn!(cycle = ?chain, "Circular dependency detected");
            return Err(KhaznaError::CircularDependency(CircularDependencyError { chain }));
        }

        let limit = self.container.settings().max_depth;
        if self.build_stack.len() >= limit {
            return Err(KhaznaError::DepthExceeded {
                limit,
                chain: self.build_stack.clone(),
            });
        }

        Ok(())
    }

    /// Runs `f` with `id` pushed on the build stack; pops on every exit.
    fn within<T>(&mut self, id: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.build_stack.push(id.to_string());
        let result = f(self);
        self.build_stack.pop();
        result
    }

    fn not_found(&self, id: &str) -> KhaznaError {
        let mut known = self.container.catalog().read().class_names();
        known.extend(self.container.registry().read().identifiers());
        let known: Vec<&str> = known.iter().map(String::as_str).collect();

        KhaznaError::NotFound(NotFoundError {
            requested: id.to_string(),
            required_by: self.build_stack.last().cloned(),
            suggestions: suggest_similar(id, &known, 3),
        })
    }
}

impl Resolver for Resolution<'_> {
    fn make_with(&mut self, id: &str, parameters: Parameters) -> Result<Instance> {
        self.make_id(id, parameters)
    }

    fn build_stack(&self) -> &[String] {
        &self.build_stack
    }

    fn parameters(&self) -> &Parameters {
        self.overrides.last().unwrap_or(&NO_OVERRIDES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Factory;
    use crate::reflect::ClassDescriptor;

    struct Clock;

    struct Scheduler {
        clock: Arc<Clock>,
    }

    fn container() -> Container {
        Container::builder()
            .discover(false)
            .descriptor(ClassDescriptor::of::<Clock>().constructor(vec![], |_| Ok(Instance::of(Clock))))
            .descriptor(ClassDescriptor::of::<Scheduler>().constructor(
                vec![Parameter::class::<Clock>("clock", 0)],
                |args| Ok(Instance::of(Scheduler { clock: args.shared::<Clock>(0)? })),
            ))
            .build()
    }

    #[test]
    fn build_stack_is_empty_after_success_and_failure() {
        let container = container();
        let mut resolution = Resolution::new(&container);

        assert!(resolution.make_id("Scheduler", Parameters::new()).is_ok());
        assert!(resolution.build_stack().is_empty());
        assert!(resolution.overrides.is_empty());

        assert!(resolution.make_id("Missing", Parameters::new()).is_err());
        assert!(resolution.build_stack().is_empty());
        assert!(resolution.overrides.is_empty());
    }

    #[test]
    fn factories_see_the_build_stack() {
        let container = container();
        container.bind(
            "stack",
            Factory::new(|r, _| Ok(Instance::of(r.build_stack().to_vec()))),
        );

        let stack = container.resolve::<Vec<String>>("stack").unwrap();
        assert_eq!(*stack, vec!["stack".to_string()]);
    }

    #[test]
    fn factories_read_undeclared_overrides() {
        let container = container();
        container.bind(
            "greet",
            Factory::new(|r, args| {
                assert!(args.is_empty());
                let name = r
                    .parameters()
                    .get("name")
                    .and_then(|value| value.cloned::<String>())
                    .unwrap_or_else(|| String::from("stranger"));
                Ok(Instance::of(format!("hello {name}")))
            }),
        );

        let greeting = container
            .resolve_with::<String>("greet", Parameters::new().with("name", String::from("ali")))
            .unwrap();
        assert_eq!(*greeting, "hello ali");
        assert_eq!(*container.resolve::<String>("greet").unwrap(), "hello stranger");
    }

    #[test]
    fn nested_make_does_not_leak_overrides() {
        let container = container();
        container
            .bind("inner", Factory::new(|r, _| Ok(Instance::of(r.parameters().len()))))
            .bind("outer", Factory::new(|r, _| resolve::<usize>(r, "inner").map(Instance::shared)));

        let seen = container
            .resolve_with::<usize>("outer", Parameters::new().with("name", 1_u8))
            .unwrap();
        assert_eq!(*seen, 0);
        assert!(Resolution::new(&container).parameters().is_empty());
    }

    #[test]
    fn typed_resolve_through_handle() {
        let container = container();
        container.bind(
            "scheduled",
            Factory::new(|r, _| {
                let scheduler: Arc<Scheduler> = resolve(r, "Scheduler")?;
                let _clock: &Clock = &scheduler.clock;
                Ok(Instance::of(true))
            }),
        );

        assert_eq!(container.resolve::<bool>("scheduled").map(|b| *b).ok(), Some(true));
    }

    #[test]
    fn typed_resolve_reports_mismatch() {
        let container = container();
        container.bind("number", Instance::of(1_u8));

        let mut resolution = Resolution::new(&container);
        match resolve::<String>(&mut resolution, "number") {
            Err(KhaznaError::TypeMismatch { target, .. }) => assert_eq!(target, "number"),
            other => panic!("Expected TypeMismatch, got: {other:?}"),
        }
    }
}
