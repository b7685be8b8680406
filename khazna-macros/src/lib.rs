//! Procedural macros for Khazna DI.
//!
//! * `#[derive(Injectable)]` - describes a struct's constructor to the container
//! * `#[interface]` - registers a trait as a non-instantiable class
//! * `#[factory_methods]` - makes `&self` methods callable through method bindings
//!
//! Every macro submits its descriptor for discovery, so a container built
//! with default settings knows about the annotated items without any
//! manual registration.

use proc_macro::TokenStream;

mod injectable;
mod interface;
mod methods;
/// Field and argument type classification.
mod types;

/// Derives `Injectable` for a struct.
///
/// Each field becomes a constructor parameter, in declaration order:
/// * `Arc<T>` - resolved from the identifier of `T`
/// * `Option<Arc<T>>` - resolved from the identifier of `T`, `None` if unavailable
/// * `Option<T>` - taken from overrides or its `id`, otherwise `None`
/// * anything else - taken from overrides or the field's default
///
/// Field attributes:
/// * `#[inject(id = "name")]` - resolve from another identifier
/// * `#[inject(default = expr)]` - value used when nothing else applies
/// * `#[inject(skip)]` - not a parameter, initialised with `Default::default()`
///
/// Struct attributes:
/// * `#[injectable(singleton)]` - instances are cached under the class
///   identifier the first time they are made
///
/// ```ignore
/// #[derive(Injectable)]
/// struct UserService {
///     repo: Arc<UserRepo>,
///     #[inject(id = "dyn Logger")]
///     logger: Arc<dyn Logger>,
///     #[inject(default = 30)]
///     timeout: u64,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject, injectable))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}

/// Registers a trait as an interface.
///
/// Makes `dyn Trait` known to the container, so an unbound dependency on it
/// reports "not instantiable" instead of "not found". The trait needs
/// `Send + Sync` supertraits to be resolvable.
///
/// ```ignore
/// #[interface]
/// pub trait Logger: Send + Sync {
///     fn log(&self, message: &str);
/// }
/// ```
#[proc_macro_attribute]
pub fn interface(args: TokenStream, input: TokenStream) -> TokenStream {
    interface::interface(args, input)
}

/// Describes the `&self` methods of an inherent impl block.
///
/// Public and private methods alike can then be the target of a method
/// binding. Arguments are resolved like constructor parameters and accept
/// `#[inject(id = ..., default = ...)]`.
///
/// ```ignore
/// #[factory_methods]
/// impl ReportFactory {
///     fn daily(&self, db: Arc<Database>, #[inject(default = 1)] day: u32) -> Report {
///         Report::new(db, day)
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn factory_methods(args: TokenStream, input: TokenStream) -> TokenStream {
    methods::factory_methods(args, input)
}
