use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, GenericArgument, PathArguments, Type};

/// How a field or argument is resolved and read back.
pub enum Shape<'a> {
    /// `Arc<T>`
    Shared(&'a Type),
    /// `Option<Arc<T>>`
    OptionalShared(&'a Type),
    /// `Option<T>`
    Optional(&'a Type),
    /// `T`
    Owned(&'a Type),
}

impl<'a> Shape<'a> {
    pub fn of(ty: &'a Type) -> Self {
        if let Some(inner) = generic_arg(ty, "Arc") {
            return Shape::Shared(inner);
        }
        if let Some(inner) = generic_arg(ty, "Option") {
            return match generic_arg(inner, "Arc") {
                Some(shared) => Shape::OptionalShared(shared),
                None => Shape::Optional(inner),
            };
        }
        Shape::Owned(ty)
    }

    /// `Parameter` construction expression.
    pub fn parameter(&self, name: &str, position: usize, id: Option<&str>, default: Option<&Expr>) -> TokenStream {
        let mut parameter = match self {
            Shape::Shared(inner) => quote! { ::khazna::reflect::Parameter::class::<#inner>(#name, #position) },
            Shape::OptionalShared(inner) => {
                quote! { ::khazna::reflect::Parameter::class::<#inner>(#name, #position).nullable() }
            }
            Shape::Optional(_) => quote! { ::khazna::reflect::Parameter::new(#name, #position).nullable() },
            Shape::Owned(_) => quote! { ::khazna::reflect::Parameter::new(#name, #position) },
        };

        if let Some(id) = id {
            parameter = quote! { #parameter.hinted(#id) };
        }

        if let Some(default) = default {
            let value = match self {
                Shape::Shared(_) | Shape::OptionalShared(_) => {
                    quote! { ::khazna::instance::Instance::shared(#default) }
                }
                Shape::Optional(inner) | Shape::Owned(inner) => {
                    quote! { ::khazna::instance::Instance::of::<#inner>(#default) }
                }
            };
            parameter = quote! { #parameter.with_default(|| #value) };
        }

        parameter
    }

    /// Expression reading position `position` out of `args`.
    pub fn fetch(&self, args: &syn::Ident, position: usize) -> TokenStream {
        match self {
            Shape::Shared(inner) => quote! { #args.shared::<#inner>(#position)? },
            Shape::OptionalShared(inner) => quote! { #args.optional_shared::<#inner>(#position)? },
            Shape::Optional(inner) => quote! { #args.optional_cloned::<#inner>(#position)? },
            Shape::Owned(inner) => quote! { #args.cloned::<#inner>(#position)? },
        }
    }
}

/// Wraps a produced `value` of type `ty` into an `Instance`.
pub fn into_instance(ty: &Type, value: TokenStream) -> TokenStream {
    if generic_arg(ty, "Arc").is_some() {
        quote! { ::khazna::instance::Instance::shared(#value) }
    } else if last_segment_is(ty, "Instance") {
        value
    } else {
        quote! { ::khazna::instance::Instance::of(#value) }
    }
}

/// `T` from `Wrapper<T>`, matching on the last path segment.
pub fn generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })
}

pub fn last_segment_is(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Path(path) => path.path.segments.last().is_some_and(|s| s.ident == name),
        _ => false,
    }
}
