//! `#[factory_methods]` implementation.

use darling::FromAttributes;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Expr, FnArg, ImplItem, ImplItemFn, ItemImpl, Pat, ReturnType, Type, parse_macro_input};

use crate::types::{Shape, generic_arg, into_instance};

#[derive(FromAttributes)]
#[darling(attributes(inject))]
struct ArgOptions {
    #[darling(default)]
    id: Option<String>,
    #[darling(default)]
    default: Option<Expr>,
}

pub fn factory_methods(args: TokenStream, input: TokenStream) -> TokenStream {
    if !args.is_empty() {
        return syn::Error::new(proc_macro2::Span::call_site(), "#[factory_methods] takes no arguments")
            .to_compile_error()
            .into();
    }

    let mut item = parse_macro_input!(input as ItemImpl);

    if let Some((_, path, _)) = &item.trait_ {
        return syn::Error::new_spanned(path, "#[factory_methods] only applies to inherent impl blocks")
            .to_compile_error()
            .into();
    }
    if !item.generics.params.is_empty() {
        return syn::Error::new_spanned(&item.generics, "#[factory_methods] does not support generic impl blocks")
            .to_compile_error()
            .into();
    }

    let self_ty = (*item.self_ty).clone();
    let mut registrations = Vec::new();

    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        match describe_method(&self_ty, method) {
            Ok(Some(registration)) => registrations.push(registration),
            Ok(None) => {}
            Err(errors) => return errors.into(),
        }
    }

    quote! {
        #item
        #(#registrations)*
    }
    .into()
}

/// Registration for one method, `None` for methods not taking `&self`.
///
/// Strips `#[inject]` from the method's arguments either way.
fn describe_method(self_ty: &Type, method: &mut ImplItemFn) -> Result<Option<TokenStream2>, TokenStream2> {
    let args = format_ident!("_args");
    let mut parameters = Vec::new();
    let mut bindings = Vec::new();
    let mut fetches = Vec::new();

    for (position, input) in method
        .sig
        .inputs
        .iter_mut()
        .filter_map(|input| match input {
            FnArg::Typed(typed) => Some(typed),
            FnArg::Receiver(_) => None,
        })
        .enumerate()
    {
        let options = ArgOptions::from_attributes(&input.attrs).map_err(|err| err.write_errors())?;
        input.attrs.retain(|attr| !attr.path().is_ident("inject"));

        let name = match &*input.pat {
            Pat::Ident(pat) => pat.ident.to_string().trim_start_matches('_').to_string(),
            _ => format!("arg{position}"),
        };

        let shape = Shape::of(&input.ty);
        parameters.push(shape.parameter(&name, position, options.id.as_deref(), options.default.as_ref()));

        let binding = format_ident!("__arg{}", position);
        fetches.push(shape.fetch(&args, position));
        bindings.push(binding);
    }

    let takes_shared_self = method
        .sig
        .receiver()
        .is_some_and(|receiver| receiver.reference.is_some() && receiver.mutability.is_none());
    if !takes_shared_self || method.sig.asyncness.is_some() {
        return Ok(None);
    }

    let ident = &method.sig.ident;
    let name = ident.to_string();
    let visibility = match method.vis {
        syn::Visibility::Inherited => quote! { ::khazna::reflect::Visibility::Private },
        _ => quote! { ::khazna::reflect::Visibility::Public },
    };

    let call = quote! { __this.#ident(#(#bindings),*) };
    let produce = match &method.sig.output {
        ReturnType::Default => quote! {
            #call;
            ::std::result::Result::Ok(::khazna::instance::Instance::of(()))
        },
        ReturnType::Type(_, ty) => match generic_arg(ty, "Result") {
            Some(ok) => {
                let wrapped = into_instance(ok, quote! { __value });
                quote! {
                    let __value = #call.map_err(|err| {
                        ::khazna::error::KhaznaError::construction(
                            ::std::format!("{}::{}", ::khazna::reflect::class_name::<#self_ty>(), #name),
                            err,
                        )
                    })?;
                    ::std::result::Result::Ok(#wrapped)
                }
            }
            None => {
                let wrapped = into_instance(ty, call);
                quote! { ::std::result::Result::Ok(#wrapped) }
            }
        },
    };

    Ok(Some(quote! {
        const _: () = {
            fn __describe() -> ::khazna::reflect::MethodDescriptor {
                ::khazna::reflect::MethodDescriptor::new::<#self_ty, _>(
                    #name,
                    #visibility,
                    ::std::vec![#(#parameters),*],
                    |__receiver: &::khazna::instance::Instance, #args: ::khazna::reflect::Arguments| {
                        let __this = ::khazna::reflect::receiver::<#self_ty>(__receiver)?;
                        #(let #bindings = #fetches;)*
                        #produce
                    },
                )
            }

            ::khazna::__private::inventory::submit! {
                ::khazna::reflect::MethodEntry::new(__describe)
            }
        };
    }))
}
