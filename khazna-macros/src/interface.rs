//! `#[interface]` implementation.

use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemTrait, parse_macro_input};

pub fn interface(args: TokenStream, input: TokenStream) -> TokenStream {
    if !args.is_empty() {
        return syn::Error::new(proc_macro2::Span::call_site(), "#[interface] takes no arguments")
            .to_compile_error()
            .into();
    }

    let item = parse_macro_input!(input as ItemTrait);

    if !item.generics.params.is_empty() {
        return syn::Error::new_spanned(&item.generics, "#[interface] does not support generic traits")
            .to_compile_error()
            .into();
    }

    let ident = &item.ident;

    quote! {
        #item

        const _: () = {
            fn __describe() -> ::khazna::reflect::ClassDescriptor {
                ::khazna::reflect::ClassDescriptor::interface::<dyn #ident>()
            }

            ::khazna::__private::inventory::submit! {
                ::khazna::reflect::ClassEntry::new(__describe)
            }
        };
    }
    .into()
}
