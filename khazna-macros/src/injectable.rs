//! `#[derive(Injectable)]` implementation.

use darling::{FromDeriveInput, FromField, ast::Data, util::Ignored};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, Expr, Ident, Type, parse_macro_input};

use crate::types::Shape;

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: Ident,
    generics: syn::Generics,
    data: Data<Ignored, InjectField>,
    #[darling(default)]
    singleton: bool,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    id: Option<String>,
    #[darling(default)]
    default: Option<Expr>,
    #[darling(default)]
    skip: bool,
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let input = match InjectableInput::from_derive_input(&input) {
        Ok(input) => input,
        Err(err) => return err.write_errors().into(),
    };

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "Injectable cannot be derived for generic types")
            .to_compile_error()
            .into();
    }

    let ident = &input.ident;
    let args = format_ident!("_args");

    let fields = match &input.data {
        Data::Struct(fields) => fields.fields.iter().collect::<Vec<_>>(),
        Data::Enum(_) => Vec::new(),
    };

    let mut parameters = Vec::new();
    let mut inits = Vec::new();
    let mut position = 0usize;

    for field in fields {
        let Some(name) = &field.ident else {
            continue;
        };

        if field.skip {
            inits.push(quote! { #name: ::std::default::Default::default() });
            continue;
        }

        let shape = Shape::of(&field.ty);
        let label = name.to_string();
        parameters.push(shape.parameter(&label, position, field.id.as_deref(), field.default.as_ref()));

        let fetch = shape.fetch(&args, position);
        inits.push(quote! { #name: #fetch });
        position += 1;
    }

    let build = if matches!(&input.data, Data::Struct(fields) if fields.style.is_unit()) {
        quote! { Self }
    } else {
        quote! { Self { #(#inits),* } }
    };

    let (descriptor, marker) = if input.singleton {
        (
            quote! { ::khazna::reflect::ClassDescriptor::of_self_registering::<Self>() },
            quote! { impl ::khazna::reflect::SelfRegistering for #ident {} },
        )
    } else {
        (quote! { ::khazna::reflect::ClassDescriptor::of::<Self>() }, quote! {})
    };

    let expanded = quote! {
        impl ::khazna::reflect::Injectable for #ident {
            fn descriptor() -> ::khazna::reflect::ClassDescriptor {
                #descriptor
                    .constructor(
                        ::std::vec![#(#parameters),*],
                        |#args: ::khazna::reflect::Arguments| {
                            ::std::result::Result::Ok(::khazna::instance::Instance::of(#build))
                        },
                    )
            }
        }

        #marker

        const _: () = {
            fn __describe() -> ::khazna::reflect::ClassDescriptor {
                <#ident as ::khazna::reflect::Injectable>::descriptor()
            }

            ::khazna::__private::inventory::submit! {
                ::khazna::reflect::ClassEntry::new(__describe)
            }
        };
    };

    expanded.into()
}
