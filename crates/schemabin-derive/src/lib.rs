// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use std::collections::HashMap;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Field directives from `#[schema(...)]`.
#[derive(Default)]
struct FieldAttrs {
    ignore: bool,
    rename: Option<String>,
    default: Option<String>,
}

/// `#[derive(Schematic)]` macro: generates `SchemaType` + `Schematic` impls
///
/// Every field type must implement `SchemaType` (scalars, `String`, `Vec`,
/// `Option`, `Box`, `HashMap`/`BTreeMap` and other derived records).
///
/// Container attribute:
/// - `#[schema(name = "app.User")]`: type name and schema identity
///   (default: module path + struct name)
///
/// Field attributes:
/// - `#[schema(rename = "wire_name")]`
/// - `#[schema(default = "literal")]`: parsed per codec at derivation
/// - `#[schema(ignore)]`: not encoded; filled with `Default::default()`
///
/// Example:
/// ```ignore
/// use schemabin::Schematic;
///
/// #[derive(Schematic, Default)]
/// #[schema(name = "app.User")]
/// struct User {
///     id: u64,
///     #[schema(rename = "display_name")]
///     name: String,
///     #[schema(default = "3")]
///     retries: u8,
///     #[schema(ignore)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Schematic, attributes(schema))]
pub fn derive_schematic(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Generic record types are not supported",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Only named fields are supported",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "Only structs are supported")),
    };

    let type_name = match container_name(input)? {
        Some(explicit) => quote! { #explicit },
        None => quote! { ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#name)) },
    };

    let mut field_defs = Vec::new();
    let mut declares = Vec::new();
    let mut to_entries = Vec::new();
    let mut from_inits = Vec::new();
    let mut wire_names: HashMap<String, String> = HashMap::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let ty = &field.ty;
        let source = ident.to_string();
        let attrs = field_attrs(field)?;

        if attrs.ignore {
            let ty_str = quote!(#ty).to_string();
            field_defs.push(quote! {
                ::schemabin::FieldDef::new(#source, ::schemabin::TypeRef::Opaque(#ty_str.to_string()))
                    .with_tags(::schemabin::FieldTags::new().ignore())
            });
            from_inits.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }

        let wire_name = attrs.rename.clone().unwrap_or_else(|| source.clone());
        if let Some(previous) = wire_names.insert(wire_name.clone(), source.clone()) {
            return Err(syn::Error::new_spanned(
                field,
                format!(
                    "wire name `{}` is already used by field `{}`",
                    wire_name, previous
                ),
            ));
        }

        let mut tags = quote! { ::schemabin::FieldTags::new() };
        if let Some(rename) = &attrs.rename {
            tags = quote! { #tags.rename(#rename) };
        }
        if let Some(default) = &attrs.default {
            tags = quote! { #tags.default_value(#default) };
        }

        field_defs.push(quote! {
            ::schemabin::FieldDef::new(#source, <#ty as ::schemabin::SchemaType>::type_ref())
                .with_tags(#tags)
        });
        declares.push(quote! {
            <#ty as ::schemabin::SchemaType>::declare(catalog);
        });
        to_entries.push(quote! {
            fields.insert(#source.to_string(), ::schemabin::SchemaType::to_value(&self.#ident));
        });
        from_inits.push(quote! {
            #ident: match fields.remove(#source) {
                ::core::option::Option::Some(v) => <#ty as ::schemabin::SchemaType>::from_value(v)?,
                ::core::option::Option::None => {
                    return ::core::result::Result::Err(::schemabin::ValueError::MissingField {
                        record: <Self as ::schemabin::Schematic>::TYPE_NAME.to_string(),
                        field: #source.to_string(),
                    })
                }
            }
        });
    }

    Ok(quote! {
        impl ::schemabin::Schematic for #name {
            const TYPE_NAME: &'static str = #type_name;

            fn struct_descriptor() -> ::schemabin::StructDescriptor {
                ::schemabin::StructDescriptor::new(
                    <Self as ::schemabin::Schematic>::TYPE_NAME,
                    ::std::vec![#(#field_defs),*],
                )
            }
        }

        impl ::schemabin::SchemaType for #name {
            fn type_ref() -> ::schemabin::TypeRef {
                ::schemabin::TypeRef::Struct(<Self as ::schemabin::Schematic>::TYPE_NAME.to_string())
            }

            fn declare(catalog: &mut ::schemabin::TypeCatalog) {
                if catalog.contains(<Self as ::schemabin::Schematic>::TYPE_NAME) {
                    return;
                }
                catalog.insert(<Self as ::schemabin::Schematic>::struct_descriptor());
                #(#declares)*
            }

            #[allow(unused_mut)]
            fn to_value(&self) -> ::schemabin::Value {
                let mut fields = ::std::collections::HashMap::new();
                #(#to_entries)*
                ::schemabin::Value::Record(fields)
            }

            #[allow(unused_mut, unused_variables)]
            fn from_value(value: ::schemabin::Value) -> ::core::result::Result<Self, ::schemabin::ValueError> {
                let mut fields = value.into_record()?;
                ::core::result::Result::Ok(Self {
                    #(#from_inits),*
                })
            }
        }
    })
}

/// `#[schema(name = "...")]` on the struct.
fn container_name(input: &DeriveInput) -> syn::Result<Option<LitStr>> {
    let mut name = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("schema") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("unknown container attribute, expected `name`"))
            }
        })?;
    }
    Ok(name)
}

fn field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("schema") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("ignore") {
                attrs.ignore = true;
            } else if meta.path.is_ident("rename") {
                attrs.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("default") {
                attrs.default = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error(
                    "unknown field attribute, expected `ignore`, `rename` or `default`",
                ));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}
