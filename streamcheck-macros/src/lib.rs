//! Procedural macros for streamcheck
//!
//! This crate provides `#[derive(Inspect)]`, which describes a type's
//! structure to streamcheck's structural comparator.
//!
//! # Example
//!
//! ```rust,ignore
//! use streamcheck::Inspect;
//!
//! #[derive(Inspect)]
//! struct Order {
//!     id: u32,
//!     #[inspect(skip)]
//!     fetched_at: std::time::Instant,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt, parse_macro_input, parse_quote, Attribute, Data, DeriveInput, Fields,
    GenericParam, Index,
};

/// Per-field options from `#[inspect(...)]`.
#[derive(Default, Debug, PartialEq)]
struct FieldConfig {
    /// Leave the field out of comparison and rendering.
    skip: bool,
    /// The field is the base part of the value.
    parent: bool,
}

impl FieldConfig {
    fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut config = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("inspect")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    config.skip = true;
                    Ok(())
                } else if meta.path.is_ident("parent") {
                    config.parent = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown inspect option, expected `skip` or `parent`"))
                }
            })?;
        }
        if config.skip && config.parent {
            return Err(syn::Error::new_spanned(
                &attrs[0],
                "a field cannot be both `skip` and `parent`",
            ));
        }
        Ok(config)
    }
}

/// Derive `streamcheck::compare::Inspect`.
///
/// Structs are described as `Shape::Struct` with their fields in
/// declaration order. Enums are described as `Shape::Variant` carrying the
/// active variant's name and fields.
///
/// # Field Options
///
/// - `#[inspect(skip)]` - leave the field out. Skipped fields never cause
///   a difference.
/// - `#[inspect(parent)]` - treat the field as the base part of the value.
///   It is compared before the other fields, at the same path. At most one
///   per struct, and not available on enum variants.
///
/// Every type parameter gets an `Inspect` bound.
///
/// ```rust,ignore
/// #[derive(Inspect)]
/// struct Named {
///     name: String,
/// }
///
/// #[derive(Inspect)]
/// struct Employee {
///     #[inspect(parent)]
///     person: Named,
///     salary: u32,
/// }
///
/// #[derive(Inspect)]
/// enum Event {
///     Joined(Employee),
///     Left { id: u32 },
///     Idle,
/// }
/// ```
#[proc_macro_derive(Inspect, attributes(inspect))]
pub fn derive_inspect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_inspect(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_inspect(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let mut generics = input.generics.clone();
    let bounded: Vec<_> = generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(ty.ident.clone()),
            _ => None,
        })
        .collect();
    let where_clause = generics.make_where_clause();
    for ident in bounded {
        where_clause
            .predicates
            .push(parse_quote!(#ident: ::streamcheck::compare::Inspect));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(data) => expand_struct(&data.fields)?,
        Data::Enum(data) => {
            if data.variants.is_empty() {
                quote! {
                    let _ = visit;
                    match *self {}
                }
            } else {
                let arms = data
                    .variants
                    .iter()
                    .map(|variant| expand_variant(&variant.ident, &variant.fields))
                    .collect::<syn::Result<Vec<_>>>()?;
                quote! {
                    match self {
                        #(#arms)*
                    }
                }
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "Inspect cannot be derived for unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::streamcheck::compare::Inspect for #name #ty_generics #where_clause {
            fn inspect(
                &self,
                visit: &mut dyn ::core::ops::FnMut(::streamcheck::compare::Shape<'_>),
            ) {
                #body
            }
        }
    })
}

fn expand_struct(fields: &Fields) -> syn::Result<TokenStream2> {
    let mut parent = None;
    let mut members = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let config = FieldConfig::from_attrs(&field.attrs)?;
        if config.skip {
            continue;
        }
        let access = match &field.ident {
            Some(ident) => quote! { self.#ident },
            None => {
                let index = Index::from(index);
                quote! { self.#index }
            }
        };
        if config.parent {
            if parent.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field can be marked `parent`",
                ));
            }
            parent = Some(access);
            continue;
        }
        members.push(member(field.ident.as_ref(), index, &quote! { &#access }));
    }

    let parent = match parent {
        Some(access) => quote! {
            ::core::option::Option::Some(&#access as &dyn ::streamcheck::compare::Inspect)
        },
        None => quote! { ::core::option::Option::None },
    };

    Ok(quote! {
        visit(::streamcheck::compare::Shape::Struct {
            parent: #parent,
            members: ::std::vec![#(#members),*],
        });
    })
}

fn expand_variant(variant: &syn::Ident, fields: &Fields) -> syn::Result<TokenStream2> {
    let case = variant.unraw().to_string();
    let mut members = Vec::new();

    let pattern = match fields {
        Fields::Named(named) => {
            let mut bound = Vec::new();
            for (index, field) in named.named.iter().enumerate() {
                let config = variant_field_config(field)?;
                if config.skip {
                    continue;
                }
                let ident = field.ident.as_ref().expect("named field has an ident");
                members.push(member(Some(ident), index, &quote! { #ident }));
                bound.push(ident);
            }
            quote! { Self::#variant { #(#bound,)* .. } }
        }
        Fields::Unnamed(unnamed) => {
            let mut bound = Vec::new();
            for (index, field) in unnamed.unnamed.iter().enumerate() {
                let config = variant_field_config(field)?;
                if config.skip {
                    bound.push(quote! { _ });
                    continue;
                }
                let binding = format_ident!("__field{}", index);
                members.push(member(None, index, &quote! { #binding }));
                bound.push(quote! { #binding });
            }
            quote! { Self::#variant(#(#bound),*) }
        }
        Fields::Unit => quote! { Self::#variant },
    };

    Ok(quote! {
        #pattern => visit(::streamcheck::compare::Shape::Variant {
            case: #case,
            members: ::std::vec![#(#members),*],
        }),
    })
}

fn variant_field_config(field: &syn::Field) -> syn::Result<FieldConfig> {
    let config = FieldConfig::from_attrs(&field.attrs)?;
    if config.parent {
        return Err(syn::Error::new_spanned(
            field,
            "`parent` is only supported on struct fields",
        ));
    }
    Ok(config)
}

/// A `Member` constructor call for one field.
fn member(ident: Option<&syn::Ident>, index: usize, value: &TokenStream2) -> TokenStream2 {
    match ident {
        Some(ident) => {
            let label = ident.unraw().to_string();
            quote! { ::streamcheck::compare::Member::named(#label, #value) }
        }
        None => quote! { ::streamcheck::compare::Member::positional(#index, #value) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(input: DeriveInput) -> String {
        expand_inspect(&input).unwrap().to_string()
    }

    #[test]
    fn test_field_config_parse() {
        let input: DeriveInput = parse_quote! {
            struct Sample {
                #[inspect(skip)]
                cache: u8,
                #[inspect(parent)]
                base: Base,
                plain: u8,
            }
        };
        let Data::Struct(data) = &input.data else {
            unreachable!()
        };
        let configs: Vec<_> = data
            .fields
            .iter()
            .map(|field| FieldConfig::from_attrs(&field.attrs).unwrap())
            .collect();

        assert!(configs[0].skip);
        assert!(configs[1].parent);
        assert_eq!(configs[2], FieldConfig::default());
    }

    #[test]
    fn test_field_config_rejects_unknown() {
        let attr: Attribute = parse_quote!(#[inspect(ignore)]);
        assert!(FieldConfig::from_attrs(&[attr]).is_err());
    }

    #[test]
    fn test_skipped_field_is_not_emitted() {
        let output = expand(parse_quote! {
            struct Order {
                id: u32,
                #[inspect(skip)]
                cache: u8,
            }
        });
        assert!(output.contains("\"id\""));
        assert!(!output.contains("cache"));
    }

    #[test]
    fn test_generic_params_are_bounded() {
        let output = expand(parse_quote! {
            struct Wrapper<T>(T);
        });
        assert!(output.contains("T : :: streamcheck :: compare :: Inspect"));
    }

    #[test]
    fn test_raw_identifiers_are_unprefixed() {
        let output = expand(parse_quote! {
            enum Token {
                r#Type { r#type: u8 },
            }
        });
        assert!(output.contains("case : \"Type\""));
        assert!(output.contains("\"type\""));
    }

    #[test]
    fn test_rejects_two_parents() {
        let input: DeriveInput = parse_quote! {
            struct Twice {
                #[inspect(parent)]
                a: A,
                #[inspect(parent)]
                b: B,
            }
        };
        assert!(expand_inspect(&input).is_err());
    }

    #[test]
    fn test_rejects_parent_in_variant() {
        let input: DeriveInput = parse_quote! {
            enum Shape {
                Child(#[inspect(parent)] Base),
            }
        };
        assert!(expand_inspect(&input).is_err());
    }

    #[test]
    fn test_rejects_unions() {
        let input: DeriveInput = parse_quote! {
            union Bits {
                int: u32,
                float: f32,
            }
        };
        assert!(expand_inspect(&input).is_err());
    }
}
