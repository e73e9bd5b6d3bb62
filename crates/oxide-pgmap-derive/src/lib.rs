//! Derive macro for `oxide-pgmap` entity descriptors.
//!
//! This crate provides `#[derive(Entity)]`, which emits the static
//! `EntityDescriptor` the row mapper and the SQL generator read in place of
//! runtime reflection.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DataEnum, DeriveInput, Expr, Fields, FieldsNamed, Ident,
    Lit, Meta, Type,
};

/// Derives `oxide_pgmap::schema::Entity`.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Overrides the table name (optional,
///   defaults to the struct name split on lowercase-to-uppercase boundaries)
///
/// # Field Attributes
///
/// - `#[column(name = "column_name")]` - Overrides the column name
/// - `#[column(mutable)]` - Assigned after construction instead of passed to
///   the constructor
/// - `#[column(transient)]` - Never read from a column; filled by a join
///   into-field, otherwise `Default::default()`
/// - `#[column(default)]` - `Default::default()` when no column matches
///
/// # Generated Items
///
/// For a struct `Vehicle`, this macro generates:
///
/// - `impl Entity for Vehicle` with the descriptor, constructor, property
///   assignment and property readers
/// - One `Vehicle::field() -> TypedColumn<Vehicle, FieldType>` accessor per
///   field
///
/// A field may not be named after an `Entity` item (`table`, `aliased`,
/// `descriptor`, ...), since its accessor would shadow that item.
///
/// On an enum of unit variants it generates an enumeration descriptor plus
/// `ToSqlValue`/`FromSqlValue` by variant name, so the enum can be used as a
/// column type.
#[proc_macro_derive(Entity, attributes(table, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity derive does not support generic types",
        ));
    }
    let table_name = get_table_name(&input.attrs)?;
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => derive_record(input, table_name, fields),
            _ => Err(syn::Error::new_spanned(
                input,
                "Entity derive only supports structs with named fields",
            )),
        },
        Data::Enum(data) => derive_enumeration(input, table_name, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            input,
            "Entity derive only supports structs and enums",
        )),
    }
}

/// `Entity` items a generated column accessor would shadow.
const ENTITY_ITEMS: [&str; 8] = [
    "descriptor",
    "construct",
    "assign",
    "property_value",
    "from_column",
    "table",
    "aliased",
    "auto_aliased",
];

struct FieldInfo {
    ident: Ident,
    ty: Type,
    name: String,
    rust_type: String,
    attrs: ColumnAttrs,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    mutable: bool,
    transient: bool,
    default: bool,
}

fn derive_record(
    input: &DeriveInput,
    table_name: Option<String>,
    fields: &FieldsNamed,
) -> syn::Result<TokenStream2> {
    let entity = &input.ident;
    let simple_name = entity.to_string();

    let mut infos = Vec::with_capacity(fields.named.len());
    for field in &fields.named {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        if ENTITY_ITEMS.iter().any(|item| ident == item) {
            return Err(syn::Error::new_spanned(
                &ident,
                format!("field `{ident}` would shadow `Entity::{ident}`; rename the field"),
            ));
        }
        let ty = field.ty.clone();
        infos.push(FieldInfo {
            name: ident.to_string(),
            rust_type: quote!(#ty).to_string().replace(' ', ""),
            attrs: parse_column_attrs(&field.attrs)?,
            ident,
            ty,
        });
    }

    let parameters = infos.iter().filter(|f| !f.attrs.mutable).map(|f| {
        let name = &f.name;
        let rust_type = &f.rust_type;
        let column = option_tokens(f.attrs.name.as_deref());
        let nullable = is_option(&f.ty);
        let optional = f.attrs.default;
        let transient = f.attrs.transient;
        quote! {
            ::oxide_pgmap::schema::ParameterDescriptor {
                name: #name,
                column: #column,
                nullable: #nullable,
                optional: #optional,
                transient: #transient,
                rust_type: #rust_type,
            }
        }
    });

    let properties = infos.iter().map(|f| {
        let name = &f.name;
        let rust_type = &f.rust_type;
        let column = option_tokens(f.attrs.name.as_deref());
        let mutable = f.attrs.mutable;
        let transient = f.attrs.transient;
        quote! {
            ::oxide_pgmap::schema::PropertyDescriptor {
                name: #name,
                column: #column,
                mutable: #mutable,
                transient: #transient,
                rust_type: #rust_type,
            }
        }
    });

    let constructed = infos.iter().map(|f| {
        let ident = &f.ident;
        let name = &f.name;
        if f.attrs.mutable {
            quote! { #ident: ::core::default::Default::default() }
        } else if f.attrs.transient {
            quote! { #ident: args.take_joined(#name)? }
        } else if f.attrs.default {
            quote! { #ident: args.take_or_default(#name)? }
        } else {
            quote! { #ident: args.take(#name)? }
        }
    });

    let args = if infos.iter().all(|f| f.attrs.mutable) {
        quote! { _args }
    } else {
        quote! { args }
    };

    let assignments: Vec<TokenStream2> = infos
        .iter()
        .filter(|f| f.attrs.mutable)
        .map(|f| {
            let ident = &f.ident;
            let name = &f.name;
            let read = if f.attrs.transient {
                quote! { value.into_object()? }
            } else {
                quote! { value.decode()? }
            };
            quote! {
                #name => {
                    self.#ident = #read;
                    ::core::result::Result::Ok(())
                }
            }
        })
        .collect();

    let assign = if assignments.is_empty() {
        quote! {}
    } else {
        quote! {
            fn assign(
                &mut self,
                property: &str,
                value: ::oxide_pgmap::schema::Argument,
            ) -> ::oxide_pgmap::Result<()> {
                match property {
                    #(#assignments)*
                    other => ::core::result::Result::Err(::oxide_pgmap::Error::mapping(
                        #simple_name,
                        ::std::format!("no mutable property {other}"),
                    )),
                }
            }
        }
    };

    let readers = infos.iter().filter(|f| !f.attrs.transient).map(|f| {
        let ident = &f.ident;
        let name = &f.name;
        quote! {
            #name => ::core::option::Option::Some(
                ::oxide_pgmap::value::ToSqlValue::to_sql_value(
                    ::core::clone::Clone::clone(&self.#ident),
                ),
            ),
        }
    });

    let accessors = infos.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let name = &f.name;
        quote! {
            /// Returns the typed column handle for this field.
            #[must_use]
            pub const fn #ident() -> ::oxide_pgmap::schema::TypedColumn<Self, #ty> {
                ::oxide_pgmap::schema::TypedColumn::new(#name)
            }
        }
    });

    let table_name = option_tokens(table_name.as_deref());
    let expanded = quote! {
        impl ::oxide_pgmap::schema::Entity for #entity {
            fn descriptor() -> &'static ::oxide_pgmap::schema::EntityDescriptor {
                static DESCRIPTOR: ::oxide_pgmap::schema::EntityDescriptor =
                    ::oxide_pgmap::schema::EntityDescriptor {
                        type_name: ::core::concat!(::core::module_path!(), "::", #simple_name),
                        simple_name: #simple_name,
                        table_name: #table_name,
                        shape: ::oxide_pgmap::schema::Shape::Record,
                        parameters: &[#(#parameters),*],
                        properties: &[#(#properties),*],
                        vtable: ::oxide_pgmap::schema::EntityVTable::of::<#entity>(),
                    };
                &DESCRIPTOR
            }

            fn construct(
                #args: &mut ::oxide_pgmap::schema::Arguments,
            ) -> ::oxide_pgmap::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#constructed),*
                })
            }

            #assign

            fn property_value(
                &self,
                property: &str,
            ) -> ::core::option::Option<::oxide_pgmap::value::SqlValue> {
                match property {
                    #(#readers)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #entity {
            #(#accessors)*
        }
    };

    Ok(expanded)
}

fn derive_enumeration(
    input: &DeriveInput,
    table_name: Option<String>,
    data: &DataEnum,
) -> syn::Result<TokenStream2> {
    let entity = &input.ident;
    let simple_name = entity.to_string();

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Entity derive only supports enums with unit variants",
            ));
        }
        variants.push((variant.ident.clone(), variant.ident.to_string()));
    }

    let to_text = variants.iter().map(|(ident, name)| quote! { Self::#ident => #name, });
    let from_text = variants
        .iter()
        .map(|(ident, name)| quote! { #name => ::core::result::Result::Ok(Self::#ident), });

    let table_name = option_tokens(table_name.as_deref());
    let not_instantiable = format!("{simple_name} is not instantiable");
    let expanded = quote! {
        impl ::oxide_pgmap::schema::Entity for #entity {
            fn descriptor() -> &'static ::oxide_pgmap::schema::EntityDescriptor {
                static DESCRIPTOR: ::oxide_pgmap::schema::EntityDescriptor =
                    ::oxide_pgmap::schema::EntityDescriptor {
                        type_name: ::core::concat!(::core::module_path!(), "::", #simple_name),
                        simple_name: #simple_name,
                        table_name: #table_name,
                        shape: ::oxide_pgmap::schema::Shape::Enumeration,
                        parameters: &[],
                        properties: &[],
                        vtable: ::oxide_pgmap::schema::EntityVTable::of::<#entity>(),
                    };
                &DESCRIPTOR
            }

            fn construct(
                _args: &mut ::oxide_pgmap::schema::Arguments,
            ) -> ::oxide_pgmap::Result<Self> {
                ::core::result::Result::Err(::oxide_pgmap::Error::configuration(#not_instantiable))
            }

            fn from_column(value: ::oxide_pgmap::value::SqlValue) -> ::oxide_pgmap::Result<Self> {
                ::oxide_pgmap::value::FromSqlValue::from_sql_value(value)
            }
        }

        impl ::oxide_pgmap::value::ToSqlValue for #entity {
            fn to_sql_value(self) -> ::oxide_pgmap::value::SqlValue {
                let name = match self {
                    #(#to_text)*
                };
                ::oxide_pgmap::value::SqlValue::Text(::std::string::String::from(name))
            }
        }

        impl ::oxide_pgmap::value::FromSqlValue for #entity {
            fn from_sql_value(
                value: ::oxide_pgmap::value::SqlValue,
            ) -> ::oxide_pgmap::Result<Self> {
                match value {
                    ::oxide_pgmap::value::SqlValue::Text(text) => match text.as_str() {
                        #(#from_text)*
                        other => ::core::result::Result::Err(::oxide_pgmap::Error::mapping(
                            #simple_name,
                            ::std::format!("unknown variant {other}"),
                        )),
                    },
                    other => ::core::result::Result::Err(::oxide_pgmap::Error::Decode {
                        expected: #simple_name,
                        found: other.kind(),
                    }),
                }
            }
        }

        impl ::oxide_pgmap::builder::SqlComparable for #entity {}

        impl ::oxide_pgmap::builder::IntoOperand<#entity> for #entity {
            fn into_operand(self) -> ::oxide_pgmap::ast::Expr {
                ::oxide_pgmap::ast::Expr::value(
                    ::oxide_pgmap::value::ToSqlValue::to_sql_value(self),
                )
            }
        }

        impl ::oxide_pgmap::builder::IntoOperand<::core::option::Option<#entity>> for #entity {
            fn into_operand(self) -> ::oxide_pgmap::ast::Expr {
                ::oxide_pgmap::ast::Expr::value(
                    ::oxide_pgmap::value::ToSqlValue::to_sql_value(self),
                )
            }
        }
    };

    Ok(expanded)
}

fn option_tokens(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    match value {
        Expr::Lit(syn::ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

fn get_table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut table_name = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("table")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                table_name = Some(string_value(&meta)?);
                Ok(())
            } else {
                Err(meta.error("unsupported table attribute"))
            }
        })?;
    }
    Ok(table_name)
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("column")) {
        // Handle empty attribute like #[column]
        if matches!(attr.meta, Meta::Path(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                result.name = Some(string_value(&meta)?);
            } else if meta.path.is_ident("mutable") {
                result.mutable = true;
            } else if meta.path.is_ident("transient") {
                result.transient = true;
            } else if meta.path.is_ident("default") {
                result.default = true;
            } else {
                return Err(meta.error("unsupported column attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}
