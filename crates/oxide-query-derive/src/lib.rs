//! Derive macro describing database tables for the oxide query builder.
//!
//! This crate provides the `#[derive(Table)]` macro, which records a struct's
//! table name, type name, columns and primary key, and adds typed column
//! accessors to the struct.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitStr, Meta, parse_macro_input};

/// Derives `oxide_query_core::schema::Table` for a struct.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - Marks the field as primary key
/// - `#[column(name = "column_name")]` - Specifies the SQL column name
///   (optional, defaults to field name)
///
/// # Generated Items
///
/// For a struct `User`, this macro generates:
///
/// - `impl Table for User` with `NAME`, `TYPE_NAME`, `COLUMNS` and
///   `PRIMARY_KEY`
/// - `User::id()`, `User::name()`, ... returning table-qualified columns
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn derive_table_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Table derive only supports structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "Table derive only supports structs with named fields",
        ));
    };

    let mut columns: Vec<ColumnInfo> = Vec::new();
    for field in &fields.named {
        let Some(field_name) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        columns.push(ColumnInfo {
            column_name: attrs.name.unwrap_or_else(|| field_name.to_string()),
            field_name,
            is_primary_key: attrs.primary_key,
        });
    }

    let primary_keys: Vec<&ColumnInfo> = columns.iter().filter(|c| c.is_primary_key).collect();
    if primary_keys.len() > 1 {
        return Err(syn::Error::new_spanned(
            &primary_keys[1].field_name,
            "only one field may be marked #[column(primary_key)]",
        ));
    }
    let primary_key_impl = match primary_keys.first() {
        Some(pk) => {
            let pk = &pk.column_name;
            quote! { const PRIMARY_KEY: Option<&'static str> = Some(#pk); }
        }
        None => quote! { const PRIMARY_KEY: Option<&'static str> = None; },
    };

    let all_column_names: Vec<&str> = columns.iter().map(|c| c.column_name.as_str()).collect();

    let column_accessors: Vec<TokenStream2> = columns
        .iter()
        .map(|info| {
            let method_name = &info.field_name;
            let column_name = &info.column_name;
            quote! {
                /// Returns the table-qualified column for building expressions.
                #[inline]
                #[must_use]
                pub fn #method_name() -> ::oxide_query_core::expr::Column {
                    ::oxide_query_core::expr::Column::qualified(#table_name, #column_name)
                }
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::oxide_query_core::schema::Table for #struct_name #ty_generics #where_clause {
            const NAME: &'static str = #table_name;
            const TYPE_NAME: &'static str = #type_name;
            const COLUMNS: &'static [&'static str] = &[#(#all_column_names),*];
            #primary_key_impl
        }

        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#column_accessors)*
        }
    })
}

struct ColumnInfo {
    field_name: Ident,
    column_name: String,
    is_primary_key: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    table_name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute, expected `name`"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                    Ok(())
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error(
                        "unsupported column attribute, expected `primary_key` or `name`",
                    ))
                }
            })?;
        }
    }

    Ok(result)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
