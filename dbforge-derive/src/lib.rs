//! Derive macro for dbforge model descriptors
//!
//! This crate provides `#[derive(SqlModel)]`, which implements
//! `dbforge::SqlModel` for a struct with named fields. The generated
//! `describe()` returns a `ModelDescriptor` listing every field, its type as
//! written in source and its `#[sql(...)]` annotation, so that SQL can be
//! generated from the struct without any runtime reflection.
//!
//! The macro is re-exported from the `dbforge` crate, so users typically
//! don't need to depend on this crate directly.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod sql_model;

/// Derive macro describing a struct for forward SQL generation.
///
/// # Attributes
///
/// On the struct:
/// - `#[sql(table = "users")]` - Table name (default: snake_case plural of the struct name)
///
/// On fields:
/// - `#[sql("pk;auto_increment;size:50")]` - Semicolon-separated column annotation
/// - `#[sql(tag = "unique;not_null")]` - Same, in key/value form
/// - `#[sql(skip)]` or `#[sql("-")]` - Exclude the field
/// - `#[sql(flatten)]` - Embed the columns of a field whose type also derives `SqlModel`
///
/// Fields that are not `pub` are described as non-exported and never become columns.
///
/// # Example
///
/// ```ignore
/// use dbforge::SqlModel;
///
/// #[derive(SqlModel)]
/// #[sql(table = "users")]
/// pub struct User {
///     #[sql("primary_key;auto_increment")]
///     pub id: i64,
///     #[sql("size:50;not_null")]
///     pub name: String,
///     #[sql("default:1")]
///     pub status: i32,
/// }
/// ```
#[proc_macro_derive(SqlModel, attributes(sql))]
pub fn derive_sql_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    sql_model::derive_sql_model_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
