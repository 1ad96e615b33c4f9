//! SqlModel derive macro implementation

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    spanned::Spanned, Attribute, Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Result,
    Visibility,
};

/// Parsed `#[sql(...)]` configuration of one field
struct FieldConfig {
    ident: Ident,
    ty: syn::Type,
    tag: Option<String>,
    exported: bool,
    skip: bool,
    flatten: bool,
}

fn parse_table_name(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut table = None;
    for attr in attrs {
        if attr.path().is_ident("sql") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let lit: LitStr = meta.value()?.parse()?;
                    table = Some(lit.value());
                    Ok(())
                } else {
                    Err(meta.error(format!(
                        "unknown sql struct attribute `{}`",
                        meta.path
                            .get_ident()
                            .map(|i| i.to_string())
                            .unwrap_or_default()
                    )))
                }
            })?;
        }
    }
    Ok(table)
}

fn parse_field_config(field: &Field) -> Result<FieldConfig> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| Error::new(field.span(), "tuple structs are not supported"))?;

    let mut tag = None;
    let mut skip = false;
    let mut flatten = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("sql") {
            continue;
        }

        // Short form: #[sql("pk;size:50")]
        if let Ok(lit) = attr.parse_args::<LitStr>() {
            let value = lit.value();
            if value.trim() == "-" {
                skip = true;
            } else {
                tag = Some(value);
            }
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
            } else if meta.path.is_ident("flatten") {
                flatten = true;
            } else if meta.path.is_ident("tag") {
                let lit: LitStr = meta.value()?.parse()?;
                tag = Some(lit.value());
            } else {
                return Err(meta.error(format!(
                    "unknown sql attribute `{}`",
                    meta.path
                        .get_ident()
                        .map(|i| i.to_string())
                        .unwrap_or_default()
                )));
            }
            Ok(())
        })?;
    }

    if flatten && tag.is_some() {
        return Err(Error::new(
            field.span(),
            "a flattened field cannot carry a column annotation",
        ));
    }

    Ok(FieldConfig {
        ident,
        ty: field.ty.clone(),
        tag,
        exported: matches!(field.vis, Visibility::Public(_)),
        skip,
        flatten,
    })
}

/// `UserProfile` -> `user_profiles`
fn default_table_name(struct_name: &str) -> String {
    let snake = struct_name.to_snake_case();
    if snake.ends_with('s')
        || snake.ends_with('x')
        || snake.ends_with('z')
        || snake.ends_with("ch")
        || snake.ends_with("sh")
    {
        format!("{}es", snake)
    } else if snake.ends_with('y')
        && !snake.ends_with("ay")
        && !snake.ends_with("ey")
        && !snake.ends_with("oy")
        && !snake.ends_with("uy")
    {
        format!("{}ies", &snake[..snake.len() - 1])
    } else {
        format!("{}s", snake)
    }
}

pub fn derive_sql_model_impl(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(Error::new(input.span(), "only named fields are supported")),
        },
        _ => return Err(Error::new(input.span(), "only structs are supported")),
    };

    let struct_name = name.to_string();
    let table = match parse_table_name(&input.attrs)? {
        Some(table) => table,
        None => default_table_name(&struct_name),
    };

    let field_configs: Vec<FieldConfig> = fields
        .iter()
        .map(parse_field_config)
        .collect::<Result<Vec<_>>>()?;

    let field_pushes: Vec<TokenStream> = field_configs
        .iter()
        .map(|config| {
            let field_name = config.ident.to_string();
            let ty = &config.ty;

            if config.flatten && !config.skip {
                return quote! {
                    model = model.embed(#field_name, <#ty as dbforge::SqlModel>::describe());
                };
            }

            let type_name = quote!(#ty).to_string();
            let exported = config.exported;
            let tag = match &config.tag {
                Some(tag) => quote! { .tag(#tag) },
                None => quote! {},
            };
            let skip = if config.skip {
                quote! { .skip() }
            } else {
                quote! {}
            };

            quote! {
                model = model.field(
                    dbforge::FieldDescriptor::new(#field_name, #type_name)
                        .exported(#exported)
                        #tag
                        #skip
                );
            }
        })
        .collect();

    let expanded = quote! {
        impl #impl_generics dbforge::SqlModel for #name #ty_generics #where_clause {
            fn describe() -> dbforge::ModelDescriptor {
                let mut model = dbforge::ModelDescriptor::new(#struct_name, #table);
                #(#field_pushes)*
                model
            }
        }
    };

    Ok(expanded)
}
