//! Procedural macros for model_link
//!
//! `#[derive(Model)]` implements `model_link::ModelDefinition` for a struct
//! with named fields, mapping each field to an attribute.
//!
//! ```ignore
//! #[derive(Model)]
//! #[model(name = "localidad", table = "localidades", paranoid)]
//! struct Localidad {
//!     #[model(default = "Desconocido")]
//!     nombre: Option<String>,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericArgument, Lit, LitStr,
    PathArguments, Type,
};

/// Derive macro for `ModelDefinition`
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_model(input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

#[derive(Default)]
struct ModelArgs {
    name: Option<LitStr>,
    table: Option<LitStr>,
    paranoid: bool,
    timestamps: Option<bool>,
}

#[derive(Default)]
struct FieldArgs {
    column: Option<LitStr>,
    default: Option<Lit>,
    primary_key: bool,
    unique: bool,
    text: bool,
    skip: bool,
}

fn expand_model(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let args = parse_model_args(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Model can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Model can only be derived for structs",
            ))
        }
    };

    let name = args
        .name
        .map(|lit| lit.value())
        .unwrap_or_else(|| ident.to_string());

    let table = args.table.map(|table| quote! { .table_name_as(#table) });
    let paranoid = args.paranoid;
    let timestamps = args.timestamps.unwrap_or(true);

    let mut attributes = Vec::new();
    for field in fields {
        let field_args = parse_field_args(&field.attrs)?;
        if field_args.skip {
            continue;
        }

        let column = match &field_args.column {
            Some(column) => column.value(),
            None => match &field.ident {
                Some(field_ident) => field_ident.to_string(),
                None => continue,
            },
        };

        let (inner, nullable) = unwrap_option(&field.ty);
        let data_type = if field_args.text {
            quote! { ::model_link::DataType::Text }
        } else {
            map_type(inner)?
        };
        let default = field_args.default.as_ref().map(default_tokens).transpose()?;
        let default = default.map(|value| quote! { .default_value(#value) });
        let primary_key = field_args.primary_key;
        let unique = field_args.unique;

        attributes.push(quote! {
            .attribute(
                #column,
                ::model_link::Attribute::new(#data_type)
                    .allow_null(#nullable)
                    .primary_key(#primary_key)
                    .unique(#unique)
                    #default
            )
        });
    }

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::model_link::ModelDefinition for #ident #ty_generics #where_clause {
            fn define() -> ::model_link::Model {
                ::model_link::Model::new(#name)
                    #table
                    .paranoid(#paranoid)
                    .timestamps(#timestamps)
                    #(#attributes)*
            }
        }
    })
}

fn parse_model_args(attrs: &[Attribute]) -> syn::Result<ModelArgs> {
    let mut args = ModelArgs::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                args.name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("table") {
                args.table = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("paranoid") {
                args.paranoid = true;
            } else if meta.path.is_ident("timestamps") {
                let value: syn::LitBool = meta.value()?.parse()?;
                args.timestamps = Some(value.value);
            } else {
                return Err(meta.error("unsupported model attribute"));
            }
            Ok(())
        })?;
    }

    Ok(args)
}

fn parse_field_args(attrs: &[Attribute]) -> syn::Result<FieldArgs> {
    let mut args = FieldArgs::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                args.column = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("default") {
                args.default = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("primary_key") {
                args.primary_key = true;
            } else if meta.path.is_ident("unique") {
                args.unique = true;
            } else if meta.path.is_ident("text") {
                args.text = true;
            } else if meta.path.is_ident("skip") {
                args.skip = true;
            } else {
                return Err(meta.error("unsupported field attribute"));
            }
            Ok(())
        })?;
    }

    Ok(args)
}

/// `Option<T>` becomes a nullable `T`
fn unwrap_option(ty: &Type) -> (&Type, bool) {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return (inner, true);
                    }
                }
            }
        }
    }

    (ty, false)
}

fn map_type(ty: &Type) -> syn::Result<TokenStream2> {
    let ident = match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    };

    let data_type = match ident.as_deref() {
        Some("String") => quote! { ::model_link::DataType::String(255) },
        Some("i8" | "i16" | "i32" | "u8" | "u16") => quote! { ::model_link::DataType::Integer },
        Some("i64" | "u32") => quote! { ::model_link::DataType::BigInt },
        Some("u64" | "usize") => {
            return Err(syn::Error::new_spanned(
                ty,
                "unsigned 64-bit integers do not fit a BIGINT column; use i64",
            ))
        }
        Some("f32") => quote! { ::model_link::DataType::Float },
        Some("f64") => quote! { ::model_link::DataType::Double },
        Some("bool") => quote! { ::model_link::DataType::Boolean },
        Some("DateTime" | "NaiveDateTime") => quote! { ::model_link::DataType::Date },
        Some("NaiveDate") => quote! { ::model_link::DataType::DateOnly },
        Some("Uuid") => quote! { ::model_link::DataType::Uuid },
        Some("Value" | "Json") => quote! { ::model_link::DataType::Json },
        _ => {
            return Err(syn::Error::new_spanned(
                ty,
                format!(
                    "no column type for `{}`",
                    ty.to_token_stream().to_string().replace(' ', "")
                ),
            ))
        }
    };

    Ok(data_type)
}

fn default_tokens(lit: &Lit) -> syn::Result<TokenStream2> {
    match lit {
        Lit::Str(value) => Ok(quote! {
            ::model_link::DefaultValue::Text(::std::string::String::from(#value))
        }),
        Lit::Int(value) => {
            let value: i64 = value.base10_parse()?;
            Ok(quote! { ::model_link::DefaultValue::Integer(#value) })
        }
        Lit::Float(value) => {
            let value: f64 = value.base10_parse()?;
            Ok(quote! { ::model_link::DefaultValue::Float(#value) })
        }
        Lit::Bool(value) => {
            let value = value.value;
            Ok(quote! { ::model_link::DefaultValue::Boolean(#value) })
        }
        other => Err(syn::Error::new_spanned(other, "unsupported default value")),
    }
}
