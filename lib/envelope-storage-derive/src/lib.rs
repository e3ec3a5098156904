use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Lit, parse_macro_input};

/// Prefix used when only a full message name is given.
const DEFAULT_TYPE_URL_PREFIX: &str = "type.googleapis.com";

/// Parsed contents of a `#[typed(...)]` attribute.
#[derive(Default)]
struct TypedAttr {
    type_url: Option<String>,
    full_name: Option<String>,
}

/// Parse #[typed(type_url = "...")] / #[typed(full_name = "...")]
fn parse_typed_attr(input: &DeriveInput) -> TypedAttr {
    let mut parsed = TypedAttr::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("typed") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("type_url") {
                meta.input.parse::<syn::Token![=]>()?;
                let lit: Lit = meta.input.parse()?;
                if let Lit::Str(s) = lit {
                    parsed.type_url = Some(s.value());
                }
            } else if meta.path.is_ident("full_name") {
                meta.input.parse::<syn::Token![=]>()?;
                let lit: Lit = meta.input.parse()?;
                if let Lit::Str(s) = lit {
                    parsed.full_name = Some(s.value());
                }
            } else {
                return Err(meta.error("expected `type_url` or `full_name`"));
            }
            Ok(())
        })
        .expect("Failed to parse #[typed(...)] attribute");
    }

    parsed
}

/// Derive macro for the `TypedMessage` trait.
///
/// Binds a prost message to the type identifier used when it travels inside a
/// `TypedValue` envelope and when it is resolved by a `SchemaRegistry`.
///
/// Attributes (at most one of):
/// - `type_url`: the complete identifier, e.g. `"type.example.com/acme.Profile"`
/// - `full_name`: the message name only; the identifier becomes
///   `type.googleapis.com/<full_name>`
///
/// Without either attribute the struct name is used as the full name.
///
/// ## Example
///
/// ```text
/// #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize, TypedMessage)]
/// #[typed(full_name = "acme.Profile")]
/// #[serde(default, deny_unknown_fields)]
/// pub struct Profile {
///     #[prost(string, tag = "1")]
///     pub name: String,
/// }
/// // Profile::TYPE_URL == "type.googleapis.com/acme.Profile"
/// ```
#[proc_macro_derive(TypedMessage, attributes(typed))]
pub fn derive_typed_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    match &input.data {
        Data::Struct(_) => {}
        _ => panic!("TypedMessage only supports structs"),
    }
    if !input.generics.params.is_empty() {
        panic!("TypedMessage does not support generic structs");
    }

    let attr = parse_typed_attr(&input);
    let type_url = match (attr.type_url, attr.full_name) {
        (Some(_), Some(_)) => {
            panic!("#[typed(...)] accepts either type_url or full_name, not both")
        }
        (Some(type_url), None) => type_url,
        (None, Some(full_name)) => format!("{}/{}", DEFAULT_TYPE_URL_PREFIX, full_name),
        (None, None) => format!("{}/{}", DEFAULT_TYPE_URL_PREFIX, name),
    };

    if type_url.ends_with('/') {
        panic!("#[typed(type_url = ...)] must end with a message name");
    }

    let expanded = quote! {
        impl envelope_storage::TypedMessage for #name {
            const TYPE_URL: &'static str = #type_url;
        }
    };

    TokenStream::from(expanded)
}
