use proc_macro2::{Ident, TokenStream};
use proc_macro_error::abort;
use quote::quote;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{
    Attribute, DataStruct, Field, Fields, GenericArgument, Index, LitStr, Member, PathArguments,
    Type,
};

pub struct ContainerAttrs {
    pub name: Option<String>,
}

impl ContainerAttrs {
    pub fn parse(attrs: &[Attribute]) -> Self {
        let mut container = ContainerAttrs { name: None };
        for attr in attrs.iter().filter(|a| a.path().is_ident("anybox")) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    container.name = Some(lit.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported anybox attribute, expected `name`"))
                }
            });
            if let Err(e) = parsed {
                abort!(e.span(), "{}", e);
            }
        }
        container
    }
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
    /// Some(true) for `envelope`, Some(false) for `plain`
    envelope: Option<bool>,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> Self {
        let mut field = FieldAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("anybox")) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    field.rename = Some(lit.value());
                } else if meta.path.is_ident("skip") {
                    field.skip = true;
                } else if meta.path.is_ident("envelope") {
                    field.envelope = Some(true);
                } else if meta.path.is_ident("plain") {
                    field.envelope = Some(false);
                } else {
                    return Err(meta.error(
                        "unsupported anybox attribute, expected `rename`, `skip`, `envelope` or `plain`",
                    ));
                }
                Ok(())
            });
            if let Err(e) = parsed {
                abort!(e.span(), "{}", e);
            }
        }
        field
    }
}

pub fn process_struct(ident: &Ident, name: TokenStream, ds: DataStruct) -> TokenStream {
    match &ds.fields {
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
            process_alias(ident, name, &unnamed.unnamed[0])
        }
        fields => process_fields(ident, name, fields),
    }
}

fn process_alias(ident: &Ident, name: TokenStream, field: &Field) -> TokenStream {
    if field.attrs.iter().any(|a| a.path().is_ident("anybox")) {
        abort!(field.span(), "Field attributes are not supported on aliased primitives");
    }
    let ty = &field.ty;
    quote!(
        impl ::anybox::Reflect for #ident {
            fn type_info() -> ::anybox::TypeInfo {
                ::anybox::TypeInfo::alias::<Self>(#name)
            }
        }

        impl ::anybox::Alias for #ident {
            type Repr = #ty;

            fn repr(&self) -> &Self::Repr {
                &self.0
            }

            fn from_repr(repr: Self::Repr) -> Self {
                Self(repr)
            }
        }
    )
}

fn process_fields(ident: &Ident, name: TokenStream, fields: &Fields) -> TokenStream {
    let mut descriptors = Vec::new();
    let mut wire_names: Vec<(String, String)> = Vec::new();
    for (idx, f) in fields.iter().enumerate() {
        let attrs = FieldAttrs::parse(&f.attrs);
        if attrs.skip {
            continue;
        }
        let (member, default_name) = match &f.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.unraw().to_string()),
            None => (Member::Unnamed(Index::from(idx)), idx.to_string()),
        };
        let wire_name = attrs.rename.unwrap_or(default_name);
        if let Some(previous) = find_clash(&wire_names, &wire_name) {
            abort!(
                f.span(),
                "Field name \"{}\" is already used by `{}`",
                wire_name,
                previous
            );
        }
        wire_names.push((wire_name.clone(), field_label(f, idx)));
        let ty = &f.ty;
        let ty_str = ty_to_str(ty);
        let ctor = if attrs.envelope.unwrap_or_else(|| mentions_any(ty)) {
            quote!(envelope)
        } else {
            quote!(plain)
        };
        descriptors.push(quote!(
            ::anybox::FieldDescriptor::#ctor::<Self, #ty>(
                #wire_name,
                #ty_str,
                |this| &this.#member,
                |this| &mut this.#member,
            )
        ));
    }

    quote!(
        impl ::anybox::Reflect for #ident {
            fn type_info() -> ::anybox::TypeInfo {
                ::anybox::TypeInfo::structure(#name, ::std::vec![#(#descriptors),*])
            }
        }
    )
}

/// Field already encoded under `wire_name`, if any.
fn find_clash<'a>(taken: &'a [(String, String)], wire_name: &str) -> Option<&'a str> {
    taken
        .iter()
        .find(|(name, _)| name == wire_name)
        .map(|(_, label)| label.as_str())
}

fn field_label(f: &Field, idx: usize) -> String {
    match &f.ident {
        Some(ident) => ident.unraw().to_string(),
        None => idx.to_string(),
    }
}

/// Whether a field type holds envelopes: `Any` itself or a generic container of it.
fn mentions_any(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path.path.segments.last().map_or(false, |segment| {
            if segment.ident == "Any" {
                return true;
            }
            match &segment.arguments {
                PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| match arg {
                    GenericArgument::Type(ty) => mentions_any(ty),
                    _ => false,
                }),
                _ => false,
            }
        }),
        Type::Group(group) => mentions_any(&group.elem),
        Type::Paren(paren) => mentions_any(&paren.elem),
        _ => false,
    }
}

fn ty_to_str(ty: &Type) -> String {
    match ty {
        Type::Path(path) => {
            let mut path_str = String::new();
            if path.path.leading_colon.is_some() {
                path_str.push_str("::");
            }
            let mut is_first = true;
            for s in &path.path.segments {
                if is_first {
                    is_first = false;
                } else {
                    path_str.push_str("::");
                }
                path_str.push_str(s.ident.unraw().to_string().as_str());
                if let PathArguments::AngleBracketed(args) = &s.arguments {
                    let args: Vec<String> = args
                        .args
                        .iter()
                        .map(|arg| match arg {
                            GenericArgument::Type(ty) => ty_to_str(ty),
                            other => tokens_to_str(other),
                        })
                        .collect();
                    path_str.push('<');
                    path_str.push_str(&args.join(", "));
                    path_str.push('>');
                }
            }
            path_str
        }
        other => tokens_to_str(other),
    }
}

fn tokens_to_str(tokens: &impl quote::ToTokens) -> String {
    tokens.to_token_stream().to_string().replace(' ', "")
}

#[cfg(test)]
mod tests {
    use super::{find_clash, mentions_any, ty_to_str};
    use syn::Type;

    fn ty(src: &str) -> Type {
        syn::parse_str(src).unwrap()
    }

    #[test]
    fn envelope_detection() {
        assert!(mentions_any(&ty("Any")));
        assert!(mentions_any(&ty("anybox::Any")));
        assert!(mentions_any(&ty("Option<Box<Any>>")));
        assert!(mentions_any(&ty("BTreeMap<String, Any>")));
        assert!(!mentions_any(&ty("Vec<String>")));
        assert!(!mentions_any(&ty("Box<dyn std::any::Any>")));
    }

    #[test]
    fn wire_name_clash() {
        let taken = vec![
            ("id".to_string(), "id".to_string()),
            ("Title".to_string(), "title".to_string()),
        ];
        assert_eq!(find_clash(&taken, "Title"), Some("title"));
        assert_eq!(find_clash(&taken, "title"), None);
    }

    #[test]
    fn type_tags() {
        assert_eq!(ty_to_str(&ty("u32")), "u32");
        assert_eq!(ty_to_str(&ty("std::vec::Vec<u8>")), "std::vec::Vec<u8>");
        assert_eq!(ty_to_str(&ty("HashMap<String, Vec<Any>>")), "HashMap<String, Vec<Any>>");
        assert_eq!(ty_to_str(&ty("[u8; 4]")), "[u8;4]");
    }
}
