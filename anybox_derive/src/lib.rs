mod reflect;

use proc_macro::TokenStream;
use proc_macro_error::{abort, proc_macro_error};
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput};

/// Implements `anybox::Reflect`.
///
/// Named and multi-field tuple structs become struct kinds with one field descriptor per field,
/// single-field tuple structs become aliased primitives.
#[proc_macro_derive(Reflect, attributes(anybox))]
#[proc_macro_error]
pub fn reflect_fn(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    if input.generics.lt_token.is_some() {
        abort!(input.generics.span(), "Generics are not supported");
    }
    let container = reflect::ContainerAttrs::parse(&input.attrs);

    let ident = input.ident;
    let ident_str = ident.to_string();
    let name = match container.name {
        Some(name) => quote!(#name),
        None => quote!(::std::format!("{}::{}", ::std::module_path!(), #ident_str)),
    };

    let ts = match input.data {
        Data::Struct(ds) => reflect::process_struct(&ident, name, ds),
        Data::Enum(de) => {
            abort!(
                de.enum_token.span(),
                "Enums are not supported, implement Reflect with TypeInfo::opaque"
            );
        }
        Data::Union(du) => {
            abort!(du.union_token.span(), "Unions are not supported");
        }
    };
    // eprintln!("{ts}");
    ts.into()
}
