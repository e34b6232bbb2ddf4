extern crate proc_macro;

mod generate;
mod load;
mod model;

use crate::model::DeriveReflect;
use proc_macro::TokenStream;

/// Derive `argbind::Typed` (and `argbind::Reflect` for records).
///
/// * Structs with named fields become records; each field becomes a parameter.
/// * Enums whose variants all wrap a record become tagged unions, selected by a discriminant argument.
/// * Enums whose variants are all units become a fixed set of choices.
///
/// Field attributes: `#[argbind(help = "..")]`, `#[argbind(default = <expr>)]`, `#[argbind(default)]`,
/// `#[argbind(from_str)]`, `#[argbind(skip)]`.
/// Struct attributes: `#[argbind(forward = Base)]` (repeatable).
/// Enum attributes: `#[argbind(prefix = false)]`; variant attribute `#[argbind(label = "..")]`.
#[proc_macro_derive(Reflect, attributes(argbind))]
pub fn reflect(input: TokenStream) -> TokenStream {
    let derive_input = syn::parse_macro_input!(input as syn::DeriveInput);

    DeriveReflect::try_from(derive_input)
        .map(DeriveReflect::generate)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
