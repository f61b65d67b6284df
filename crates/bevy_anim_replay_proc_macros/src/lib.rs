mod value_wrapper;

use proc_macro::TokenStream;

use crate::value_wrapper::value_wrapper;

/// Typed accessors (`as_<variant>`) and `From` conversions for single-field enum variants.
///
/// The error returned on a mismatched variant is configured with
/// `#[unwrap_error(error(path::to::Error), variant(VariantName))]`, where the variant takes the
/// expected and found variant names as two `String`s. Variants marked `#[trivial_copy]` are
/// returned by value, all others by reference.
#[proc_macro_derive(ValueWrapper, attributes(unwrap_error, trivial_copy))]
pub fn derive_value_wrapper(input: TokenStream) -> TokenStream {
    value_wrapper(input)
}
