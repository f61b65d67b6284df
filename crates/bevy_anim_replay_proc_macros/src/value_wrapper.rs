use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Ident, Path, parenthesized, parse_macro_input};

struct UnwrapError {
    error: Path,
    variant: Ident,
}

pub(crate) fn value_wrapper(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "ValueWrapper only works on enums.",
        ));
    };

    let unwrap_error = parse_unwrap_error(input)?;
    let error_path = &unwrap_error.error;
    let error_variant = &unwrap_error.variant;

    let mut name_arms = Vec::new();
    let mut accessors = Vec::new();
    let mut conversions = Vec::new();

    for variant in &data_enum.variants {
        let variant_ident = &variant.ident;
        let variant_str = variant_ident.to_string();

        let Fields::Unnamed(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "ValueWrapper variants must have exactly one unnamed field",
            ));
        };
        if fields.unnamed.len() != 1 {
            return Err(syn::Error::new_spanned(
                variant,
                "ValueWrapper variants must have exactly one unnamed field",
            ));
        }
        let inner_ty = &fields.unnamed[0].ty;

        let trivial_copy = variant
            .attrs
            .iter()
            .any(|attr| attr.path().is_ident("trivial_copy"));

        let accessor = format_ident!("as_{}", to_snake_case(&variant_str));

        name_arms.push(quote! {
            #name::#variant_ident(_) => #variant_str
        });

        let mismatch = quote! {
            other => Err(#error_path::#error_variant(
                #variant_str.to_string(),
                other.variant_name().to_string(),
            ))
        };

        if trivial_copy {
            accessors.push(quote! {
                pub fn #accessor(&self) -> ::core::result::Result<#inner_ty, #error_path> {
                    match self {
                        #name::#variant_ident(value) => Ok(*value),
                        #mismatch,
                    }
                }
            });
        } else {
            accessors.push(quote! {
                pub fn #accessor(&self) -> ::core::result::Result<&#inner_ty, #error_path> {
                    match self {
                        #name::#variant_ident(value) => Ok(value),
                        #mismatch,
                    }
                }
            });
        }

        conversions.push(quote! {
            impl From<#inner_ty> for #name {
                fn from(value: #inner_ty) -> Self {
                    #name::#variant_ident(value)
                }
            }
        });
    }

    Ok(quote! {
        impl #name {
            /// Name of the variant currently held.
            pub fn variant_name(&self) -> &'static str {
                match self {
                    #(#name_arms,)*
                }
            }

            #(#accessors)*
        }

        #(#conversions)*
    })
}

fn parse_unwrap_error(input: &DeriveInput) -> syn::Result<UnwrapError> {
    let Some(attr) = input
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("unwrap_error"))
    else {
        return Err(syn::Error::new_spanned(
            input,
            "ValueWrapper requires an #[unwrap_error(error(..), variant(..))] attribute",
        ));
    };

    let mut error = None;
    let mut variant = None;

    attr.parse_nested_meta(|meta| {
        let content;
        parenthesized!(content in meta.input);
        if meta.path.is_ident("error") {
            error = Some(content.parse::<Path>()?);
            Ok(())
        } else if meta.path.is_ident("variant") {
            variant = Some(content.parse::<Ident>()?);
            Ok(())
        } else {
            Err(meta.error("expected `error` or `variant`"))
        }
    })?;

    match (error, variant) {
        (Some(error), Some(variant)) => Ok(UnwrapError { error, variant }),
        _ => Err(syn::Error::new_spanned(
            attr,
            "unwrap_error needs both `error(..)` and `variant(..)`",
        )),
    }
}

fn to_snake_case(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for (i, ch) in camel.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
