use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

mod utils;

/// Derives `label()`, `VARIANTS` and `Display` for a fieldless enum.
///
/// Variant names are split on camel-case boundaries (`BaseLocated` becomes
/// `"Base Located"`) unless the variant carries `#[label = "..."]`.
#[proc_macro_derive(EnumLabel, attributes(label))]
pub fn derive_enum_label(input: TokenStream) -> TokenStream {
    let derive_input = parse_macro_input!(input as DeriveInput);

    match expand_enum_label(&derive_input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand_enum_label(derive_input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &derive_input.ident;
    let (impl_generics, ty_generics, where_clause) = derive_input.generics.split_for_impl();

    let Data::Enum(data) = &derive_input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "EnumLabel can only be derived for enums",
        ));
    };

    let mut label_arms = Vec::with_capacity(data.variants.len());
    let mut variants = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "EnumLabel variants cannot carry fields",
            ));
        }

        let variant_ident = &variant.ident;
        let label = match utils::label_override(&variant.attrs)? {
            Some(label) => label,
            None => utils::separate_words(&variant_ident.to_string()),
        };

        label_arms.push(quote! { Self::#variant_ident => #label });
        variants.push(quote! { Self::#variant_ident });
    }

    Ok(quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            pub const VARIANTS: &'static [Self] = &[#(#variants),*];

            pub fn label(&self) -> &'static str {
                match self {
                    #(#label_arms),*
                }
            }
        }

        impl #impl_generics ::std::fmt::Display for #ident #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.label())
            }
        }
    })
}
