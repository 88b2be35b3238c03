use syn::{Attribute, Expr, ExprLit, Lit, Meta};

/// Splits a camel-case identifier into space separated words.
///
/// Runs of capitals stay together (`APKSplit` becomes `"APK Split"`).
pub(crate) fn separate_words(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut result = String::with_capacity(ident.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());

            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                result.push(' ');
            }
        }

        result.push(c);
    }

    result
}

/// Reads `#[label = "..."]` from a variant's attributes.
pub(crate) fn label_override(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident("label") {
            continue;
        }

        return match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Ok(Some(s.value())),
                other => Err(syn::Error::new_spanned(other, "expected a string literal")),
            },
            other => Err(syn::Error::new_spanned(other, "expected `#[label = \"...\"]`")),
        };
    }

    Ok(None)
}
