//! Text-level edits to a decoded `AndroidManifest.xml`.
//!
//! These do not parse XML. They act on the first lexical `<application`
//! occurrence, so a commented-out or nested match earlier in the file wins.

use once_cell::sync::Lazy;
use regex::Regex;

pub const APPLICATION_TAG: &str = "<application";

pub const NETWORK_SECURITY_CONFIG_ATTR: &str = "android:networkSecurityConfig";
pub const NETWORK_SECURITY_CONFIG_VALUE: &str = "@xml/network_security_config";

pub const EXTRACT_NATIVE_LIBS_ATTR: &str = "android:extractNativeLibs";

static EXTRACT_NATIVE_LIBS_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"{}="[^"]*""#, regex::escape(EXTRACT_NATIVE_LIBS_ATTR)))
        .expect("extractNativeLibs pattern is valid")
});

/// What a single transform did to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Inserted,
    Rewritten,
    Unchanged,
}

/// Inserts `attribute` right after the first `<application`. Returns `None`
/// when the manifest has no application tag.
pub fn insert_into_application(content: &str, attribute: &str) -> Option<String> {
    let at = content.find(APPLICATION_TAG)? + APPLICATION_TAG.len();

    let mut patched = String::with_capacity(content.len() + attribute.len() + 1);
    patched.push_str(&content[..at]);
    patched.push(' ');
    patched.push_str(attribute);
    patched.push_str(&content[at..]);

    Some(patched)
}

/// Points the application at `@xml/network_security_config` unless the
/// attribute already appears anywhere (whatever its value).
pub fn network_security_config(content: &str) -> (String, Edit) {
    if content.contains(NETWORK_SECURITY_CONFIG_ATTR) {
        return (content.to_string(), Edit::Unchanged);
    }

    let attribute = format!(
        r#"{}="{}""#,
        NETWORK_SECURITY_CONFIG_ATTR, NETWORK_SECURITY_CONFIG_VALUE
    );

    match insert_into_application(content, &attribute) {
        Some(patched) => (patched, Edit::Inserted),
        None => (content.to_string(), Edit::Unchanged),
    }
}

/// Forces every `android:extractNativeLibs` value to `"true"`, inserting the
/// attribute into the application tag when it is absent.
pub fn extract_native_libs(content: &str) -> (String, Edit) {
    if content.contains(EXTRACT_NATIVE_LIBS_ATTR) {
        let replacement = format!(r#"{}="true""#, EXTRACT_NATIVE_LIBS_ATTR);
        let patched = EXTRACT_NATIVE_LIBS_VALUE
            .replace_all(content, regex::NoExpand(&replacement))
            .into_owned();

        return if patched == content {
            (patched, Edit::Unchanged)
        } else {
            (patched, Edit::Rewritten)
        };
    }

    let attribute = format!(r#"{}="true""#, EXTRACT_NATIVE_LIBS_ATTR);

    match insert_into_application(content, &attribute) {
        Some(patched) => (patched, Edit::Inserted),
        None => (content.to_string(), Edit::Unchanged),
    }
}
