//! Flat `key=value` argument strings.
//!
//! The flat form is the literal argument string a module was written with,
//! e.g. `src=/etc/motd dest='motd copy' mode=0644`. Tokens are split with shell
//! quoting rules. A token is a pair when it has a key made of word characters
//! before its first `=`; anything else is a free-form parameter and is collected,
//! space-joined, under [`RAW_PARAMS_KEY`].
//!
//! Free-form text is written back verbatim, so `decode(encode(tree))` returns
//! `tree` only when the tree has no [`RAW_PARAMS_KEY`] entry. Raw text holding
//! `key=value` words or shell quotes is re-split on the way back in.

use crate::error::{BootstrapError, Result};
use crate::types::{scalar_text, OptionTree};
use serde_json::Value;

/// Key holding the free-form (non key=value) tokens of a flat string.
pub const RAW_PARAMS_KEY: &str = "_raw_params";

/// Decode a flat argument string into a tree of string values.
pub fn decode(args: &str) -> Result<OptionTree> {
    let mut options = OptionTree::new();
    if args.trim().is_empty() {
        return Ok(options);
    }

    let tokens = shlex::split(args)
        .ok_or_else(|| BootstrapError::decode(format!("unbalanced quotes in {:?}", args)))?;

    let mut raw_params: Vec<String> = Vec::new();
    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) if is_key(key) => {
                options.insert(key.to_string(), Value::String(value.to_string()));
            }
            _ => raw_params.push(token),
        }
    }

    if !raw_params.is_empty() {
        options.insert(
            RAW_PARAMS_KEY.to_string(),
            Value::String(raw_params.join(" ")),
        );
    }
    Ok(options)
}

/// Encode a tree back into the flat form.
///
/// Free-form parameters come first, unquoted, so they do not round-trip.
/// Nested trees and sequences are written as quoted JSON; `null` becomes an
/// empty value.
pub fn encode(options: &OptionTree) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(options.len());

    if let Some(raw) = options.get(RAW_PARAMS_KEY).and_then(scalar_text) {
        if !raw.is_empty() {
            parts.push(raw);
        }
    }

    for (key, value) in options {
        if key == RAW_PARAMS_KEY {
            continue;
        }
        let text = match value {
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => value.to_string(),
            scalar => scalar_text(scalar).unwrap_or_default(),
        };
        parts.push(format!("{}={}", key, quote(&text)));
    }

    parts.join(" ")
}

/// Whether `key` can appear on the left of a flat `key=value` token.
pub fn is_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

fn quote(text: &str) -> String {
    // NUL is the only input shlex refuses to quote
    let text = text.replace('\0', "");
    match shlex::try_quote(&text) {
        Ok(quoted) => quoted.into_owned(),
        Err(_) => text,
    }
}
