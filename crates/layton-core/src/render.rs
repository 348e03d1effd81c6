//! `${name}` substitution for errand bodies.
//!
//! Substitution never fails: placeholders without a supplied value are left
//! in place, and supplied values with no placeholder are ignored.

use crate::error::{LaytonError, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Runtime values keyed by variable name.
pub type Variables = BTreeMap<String, String>;

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap())
}

/// Replace every `${name}` whose name is in `vars`.
pub fn render(body: &str, vars: &Variables) -> String {
    placeholder_re()
        .replace_all(body, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder names referenced by `body`, deduplicated, in first-seen order.
pub fn placeholders(body: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in placeholder_re().captures_iter(body) {
        let name = caps[1].to_string();
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// Parse caller-supplied JSON into variables.
///
/// Blank input is an empty mapping. Anything other than a JSON object is
/// rejected. String values are taken verbatim; other values use their JSON
/// text.
pub fn parse_variables(raw: &str) -> Result<Variables> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Variables::new());
    }
    let value: Value =
        serde_json::from_str(raw).map_err(|e| LaytonError::InvalidInput(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(LaytonError::InvalidInput(
            "expected a JSON object of variable names to values".to_string(),
        ));
    };
    Ok(obj
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}
