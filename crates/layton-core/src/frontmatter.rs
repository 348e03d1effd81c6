//! Line-oriented frontmatter for `.layton` markdown files.
//!
//! A document opens with a `---` line, carries `key: value` lines, and closes
//! with a second `---` line. Two dialects share the block syntax:
//!
//! - [`parse`]: flat fields plus an indented `variables:` mapping (errands,
//!   rolodex cards).
//! - [`parse_with_lists`]: flat fields plus `- item` lists under a bare `key:`
//!   line (protocol triggers).
//!
//! Blank lines and `#` comments are skipped. Later keys overwrite earlier
//! ones. A block that yields no fields is treated as absent.

use serde::Serialize;
use std::collections::BTreeMap;

/// Key that opens the nested variables mapping.
pub const VARIABLES_KEY: &str = "variables";

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Frontmatter {
    fields: BTreeMap<String, FieldValue>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// List value for `key`. A scalar is promoted to a one-element list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(FieldValue::List(items)) => items.clone(),
            Some(FieldValue::Text(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn variables(&self) -> BTreeMap<String, String> {
        match self.fields.get(VARIABLES_KEY) {
            Some(FieldValue::Map(vars)) => vars.clone(),
            _ => BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    /// Serialize back to a delimited block, including both `---` lines.
    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in &self.fields {
            match value {
                FieldValue::Text(s) => out.push_str(&format!("{key}: {s}\n")),
                FieldValue::List(items) => {
                    out.push_str(&format!("{key}:\n"));
                    for item in items {
                        out.push_str(&format!("  - {item}\n"));
                    }
                }
                FieldValue::Map(map) => {
                    out.push_str(&format!("{key}:\n"));
                    for (k, v) in map {
                        out.push_str(&format!("  {k}: {v}\n"));
                    }
                }
            }
        }
        out.push_str("---\n");
        out
    }

    fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

// ---------------------------------------------------------------------------
// Block extraction
// ---------------------------------------------------------------------------

/// Split `content` into the lines between the delimiters and the text after
/// the closing delimiter line.
fn split_block(content: &str) -> Option<(Vec<&str>, &str)> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if !first.ends_with('\n') || first.trim_end() != DELIMITER {
        return None;
    }

    let mut offset = first.len();
    let mut block = Vec::new();
    for line in lines {
        offset += line.len();
        let text = line.trim_end_matches(['\n', '\r']);
        if text.trim_end() == DELIMITER {
            return Some((block, &content[offset..]));
        }
        block.push(text);
    }
    None
}

/// Everything after the closing delimiter, minus leading blank lines.
/// Empty when the document has no delimited block.
pub fn body(content: &str) -> &str {
    let Some((_, mut rest)) = split_block(content) else {
        return "";
    };
    while let Some(pos) = rest.find('\n') {
        if rest[..pos].trim().is_empty() {
            rest = &rest[pos + 1..];
        } else {
            break;
        }
    }
    rest
}

fn is_comment_or_blank(stripped: &str) -> bool {
    stripped.is_empty() || stripped.starts_with('#')
}

// ---------------------------------------------------------------------------
// Dialects
// ---------------------------------------------------------------------------

/// Parse flat fields plus an indented `variables:` mapping.
pub fn parse(content: &str) -> Option<Frontmatter> {
    let (block, _) = split_block(content)?;

    let mut fm = Frontmatter::default();
    let mut variables = BTreeMap::new();
    let mut in_variables = false;

    for line in block {
        let stripped = line.trim();
        if is_comment_or_blank(stripped) {
            continue;
        }
        if stripped == "variables:" {
            in_variables = true;
            continue;
        }

        let indented = line.starts_with("  ");
        if in_variables && stripped.contains(':') {
            if indented {
                if let Some((name, desc)) = stripped.split_once(':') {
                    variables.insert(name.trim().to_string(), desc.trim().to_string());
                }
                continue;
            }
            in_variables = false;
        }

        if let Some((key, value)) = stripped.split_once(':') {
            fm.insert(key.trim(), FieldValue::Text(value.trim().to_string()));
        }
    }

    if !variables.is_empty() {
        fm.insert(VARIABLES_KEY, FieldValue::Map(variables));
    }
    fm.into_option()
}

/// Parse flat fields plus `- item` lists under bare `key:` lines.
pub fn parse_with_lists(content: &str) -> Option<Frontmatter> {
    let (block, _) = split_block(content)?;

    let mut fm = Frontmatter::default();
    let mut current_key: Option<String> = None;
    let mut items: Vec<String> = Vec::new();

    let flush = |fm: &mut Frontmatter, key: &Option<String>, items: &mut Vec<String>| {
        if let Some(key) = key {
            if !items.is_empty() {
                fm.insert(key.clone(), FieldValue::List(std::mem::take(items)));
            }
        }
        items.clear();
    };

    for line in block {
        let stripped = line.trim();
        if is_comment_or_blank(stripped) {
            continue;
        }

        if current_key.is_some() {
            if let Some(item) = stripped.strip_prefix("- ") {
                items.push(item.trim().to_string());
                continue;
            }
        }

        if let Some((key, value)) = stripped.split_once(':') {
            flush(&mut fm, &current_key, &mut items);
            let key = key.trim().to_string();
            let value = value.trim();
            if !value.is_empty() {
                fm.insert(key.clone(), FieldValue::Text(value.to_string()));
            }
            current_key = Some(key);
        }
    }
    flush(&mut fm, &current_key, &mut items);

    fm.into_option()
}
