use crate::error::{LaytonError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const LAYTON_DIR: &str = ".layton";
pub const ERRANDS_DIR: &str = ".layton/errands";
pub const PROTOCOLS_DIR: &str = ".layton/protocols";
pub const ROLODEX_DIR: &str = ".layton/rolodex";

pub const CONFIG_FILE: &str = ".layton/config.json";

/// Placeholder file kept in otherwise empty artifact directories.
pub const SENTINEL_FILE: &str = ".gitkeep";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn layton_dir(root: &Path) -> PathBuf {
    root.join(LAYTON_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn errands_dir(root: &Path) -> PathBuf {
    root.join(ERRANDS_DIR)
}

pub fn protocols_dir(root: &Path) -> PathBuf {
    root.join(PROTOCOLS_DIR)
}

pub fn rolodex_dir(root: &Path) -> PathBuf {
    root.join(ROLODEX_DIR)
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Check that `name` is a lowercase identifier usable as a file stem.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(LaytonError::InvalidName(name.to_string()));
    }
    Ok(())
}
