use crate::error::{LaytonError, Result};
use crate::frontmatter::{self, Frontmatter};
use crate::{paths, templates};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Errand,
    Protocol,
    Rolodex,
}

impl ArtifactKind {
    pub fn dir(self, root: &Path) -> PathBuf {
        match self {
            ArtifactKind::Errand => paths::errands_dir(root),
            ArtifactKind::Protocol => paths::protocols_dir(root),
            ArtifactKind::Rolodex => paths::rolodex_dir(root),
        }
    }

    pub fn default_skeleton(self) -> &'static str {
        match self {
            ArtifactKind::Errand => templates::ERRAND_SKELETON,
            ArtifactKind::Protocol => templates::PROTOCOL_SKELETON,
            ArtifactKind::Rolodex => templates::ROLODEX_SKELETON,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactKind::Errand => "errand",
            ArtifactKind::Protocol => "protocol",
            ArtifactKind::Rolodex => "rolodex card",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Parsed documents
// ---------------------------------------------------------------------------

/// A stored errand template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub name: String,
    pub description: String,
    /// Documentation only: rendering neither requires nor restricts these.
    pub variables: BTreeMap<String, String>,
    #[serde(skip_serializing)]
    pub body: String,
    pub path: PathBuf,
}

impl Definition {
    fn from_parts(fallback_name: &str, fm: &Frontmatter, body: &str, path: PathBuf) -> Self {
        Self {
            name: fm.text("name").unwrap_or(fallback_name).to_string(),
            description: fm.text("description").unwrap_or_default().to_string(),
            variables: fm.variables(),
            body: body.to_string(),
            path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Protocol {
    pub name: String,
    pub description: String,
    pub triggers: Vec<String>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub name: String,
    pub description: String,
    pub source: String,
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// TemplateStore
// ---------------------------------------------------------------------------

/// One directory of `<name>.md` documents plus the skeleton used to add more.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
    skeleton: String,
}

struct Entry {
    path: PathBuf,
    stem: String,
    frontmatter: Frontmatter,
    body: String,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>, skeleton: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            skeleton: skeleton.into(),
        }
    }

    pub fn for_kind(root: &Path, kind: ArtifactKind) -> Self {
        Self::new(kind.dir(root), kind.default_skeleton())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.md"))
    }

    /// Parse every `*.md` file with `parse`, keeping those that declare a
    /// `name`. Unreadable files are skipped. Sorted by name.
    fn scan(&self, parse: fn(&str) -> Option<Frontmatter>) -> Result<Vec<Entry>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dirent in std::fs::read_dir(&self.dir)? {
            let path = dirent?.path();
            let is_markdown = path.extension().is_some_and(|ext| ext == "md");
            let is_sentinel = path
                .file_name()
                .is_some_and(|n| n == paths::SENTINEL_FILE);
            if !is_markdown || is_sentinel || !path.is_file() {
                continue;
            }

            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            let Some(fm) = parse(&content) else {
                continue;
            };
            if !fm.contains("name") {
                continue;
            }
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let body = frontmatter::body(&content).to_string();
            entries.push(Entry {
                path,
                stem,
                frontmatter: fm,
                body,
            });
        }

        entries.sort_by(|a, b| entry_name(a).cmp(entry_name(b)));
        Ok(entries)
    }

    /// List errand definitions. A missing directory yields an empty list.
    pub fn list(&self) -> Result<Vec<Definition>> {
        Ok(self
            .scan(frontmatter::parse)?
            .into_iter()
            .map(|e| Definition::from_parts(&e.stem, &e.frontmatter, &e.body, e.path))
            .collect())
    }

    pub fn list_protocols(&self) -> Result<Vec<Protocol>> {
        Ok(self
            .scan(frontmatter::parse_with_lists)?
            .into_iter()
            .map(|e| Protocol {
                name: entry_name(&e).to_string(),
                description: e.frontmatter.text("description").unwrap_or_default().to_string(),
                triggers: e.frontmatter.list("triggers"),
                path: e.path,
            })
            .collect())
    }

    pub fn list_cards(&self) -> Result<Vec<Card>> {
        Ok(self
            .scan(frontmatter::parse)?
            .into_iter()
            .map(|e| Card {
                name: entry_name(&e).to_string(),
                description: e.frontmatter.text("description").unwrap_or_default().to_string(),
                source: e.frontmatter.text("source").unwrap_or_default().to_string(),
                path: e.path,
            })
            .collect())
    }

    /// Load `<name>.md` with its body. A file without frontmatter is not a
    /// definition and reports as not found.
    pub fn load(&self, name: &str) -> Result<Definition> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(LaytonError::DefinitionNotFound(name.to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        let fm = frontmatter::parse(&content)
            .ok_or_else(|| LaytonError::DefinitionNotFound(name.to_string()))?;
        Ok(Definition::from_parts(
            name,
            &fm,
            frontmatter::body(&content),
            path,
        ))
    }

    /// Create `<name>.md` from the skeleton. Never overwrites.
    pub fn add(&self, name: &str) -> Result<PathBuf> {
        let path = self.path_for(name);
        if path.exists() {
            return Err(LaytonError::DefinitionExists(path));
        }
        std::fs::create_dir_all(&self.dir)?;

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(LaytonError::DefinitionExists(path));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(templates::instantiate(&self.skeleton, name).as_bytes())?;
        tracing::debug!(path = %path.display(), "created from skeleton");
        Ok(path)
    }
}

fn entry_name(entry: &Entry) -> &str {
    entry.frontmatter.text("name").unwrap_or(&entry.stem)
}
