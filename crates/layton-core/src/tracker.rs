//! Gateway to the `bd` issue tracker.
//!
//! Every tracker interaction goes through [`Tracker`]. Write paths (epic and
//! item creation) fail loudly with a typed error. Read paths (label queries,
//! item fetch, comments, label transitions) degrade to empty or absent values.
//!
//! The tracker owns all item state. Nothing here caches items; every read
//! re-queries.

use crate::config::Config;
use crate::error::{LaytonError, Result};
use crate::runner::{CommandOutput, CommandRunner, SystemRunner};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

pub const TRACKER_PROGRAM: &str = "bd";

/// Config key holding the parent epic ID.
pub const EPIC_KEY: &str = "errands.epic";
pub const DEFAULT_EPIC_TITLE: &str = "Background Tasks";

pub const LABEL_SCHEDULED: &str = "scheduled";
pub const LABEL_IN_PROGRESS: &str = "in-progress";
pub const LABEL_NEEDS_REVIEW: &str = "needs-review";

/// Banner prefixes `bd` writes ahead of real output.
const DIAGNOSTIC_PREFIXES: [&str; 3] = ["Note:", "Warning:", "\u{26a0}"];
const NO_COMMENTS_SENTINEL: &str = "No comments on";

// ---------------------------------------------------------------------------
// TrackedItem
// ---------------------------------------------------------------------------

/// An item as reported by the tracker. `bd` may name the identifier `id` or
/// `number`; both normalize to `id`. Unrecognized fields are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct TrackedItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub labels: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for TrackedItem {
    type Error = String;

    fn try_from(mut map: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let id = take_id(&mut map).ok_or_else(|| "item has no id or number field".to_string())?;
        let title = take_string(&mut map, "title");
        let description = take_string(&mut map, "description").unwrap_or_default();
        let status = take_string(&mut map, "status");
        let labels = match map.remove("labels") {
            Some(Value::Array(values)) => values
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Ok(Self {
            id,
            title,
            description,
            status,
            labels,
            extra: map,
        })
    }
}

impl TrackedItem {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn take_id(map: &mut Map<String, Value>) -> Option<String> {
    let id = map.remove("id");
    let number = map.remove("number");
    id.as_ref()
        .and_then(scalar_text)
        .or_else(|| number.as_ref().and_then(scalar_text))
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

/// Identifier of a create response, under either accepted field name.
pub fn response_id(response: &Value) -> Option<String> {
    ["id", "number"]
        .iter()
        .find_map(|key| response.get(key).and_then(scalar_text))
}

/// `bd show` prints either an array (only the first element is decoded) or a
/// bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ShowResponse {
    Many(Vec<Value>),
    One(TrackedItem),
}

impl ShowResponse {
    fn into_item(self) -> Option<TrackedItem> {
        match self {
            ShowResponse::Many(items) => match items.into_iter().next()? {
                Value::Object(map) => TrackedItem::try_from(map).ok(),
                _ => None,
            },
            ShowResponse::One(item) => Some(item),
        }
    }
}

/// Decode JSON from `raw`, skipping any leading diagnostic text.
fn decode_json<T: serde::de::DeserializeOwned>(raw: &str) -> std::result::Result<T, serde_json::Error> {
    match serde_json::from_str(raw.trim()) {
        Ok(v) => Ok(v),
        Err(e) => match raw.find(['[', '{']) {
            Some(start) if start > 0 => serde_json::from_str(raw[start..].trim_end()),
            _ => Err(e),
        },
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStep {
    Remove,
    Add,
}

impl fmt::Display for LabelStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelStep::Remove => f.write_str("remove"),
            LabelStep::Add => f.write_str("add"),
        }
    }
}

/// Outcome of a label swap. Advisory: callers log it and carry on.
///
/// The swap is two tracker calls. `Failed { step: Add, .. }` means the old
/// label is already gone and the item carries neither label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Unavailable,
    Failed { step: LabelStep, detail: String },
}

impl Transition {
    pub fn succeeded(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

// ---------------------------------------------------------------------------
// NewItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub parent: String,
    pub labels: Vec<String>,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

pub struct Tracker<R = SystemRunner> {
    root: PathBuf,
    program: String,
    runner: R,
}

impl Tracker<SystemRunner> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_runner(root, SystemRunner)
    }
}

impl<R: CommandRunner> Tracker<R> {
    pub fn with_runner(root: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            root: root.into(),
            program: TRACKER_PROGRAM.to_string(),
            runner,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn is_available(&self) -> bool {
        self.runner.is_available(&self.program)
    }

    pub fn require_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(LaytonError::TrackerUnavailable {
                program: self.program.clone(),
            })
        }
    }

    fn invoke(&self, args: &[&str]) -> CommandOutput {
        tracing::debug!(program = %self.program, ?args, "invoking tracker");
        self.runner.run(&self.program, args)
    }

    // -----------------------------------------------------------------------
    // Epic
    // -----------------------------------------------------------------------

    /// Configured epic ID, read from project config. No tracker call.
    pub fn get_epic(&self) -> Result<Option<String>> {
        Ok(Config::load(&self.root)?.get_string(EPIC_KEY))
    }

    pub fn set_epic(&self, id: &str) -> Result<()> {
        let mut cfg = Config::load(&self.root)?;
        cfg.set(EPIC_KEY, Value::String(id.to_string()));
        cfg.save(&self.root)
    }

    pub fn create_epic(&self, title: &str) -> Result<String> {
        self.require_available()?;
        let out = self.invoke(&["create", "--title", title, "--type", "epic", "--json"]);
        if !out.success {
            return Err(LaytonError::Tracker(out.failure_detail()));
        }
        let response: Value = decode_json(&out.stdout)
            .map_err(|e| LaytonError::Tracker(format!("invalid JSON response: {e}")))?;
        response_id(&response).ok_or_else(|| {
            LaytonError::Tracker(format!("no ID in response: {}", out.stdout.trim()))
        })
    }

    /// Configured epic, creating and persisting one on first use.
    pub fn ensure_epic(&self) -> Result<String> {
        if let Some(epic) = self.get_epic()? {
            return Ok(epic);
        }
        let epic = self.create_epic(DEFAULT_EPIC_TITLE)?;
        self.set_epic(&epic)?;
        tracing::info!(epic = %epic, "created errands epic");
        Ok(epic)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Create an item. Returns the tracker's JSON response, or
    /// `{"output": <text>}` when the response is not JSON.
    pub fn create_item(&self, item: &NewItem) -> Result<Value> {
        self.require_available()?;
        let labels = item.labels.join(",");
        let mut args = vec![
            "create",
            "--title",
            item.title.as_str(),
            "--parent",
            item.parent.as_str(),
        ];
        if !item.labels.is_empty() {
            args.extend(["--labels", labels.as_str()]);
        }
        args.extend(["--description", item.description.as_str(), "--json"]);

        let out = self.invoke(&args);
        if !out.success {
            return Err(LaytonError::Tracker(out.failure_detail()));
        }
        Ok(decode_json(&out.stdout)
            .unwrap_or_else(|_| serde_json::json!({ "output": out.stdout.trim() })))
    }

    /// Items carrying `label`, optionally filtered by status. Empty on any
    /// failure: callers cannot tell "none" from "query failed".
    pub fn query_by_label(&self, label: &str, status: Option<&str>) -> Vec<TrackedItem> {
        if !self.is_available() {
            return Vec::new();
        }
        let mut args = vec!["list", "-l", label];
        if let Some(status) = status {
            args.extend(["-s", status]);
        }
        args.extend(["--json", "--limit", "0"]);

        let out = self.invoke(&args);
        if !out.success {
            tracing::warn!(label, detail = %out.failure_detail(), "label query failed");
            return Vec::new();
        }
        parse_item_list(&out.stdout)
    }

    pub fn scheduled(&self) -> Vec<TrackedItem> {
        self.query_by_label(LABEL_SCHEDULED, Some("open"))
    }

    pub fn in_progress(&self) -> Vec<TrackedItem> {
        self.query_by_label(LABEL_IN_PROGRESS, Some("open"))
    }

    pub fn pending_review(&self) -> Vec<TrackedItem> {
        self.query_by_label(LABEL_NEEDS_REVIEW, Some("closed"))
    }

    /// Fetch one item. `None` when missing, unparseable, or the tracker is
    /// unavailable.
    pub fn get_item(&self, id: &str) -> Option<TrackedItem> {
        if !self.is_available() {
            return None;
        }
        let out = self.invoke(&["show", id, "--json"]);
        if !out.success {
            tracing::debug!(id, detail = %out.failure_detail(), "show failed");
            return None;
        }
        match decode_json::<ShowResponse>(&out.stdout) {
            Ok(resp) => resp.into_item(),
            Err(e) => {
                tracing::warn!(id, error = %e, "unparseable show response");
                None
            }
        }
    }

    /// Comment text for an item, with tracker banners removed. Empty when
    /// there are none or the call fails.
    pub fn get_comments(&self, id: &str) -> String {
        if !self.is_available() {
            return String::new();
        }
        let out = self.invoke(&["comments", id]);
        if !out.success {
            return String::new();
        }
        clean_comments(&out.stdout)
    }

    /// Swap `from` for `to` on an item: remove, then add. Not atomic.
    pub fn transition_label(&self, id: &str, from: &str, to: &str) -> Transition {
        if !self.is_available() {
            return Transition::Unavailable;
        }
        let removed = self.invoke(&["label", "remove", id, from]);
        if !removed.success {
            return Transition::Failed {
                step: LabelStep::Remove,
                detail: removed.failure_detail(),
            };
        }
        let added = self.invoke(&["label", "add", id, to]);
        if !added.success {
            return Transition::Failed {
                step: LabelStep::Add,
                detail: added.failure_detail(),
            };
        }
        Transition::Applied
    }
}

/// Decode a `bd list` response starting at the first `[`. Elements without
/// an identifier are dropped.
pub fn parse_item_list(raw: &str) -> Vec<TrackedItem> {
    let Some(start) = raw.find('[') else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Value>>(raw[start..].trim_end()) {
        Ok(values) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => TrackedItem::try_from(map).ok(),
                _ => None,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "unparseable list response");
            Vec::new()
        }
    }
}

fn clean_comments(raw: &str) -> String {
    let kept: Vec<&str> = raw
        .trim()
        .lines()
        .filter(|line| !DIAGNOSTIC_PREFIXES.iter().any(|p| line.starts_with(p)))
        .collect();
    let text = kept.join("\n");
    let text = text.trim();
    if text.starts_with(NO_COMMENTS_SENTINEL) {
        String::new()
    } else {
        text.to_string()
    }
}
