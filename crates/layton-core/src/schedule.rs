//! Turning errand definitions into tracker items.

use crate::error::{LaytonError, Result};
use crate::render::{self, Variables};
use crate::runner::CommandRunner;
use crate::store::TemplateStore;
use crate::tracker::{self, NewItem, Tracker, LABEL_SCHEDULED};
use serde::Serialize;
use serde_json::Value;

/// What `run` reports back: just enough to hand the item to an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledItem {
    pub bead_id: String,
    pub title: String,
}

/// `[<name>] <description>`, or `[<name>]` when the description is empty.
pub fn item_title(name: &str, description: &str) -> String {
    if description.is_empty() {
        format!("[{name}]")
    } else {
        format!("[{name}] {description}")
    }
}

pub fn type_label(name: &str) -> String {
    format!("type:{name}")
}

/// Render definition `name` and create a `scheduled` item under the
/// configured epic.
///
/// Checks run in a fixed order: tracker availability, then epic, then
/// definition. Nothing is created unless all three pass. Returns the
/// tracker's create response unchanged.
pub fn schedule<R: CommandRunner>(
    store: &TemplateStore,
    tracker: &Tracker<R>,
    name: &str,
    vars: &Variables,
) -> Result<Value> {
    tracker.require_available()?;
    let epic = tracker.get_epic()?.ok_or(LaytonError::NoEpic)?;
    let definition = store.load(name)?;

    let description = render::render(&definition.body, vars);
    let unresolved: Vec<String> = render::placeholders(&description)
        .into_iter()
        .filter(|p| !vars.contains_key(p))
        .collect();
    if !unresolved.is_empty() {
        tracing::debug!(errand = name, ?unresolved, "placeholders left unrendered");
    }

    let item = NewItem {
        title: item_title(name, &definition.description),
        parent: epic,
        labels: vec![LABEL_SCHEDULED.to_string(), type_label(name)],
        description,
    };
    let response = tracker.create_item(&item)?;
    tracing::info!(errand = name, parent = %item.parent, "scheduled errand");
    Ok(response)
}

/// Schedule `name`, provisioning the epic first if none is configured.
pub fn run<R: CommandRunner>(
    store: &TemplateStore,
    tracker: &Tracker<R>,
    name: &str,
    vars: &Variables,
) -> Result<ScheduledItem> {
    tracker.require_available()?;
    tracker.ensure_epic()?;
    let response = schedule(store, tracker, name, vars)?;
    let bead_id = tracker::response_id(&response).ok_or_else(|| {
        LaytonError::Tracker(format!("no ID in create response: {response}"))
    })?;
    let title = response
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(ScheduledItem { bead_id, title })
}
