//! Execution prompts for scheduled items.

use crate::runner::CommandRunner;
use crate::tracker::{Tracker, Transition, LABEL_IN_PROGRESS, LABEL_NEEDS_REVIEW, LABEL_SCHEDULED};

const UNTITLED: &str = "Untitled";

/// An assembled prompt plus how the `scheduled` to `in-progress` swap went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub transition: Transition,
}

/// Build the prompt for item `id`, marking it in progress along the way.
///
/// Returns `None` only when the item cannot be fetched. A failed label
/// transition is logged and otherwise ignored.
pub fn build_prompt<R: CommandRunner>(tracker: &Tracker<R>, id: &str) -> Option<Prompt> {
    let item = tracker.get_item(id)?;

    let transition = tracker.transition_label(id, LABEL_SCHEDULED, LABEL_IN_PROGRESS);
    match &transition {
        Transition::Applied => tracing::debug!(id, "marked in progress"),
        Transition::Unavailable => tracing::warn!(id, "tracker unavailable, labels unchanged"),
        Transition::Failed { step, detail } => {
            tracing::warn!(id, %step, %detail, "label transition failed")
        }
    }

    let comments = tracker.get_comments(id);
    let title = item.title.as_deref().unwrap_or(UNTITLED);
    Some(Prompt {
        text: assemble(id, title, &item.description, &comments),
        transition,
    })
}

/// Lay out header, description, prior comments (when any), and the
/// completion protocol.
pub fn assemble(id: &str, title: &str, description: &str, comments: &str) -> String {
    let mut out = format!("# Errand: {id} - {title}\n\n{description}\n");
    if !comments.is_empty() {
        out.push_str("\n## Context (prior comments)\n\n");
        out.push_str(comments);
        out.push('\n');
    }
    out.push_str(&completion_protocol(id));
    out
}

/// The four closing commands, each on one line in its own fenced block.
fn completion_protocol(id: &str) -> String {
    let steps = [
        (
            "Record findings",
            format!("bd comments add {id} \"## Summary\\n\\n<findings>\""),
        ),
        (
            "Remove the in-progress label",
            format!("bd label remove {id} {LABEL_IN_PROGRESS}"),
        ),
        ("Close the item", format!("bd close {id}")),
        (
            "Flag it for review",
            format!("bd label add {id} {LABEL_NEEDS_REVIEW}"),
        ),
    ];

    let mut out = String::from("\n## Completion Protocol\n\nWhen done:\n");
    for (n, (label, command)) in steps.iter().enumerate() {
        out.push_str(&format!("\n{}. {label}:\n```bash\n{command}\n```\n", n + 1));
    }
    out.push_str(&format!(
        "\nIf BLOCKED: `bd comments add {id} \"BLOCKED: <reason>\"` and do NOT close.\n"
    ));
    out
}
