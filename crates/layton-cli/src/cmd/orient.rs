use crate::output::{print_next_steps, print_success};
use anyhow::Context;
use layton_core::{
    config::Config,
    store::{ArtifactKind, TemplateStore},
    tracker::Tracker,
};
use std::path::Path;

/// Summarize everything the assistant needs at the start of a session:
/// config presence, inventories, and the item queues.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let tracker = Tracker::new(root);
    tracker.require_available()?;

    let needs_setup = !Config::exists(root);
    let cards = TemplateStore::for_kind(root, ArtifactKind::Rolodex)
        .list_cards()
        .context("failed to list rolodex cards")?;
    let protocols = TemplateStore::for_kind(root, ArtifactKind::Protocol)
        .list_protocols()
        .context("failed to list protocols")?;
    let errands = TemplateStore::for_kind(root, ArtifactKind::Errand)
        .list()
        .context("failed to list errands")?;

    let scheduled = tracker.scheduled();
    let in_progress = tracker.in_progress();
    let pending_review = tracker.pending_review();

    let mut next_steps = Vec::new();
    if needs_setup {
        next_steps.push("Run 'layton config init' for quick setup".to_string());
    }
    if cards.is_empty() {
        next_steps.push("Run 'layton rolodex add <name>' to create a card".to_string());
    }
    if protocols.is_empty() {
        next_steps.push("Run 'layton protocols add <name>' to create a protocol".to_string());
    }
    if !pending_review.is_empty() {
        next_steps.push(format!("{} item(s) pending review", pending_review.len()));
    }

    if json {
        return print_success(
            &serde_json::json!({
                "needs_setup": needs_setup,
                "bd_available": true,
                "rolodex": cards,
                "protocols": protocols,
                "errands": {
                    "templates": errands,
                    "queue": {
                        "scheduled": scheduled,
                        "in_progress": in_progress,
                        "pending_review": pending_review,
                    },
                },
            }),
            &next_steps,
        );
    }

    println!("Project: {}", root.display());
    println!(
        "Config: {}",
        if needs_setup { "missing" } else { "present" }
    );
    println!();
    println!("Rolodex: {} card(s)", cards.len());
    for c in &cards {
        println!("  {}  {}", c.name, c.description);
    }
    println!("Protocols: {}", protocols.len());
    for p in &protocols {
        println!("  {}  {}", p.name, p.description);
    }
    println!("Errands: {}", errands.len());
    for e in &errands {
        println!("  {}  {}", e.name, e.description);
    }
    println!();
    println!(
        "Queue: {} scheduled, {} in progress, {} pending review",
        scheduled.len(),
        in_progress.len(),
        pending_review.len()
    );
    print_next_steps(&next_steps);
    Ok(())
}
