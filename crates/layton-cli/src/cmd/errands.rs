use crate::output::{print_next_steps, print_success, print_table};
use anyhow::Context;
use clap::Subcommand;
use layton_core::{
    paths, prompt,
    render::{self, Variables},
    schedule,
    store::{ArtifactKind, TemplateStore},
    tracker::{TrackedItem, Tracker},
    LaytonError,
};
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand, Default)]
pub enum ErrandsSubcommand {
    /// List errand definitions
    #[default]
    List,

    /// Create a new errand definition from the starter template
    Add { name: String },

    /// Create a tracker item from an errand (epic must be configured)
    Schedule {
        name: String,
        /// Variables as a JSON object; read from stdin when omitted and piped
        vars: Option<String>,
    },

    /// Schedule an errand, creating the epic first if needed
    Run {
        name: String,
        /// Variables as a JSON object; read from stdin when omitted and piped
        vars: Option<String>,
    },

    /// Print the execution prompt for an item and mark it in progress
    Prompt { id: String },

    /// Show or set the parent epic
    Epic {
        #[command(subcommand)]
        action: Option<EpicAction>,
    },

    /// Show scheduled, in-progress, and pending-review items
    Queue,
}

#[derive(Subcommand)]
pub enum EpicAction {
    /// Record an existing tracker item as the epic
    Set { id: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ErrandsSubcommand, json: bool) -> anyhow::Result<()> {
    let store = TemplateStore::for_kind(root, ArtifactKind::Errand);
    match subcmd {
        ErrandsSubcommand::List => list(&store, json),
        ErrandsSubcommand::Add { name } => add(&store, &name, json),
        ErrandsSubcommand::Schedule { name, vars } => {
            schedule_cmd(root, &store, &name, vars.as_deref(), json)
        }
        ErrandsSubcommand::Run { name, vars } => run_cmd(root, &store, &name, vars.as_deref(), json),
        ErrandsSubcommand::Prompt { id } => prompt_cmd(root, &id, json),
        ErrandsSubcommand::Epic { action: None } => epic_show(root, json),
        ErrandsSubcommand::Epic {
            action: Some(EpicAction::Set { id }),
        } => epic_set(root, &id, json),
        ErrandsSubcommand::Queue => queue(root, json),
    }
}

/// How long to wait for piped variables before treating stdin as empty.
const STDIN_GRACE: Duration = Duration::from_millis(250);

/// Variables from the argument, else from piped stdin, else empty.
///
/// A pipe that stays open without reaching end-of-file within
/// [`STDIN_GRACE`] counts as no input.
fn read_variables(arg: Option<&str>) -> anyhow::Result<Variables> {
    let raw = match arg {
        Some(raw) => raw.to_string(),
        None if std::io::stdin().is_terminal() => String::new(),
        None => match read_ready(std::io::stdin(), STDIN_GRACE) {
            Some(read) => read.context("failed to read variables from stdin")?,
            None => {
                tracing::debug!("no variables on stdin, using none");
                String::new()
            }
        },
    };
    Ok(render::parse_variables(&raw)?)
}

/// Read `reader` to end-of-file on a helper thread. `None` when that takes
/// longer than `wait`; the thread is left blocked and dies with the process.
fn read_ready<R: Read + Send + 'static>(
    mut reader: R,
    wait: Duration,
) -> Option<std::io::Result<String>> {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = tx.send(reader.read_to_string(&mut buf).map(|_| buf));
    });
    rx.recv_timeout(wait).ok()
}

// ---------------------------------------------------------------------------
// list / add
// ---------------------------------------------------------------------------

fn list(store: &TemplateStore, json: bool) -> anyhow::Result<()> {
    let errands = store.list().context("failed to list errands")?;
    let next_steps = if errands.is_empty() {
        vec!["Run 'layton errands add <name>' to create an errand".to_string()]
    } else {
        vec!["Run 'layton errands schedule <name> [json-vars]' to queue one".to_string()]
    };

    if json {
        return print_success(&serde_json::json!({ "errands": errands }), &next_steps);
    }
    if errands.is_empty() {
        println!("No errands.");
    } else {
        let rows = errands
            .iter()
            .map(|e| {
                vec![
                    e.name.clone(),
                    e.description.clone(),
                    e.variables.keys().cloned().collect::<Vec<_>>().join(", "),
                ]
            })
            .collect();
        print_table(&["NAME", "DESCRIPTION", "VARIABLES"], rows);
    }
    print_next_steps(&next_steps);
    Ok(())
}

fn add(store: &TemplateStore, name: &str, json: bool) -> anyhow::Result<()> {
    paths::validate_name(name)?;
    let path = store.add(name)?;
    let next_steps = vec![format!("Edit {} to configure the errand", path.display())];

    if json {
        print_success(
            &serde_json::json!({ "created": path, "name": name }),
            &next_steps,
        )?;
    } else {
        println!("Created errand '{name}' at {}", path.display());
        print_next_steps(&next_steps);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// schedule / run
// ---------------------------------------------------------------------------

fn schedule_cmd(
    root: &Path,
    store: &TemplateStore,
    name: &str,
    vars: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let vars = read_variables(vars)?;
    let tracker = Tracker::new(root);
    let response = schedule::schedule(store, &tracker, name, &vars)
        .with_context(|| format!("failed to schedule errand '{name}'"))?;

    if json {
        print_success(&serde_json::json!({ "scheduled": response }), &[])?;
    } else {
        match layton_core::tracker::response_id(&response) {
            Some(id) => println!("Scheduled '{name}' as {id}"),
            None => println!("Scheduled '{name}'"),
        }
    }
    Ok(())
}

fn run_cmd(
    root: &Path,
    store: &TemplateStore,
    name: &str,
    vars: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let vars = read_variables(vars)?;
    let tracker = Tracker::new(root);
    let item = schedule::run(store, &tracker, name, &vars)
        .with_context(|| format!("failed to run errand '{name}'"))?;

    if json {
        print_success(&item, &[])?;
    } else {
        println!("{}  {}", item.bead_id, item.title);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// prompt
// ---------------------------------------------------------------------------

fn prompt_cmd(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let tracker = Tracker::new(root);
    tracker.require_available()?;
    let built =
        prompt::build_prompt(&tracker, id).ok_or_else(|| LaytonError::ItemNotFound(id.to_string()))?;

    if json {
        print_success(
            &serde_json::json!({ "bead_id": id, "prompt": built.text }),
            &[],
        )?;
    } else {
        print!("{}", built.text);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// epic
// ---------------------------------------------------------------------------

fn epic_show(root: &Path, json: bool) -> anyhow::Result<()> {
    let tracker = Tracker::new(root);
    let epic = tracker
        .get_epic()
        .context("failed to read config")?
        .ok_or(LaytonError::NoEpic)?;

    if json {
        print_success(&serde_json::json!({ "epic": epic }), &[])?;
    } else {
        println!("{epic}");
    }
    Ok(())
}

fn epic_set(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let tracker = Tracker::new(root);
    tracker.set_epic(id).context("failed to save config")?;

    if json {
        print_success(&serde_json::json!({ "epic": id }), &[])?;
    } else {
        println!("Epic set to {id}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// queue
// ---------------------------------------------------------------------------

fn queue(root: &Path, json: bool) -> anyhow::Result<()> {
    let tracker = Tracker::new(root);
    tracker.require_available()?;
    let scheduled = tracker.scheduled();
    let in_progress = tracker.in_progress();
    let pending_review = tracker.pending_review();

    let mut next_steps = Vec::new();
    if !pending_review.is_empty() {
        next_steps.push(format!("{} item(s) pending review", pending_review.len()));
    }

    if json {
        return print_success(
            &serde_json::json!({
                "scheduled": scheduled,
                "in_progress": in_progress,
                "pending_review": pending_review,
            }),
            &next_steps,
        );
    }

    for (heading, items) in [
        ("Scheduled", &scheduled),
        ("In progress", &in_progress),
        ("Pending review", &pending_review),
    ] {
        println!("{heading} ({})", items.len());
        print_items(items);
        println!();
    }
    print_next_steps(&next_steps);
    Ok(())
}

fn print_items(items: &[TrackedItem]) {
    if items.is_empty() {
        return;
    }
    let rows = items
        .iter()
        .map(|i| vec![i.id.clone(), i.title.clone().unwrap_or_default()])
        .collect();
    print_table(&["ID", "TITLE"], rows);
}
