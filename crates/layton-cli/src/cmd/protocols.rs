use crate::output::{print_next_steps, print_success, print_table};
use anyhow::Context;
use clap::Subcommand;
use layton_core::{
    paths,
    store::{ArtifactKind, TemplateStore},
};
use std::path::Path;

#[derive(Subcommand, Default)]
pub enum ProtocolsSubcommand {
    /// List protocols and their trigger phrases
    #[default]
    List,
    /// Create a new protocol from the starter template
    Add { name: String },
}

pub fn run(root: &Path, subcmd: ProtocolsSubcommand, json: bool) -> anyhow::Result<()> {
    let store = TemplateStore::for_kind(root, ArtifactKind::Protocol);
    match subcmd {
        ProtocolsSubcommand::List => list(&store, json),
        ProtocolsSubcommand::Add { name } => add(&store, &name, json),
    }
}

fn list(store: &TemplateStore, json: bool) -> anyhow::Result<()> {
    let protocols = store
        .list_protocols()
        .context("failed to list protocols")?;
    let mut next_steps = Vec::new();
    if protocols.is_empty() {
        next_steps.push("Run 'layton protocols add <name>' to create a protocol".to_string());
    }

    if json {
        return print_success(&serde_json::json!({ "protocols": protocols }), &next_steps);
    }
    if protocols.is_empty() {
        println!("No protocols.");
    } else {
        let rows = protocols
            .iter()
            .map(|p| vec![p.name.clone(), p.description.clone(), p.triggers.join("; ")])
            .collect();
        print_table(&["NAME", "DESCRIPTION", "TRIGGERS"], rows);
    }
    print_next_steps(&next_steps);
    Ok(())
}

fn add(store: &TemplateStore, name: &str, json: bool) -> anyhow::Result<()> {
    paths::validate_name(name)?;
    let path = store.add(name)?;
    let next_steps = vec![format!("Edit {} to configure the protocol", path.display())];

    if json {
        print_success(
            &serde_json::json!({ "created": path, "name": name }),
            &next_steps,
        )?;
    } else {
        println!("Created protocol '{name}' at {}", path.display());
        print_next_steps(&next_steps);
    }
    Ok(())
}
