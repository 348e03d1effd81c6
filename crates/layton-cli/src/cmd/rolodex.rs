use crate::output::{print_next_steps, print_success, print_table};
use anyhow::Context;
use clap::Subcommand;
use layton_core::{
    paths,
    store::{ArtifactKind, TemplateStore},
};
use std::path::Path;

#[derive(Subcommand, Default)]
pub enum RolodexSubcommand {
    /// List rolodex cards
    #[default]
    List,
    /// Create a new card from the starter template
    Add { name: String },
}

pub fn run(root: &Path, subcmd: RolodexSubcommand, json: bool) -> anyhow::Result<()> {
    let store = TemplateStore::for_kind(root, ArtifactKind::Rolodex);
    match subcmd {
        RolodexSubcommand::List => list(&store, json),
        RolodexSubcommand::Add { name } => add(&store, &name, json),
    }
}

fn list(store: &TemplateStore, json: bool) -> anyhow::Result<()> {
    let cards = store.list_cards().context("failed to list rolodex cards")?;
    let mut next_steps = Vec::new();
    if cards.is_empty() {
        next_steps.push("Run 'layton rolodex add <name>' to create a card".to_string());
    }

    if json {
        return print_success(&serde_json::json!({ "rolodex": cards }), &next_steps);
    }
    if cards.is_empty() {
        println!("No rolodex cards.");
    } else {
        let rows = cards
            .iter()
            .map(|c| vec![c.name.clone(), c.description.clone(), c.source.clone()])
            .collect();
        print_table(&["NAME", "DESCRIPTION", "SOURCE"], rows);
    }
    print_next_steps(&next_steps);
    Ok(())
}

fn add(store: &TemplateStore, name: &str, json: bool) -> anyhow::Result<()> {
    paths::validate_name(name)?;
    let path = store.add(name)?;
    let next_steps = vec![format!("Edit {} to configure the card", path.display())];

    if json {
        print_success(
            &serde_json::json!({ "created": path, "name": name }),
            &next_steps,
        )?;
    } else {
        println!("Created card '{name}' at {}", path.display());
        print_next_steps(&next_steps);
    }
    Ok(())
}
