use crate::output::{print_json, print_success};
use anyhow::Context;
use clap::Subcommand;
use layton_core::{
    config::{self, Config},
    paths, LaytonError,
};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand, Default)]
pub enum ConfigSubcommand {
    /// Print the whole config document
    #[default]
    Show,

    /// List every key in dot notation
    Keys,

    /// Print the value at a dotted key
    Get { key: String },

    /// Set a dotted key. The value is parsed as JSON when possible.
    Set { key: String, value: String },

    /// Write a starter config
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Keys => keys(root, json),
        ConfigSubcommand::Get { key } => get(root, &key, json),
        ConfigSubcommand::Set { key, value } => set(root, &key, &value, json),
        ConfigSubcommand::Init { force } => init(root, force, json),
    }
}

fn load(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).context("failed to load config")
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let cfg = load(root)?;
    let mut next_steps = Vec::new();
    if !Config::exists(root) {
        next_steps.push("Run 'layton config init' to create a config".to_string());
    }

    if json {
        print_success(cfg.as_value(), &next_steps)
    } else {
        print_json(cfg.as_value())
    }
}

fn keys(root: &Path, json: bool) -> anyhow::Result<()> {
    let keys = load(root)?.keys();
    if json {
        print_success(&serde_json::json!({ "keys": keys }), &[])?;
    } else {
        for key in &keys {
            println!("{key}");
        }
    }
    Ok(())
}

fn get(root: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load(root)?;
    let value = cfg.get(key)?;
    if json {
        print_success(&serde_json::json!({ "key": key, "value": value }), &[])?;
    } else {
        match value {
            serde_json::Value::String(s) => println!("{s}"),
            other => println!("{}", serde_json::to_string_pretty(other)?),
        }
    }
    Ok(())
}

fn set(root: &Path, key: &str, raw: &str, json: bool) -> anyhow::Result<()> {
    let mut cfg = load(root)?;
    let value = config::parse_value(raw);
    cfg.set(key, value.clone());
    cfg.save(root).context("failed to save config")?;

    if json {
        print_success(&serde_json::json!({ "key": key, "value": value }), &[])?;
    } else {
        println!("Set {key}");
    }
    Ok(())
}

fn init(root: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    if Config::exists(root) && !force {
        return Err(LaytonError::DefinitionExists(path).into());
    }
    let cfg = Config::from_value(Config::default_document());
    cfg.save(root).context("failed to write config")?;

    let next_steps = vec!["Run 'layton config set timezone <tz>' to set your timezone".to_string()];
    if json {
        print_success(
            &serde_json::json!({ "created": path, "config": cfg.as_value() }),
            &next_steps,
        )?;
    } else {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
