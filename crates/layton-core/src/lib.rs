pub mod config;
pub mod error;
pub mod frontmatter;
pub mod io;
pub mod paths;
pub mod prompt;
pub mod render;
pub mod runner;
pub mod schedule;
pub mod store;
pub mod templates;
pub mod tracker;

pub use error::{LaytonError, Result};
