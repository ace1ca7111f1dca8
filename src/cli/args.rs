//! CLI argument definitions using clap
//!
//! Commands:
//! - crudbase find --entity <Name> [--query JSON]
//! - crudbase find-all --entity <Name> [--query JSON]
//! - crudbase find-one --entity <Name> --id N [--query JSON]
//! - crudbase create --entity <Name> --data JSON
//! - crudbase update --entity <Name> --id N --data JSON
//! - crudbase remove --entity <Name> --id N
//! - crudbase link|unlink --entity <Name> --relation R --id N --related M

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// crudbase - declarative queries and validated writes over admin entities
#[derive(Parser, Debug)]
#[command(name = "crudbase")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// One page of rows with pagination metadata
    Find {
        #[arg(long)]
        entity: String,
        /// `{"filters", "sorts", "page", "pageSize", "includes"}`
        #[arg(long)]
        query: Option<String>,
    },

    /// Every matching row
    FindAll {
        #[arg(long)]
        entity: String,
        /// `{"filters", "sorts", "includes"}`
        #[arg(long)]
        query: Option<String>,
    },

    /// One row by id
    FindOne {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        id: u64,
        /// `{"includes"}`
        #[arg(long)]
        query: Option<String>,
    },

    /// Validate and insert a row
    Create {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        data: String,
    },

    /// Validate and apply a partial update
    Update {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        id: u64,
        #[arg(long)]
        data: String,
    },

    /// Delete a row by id
    Remove {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        id: u64,
    },

    /// Link two rows through a many-to-many relation
    Link {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        relation: String,
        #[arg(long)]
        id: u64,
        #[arg(long)]
        related: u64,
    },

    /// Unlink two rows of a many-to-many relation
    Unlink {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        relation: String,
        #[arg(long)]
        id: u64,
        #[arg(long)]
        related: u64,
    },
}

impl Command {
    pub fn entity(&self) -> &str {
        match self {
            Command::Find { entity, .. }
            | Command::FindAll { entity, .. }
            | Command::FindOne { entity, .. }
            | Command::Create { entity, .. }
            | Command::Update { entity, .. }
            | Command::Remove { entity, .. }
            | Command::Link { entity, .. }
            | Command::Unlink { entity, .. } => entity,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Find { .. } => "find",
            Command::FindAll { .. } => "find-all",
            Command::FindOne { .. } => "find-one",
            Command::Create { .. } => "create",
            Command::Update { .. } => "update",
            Command::Remove { .. } => "remove",
            Command::Link { .. } => "link",
            Command::Unlink { .. } => "unlink",
        }
    }
}
