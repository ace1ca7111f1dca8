//! CLI command implementations
//!
//! Boot sequence for every command:
//! 1. Load config
//! 2. Install logging
//! 3. Open memory storage and seed it
//! 4. Run one operation and print its result
//! 5. Close storage

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::EngineConfig;
use crate::entities::{standard_registry, Admin, Article, Content, Tag, User};
use crate::observability::init_logging;
use crate::query::{FindAllQuery, FindOneQuery, FindQuery};
use crate::seed::{SeedSet, Seeder};
use crate::service::{Entity, EngineError, EntityService, LinkService};
use crate::storage::Connection;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{parse_object, parse_query, write_json};

/// Runs a parsed command line, printing the result to stdout
pub async fn run(cli: Cli) -> CliResult<()> {
    let config = EngineConfig::load_or_default(cli.config.as_deref())?;
    init_logging(&config.log_level);

    let conn = open(&config).await?;
    let outcome = run_command(&conn, &config, &cli.command).await;
    conn.close().await.map_err(EngineError::from)?;

    write_json(&outcome?)
}

/// Opens storage over the standard entities and applies the seed file
pub async fn open(config: &EngineConfig) -> CliResult<Connection> {
    let conn = Connection::open_memory(Arc::new(standard_registry()));
    if let Some(path) = &config.seed_path {
        let seeds = SeedSet::load(path)?;
        Seeder::new(conn.clone())
            .hash_credentials(config.hash_seed_credentials)
            .run(seeds)
            .await?;
    }
    Ok(conn)
}

/// Runs one command against an open connection
pub async fn run_command(
    conn: &Connection,
    config: &EngineConfig,
    command: &Command,
) -> CliResult<Value> {
    info!(command = command.name(), entity = command.entity(), "running command");
    match command.entity() {
        "Article" => dispatch::<Article>(conn, config, command).await,
        "User" => dispatch::<User>(conn, config, command).await,
        "Tag" => dispatch::<Tag>(conn, config, command).await,
        "Content" => dispatch::<Content>(conn, config, command).await,
        "Admin" => dispatch::<Admin>(conn, config, command).await,
        other => Err(CliError::usage(format!(
            "unknown entity '{}', expected one of: Article, User, Tag, Content, Admin",
            other
        ))),
    }
}

async fn dispatch<E: Entity>(
    conn: &Connection,
    config: &EngineConfig,
    command: &Command,
) -> CliResult<Value> {
    let service = EntityService::<E>::new(conn.clone()).with_page_size(config.default_page_size);

    match command {
        Command::Find { query, .. } => {
            let query: FindQuery = parse_query(query.as_deref())?;
            to_value(&service.find(&query).await?)
        }
        Command::FindAll { query, .. } => {
            let query: FindAllQuery = parse_query(query.as_deref())?;
            to_value(&service.find_all(&query).await?)
        }
        Command::FindOne { id, query, .. } => {
            let query: FindOneQuery = parse_query(query.as_deref())?;
            to_value(&service.find_one(*id, &query).await?)
        }
        Command::Create { data, .. } => {
            let input = parse_object("data", data)?;
            to_value(&service.create(&input).await?)
        }
        Command::Update { id, data, .. } => {
            let input = parse_object("data", data)?;
            to_value(&service.update(*id, &input).await?)
        }
        Command::Remove { id, .. } => {
            service.remove(*id).await?;
            Ok(Value::Null)
        }
        Command::Link {
            relation,
            id,
            related,
            ..
        } => {
            let links = LinkService::<E>::new(conn.clone(), relation)?;
            to_value(&links.attach(*id, *related).await?)
        }
        Command::Unlink {
            relation,
            id,
            related,
            ..
        } => {
            let links = LinkService::<E>::new(conn.clone(), relation)?;
            to_value(&links.detach(*id, *related).await?)
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> CliResult<Value> {
    serde_json::to_value(value).map_err(|e| EngineError::Decode(e.to_string()).into())
}
