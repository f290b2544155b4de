//! `folio-server` command line: print server-side joins as JSON

use anyhow::Context;
use clap::{value_parser, Arg, Command};
use folio_comments::{UserId, WorkId};
use folio_server::{seed, AdminRegistry, MemoryConnector, ServerConfig, ServerDb};
use folio_store::MemoryStore;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("folio-server")
        .version(folio_server::VERSION)
        .about("Server-side joins over works and their owners")
        .subcommand_required(true)
        .arg(
            Arg::new("seed")
                .long("seed")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON fixture to load into the in-process store"),
        )
        .subcommand(
            Command::new("work")
                .about("Print a work joined with its owner's profile")
                .arg(Arg::new("id").required(true).help("Work id")),
        )
        .subcommand(
            Command::new("dev")
                .about("Print a user joined with the works they own")
                .arg(Arg::new("id").required(true).help("User id")),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_server=info,folio_comments=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = cli().get_matches();

    let config = ServerConfig::from_env().context("server store credential is not configured")?;
    info!(app = %config.app_name, project_id = %config.credential.project_id, "folio-server starting");

    let store = MemoryStore::new();
    if let Some(fixture) = matches.get_one::<PathBuf>("seed") {
        seed::load_fixture(&store, fixture).await?;
    }

    let registry = AdminRegistry::new();
    let app = registry
        .initialize_or_reuse(&config, &MemoryConnector::new(store))
        .await?;
    let db = ServerDb::from_app(&app);

    let output = match matches.subcommand() {
        Some(("work", args)) => {
            let id = args.get_one::<String>("id").context("missing work id")?;
            serde_json::to_value(db.get_work_details(&WorkId::new(id.as_str())).await?)?
        }
        Some(("dev", args)) => {
            let id = args.get_one::<String>("id").context("missing user id")?;
            serde_json::to_value(db.get_dev_details(&UserId::new(id.as_str())).await?)?
        }
        _ => anyhow::bail!("unknown command"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
