use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tagvault::config::Config;
use tagvault::registry::RemoteRegistry;
use tagvault::store::{DocumentSource, Instance, SecretStore, StoreStatus};
use tagvault::sync::{HttpRemote, SyncClient, SyncOutcome};
use tagvault::{gen_password, GpgCipher, StdinPrompter};

#[derive(Parser)]
#[command(name = "tagvault")]
#[command(version)]
#[command(about = "A local-first encrypted secret store", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List secrets, optionally filtered by a tag query
    List { query: Option<String> },

    /// Add a new secret
    Add,

    /// Edit the secret matching a tag query
    Update { query: String },

    /// Delete the secret matching a tag query
    Delete { query: String },

    /// Reconcile the local document with the configured remote
    Sync,

    /// Generate a random password
    GenPassword,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let cipher = GpgCipher::new();
    let prompter = StdinPrompter::new();
    let store = SecretStore::new(&cipher, &prompter);

    match command {
        Commands::GenPassword => {
            println!("{}", gen_password());
        }
        Commands::List { query } => {
            let (_, instance) = open_instance(&store, &config).await?;
            let records = store.list(&instance, query.as_deref())?;
            if records.is_empty() {
                if query.is_some() {
                    println!("{}", StoreStatus::NoResult);
                } else {
                    println!("No secrets stored");
                }
            }
            for record in records {
                println!("{}: {}", record.joined_tags(), record.secret);
                for (key, value) in &record.extra {
                    println!("  {}: {}", key, value);
                }
            }
        }
        Commands::Add => {
            let (identity, mut instance) = open_instance(&store, &config).await?;
            let record = store.add(&mut instance, &identity).await?;
            println!("Added '{}'", record.joined_tags());
        }
        Commands::Update { query } => {
            let (identity, mut instance) = open_instance(&store, &config).await?;
            let status = store.update(&mut instance, &identity, &query).await?;
            match status {
                StoreStatus::Committed => println!("Updated"),
                other => println!("{}", other),
            }
        }
        Commands::Delete { query } => {
            let (identity, mut instance) = open_instance(&store, &config).await?;
            let status = store.delete(&mut instance, &identity, &query).await?;
            match status {
                StoreStatus::Committed => println!("Deleted"),
                other => println!("{}", other),
            }
        }
        Commands::Sync => {
            let (identity, mut instance) = open_instance(&store, &config).await?;
            let identity = identity.as_str();
            let remote_url = config.require_remote()?;
            let registry_path = config.registry_path(identity);
            let mut registry = RemoteRegistry::load(&registry_path, &cipher).await?;

            let remote = HttpRemote::new(remote_url);
            let client = SyncClient::new(&remote, &cipher, &prompter, remote_url);

            // Tokens obtained during the attempt are kept even when the
            // reconcile step fails.
            let result = client.sync(&mut instance, &mut registry, identity).await;
            registry.save(&registry_path, &cipher, identity).await?;

            let report = result?;
            match report.outcome {
                SyncOutcome::AlreadyConsistent => println!("Already up to date"),
                SyncOutcome::Merged => {
                    println!("Merged {} remote change(s)", report.applied_changes)
                }
                SyncOutcome::Bootstrapped => println!("Uploaded local secrets to remote"),
            }
        }
    }

    Ok(())
}

/// Resolves the configured identity and opens its encrypted document.
async fn open_instance(
    store: &SecretStore<'_>,
    config: &Config,
) -> Result<(String, Instance), Box<dyn std::error::Error>> {
    let identity = config.require_identity()?.to_string();
    let document_path = config.document_path(&identity);

    let instance = store
        .get_instance(DocumentSource::Path(document_path), Some(&identity))
        .await?;

    Ok((identity, instance))
}
