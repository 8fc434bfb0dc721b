mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use tenantport::TransferConfig;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// SQLite database file, or `:memory:`
    #[clap(short, long, global = true, env = "TENANTPORT_DATABASE")]
    database: Option<String>,
    /// Root directory of the attachment store
    #[clap(long, global = true)]
    storage_root: Option<PathBuf>,
    /// TOML configuration file
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    Account {
        #[clap(subcommand)]
        command: AccountCommands,
    },
    /// Build an export and copy its archive out of the store
    Export {
        #[clap(long)]
        account: String,
        #[clap(long)]
        user: String,
        /// Only the cards the user can access
        #[clap(long)]
        single_user: bool,
        #[clap(short, long)]
        out: Option<PathBuf>,
    },
    /// Import an archive into a new account owned by `identity`
    Import {
        #[clap(short, long)]
        archive: PathBuf,
        #[clap(short, long)]
        identity: String,
    },
    /// Remove exports past the retention window
    CleanupExports,
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Migrate {
        #[clap(subcommand)]
        direction: commands::MigrateDirection,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommands {
    Create {
        #[clap(short, long)]
        name: String,
        #[clap(long)]
        owner_email: String,
        #[clap(long)]
        owner_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    let mut config = match &args.config {
        Some(path) => TransferConfig::from_file(path)?,
        None => TransferConfig::from_env(),
    };
    if let Some(database) = &args.database {
        config.database_url = tenantport::database::connection::get_database_url(Some(database));
    }
    if let Some(root) = args.storage_root {
        config.storage_root = root;
    }

    match args.command {
        Commands::Db { command } => match command {
            DbCommands::Migrate { direction } => {
                commands::migrate_database(&config, direction).await?;
            }
        },
        Commands::Account { command } => match command {
            AccountCommands::Create {
                name,
                owner_email,
                owner_name,
            } => {
                let runtime = commands::Runtime::start(&config).await?;
                commands::create_account(&runtime, &name, &owner_email, owner_name.as_deref())
                    .await?;
            }
        },
        Commands::Export {
            account,
            user,
            single_user,
            out,
        } => {
            let runtime = commands::Runtime::start(&config).await?;
            commands::export(&runtime, &account, &user, single_user, out.as_deref()).await?;
        }
        Commands::Import { archive, identity } => {
            let runtime = commands::Runtime::start(&config).await?;
            commands::import(&runtime, &archive, &identity).await?;
        }
        Commands::CleanupExports => {
            let runtime = commands::Runtime::start(&config).await?;
            commands::cleanup_exports(&runtime).await?;
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sqlx=warn,{}", log_level)))
        .without_time()
        .init();
}
