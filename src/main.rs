//! CLI entry point for blogsmith

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blogsmith::Site;

#[derive(Parser)]
#[command(name = "blogsmith")]
#[command(version)]
#[command(about = "A static blog generator for Markdown posts", long_about = None)]
struct Cli {
    /// Site directory (defaults to current directory)
    #[arg(short, long, global = true)]
    source: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into the destination directory
    #[command(alias = "b")]
    Build,

    /// Build, serve the site locally and rebuild on changes
    #[command(alias = "s")]
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Do not rebuild when files change
        #[arg(long)]
        no_watch: bool,
    },

    /// Scaffold a new site
    Init {
        /// Directory to initialize (defaults to the site directory)
        folder: Option<PathBuf>,
    },

    /// Create a new post
    New {
        /// Title of the new post
        title: String,
    },

    /// Remove the destination directory
    Clean,

    /// List site content
    List {
        /// What to list (posts, pages, categories, tags)
        #[arg(default_value = "posts")]
        r#type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "blogsmith=debug,info"
    } else {
        "blogsmith=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let base_dir = match cli.source {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => cwd.join(dir),
        None => cwd,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = match folder {
                Some(folder) if folder.is_absolute() => folder,
                Some(folder) => base_dir.join(folder),
                None => base_dir,
            };
            blogsmith::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {}", target_dir.display());
        }

        Commands::New { title } => {
            let site = Site::new(&base_dir)?;
            let path = site.new_post(&title)?;
            println!("Created: {}", path.display());
        }

        Commands::Build => {
            let site = Site::new(&base_dir)?;
            site.build()?;
            println!("Built successfully!");
        }

        Commands::Serve {
            host,
            port,
            no_watch,
        } => {
            // Watch events report canonical paths
            let base_dir = base_dir.canonicalize().unwrap_or(base_dir);
            let site = Site::new(&base_dir)?;
            site.build()?;

            tracing::info!("Starting server at http://{}:{}", host, port);
            blogsmith::server::start(&site, &host, port, !no_watch).await?;
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            blogsmith::commands::list::run(&site, &r#type)?;
        }
    }

    Ok(())
}
