use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docloom::cli::AppContext;
use docloom::cli::commands;

#[derive(Parser)]
#[command(name = "docloom")]
#[command(
    version,
    about = "AI documentation pipeline for code repositories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan the documentation structure for a source
    Plan {
        #[arg(long, short, help = "Local directory or GitHub repository URL")]
        source: String,
        #[arg(long, help = "Discard the existing plan and re-plan from scratch")]
        regenerate: bool,
    },

    /// Generate page content for planned pages
    Generate {
        #[arg(long, short, help = "Local directory or GitHub repository URL")]
        source: String,
        #[arg(long, short, help = "Generate only this page")]
        title: Option<String>,
        #[arg(long, help = "Requeue already-generated or failed pages first")]
        regenerate: bool,
    },

    /// Ask a question against published documentation
    Chat {
        #[arg(long, short, help = "Repository identity (owner/repo or project name)")]
        repo: String,
        #[arg(help = "The question to ask")]
        query: String,
    },

    /// Show persisted pages and their states
    Status {
        #[arg(long, short, help = "Repository identity to inspect")]
        repo: Option<String>,
    },

    /// Publish or unpublish a generated page
    Publish {
        #[arg(long, short, help = "Repository identity (owner/repo or project name)")]
        repo: String,
        #[arg(long, short, help = "Page title")]
        title: String,
        #[arg(long, help = "Remove from the published set instead")]
        unpublish: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show,
    /// Show configuration file paths
    Path,
    /// Write a default project config
    Init {
        #[arg(long, short, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mdocloom encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rt = Runtime::new()?;

    match cli.command {
        Commands::Plan { source, regenerate } => {
            let ctx = AppContext::init()?;
            rt.block_on(commands::plan::run(&ctx, &source, regenerate))?;
        }
        Commands::Generate {
            source,
            title,
            regenerate,
        } => {
            let ctx = AppContext::init()?;
            rt.block_on(commands::generate::run(
                &ctx,
                &source,
                title.as_deref(),
                regenerate,
            ))?;
        }
        Commands::Chat { repo, query } => {
            let ctx = AppContext::init()?;
            rt.block_on(commands::chat::run(&ctx, &repo, &query))?;
        }
        Commands::Status { repo } => {
            let ctx = AppContext::init_offline()?;
            commands::status::run(&ctx, repo.as_deref())?;
        }
        Commands::Publish {
            repo,
            title,
            unpublish,
        } => {
            let ctx = AppContext::init_offline()?;
            commands::publish::run(&ctx, &repo, &title, unpublish)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show()?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { force } => commands::config::init(force)?,
        },
    }

    Ok(())
}
