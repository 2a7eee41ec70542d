//! CLI entry and dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use subtext_core::api::ApiClient;
use subtext_core::config;
use subtext_core::session::{SessionManager, SessionStore};

mod commands;

#[derive(Parser)]
#[command(name = "subtext")]
#[command(version)]
#[command(about = "Hidden-intent analysis for your conversations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create an account and log in
    Signup {
        /// Account email address
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long)]
        password: String,
        /// Display name
        #[arg(long)]
        name: String,
    },

    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long)]
        password: String,
    },

    /// Log out and clear the saved session
    Logout,

    /// Show the current session and subscription
    Status,

    /// Analyze a conversation for hidden intent (one argument per message)
    Analyze {
        /// Messages in order, oldest first
        #[arg(value_name = "MESSAGE", num_args = 1..)]
        messages: Vec<String>,
    },

    /// Extract conversation text from a screenshot
    Ocr {
        /// Path to the screenshot (png, jpg, webp)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Analyze the extracted text right away
        #[arg(long)]
        analyze: bool,
    },

    /// Manage the subscription
    Subscription {
        #[command(subcommand)]
        command: SubscriptionCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum SubscriptionCommands {
    /// Show subscription status and monthly usage
    Status,
    /// List available plans
    Plans,
    /// Activate a subscription
    Create {
        /// Subscription ID from the payment provider
        #[arg(long)]
        id: String,
        /// Plan tier (e.g. premium)
        #[arg(long)]
        tier: String,
    },
    /// Cancel the active subscription
    Cancel {
        /// Optional cancellation reason
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = crate::logging::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;
    let base_url = config.effective_api_base_url()?;

    let manager = Arc::new(SessionManager::new(
        ApiClient::new(base_url),
        SessionStore::open_default(),
    ));
    manager.bootstrap();

    match cli.command {
        Commands::Signup {
            email,
            password,
            name,
        } => commands::auth::signup(&manager, &email, &password, &name).await,
        Commands::Login {
            email,
            password,
        } => commands::auth::login(&manager, &email, &password).await,
        Commands::Logout => commands::auth::logout(&manager).await,
        Commands::Status => commands::auth::status(&manager).await,

        Commands::Analyze {
            messages,
        } => commands::analyze::run(&manager, &messages).await,
        Commands::Ocr {
            image,
            analyze,
        } => commands::analyze::ocr(&manager, &image, analyze).await,

        Commands::Subscription {
            command,
        } => match command {
            SubscriptionCommands::Status => commands::subscription::status(&manager).await,
            SubscriptionCommands::Plans => commands::subscription::plans(&manager).await,
            SubscriptionCommands::Create {
                id,
                tier,
            } => commands::subscription::create(&manager, &id, &tier).await,
            SubscriptionCommands::Cancel {
                reason,
            } => commands::subscription::cancel(&manager, reason.as_deref()).await,
        },

        Commands::Config {
            command,
        } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
