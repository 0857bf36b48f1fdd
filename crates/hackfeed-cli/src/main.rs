use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hackfeed_core::FeedView;
use hackfeed_infrastructure::ClientConfig;
use hackfeed_infrastructure::config::API_URL_ENV;

mod commands;

#[derive(Parser)]
#[command(name = "hackfeed")]
#[command(about = "hackfeed - read, post and favorite stories on a Hack-or-Snooze news site", long_about = None)]
struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        username: String,
        #[arg(long, env = "HACKFEED_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Signup {
        username: String,
        #[arg(long, env = "HACKFEED_PASSWORD", hide_env_values = true)]
        password: String,
        /// Display name shown as story author
        #[arg(long)]
        name: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List stories
    Stories {
        /// all, favorites or mine
        #[arg(long, default_value_t = FeedView::All)]
        view: FeedView,
    },
    /// Submit a story
    Submit { title: String, url: String },
    /// Delete one of your stories
    Delete { story_id: String },
    /// Toggle a story in your favorites
    Favorite { story_id: String },
}

fn load_config(path: Option<&PathBuf>) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => {
            ClientConfig::load_from(path)?.with_api_url_override(std::env::var(API_URL_ENV).ok())
        }
        None => ClientConfig::load()?,
    };
    Ok(config)
}

fn setup_tracing(default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    setup_tracing(&config.log_level);

    let client = commands::build_client(&config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&client, &username, &password).await?
        }
        Commands::Signup {
            username,
            password,
            name,
        } => commands::session::signup(&client, &username, &password, &name).await?,
        Commands::Logout => commands::session::logout(&client).await?,
        Commands::Whoami => commands::session::whoami(&client).await,
        Commands::Stories { view } => commands::stories::list(&client, view).await?,
        Commands::Submit { title, url } => commands::stories::submit(&client, &title, &url).await?,
        Commands::Delete { story_id } => commands::stories::delete(&client, &story_id).await?,
        Commands::Favorite { story_id } => {
            commands::stories::favorite(&client, &story_id).await?
        }
    }

    Ok(())
}
