use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use fren::fren_config::AdminConfig;
use fren::state::{AppConfig, AppState, init_app_state};

#[derive(Parser)]
#[command(name = "fren-cli")]
#[command(about = "Fren CLI - Administrative tools for the portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator holding every role, or reset its password
    CreateAdmin {
        /// First name of the administrator
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the administrator
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Synchronize the role catalog with the database
    SyncRoles,
}

fn prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Input::<String>::new()
            .with_prompt(label)
            .interact_text()
            .with_context(|| format!("Failed to read {}", label.to_lowercase())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let state = init_app_state(AppConfig::from_env()).await?;

    match cli.command {
        Commands::CreateAdmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&state, first_name, last_name, email, password).await,
        Commands::SyncRoles => {
            state
                .roles
                .sync_catalog()
                .await
                .map_err(|e| anyhow::anyhow!("Error synchronizing roles: {e}"))?;
            println!("✅ Role catalog synchronized");
            Ok(())
        }
    }
}

async fn handle_create_admin(
    state: &AppState,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let first_name = prompt(first_name, "First name")?;
    let last_name = prompt(last_name, "Last name")?;
    let email = prompt(email, "Email address")?;
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .context("Failed to read password")?,
    };

    let config = AdminConfig {
        email,
        first_name,
        last_name,
        password,
    };

    state
        .roles
        .sync_catalog()
        .await
        .map_err(|e| anyhow::anyhow!("Error synchronizing roles: {e}"))?;
    let user = state
        .users
        .bootstrap_admin(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Error creating administrator: {e}"))?;

    println!("\n✅ Administrator ready!");
    println!("   Email: {}", user.email);
    println!("   Name: {} {}", user.first_name, user.last_name);
    Ok(())
}
