//! Student Aid Administration CLI
//!
//! Operator commands that run directly against the database: bootstrapping
//! the first admin, listing accounts by role and deactivating managers.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use uuid::Uuid;

use student_aid_service::{
    config::AppConfig,
    database::{run_migrations, DatabaseConfig},
    models::{RegisterRequest, Role},
    repository::{AccountRepository, PgAccountRepository},
    service::{
        AccountNotifier, AccountService, EmailTemplates, JwtService, LogGateway,
        NotificationQueue,
    },
};

/// Student aid administration CLI
#[derive(Parser)]
#[command(name = "aid-admin", about = "Student aid administration CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the first admin account
    BootstrapAdmin(BootstrapArgs),
    /// List accounts holding a role
    ListAccounts(ListArgs),
    /// Deactivate a manager account
    DeactivateManager(DeactivateArgs),
}

#[derive(Args)]
struct BootstrapArgs {
    /// Admin email address
    #[arg(short, long)]
    email: String,

    /// Admin full name
    #[arg(short = 'n', long)]
    full_name: String,

    /// Admin password
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct ListArgs {
    /// Role to list: student, manager or admin
    #[arg(short, long, default_value = "student")]
    role: Role,
}

#[derive(Args)]
struct DeactivateArgs {
    /// Manager account ID
    id: Uuid,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let database = DatabaseConfig::from_env().context("Failed to load database configuration")?;
    let database_pool = database
        .create_pool()
        .await
        .context("Failed to connect to database")?;

    // Run migrations to ensure database is up to date
    run_migrations(&database_pool)
        .await
        .context("Failed to run migrations")?;

    let accounts = Arc::new(PgAccountRepository::new(database_pool));

    match cli.command {
        Commands::BootstrapAdmin(args) => bootstrap_admin(accounts, args).await?,
        Commands::ListAccounts(args) => list_accounts(accounts.as_ref(), args).await?,
        Commands::DeactivateManager(args) => deactivate_manager(accounts.as_ref(), args).await?,
    }

    Ok(())
}

async fn bootstrap_admin(
    accounts: Arc<PgAccountRepository>,
    args: BootstrapArgs,
) -> anyhow::Result<()> {
    println!("🔧 Creating the first admin account...");

    // Admins are created pre-verified so no mail is ever queued here
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    let notifier = AccountNotifier::new(
        EmailTemplates::new(&config.public_base_url)?,
        NotificationQueue::start(Arc::new(LogGateway)),
    );
    let service = AccountService::new(
        accounts,
        Arc::new(JwtService::from_config(&config.jwt)),
        notifier,
    )
    .with_bcrypt_cost(config.security.bcrypt_cost);

    let account = service
        .bootstrap_admin(RegisterRequest {
            email: args.email,
            password: args.password,
            full_name: args.full_name,
            user_type: Role::Admin,
        })
        .await?;

    println!("✅ Admin created successfully!");
    println!();
    println!("📋 Account Details:");
    println!("   ID: {}", account.id);
    println!("   Email: {}", account.email);
    println!("   Name: {}", account.full_name);
    println!("   Created: {}", account.created_at);

    Ok(())
}

async fn list_accounts(accounts: &dyn AccountRepository, args: ListArgs) -> anyhow::Result<()> {
    println!("📋 Listing {} accounts...", args.role);

    let listed = accounts.list_by_role(args.role).await?;
    if listed.is_empty() {
        println!("No {} accounts found.", args.role);
        return Ok(());
    }

    println!();
    println!(
        "{:<38} {:<32} {:<24} {:<8} {:<8}",
        "ID", "Email", "Name", "Active", "Verified"
    );
    println!("{}", "-".repeat(114));

    for account in listed {
        println!(
            "{:<38} {:<32} {:<24} {:<8} {:<8}",
            account.id,
            truncate_string(&account.email, 31),
            truncate_string(&account.full_name, 23),
            if account.is_active { "✅" } else { "❌" },
            if account.email_verified { "✅" } else { "❌" },
        );
    }

    Ok(())
}

async fn deactivate_manager(
    accounts: &dyn AccountRepository,
    args: DeactivateArgs,
) -> anyhow::Result<()> {
    println!("⚠️  Deactivating manager {}...", args.id);

    match accounts.deactivate_manager(args.id).await? {
        Some(record) => {
            println!("✅ Manager {} ({}) deactivated", record.id, record.email);
            Ok(())
        }
        None => bail!("Manager {} not found", args.id),
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
