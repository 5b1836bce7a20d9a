//! CLI administration tool for shortlink.
//!
//! Provides commands for bootstrapping accounts, viewing statistics,
//! running the cleanup by hand and performing database checks without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create the first administrator
//! cargo run --bin admin -- user create --email root@example.com --admin
//!
//! # List accounts
//! cargo run --bin admin -- user list --search example.com
//!
//! # Grant the ADMIN role to an existing account
//! cargo run --bin admin -- user promote alice@example.com
//!
//! # Delete expired anonymous links and sessions now
//! cargo run --bin admin -- cleanup
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `DEFAULT_LINK_LIMIT` (optional): Quota given to created accounts (default: 10)

use shortlink::application::services::{AuthService, AuthSettings};
use shortlink::config::mask_connection_string;
use shortlink::domain::entities::Role;
use shortlink::domain::repositories::{
    LinkRepository, SessionRepository, UserListQuery, UserRepository,
};
use shortlink::infrastructure::persistence::{
    PgLinkRepository, PgSessionRepository, PgUserRepository,
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing shortlink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Delete expired anonymous links and sessions
    Cleanup {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Account management subcommands.
#[derive(Subcommand)]
enum UserAction {
    /// Create a local account (password is prompted)
    Create {
        #[arg(short, long)]
        email: Option<String>,

        /// Give the account the ADMIN role
        #[arg(long)]
        admin: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List accounts
    List {
        /// Case-insensitive email filter
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long, default_value_t = 50)]
        limit: i64,
    },

    /// Grant the ADMIN role to an account
    Promote { email: String },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::User { action } => handle_user_action(action, &pool).await?,
        Commands::Cleanup { yes } => run_cleanup(&pool, yes).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool, &database_url).await?,
    }

    Ok(())
}

/// Dispatches account management commands.
async fn handle_user_action(action: UserAction, pool: &PgPool) -> Result<()> {
    let users = Arc::new(PgUserRepository::new(Arc::new(pool.clone())));

    match action {
        UserAction::Create { email, admin, yes } => {
            create_user(pool, email, admin, yes).await?;
        }
        UserAction::List { search, limit } => {
            list_users(users, search, limit).await?;
        }
        UserAction::Promote { email } => {
            promote_user(users, email).await?;
        }
    }

    Ok(())
}

/// Creates a local account through [`AuthService`], so the email and
/// password rules match `POST /api/auth/register`.
async fn create_user(
    pool: &PgPool,
    email: Option<String>,
    admin: bool,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "👤 Create User".bright_blue().bold());
    println!();

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };

    let password = Password::new()
        .with_prompt("Password (8-128 characters)")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let role = if admin { Role::Admin } else { Role::User };

    println!();
    println!("  Email: {}", email.cyan());
    println!("  Role:  {}", role.to_string().bright_yellow());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this account?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let pool = Arc::new(pool.clone());
    let default_link_limit = std::env::var("DEFAULT_LINK_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    // No sessions are issued here, so the secret only has to exist.
    let auth = AuthService::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgSessionRepository::new(pool)),
        AuthSettings {
            session_secret: std::env::var("SESSION_SECRET").unwrap_or_default(),
            session_ttl: chrono::Duration::hours(1),
            default_link_limit,
        },
    );

    let user = auth
        .create_user(&email, &password, role)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create user: {}", e))?;

    println!();
    println!(
        "{} (id {})",
        "✅ Account created successfully!".green().bold(),
        user.id.to_string().bright_white()
    );
    println!();

    Ok(())
}

/// Lists accounts with their link counts.
///
/// # Output Format
///
/// ```text
/// 📋 Users
///
///   ID   Email                          Role   Links  Created            Status
///   ───────────────────────────────────────────────────────────────────────────
///   1    root@example.com               ADMIN  0      2026-01-15 10:30   ACTIVE
///   2    bob@example.com                USER   4      2026-01-16 14:20   BLOCKED
/// ```
async fn list_users(
    users: Arc<PgUserRepository>,
    search: Option<String>,
    limit: i64,
) -> Result<()> {
    println!("{}", "📋 Users".bright_blue().bold());
    println!();

    let rows = users
        .list(UserListQuery {
            exclude_id: 0,
            offset: 0,
            limit: limit.clamp(1, 1000),
            search: search.clone(),
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))?;

    if rows.is_empty() {
        println!("{}", "  No users found".yellow());
        println!();
        println!(
            "  Create one with: {} admin user create --admin",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    let total = users
        .count_matching(0, search)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count users: {}", e))?;

    println!(
        "  {:<4} {:<30} {:<6} {:<6} {:<18} {:<8}",
        "ID".bright_white().bold(),
        "Email".bright_white().bold(),
        "Role".bright_white().bold(),
        "Links".bright_white().bold(),
        "Created".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(80).bright_black());

    for row in &rows {
        let status = if row.user.is_blocked {
            "BLOCKED".red()
        } else {
            "ACTIVE".green()
        };
        let role = match row.user.role {
            Role::Admin => row.user.role.as_str().bright_yellow(),
            Role::User => row.user.role.as_str().normal(),
        };

        println!(
            "  {:<4} {:<30} {:<6} {:<6} {:<18} {}",
            row.user.id.to_string().bright_black(),
            row.user.email.cyan(),
            role,
            format!("{}/{}", row.link_count, row.user.link_limit),
            row.user
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            status
        );
    }

    println!();
    println!(
        "  Showing {} of {}",
        rows.len().to_string().bright_white().bold(),
        total.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Grants the ADMIN role. The HTTP admin console cannot do this for the
/// first administrator, so bootstrapping goes through here.
async fn promote_user(users: Arc<PgUserRepository>, email: String) -> Result<()> {
    println!("{}", "⬆️  Promote User".bright_blue().bold());
    println!();

    let user = users
        .find_by_email(&email.trim().to_lowercase())
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("User not found")?;

    if user.is_admin() {
        println!("{}", "⚠️  This account is already an administrator".yellow());
        return Ok(());
    }

    println!("  User: {}", user.email.cyan());
    println!("  ID:   {}", user.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Grant the ADMIN role?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    users
        .set_role(user.id, Role::Admin)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to change role: {}", e))?;

    println!();
    println!("{}", "✅ User promoted successfully!".green().bold());
    println!();

    Ok(())
}

/// Same work as the scheduled cleanup job, run once.
async fn run_cleanup(pool: &PgPool, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Cleanup".bright_blue().bold());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete expired anonymous links and sessions?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let pool = Arc::new(pool.clone());
    let links = PgLinkRepository::new(pool.clone());
    let sessions = PgSessionRepository::new(pool);
    let now = Utc::now();

    let links_deleted = links
        .delete_expired_anonymous(now)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete links: {}", e))?;
    let sessions_purged = sessions
        .delete_expired(now)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to purge sessions: {}", e))?;

    println!(
        "  Links deleted:    {}",
        links_deleted.to_string().bright_green().bold()
    );
    println!(
        "  Sessions purged:  {}",
        sessions_purged.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Number of users and administrators
/// - Number of links, anonymous and owned
/// - Total number of clicks
/// - Number of live sessions
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let admins_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'")
        .fetch_one(pool)
        .await?;

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
        .fetch_one(pool)
        .await?;

    let anonymous_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE owner_id IS NULL")
            .fetch_one(pool)
            .await?;

    let clicks_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks")
        .fetch_one(pool)
        .await?;

    let sessions_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE expires_at > NOW()")
            .fetch_one(pool)
            .await?;

    println!(
        "  Users:         {} ({} admin)",
        users_count.to_string().bright_green().bold(),
        admins_count
    );
    println!(
        "  Links:         {} ({} anonymous)",
        links_count.to_string().bright_green().bold(),
        anonymous_count
    );
    println!(
        "  Clicks:        {}",
        clicks_count.to_string().bright_green().bold()
    );
    println!(
        "  Live sessions: {}",
        sessions_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool, database_url: &str) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
                    .fetch_one(pool)
                    .await
                    .unwrap_or(0);

            println!(
                "  Connection: {}",
                mask_connection_string(database_url).bright_black()
            );
            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
