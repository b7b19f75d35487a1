use clap::{Parser, Subcommand};
use sqlx::SqlitePool;

use crate::auth::hash_password;
use crate::models::{Role, SignupRequest, User};

#[derive(Debug, Parser)]
#[command(name = "event-planner", version, about = "Event planning backend with invites and RSVPs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API (the default when no command is given)
    Serve,
    /// Create an account directly in the database
    CreateUser {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
        /// Give the account the organizer role
        #[arg(long)]
        organizer: bool,
    },
}

pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<User> {
    let request = SignupRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role,
    };
    request.validate().map_err(anyhow::Error::msg)?;

    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    let user = User::new(
        request.username.trim().to_string(),
        request.email.trim().to_lowercase(),
        hash,
        role,
    );

    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(&user.created_at)
    .execute(pool)
    .await?;

    println!("Created user:");
    println!("  ID: {}", user.id);
    println!("  Username: {}", user.username);
    println!("  Role: {}", user.role);

    Ok(user)
}
