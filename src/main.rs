use clap::Parser;
use event_planner::cli::{self, Cli, Command};
use event_planner::config::Config;
use event_planner::models::Role;
use event_planner::{build_app, db};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let app = build_app(pool, &config);
            let listener = TcpListener::bind(config.bind_addr).await?;

            tracing::info!("listening on {}", config.bind_addr);
            axum::serve(listener, app).await?;
        }
        Command::CreateUser {
            username,
            email,
            password,
            organizer,
        } => {
            let role = if organizer { Role::Organizer } else { Role::User };
            cli::create_user(&pool, &username, &email, &password, role).await?;
        }
    }

    Ok(())
}
