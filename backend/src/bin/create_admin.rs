//! Admin CLI: create a superuser account directly in the database.
//!
//! Superusers are never created over HTTP; this binary is the only way to
//! mint one.

use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};

use backend::domain::AccountService;
use backend::domain::user::{DisplayName, EmailAddress};
use backend::outbound::persistence::{
    DbPool, DieselAccessTokenRepository, DieselUserRepository, PoolConfig,
};

/// Create a superuser account.
#[derive(Parser, Debug)]
#[command(name = "create-admin", version, about)]
struct Args {
    /// Email address for the new superuser.
    #[arg(long)]
    email: String,

    /// Display name for the new superuser.
    #[arg(long)]
    name: String,

    /// Password for the new superuser.
    #[arg(long)]
    password: String,

    /// PostgreSQL connection URL; falls back to DATABASE_URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let email = EmailAddress::new(&args.email).map_err(|err| eyre!("invalid email: {err}"))?;
    let name = DisplayName::new(args.name).map_err(|err| eyre!("invalid name: {err}"))?;

    let pool = DbPool::new(PoolConfig::new(&args.database_url)).await?;
    let accounts = AccountService::new(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselAccessTokenRepository::new(pool)),
    );

    let user = accounts
        .create_superuser(email, name, &args.password)
        .await
        .map_err(|err| eyre!("superuser creation failed: {}", err.message()))?;

    println!("created superuser {} ({})", user.email(), user.id());
    Ok(())
}
