//! Creates a forum account in the configured Postgres database and prints
//! a bearer token for it.
//!
//! ```text
//! seed <username> [--staff] [--superuser]
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use auth_adapters::JwtAuthenticator;
use configs::Settings;
use domains::{DomainError, NewUser};
use secrecy::ExposeSecret;
use services::{AccountService, Repositories};
use storage_adapters::PgStore;

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<NewUser> {
    let mut new = NewUser::default();
    for arg in args {
        match arg.as_str() {
            "--staff" => new.is_staff = true,
            "--superuser" => {
                new.is_staff = true;
                new.is_superuser = true;
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            name if new.username.is_empty() => new.username = name.to_string(),
            extra => bail!("unexpected argument {extra}"),
        }
    }
    if new.username.is_empty() {
        bail!("usage: seed <username> [--staff] [--superuser]");
    }
    Ok(new)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
        .init();

    let new = parse_args(std::env::args().skip(1))?;
    let settings = Settings::load().context("loading configuration")?;
    if settings.database.is_memory() {
        bail!("seeding needs FORUM__DATABASE__URL pointing at Postgres");
    }

    let store = PgStore::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await?;
    store.migrate().await?;
    let accounts = AccountService::new(Repositories::from_store(Arc::new(store)).users);

    let username = new.username.clone();
    let user = match accounts.create_user(new).await {
        Ok(user) => user,
        Err(DomainError::Conflict(_)) => bail!("user {username} already exists"),
        Err(other) => return Err(other.into()),
    };

    let auth = JwtAuthenticator::new(
        &settings.auth.jwt_secret,
        chrono::Duration::seconds(settings.auth.token_ttl_secs),
    );
    println!("{} {}", user.id, auth.issue(user.id)?);
    Ok(())
}
