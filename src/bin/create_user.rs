//! Out-of-band user provisioning: hashes a password and upserts the user
//! row. There is no HTTP registration endpoint; this is the only way
//! credentials enter the system.

use anyhow::{Context, Result};
use clap::Parser;

use surgery_api::auth::password;
use surgery_api::{database, services};

#[derive(Parser, Debug)]
#[command(name = "create-user", about = "Provision an API user (reads DATABASE_URL)")]
struct Args {
    /// Username for the new or existing user
    username: String,

    /// Plaintext password; stored only as a bcrypt hash
    password: String,

    /// Print the hash without touching the database
    #[arg(long)]
    hash_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let hash = password::hash_password(&args.password).context("password hashing failed")?;

    if args.hash_only {
        println!("{}", hash);
        return Ok(());
    }

    let pool = database::connect().await.context("database connection failed")?;
    database::ensure_schema(&pool).await.context("schema preparation failed")?;

    let user = services::users::upsert(&pool, &args.username, &hash)
        .await
        .context("user upsert failed")?;

    println!("Provisioned user '{}' (id {})", user.username, user.id);
    Ok(())
}
