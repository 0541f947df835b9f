use crate::error::SourceError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::env;
use std::time::Duration;

const WRDS_HOST: &str = "wrds-pgdata.wharton.upenn.edu";
const WRDS_PORT: u16 = 9737;
const WRDS_DATABASE: &str = "wrds";

/// Opens a single-connection pool for the fetch phase.
///
/// Credentials are read after loading `.env` (if present). `DATABASE_URL`
/// wins; otherwise `WRDS_USERNAME` and `WRDS_PASSWORD` are used against the
/// WRDS PostgreSQL endpoint. The caller owns the pool and must close it once
/// the bulk fetches are done.
pub async fn connect() -> Result<PgPool, SourceError> {
    // A missing .env file is fine as long as the variables are in the environment.
    dotenvy::dotenv().ok();

    let options = connect_options()?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(SourceError::ConnectionError)?;

    Ok(pool)
}

fn connect_options() -> Result<PgConnectOptions, SourceError> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return url
            .parse::<PgConnectOptions>()
            .map_err(|e| SourceError::ConnectionConfigError(format!("invalid DATABASE_URL: {e}")));
    }

    let username = env::var("WRDS_USERNAME").map_err(|_e| {
        SourceError::ConnectionConfigError(
            "DATABASE_URL or WRDS_USERNAME/WRDS_PASSWORD must be set.".to_string(),
        )
    })?;
    let password = env::var("WRDS_PASSWORD").map_err(|_e| {
        SourceError::ConnectionConfigError("WRDS_PASSWORD must be set.".to_string())
    })?;

    Ok(PgConnectOptions::new()
        .host(WRDS_HOST)
        .port(WRDS_PORT)
        .database(WRDS_DATABASE)
        .username(&username)
        .password(&password)
        .ssl_mode(PgSslMode::Require))
}
