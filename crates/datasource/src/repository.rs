use crate::connection::connect;
use crate::error::SourceError;
use crate::RawDataSource;
use async_trait::async_trait;
use configuration::Tables;
use core_types::{RawDelisting, RawFactorRow, RawSecurityMonth, RawTables, SampleWindow};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

/// Fetches the raw tables from a WRDS-style PostgreSQL database.
///
/// Numeric columns are cast to `float8` in SQL so that every column decodes
/// the same way regardless of how the upstream schema declares it.
#[derive(Debug, Clone)]
pub struct PostgresSource {
    tables: Tables,
}

impl PostgresSource {
    /// `tables` must already have passed `Settings::validate`.
    pub fn new(tables: Tables) -> Self {
        Self { tables }
    }

    async fn fetch_all(&self, pool: &PgPool, window: &SampleWindow) -> Result<RawTables, SourceError> {
        let security_months = self.fetch_security_months(pool, window).await?;
        tracing::info!(rows = security_months.len(), "Fetched security months.");

        let delistings = self.fetch_delistings(pool, window).await?;
        tracing::info!(rows = delistings.len(), "Fetched delisting events.");

        let factors = self.fetch_factors(pool, window).await?;
        tracing::info!(rows = factors.len(), "Fetched reference factors.");

        Ok(RawTables {
            security_months,
            delistings,
            factors,
        })
    }

    /// Monthly stock file joined with the name history that was in effect on
    /// each observation date.
    pub async fn fetch_security_months(
        &self,
        pool: &PgPool,
        window: &SampleWindow,
    ) -> Result<Vec<RawSecurityMonth>, SourceError> {
        let table = &self.tables.security_months;
        let sql = format!(
            r#"
            SELECT
                a.permno::float8 AS permno, a.permco::float8 AS permco, a.date,
                b.shrcd::float8 AS shrcd, b.exchcd::float8 AS exchcd,
                a.ret::float8 AS ret, a.shrout::float8 AS shrout, a.prc::float8 AS prc,
                a.cfacpr::float8 AS cfacpr, a.cfacshr::float8 AS cfacshr
            FROM
                {table} AS a
            LEFT JOIN
                {names} AS b
                ON a.permno = b.permno AND b.namedt <= a.date AND a.date <= b.nameendt
            WHERE
                a.date BETWEEN $1 AND $2
            "#,
            names = self.tables.security_names,
        );

        let rows = run_query(pool, table, &sql, window).await?;
        rows.iter()
            .map(|row| -> Result<RawSecurityMonth, sqlx::Error> {
                Ok(RawSecurityMonth {
                    permno: row.try_get("permno")?,
                    permco: row.try_get("permco")?,
                    date: row.try_get("date")?,
                    shrcd: row.try_get("shrcd")?,
                    exchcd: row.try_get("exchcd")?,
                    ret: row.try_get("ret")?,
                    shrout: row.try_get("shrout")?,
                    prc: row.try_get("prc")?,
                    cfacpr: row.try_get("cfacpr")?,
                    cfacshr: row.try_get("cfacshr")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| decode_error(table, e))
    }

    pub async fn fetch_delistings(
        &self,
        pool: &PgPool,
        window: &SampleWindow,
    ) -> Result<Vec<RawDelisting>, SourceError> {
        let table = &self.tables.delistings;
        let sql = format!(
            r#"
            SELECT permno::float8 AS permno, dlret::float8 AS dlret, dlstdt, dlstcd::float8 AS dlstcd
            FROM {table}
            WHERE dlstdt BETWEEN $1 AND $2
            "#
        );

        let rows = run_query(pool, table, &sql, window).await?;
        rows.iter()
            .map(|row| -> Result<RawDelisting, sqlx::Error> {
                Ok(RawDelisting {
                    permno: row.try_get("permno")?,
                    dlret: row.try_get("dlret")?,
                    dlstdt: row.try_get("dlstdt")?,
                    dlstcd: row.try_get("dlstcd")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| decode_error(table, e))
    }

    pub async fn fetch_factors(
        &self,
        pool: &PgPool,
        window: &SampleWindow,
    ) -> Result<Vec<RawFactorRow>, SourceError> {
        let table = &self.tables.factors;
        let sql = format!(
            r#"
            SELECT date, mktrf::float8 AS mktrf, smb::float8 AS smb, hml::float8 AS hml, rf::float8 AS rf
            FROM {table}
            WHERE date BETWEEN $1 AND $2
            ORDER BY date ASC
            "#
        );

        let rows = run_query(pool, table, &sql, window).await?;
        rows.iter()
            .map(|row| -> Result<RawFactorRow, sqlx::Error> {
                Ok(RawFactorRow {
                    date: row.try_get("date")?,
                    mktrf: row.try_get("mktrf")?,
                    smb: row.try_get("smb")?,
                    hml: row.try_get("hml")?,
                    rf: row.try_get("rf")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| decode_error(table, e))
    }
}

#[async_trait]
impl RawDataSource for PostgresSource {
    async fn fetch_raw_tables(&self, window: &SampleWindow) -> Result<RawTables, SourceError> {
        let pool = connect().await?;
        tracing::debug!("Database connection established.");

        let result = self.fetch_all(&pool, window).await;

        // Released on both paths; nothing downstream touches the database.
        pool.close().await;
        tracing::debug!("Database connection closed.");

        result
    }
}

async fn run_query(
    pool: &PgPool,
    table: &str,
    sql: &str,
    window: &SampleWindow,
) -> Result<Vec<PgRow>, SourceError> {
    sqlx::query(sql)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(pool)
        .await
        .map_err(|e| decode_error(table, e))
}

/// Column-level failures are schema problems; everything else is a query failure.
fn decode_error(table: &str, error: sqlx::Error) -> SourceError {
    match error {
        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => SourceError::SchemaError {
            table: table.to_string(),
            message: error.to_string(),
        },
        other => SourceError::QueryError {
            table: table.to_string(),
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_failures_are_schema_errors() {
        let error = decode_error("crsp.msf", sqlx::Error::ColumnNotFound("shrcd".to_string()));
        assert!(matches!(error, SourceError::SchemaError { ref table, .. } if table == "crsp.msf"));

        let error = decode_error("crsp.msf", sqlx::Error::PoolTimedOut);
        assert!(matches!(error, SourceError::QueryError { .. }));
    }
}
