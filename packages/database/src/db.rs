//! Store connection lifecycle.

use std::path::Path;
use std::sync::Arc;

use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, Row};
use switchy_database_connection::init_sqlite_rusqlite;

use crate::{DbError, POPULATION_TABLE, paths};

/// Opens an existing population store.
///
/// The file must already exist: a missing store is reported as
/// [`DbError::Open`] rather than silently created empty. The `population`
/// table is probed once so that a store without the expected schema fails
/// here instead of on the first request.
///
/// # Errors
///
/// Returns [`DbError`] if the file is missing, cannot be opened, or has no
/// `population` table.
pub async fn open_store(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if !path.is_file() {
        return Err(DbError::Open {
            path: path.display().to_string(),
            message: "file does not exist".to_string(),
        });
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let count = count_zones(db.as_ref()).await?;
    log::info!("Opened {} ({count} zones)", path.display());

    Ok(db)
}

/// Returns the number of zones in a store.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_zones(db: &dyn Database) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT COUNT(*) AS count FROM {POPULATION_TABLE}"),
            &[],
        )
        .await?;

    read_count(&rows)
}

/// Decodes the single `count` column of a `COUNT(*)` result.
fn read_count(rows: &[Row]) -> Result<u64, DbError> {
    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Count query returned no row".to_string(),
    })?;

    let count: i64 = row.to_value("count").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse zone count: {e}"),
    })?;

    u64::try_from(count).map_err(|_| DbError::Conversion {
        message: format!("Negative zone count {count}"),
    })
}

/// The two read-only population stores, opened once at startup and shared
/// by every request.
#[derive(Clone)]
pub struct PopulationStores {
    /// 10-year band store queried by the results view.
    pub summary: Arc<dyn Database>,
    /// 5-year band store queried by the download view.
    pub detail: Arc<dyn Database>,
}

impl PopulationStores {
    /// Opens both stores from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if either store cannot be opened.
    pub async fn open(dir: &Path) -> Result<Self, DbError> {
        let summary = open_store(&paths::summary_db_path(dir)).await?;
        let detail = open_store(&paths::detail_db_path(dir)).await?;

        Ok(Self {
            summary: Arc::from(summary),
            detail: Arc::from(detail),
        })
    }

    /// Releases the store handles.
    ///
    /// Connections close once the last clone of the handles is dropped; the
    /// server calls this after the HTTP server has stopped, at which point
    /// no request holds a clone.
    pub fn close(self) {
        log::info!("Closing population stores");
        drop(self.summary);
        drop(self.detail);
    }
}

impl std::fmt::Debug for PopulationStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulationStores").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn missing_store_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PopulationStores::open(dir.path()).await;
        assert!(matches!(result, Err(DbError::Open { .. })));
        assert!(!paths::summary_db_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn opens_fixture_stores() {
        let fixture = fixtures::FixtureStores::build().await.unwrap();
        let stores = PopulationStores::open(fixture.dir()).await.unwrap();

        let zones = fixtures::ZONES.len() as u64;
        assert_eq!(count_zones(stores.summary.as_ref()).await.unwrap(), zones);
        assert_eq!(count_zones(stores.detail.as_ref()).await.unwrap(), zones);

        stores.close();
    }

    #[tokio::test]
    async fn count_decoding_errors_are_reported() {
        let fixture = fixtures::FixtureStores::build().await.unwrap();
        let stores = PopulationStores::open(fixture.dir()).await.unwrap();
        let db = stores.summary.as_ref();

        let rows = db
            .query_raw_params("SELECT 'many' AS count", &[])
            .await
            .unwrap();
        assert!(matches!(read_count(&rows), Err(DbError::Conversion { .. })));

        let rows = db
            .query_raw_params("SELECT -1 AS count", &[])
            .await
            .unwrap();
        assert!(matches!(read_count(&rows), Err(DbError::Conversion { .. })));

        let rows = db
            .query_raw_params("SELECT 1 AS count WHERE 1 = 0", &[])
            .await
            .unwrap();
        assert!(matches!(read_count(&rows), Err(DbError::Conversion { .. })));
    }

    #[tokio::test]
    async fn empty_store_counts_zero_zones() {
        let dir = tempfile::tempdir().unwrap();
        crate::load::build_stores(dir.path(), &[]).await.unwrap();

        let stores = PopulationStores::open(dir.path()).await.unwrap();
        assert_eq!(count_zones(stores.summary.as_ref()).await.unwrap(), 0);
        assert_eq!(count_zones(stores.detail.as_ref()).await.unwrap(), 0);
    }
}
