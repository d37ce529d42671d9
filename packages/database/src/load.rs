//! Offline construction of the population stores.
//!
//! The server never writes to the stores. This module builds both of them
//! from a single CSV extract of 5-year bands: the detail store is written
//! as-is and the summary store is derived by folding pairs of 5-year bands
//! into 10-year bands, so the two aggregation paths always agree.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use popbuilder_population_models::{
    DETAIL_BAND_COUNT, DETAIL_BANDS, Group, PopulationSummary, SUMMARY_BAND_COUNT, SUMMARY_BANDS,
    ZoneCode, ZoneDetail,
};
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;

use crate::detail::{DETAIL_GROUPS, detail_columns};
use crate::{DbError, POPULATION_TABLE, paths};

/// Rows per multi-row `INSERT`. Keeps the detail store's bound parameter
/// count (58 per row) under `SQLite`'s historical limit of 999.
const INSERT_CHUNK: usize = 16;

/// Outcome of a store build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    /// Zones written to each store.
    pub zones: usize,
    /// Total population across every zone.
    pub population: i64,
}

/// Reads zone rows from a CSV extract.
///
/// The header must contain `code` and every detail column (`p_0_4` ..
/// `f_90`); extra columns are ignored and column order is free.
///
/// # Errors
///
/// Returns [`DbError::Conversion`] if a column is missing, a count is not a
/// non-negative integer, or a zone code appears twice, and [`DbError::Csv`]
/// if the CSV itself is malformed.
pub fn read_detail_csv<R: Read>(reader: R) -> Result<Vec<ZoneDetail>, DbError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let index_of = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DbError::Conversion {
                message: format!("Missing column {name}"),
            })
    };

    let code_idx = index_of("code")?;
    let mut band_idx = Vec::with_capacity(DETAIL_GROUPS.len() * DETAIL_BAND_COUNT);
    for group in DETAIL_GROUPS {
        for band in &DETAIL_BANDS {
            band_idx.push(index_of(&band.column(group))?);
        }
    }

    let mut seen = BTreeSet::new();
    let mut zones = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Line 1 is the header.
        let line = i + 2;

        let code = record.get(code_idx).unwrap_or_default().to_string();
        if code.is_empty() {
            return Err(DbError::Conversion {
                message: format!("Empty zone code on line {line}"),
            });
        }
        if !seen.insert(code.clone()) {
            return Err(DbError::Conversion {
                message: format!("Duplicate zone code {code} on line {line}"),
            });
        }

        let mut counts = [[0_i64; DETAIL_BAND_COUNT]; 3];
        for (n, idx) in band_idx.iter().enumerate() {
            let raw = record.get(*idx).unwrap_or_default();
            let value: i64 = raw.parse().map_err(|_| DbError::Conversion {
                message: format!("Invalid count {raw:?} in column {} on line {line}", &headers[*idx]),
            })?;
            if value < 0 {
                return Err(DbError::Conversion {
                    message: format!("Negative count in column {} on line {line}", &headers[*idx]),
                });
            }
            counts[n / DETAIL_BAND_COUNT][n % DETAIL_BAND_COUNT] = value;
        }

        let [persons, male, female] = counts;
        zones.push(ZoneDetail {
            code: ZoneCode::from(code),
            persons,
            male,
            female,
        });
    }

    Ok(zones)
}

/// Folds a zone's 5-year bands into the 10-year bands of the summary store.
#[must_use]
pub fn summarise(zone: &ZoneDetail) -> PopulationSummary {
    PopulationSummary {
        male: fold_bands(&zone.male),
        female: fold_bands(&zone.female),
    }
}

fn fold_bands(fine: &[i64; DETAIL_BAND_COUNT]) -> [i64; SUMMARY_BAND_COUNT] {
    std::array::from_fn(|i| {
        DETAIL_BANDS
            .iter()
            .zip(fine.iter())
            .filter(|(band, _)| SUMMARY_BANDS[i].contains(band))
            .map(|(_, count)| count)
            .sum()
    })
}

/// Column names of the summary store in table order, starting with `code`.
#[must_use]
pub fn summary_columns() -> Vec<String> {
    std::iter::once("code".to_string())
        .chain([Group::Male, Group::Female].into_iter().flat_map(|group| {
            SUMMARY_BANDS.iter().map(move |band| band.column(group))
        }))
        .collect()
}

/// Creates the `population` table and writes one detail row per zone.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails.
pub async fn write_detail_store(db: &dyn Database, zones: &[ZoneDetail]) -> Result<(), DbError> {
    let rows = zones.iter().map(|zone| {
        let mut values = Vec::with_capacity(1 + DETAIL_GROUPS.len() * DETAIL_BAND_COUNT);
        values.push(DatabaseValue::String(zone.code.as_str().to_string()));
        for group in DETAIL_GROUPS {
            values.extend(zone.bands(group).iter().copied().map(DatabaseValue::Int64));
        }
        values
    });

    write_table(db, &detail_columns(), rows).await
}

/// Creates the `population` table and writes one 10-year band row per zone.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails.
pub async fn write_summary_store(db: &dyn Database, zones: &[ZoneDetail]) -> Result<(), DbError> {
    let rows = zones.iter().map(|zone| {
        let summary = summarise(zone);
        let mut values = Vec::with_capacity(1 + 2 * SUMMARY_BAND_COUNT);
        values.push(DatabaseValue::String(zone.code.as_str().to_string()));
        values.extend(summary.male.iter().copied().map(DatabaseValue::Int64));
        values.extend(summary.female.iter().copied().map(DatabaseValue::Int64));
        values
    });

    write_table(db, &summary_columns(), rows).await
}

async fn write_table(
    db: &dyn Database,
    columns: &[String],
    rows: impl Iterator<Item = Vec<DatabaseValue>>,
) -> Result<(), DbError> {
    let definitions = columns
        .iter()
        .map(|column| {
            if column == "code" {
                "code TEXT PRIMARY KEY".to_string()
            } else {
                format!("{column} INTEGER NOT NULL")
            }
        })
        .collect::<Vec<_>>()
        .join(",\n            ");

    db.exec_raw(&format!("DROP TABLE IF EXISTS {POPULATION_TABLE}"))
        .await?;
    db.exec_raw(&format!(
        "CREATE TABLE {POPULATION_TABLE} (\n            {definitions}\n        )"
    ))
    .await?;

    let column_list = columns.join(", ");
    let rows: Vec<Vec<DatabaseValue>> = rows.collect();

    for chunk in rows.chunks(INSERT_CHUNK) {
        let mut placeholders = Vec::with_capacity(chunk.len());
        let mut params = Vec::with_capacity(chunk.len() * columns.len());
        let mut next = 1;

        for row in chunk {
            let slots: Vec<String> = (next..next + row.len()).map(|i| format!("${i}")).collect();
            next += row.len();
            placeholders.push(format!("({})", slots.join(", ")));
            params.extend(row.iter().cloned());
        }

        db.exec_raw_params(
            &format!(
                "INSERT INTO {POPULATION_TABLE} ({column_list}) VALUES {}",
                placeholders.join(", ")
            ),
            &params,
        )
        .await?;
    }

    Ok(())
}

/// Creates (or truncates) a store file and returns a handle to it.
///
/// # Errors
///
/// Returns [`DbError`] if an existing file cannot be removed or the new
/// store cannot be opened.
pub fn create_store(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent)?;
    }
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Writes both stores into `dir` from in-memory zone rows.
///
/// # Errors
///
/// Returns [`DbError`] if either store cannot be created or written.
pub async fn build_stores(dir: &Path, zones: &[ZoneDetail]) -> Result<BuildReport, DbError> {
    let detail_path = paths::detail_db_path(dir);
    log::info!("Writing {} zones to {}", zones.len(), detail_path.display());
    let detail = create_store(&detail_path)?;
    write_detail_store(detail.as_ref(), zones).await?;

    let summary_path = paths::summary_db_path(dir);
    log::info!("Writing {} zones to {}", zones.len(), summary_path.display());
    let summary = create_store(&summary_path)?;
    write_summary_store(summary.as_ref(), zones).await?;

    Ok(BuildReport {
        zones: zones.len(),
        population: zones.iter().map(ZoneDetail::total).sum(),
    })
}

/// Reads a CSV extract from `input` and writes both stores into `dir`.
///
/// # Errors
///
/// Returns [`DbError`] if the input cannot be read or parsed, or a store
/// cannot be written.
pub async fn build_stores_from_csv(input: &Path, dir: &Path) -> Result<BuildReport, DbError> {
    log::info!("Reading {}", input.display());
    let file = std::fs::File::open(input)?;
    let zones = read_detail_csv(std::io::BufReader::new(file))?;
    build_stores(dir, &zones).await
}
