//! Detail path: one row of 5-year bands per zone, for the CSV download.

use moosicbox_json_utils::database::ToValue as _;
use popbuilder_population_models::{DETAIL_BAND_COUNT, DETAIL_BANDS, Group, ZoneCode, ZoneDetail};
use switchy_database::{Database, Row};

use crate::in_clause::zone_in_clause;
use crate::{DbError, POPULATION_TABLE};

/// Groups in detail-store column order.
pub const DETAIL_GROUPS: [Group; 3] = [Group::Persons, Group::Male, Group::Female];

/// Column names of the detail store in table order, starting with `code`.
#[must_use]
pub fn detail_columns() -> Vec<String> {
    std::iter::once("code".to_string())
        .chain(DETAIL_GROUPS.into_iter().flat_map(|group| {
            DETAIL_BANDS.iter().map(move |band| band.column(group))
        }))
        .collect()
}

/// Returns one [`ZoneDetail`] per requested code present in the store.
///
/// Codes missing from the store are omitted. Rows come back in the store's
/// natural order, which is not necessarily the order of `codes`.
///
/// # Errors
///
/// Returns [`DbError`] if `codes` is empty, the query fails, or any row
/// cannot be decoded. A single bad row fails the whole call.
pub async fn get_detail(db: &dyn Database, codes: &[ZoneCode]) -> Result<Vec<ZoneDetail>, DbError> {
    let filter = zone_in_clause("code", codes)?;
    let sql = format!(
        "SELECT {} FROM {POPULATION_TABLE} WHERE {}",
        detail_columns().join(", "),
        filter.sql
    );

    let rows = db.query_raw_params(&sql, &filter.params).await?;

    let details = rows.iter().map(read_zone).collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "Detail for {} requested zone(s): {} found",
        codes.len(),
        details.len()
    );

    Ok(details)
}

fn read_zone(row: &Row) -> Result<ZoneDetail, DbError> {
    let code: String = row.to_value("code").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse zone code: {e}"),
    })?;

    Ok(ZoneDetail {
        persons: read_bands(row, &code, Group::Persons)?,
        male: read_bands(row, &code, Group::Male)?,
        female: read_bands(row, &code, Group::Female)?,
        code: ZoneCode::from(code),
    })
}

fn read_bands(row: &Row, code: &str, group: Group) -> Result<[i64; DETAIL_BAND_COUNT], DbError> {
    let mut bands = [0; DETAIL_BAND_COUNT];

    for (slot, band) in bands.iter_mut().zip(DETAIL_BANDS.iter()) {
        let column = band.column(group);
        *slot = row
            .to_value(column.as_str())
            .map_err(|e| DbError::Conversion {
                message: format!("Failed to parse {column} for zone {code}: {e}"),
            })?;
    }

    Ok(bands)
}
