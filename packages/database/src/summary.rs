//! Summary path: band totals across a set of zones.
//!
//! Runs a single aggregate query over the 10-year band store and returns
//! the per-band sums for the results view.

use moosicbox_json_utils::database::ToValue as _;
use popbuilder_population_models::{
    Group, PopulationSummary, SUMMARY_BAND_COUNT, SUMMARY_BANDS, ZoneCode,
};
use switchy_database::Database;
use switchy_database::Row;

use crate::in_clause::zone_in_clause;
use crate::{DbError, POPULATION_TABLE};

/// Builds the `SELECT SUM(..) AS .., ...` list for every summary column,
/// males first.
fn sum_columns() -> String {
    [Group::Male, Group::Female]
        .into_iter()
        .flat_map(|group| SUMMARY_BANDS.iter().map(move |band| band.column(group)))
        .map(|column| format!("SUM({column}) AS {column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns the population of `codes` summed per 10-year band.
///
/// Codes with no record in the store contribute nothing; if none of the
/// codes exist every band is zero.
///
/// # Errors
///
/// Returns [`DbError`] if `codes` is empty, the query fails, or the
/// aggregate row cannot be decoded.
pub async fn get_summary(
    db: &dyn Database,
    codes: &[ZoneCode],
) -> Result<PopulationSummary, DbError> {
    let filter = zone_in_clause("code", codes)?;
    let sql = format!(
        "SELECT {} FROM {POPULATION_TABLE} WHERE {}",
        sum_columns(),
        filter.sql
    );

    let rows = db.query_raw_params(&sql, &filter.params).await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Aggregate query returned no row".to_string(),
    })?;

    let summary = PopulationSummary {
        male: read_bands(row, Group::Male)?,
        female: read_bands(row, Group::Female)?,
    };

    log::debug!(
        "Summary for {} zone(s): total {}",
        codes.len(),
        summary.total()
    );

    Ok(summary)
}

/// Reads the 10 summed bands for `group`. `SUM` over no matching rows is
/// `NULL`, which reads as zero.
fn read_bands(row: &Row, group: Group) -> Result<[i64; SUMMARY_BAND_COUNT], DbError> {
    let mut bands = [0; SUMMARY_BAND_COUNT];

    for (slot, band) in bands.iter_mut().zip(SUMMARY_BANDS.iter()) {
        let column = band.column(group);
        let value: Option<i64> = row.to_value(column.as_str()).map_err(|e| DbError::Conversion {
            message: format!("Failed to parse {column}: {e}"),
        })?;
        *slot = value.unwrap_or(0);
    }

    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PopulationStores;
    use crate::detail::get_detail;
    use crate::fixtures::{self, FixtureStores};

    fn codes(raw: &[&str]) -> Vec<ZoneCode> {
        raw.iter().copied().map(ZoneCode::from).collect()
    }

    async fn stores() -> (FixtureStores, PopulationStores) {
        let fixture = FixtureStores::build().await.unwrap();
        let stores = PopulationStores::open(fixture.dir()).await.unwrap();
        (fixture, stores)
    }

    #[test]
    fn sum_columns_alias_every_band() {
        let columns = sum_columns();
        assert!(columns.starts_with("SUM(m_0_9) AS m_0_9, SUM(m_10_19) AS m_10_19"));
        assert!(columns.ends_with("SUM(f_90) AS f_90"));
        assert_eq!(columns.matches("SUM(").count(), 2 * SUMMARY_BAND_COUNT);
    }

    #[tokio::test]
    async fn single_zone_totals() {
        let (_fixture, stores) = stores().await;

        for zone in &fixtures::ZONES {
            let summary = get_summary(stores.summary.as_ref(), &codes(&[zone.code]))
                .await
                .unwrap();
            assert_eq!(summary.total(), zone.total, "zone {}", zone.code);
        }

        let first = get_summary(stores.summary.as_ref(), &codes(&["E01004736"]))
            .await
            .unwrap();
        assert_eq!(first.formatted_total(), "1,863");
    }

    #[tokio::test]
    async fn union_of_zones_is_sum_of_single_zones() {
        let (_fixture, stores) = stores().await;
        let all: Vec<&str> = fixtures::ZONES.iter().map(|z| z.code).collect();

        let combined = get_summary(stores.summary.as_ref(), &codes(&all))
            .await
            .unwrap();

        let mut singles = Vec::new();
        for code in &all {
            singles.push(
                get_summary(stores.summary.as_ref(), &codes(&[code]))
                    .await
                    .unwrap(),
            );
        }
        let summed: PopulationSummary = singles.into_iter().sum();

        assert_eq!(combined, summed);
        assert_eq!(combined.total(), 18755);
        assert_eq!(combined.formatted_total(), "18,755");
    }

    #[tokio::test]
    async fn total_matches_detail_path() {
        let (_fixture, stores) = stores().await;
        let selection = codes(&["E01004733", "E01004745", "E01004747"]);

        let summary = get_summary(stores.summary.as_ref(), &selection)
            .await
            .unwrap();
        let detail = get_detail(stores.detail.as_ref(), &selection)
            .await
            .unwrap();

        let detail_total: i64 = detail.iter().map(|row| row.total()).sum();
        assert_eq!(summary.total(), detail_total);
    }

    #[tokio::test]
    async fn unknown_codes_contribute_nothing() {
        let (_fixture, stores) = stores().await;

        let mixed = get_summary(stores.summary.as_ref(), &codes(&["E01004736", "NOPE"]))
            .await
            .unwrap();
        let alone = get_summary(stores.summary.as_ref(), &codes(&["E01004736"]))
            .await
            .unwrap();
        assert_eq!(mixed, alone);

        let none = get_summary(stores.summary.as_ref(), &codes(&["NOPE"]))
            .await
            .unwrap();
        assert_eq!(none, PopulationSummary::default());
        assert_eq!(none.formatted_total(), "0");
    }

    #[tokio::test]
    async fn repeated_codes_are_counted_once() {
        let (_fixture, stores) = stores().await;

        let twice = get_summary(stores.summary.as_ref(), &codes(&["E01004736", "E01004736"]))
            .await
            .unwrap();
        assert_eq!(twice.total(), 1863);
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let (_fixture, stores) = stores().await;
        let result = get_summary(stores.summary.as_ref(), &[]).await;
        assert!(matches!(result, Err(DbError::NoZones)));
    }
}
