//! Small, fully known population stores for tests.
//!
//! Ten Leeds LSOAs with fixed totals. Each zone's remaining population is
//! spread evenly over the bands above its youngest band and split between
//! the sexes, then both stores are written through [`crate::load`] so the
//! summary and detail paths agree exactly.

use std::path::Path;

use popbuilder_population_models::{DETAIL_BAND_COUNT, ZoneCode, ZoneDetail};
use switchy_database::DatabaseValue;
use switchy_database_connection::init_sqlite_rusqlite;
use tempfile::TempDir;

use crate::{DbError, POPULATION_TABLE, load, paths};

/// A fixture zone: its code, total population, and persons aged 0-4.
#[derive(Debug, Clone, Copy)]
pub struct FixtureZone {
    /// Zone code.
    pub code: &'static str,
    /// Total population across every band.
    pub total: i64,
    /// Persons in the youngest 5-year band.
    pub youngest: i64,
}

const fn zone(code: &'static str, total: i64, youngest: i64) -> FixtureZone {
    FixtureZone {
        code,
        total,
        youngest,
    }
}

/// The fixture zones. Totals sum to 18,755 and the youngest bands to 909.
pub const ZONES: [FixtureZone; 10] = [
    zone("E01004736", 1863, 49),
    zone("E01004731", 1927, 87),
    zone("E01004732", 1608, 78),
    zone("E01004733", 2456, 84),
    zone("E01004744", 1375, 99),
    zone("E01004748", 1690, 76),
    zone("E01004743", 1534, 103),
    zone("E01004745", 2341, 132),
    zone("E01004746", 1531, 84),
    zone("E01004747", 2430, 117),
];

/// Builds the detail row for a fixture zone.
#[must_use]
pub fn zone_detail(zone: &FixtureZone) -> ZoneDetail {
    let rest = zone.total - zone.youngest;
    #[allow(clippy::cast_possible_wrap)]
    let others = (DETAIL_BAND_COUNT - 1) as i64;

    let persons: [i64; DETAIL_BAND_COUNT] = std::array::from_fn(|i| {
        if i == 0 {
            zone.youngest
        } else {
            #[allow(clippy::cast_possible_wrap)]
            let extra = i64::from((i as i64) <= rest % others);
            rest / others + extra
        }
    });
    let male: [i64; DETAIL_BAND_COUNT] = std::array::from_fn(|i| persons[i] / 2);
    let female = std::array::from_fn(|i| persons[i] - male[i]);

    ZoneDetail {
        code: ZoneCode::from(zone.code),
        persons,
        male,
        female,
    }
}

/// Detail rows for every fixture zone, in [`ZONES`] order.
#[must_use]
pub fn zone_details() -> Vec<ZoneDetail> {
    ZONES.iter().map(zone_detail).collect()
}

/// Both fixture stores written into a temporary directory that is removed
/// on drop.
pub struct FixtureStores {
    dir: TempDir,
}

impl FixtureStores {
    /// Writes the fixture stores.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the directory or either store cannot be
    /// written.
    pub async fn build() -> Result<Self, DbError> {
        let dir = tempfile::tempdir()?;
        load::build_stores(dir.path(), &zone_details()).await?;
        Ok(Self { dir })
    }

    /// Directory holding `popzones-10.db` and `popzones-5.db`.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Overwrites one band of one zone in the detail store with text, so
    /// that reading it back as a count fails.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be opened or updated.
    pub async fn corrupt_detail_band(&self, code: &str, column: &str) -> Result<(), DbError> {
        let path = paths::detail_db_path(self.dir());
        let db = init_sqlite_rusqlite(Some(path.as_path())).map_err(|e| DbError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        db.exec_raw_params(
            &format!("UPDATE {POPULATION_TABLE} SET {column} = 'corrupt' WHERE code = $1"),
            &[DatabaseValue::String(code.to_string())],
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_rows_hit_their_targets() {
        for zone in &ZONES {
            let detail = zone_detail(zone);
            assert_eq!(detail.total(), zone.total, "zone {}", zone.code);
            assert_eq!(detail.persons[0], zone.youngest);
            assert!(detail.persons.iter().all(|&n| n >= 0));
        }
    }

    #[test]
    fn fixture_sums() {
        assert_eq!(ZONES.iter().map(|z| z.total).sum::<i64>(), 18755);
        assert_eq!(ZONES.iter().map(|z| z.youngest).sum::<i64>(), 909);
    }
}
