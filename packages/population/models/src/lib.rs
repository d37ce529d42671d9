#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Zone code, age band, and population result types.
//!
//! This crate defines the vocabulary shared by the lookup stores, the
//! server, and the ingest tool. Band tables are declared once here so that
//! SQL column lists, CSV headers, and template field names are all derived
//! from the same source.

pub mod bands;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use bands::{AgeBand, DETAIL_BANDS, SUMMARY_BANDS};

/// Number of 10-year bands per sex on the summary path.
pub const SUMMARY_BAND_COUNT: usize = SUMMARY_BANDS.len();

/// Number of 5-year bands per group on the detail path.
pub const DETAIL_BAND_COUNT: usize = DETAIL_BANDS.len();

/// Delimiter between zone codes in a submitted selection.
pub const ZONE_DELIMITER: char = ',';

/// Identifier for a small geographic area, e.g. a census LSOA code such as
/// `E01004736`.
///
/// Zone codes are opaque: no structure is assumed beyond being an exact-match
/// lookup key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneCode(String);

impl ZoneCode {
    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ZoneCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ZoneCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ZoneCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ZoneCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Splits a comma-delimited zone selection into zone codes.
///
/// Order is preserved. Tokens are neither trimmed, deduplicated, nor
/// validated; codes that do not exist in a store are simply absent from
/// query results. An empty input yields a single empty code, so callers
/// treat an empty selection as "nothing selected" before parsing.
#[must_use]
pub fn parse_zone_codes(raw: &str) -> Vec<ZoneCode> {
    raw.split(ZONE_DELIMITER).map(ZoneCode::from).collect()
}

/// Population group a band column belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Group {
    /// All persons (male + female).
    Persons,
    /// Males.
    Male,
    /// Females.
    Female,
}

impl Group {
    /// Column and field-name prefix used by the stores and templates.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Persons => "p",
            Self::Male => "m",
            Self::Female => "f",
        }
    }
}

/// Population for a set of zones on the summary path: 10-year bands for
/// each sex, summed across every requested zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSummary {
    /// Male counts, indexed like [`SUMMARY_BANDS`].
    pub male: [i64; SUMMARY_BAND_COUNT],
    /// Female counts, indexed like [`SUMMARY_BANDS`].
    pub female: [i64; SUMMARY_BAND_COUNT],
}

impl PopulationSummary {
    /// Total population: the sum of all 20 band counts.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.male.iter().chain(self.female.iter()).sum()
    }

    /// Total population formatted with thousands separators.
    #[must_use]
    pub fn formatted_total(&self) -> String {
        format_thousands(self.total())
    }

    /// Counts for the given sex. [`Group::Persons`] yields the per-band sum of
    /// both sexes.
    #[must_use]
    pub fn bands(&self, group: Group) -> [i64; SUMMARY_BAND_COUNT] {
        match group {
            Group::Male => self.male,
            Group::Female => self.female,
            Group::Persons => std::array::from_fn(|i| self.male[i] + self.female[i]),
        }
    }
}

impl std::ops::Add for PopulationSummary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            male: std::array::from_fn(|i| self.male[i] + rhs.male[i]),
            female: std::array::from_fn(|i| self.female[i] + rhs.female[i]),
        }
    }
}

impl std::iter::Sum for PopulationSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, s| acc + s)
    }
}

/// Population for a single zone on the detail path: 5-year bands for
/// persons, males, and females.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDetail {
    /// Zone the counts belong to.
    pub code: ZoneCode,
    /// Person counts, indexed like [`DETAIL_BANDS`].
    pub persons: [i64; DETAIL_BAND_COUNT],
    /// Male counts, indexed like [`DETAIL_BANDS`].
    pub male: [i64; DETAIL_BAND_COUNT],
    /// Female counts, indexed like [`DETAIL_BANDS`].
    pub female: [i64; DETAIL_BAND_COUNT],
}

impl ZoneDetail {
    /// Counts for the given group.
    #[must_use]
    pub const fn bands(&self, group: Group) -> &[i64; DETAIL_BAND_COUNT] {
        match group {
            Group::Persons => &self.persons,
            Group::Male => &self.male,
            Group::Female => &self.female,
        }
    }

    /// Total population of the zone, taken from the persons bands.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.persons.iter().sum()
    }
}

/// Formats an integer with `,` as the thousands separator.
///
/// ```
/// use popbuilder_population_models::format_thousands;
///
/// assert_eq!(format_thousands(18755), "18,755");
/// assert_eq!(format_thousands(909), "909");
/// ```
#[must_use]
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if value < 0 {
        out.push('-');
    }

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
