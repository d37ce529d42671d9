#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Form payloads and view models for the popbuilder server.
//!
//! Forms are decoded from `application/x-www-form-urlencoded` bodies. Every
//! field defaults to empty so that a missing field and an empty one are
//! treated alike.

use popbuilder_population_models::{Group, PopulationSummary, SUMMARY_BANDS};
use serde::{Deserialize, Serialize};

/// Body of a `POST /results` or `POST /download` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZonesForm {
    /// Comma-separated zone codes.
    #[serde(default)]
    pub zones: String,
}

/// Body of a `POST /` request from the intro page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntroForm {
    /// Non-empty when the intro form was submitted.
    #[serde(default)]
    pub posted: String,
    /// Non-empty when the visitor ticked "skip the intro".
    #[serde(default, rename = "skipintro")]
    pub skip_intro: String,
}

/// Data for the results page template.
///
/// Field names match the template placeholders: `population`, `zones`,
/// and one `m<age>` / `f<age>` field per 10-year band (`m0` .. `m90`,
/// `f0` .. `f90`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    /// Total population with thousands separators.
    pub population: String,
    /// The zone selection exactly as submitted.
    pub zones: String,
    /// Band counts.
    pub summary: PopulationSummary,
}

impl ResultsView {
    /// Builds the view for a summary and the raw zone selection it came from.
    #[must_use]
    pub fn new(summary: PopulationSummary, zones: impl Into<String>) -> Self {
        Self {
            population: summary.formatted_total(),
            zones: zones.into(),
            summary,
        }
    }

    /// Looks up a template field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "population" => Some(self.population.clone()),
            "zones" => Some(self.zones.clone()),
            _ => [Group::Male, Group::Female].into_iter().find_map(|group| {
                SUMMARY_BANDS
                    .iter()
                    .position(|band| band.field(group) == name)
                    .map(|i| self.summary.bands(group)[i].to_string())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ResultsView {
        ResultsView::new(
            PopulationSummary {
                male: [10, 11, 12, 13, 14, 15, 16, 17, 18, 19],
                female: [20, 21, 22, 23, 24, 25, 26, 27, 28, 1029],
            },
            "E01004736,E01004731",
        )
    }

    #[test]
    fn scalar_fields() {
        let view = view();
        assert_eq!(view.field("population").as_deref(), Some("1,390"));
        assert_eq!(view.field("zones").as_deref(), Some("E01004736,E01004731"));
    }

    #[test]
    fn band_fields() {
        let view = view();
        assert_eq!(view.field("m0").as_deref(), Some("10"));
        assert_eq!(view.field("m90").as_deref(), Some("19"));
        assert_eq!(view.field("f30").as_deref(), Some("23"));
        assert_eq!(view.field("f90").as_deref(), Some("1029"));
    }

    #[test]
    fn unknown_fields() {
        let view = view();
        assert_eq!(view.field("m5"), None);
        assert_eq!(view.field("p0"), None);
        assert_eq!(view.field(""), None);
    }
}
