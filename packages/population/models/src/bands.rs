//! Age band tables for the summary (10-year) and detail (5-year) paths.

/// An age range in whole years. `upper` is inclusive; `None` marks the
/// open-ended top band (e.g. `90+`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgeBand {
    /// Youngest age in the band.
    pub lower: u8,
    /// Oldest age in the band, or `None` for an open-ended band.
    pub upper: Option<u8>,
}

/// 10-year bands used by the summary store and the results view.
pub const SUMMARY_BANDS: [AgeBand; 10] = [
    AgeBand::span(0, 9),
    AgeBand::span(10, 19),
    AgeBand::span(20, 29),
    AgeBand::span(30, 39),
    AgeBand::span(40, 49),
    AgeBand::span(50, 59),
    AgeBand::span(60, 69),
    AgeBand::span(70, 79),
    AgeBand::span(80, 89),
    AgeBand::open(90),
];

/// 5-year bands used by the detail store and the CSV download.
pub const DETAIL_BANDS: [AgeBand; 19] = [
    AgeBand::span(0, 4),
    AgeBand::span(5, 9),
    AgeBand::span(10, 14),
    AgeBand::span(15, 19),
    AgeBand::span(20, 24),
    AgeBand::span(25, 29),
    AgeBand::span(30, 34),
    AgeBand::span(35, 39),
    AgeBand::span(40, 44),
    AgeBand::span(45, 49),
    AgeBand::span(50, 54),
    AgeBand::span(55, 59),
    AgeBand::span(60, 64),
    AgeBand::span(65, 69),
    AgeBand::span(70, 74),
    AgeBand::span(75, 79),
    AgeBand::span(80, 84),
    AgeBand::span(85, 89),
    AgeBand::open(90),
];

impl AgeBand {
    /// A closed band covering `lower..=upper`.
    #[must_use]
    pub const fn span(lower: u8, upper: u8) -> Self {
        Self {
            lower,
            upper: Some(upper),
        }
    }

    /// An open-ended band covering `lower` and above.
    #[must_use]
    pub const fn open(lower: u8) -> Self {
        Self { lower, upper: None }
    }

    /// Column suffix, e.g. `0_9` or `90`.
    #[must_use]
    pub fn suffix(&self) -> String {
        match self.upper {
            Some(upper) => format!("{}_{upper}", self.lower),
            None => self.lower.to_string(),
        }
    }

    /// Store column name for this band in `group`, e.g. `m_0_9`.
    #[must_use]
    pub fn column(&self, group: crate::Group) -> String {
        format!("{}_{}", group.prefix(), self.suffix())
    }

    /// Template field name for this band in `group`, e.g. `m0` or `f90`.
    #[must_use]
    pub fn field(&self, group: crate::Group) -> String {
        format!("{}{}", group.prefix(), self.lower)
    }

    /// Human-readable label, e.g. `0-9` or `90+`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.upper {
            Some(upper) => format!("{}-{upper}", self.lower),
            None => format!("{}+", self.lower),
        }
    }

    /// Whether `other` lies entirely inside this band.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        if other.lower < self.lower {
            return false;
        }
        match (self.upper, other.upper) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(outer), Some(inner)) => inner <= outer,
        }
    }
}

/// Column names for every band of `bands` in `group`, in table order.
pub fn columns(bands: &[AgeBand], group: crate::Group) -> impl Iterator<Item = String> + '_ {
    bands.iter().map(move |band| band.column(group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Group;

    #[test]
    fn column_names() {
        assert_eq!(SUMMARY_BANDS[0].column(Group::Male), "m_0_9");
        assert_eq!(SUMMARY_BANDS[9].column(Group::Female), "f_90");
        assert_eq!(DETAIL_BANDS[0].column(Group::Persons), "p_0_4");
        assert_eq!(DETAIL_BANDS[18].column(Group::Persons), "p_90");
    }

    #[test]
    fn field_names_and_labels() {
        assert_eq!(SUMMARY_BANDS[3].field(Group::Male), "m30");
        assert_eq!(SUMMARY_BANDS[3].label(), "30-39");
        assert_eq!(SUMMARY_BANDS[9].label(), "90+");
    }

    #[test]
    fn every_detail_band_folds_into_exactly_one_summary_band() {
        for detail in &DETAIL_BANDS {
            let owners = SUMMARY_BANDS.iter().filter(|s| s.contains(detail)).count();
            assert_eq!(owners, 1, "band {} has {owners} owners", detail.label());
        }
    }

    #[test]
    fn open_band_is_not_inside_closed_band() {
        assert!(!AgeBand::span(80, 89).contains(&AgeBand::open(90)));
        assert!(AgeBand::open(90).contains(&AgeBand::open(90)));
        assert!(!AgeBand::span(10, 19).contains(&AgeBand::span(5, 9)));
    }
}
