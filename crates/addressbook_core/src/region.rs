//! Restricted-jurisdiction classification
//!
//! A contact whose country appears in [`RESTRICTED_JURISDICTIONS`] keeps its
//! personal fields in the PII store. Matching is case-insensitive against
//! either the display name or the ISO 3166-1 alpha-2 code.

use serde::{Deserialize, Serialize};

/// A jurisdiction subject to PII storage restrictions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Jurisdiction {
    pub name: &'static str,
    pub code: &'static str,
}

impl Jurisdiction {
    const fn new(name: &'static str, code: &'static str) -> Self {
        Self { name, code }
    }

    /// Whether `country` names this jurisdiction by name or by code.
    ///
    /// `upper` must already be uppercased with [`str::to_uppercase`].
    fn matches_upper(&self, upper: &str) -> bool {
        self.name.eq_ignore_ascii_case(upper) || self.code.eq_ignore_ascii_case(upper)
    }

    /// Whether `country` names this jurisdiction by name or by code
    pub fn matches(&self, country: &str) -> bool {
        self.matches_upper(&country.to_uppercase())
    }
}

/// EU member states plus the EEA states
pub const RESTRICTED_JURISDICTIONS: &[Jurisdiction] = &[
    Jurisdiction::new("Austria", "AT"),
    Jurisdiction::new("Belgium", "BE"),
    Jurisdiction::new("Bulgaria", "BG"),
    Jurisdiction::new("Croatia", "HR"),
    Jurisdiction::new("Cyprus", "CY"),
    Jurisdiction::new("Czech Republic", "CZ"),
    Jurisdiction::new("Denmark", "DK"),
    Jurisdiction::new("Estonia", "EE"),
    Jurisdiction::new("Finland", "FI"),
    Jurisdiction::new("France", "FR"),
    Jurisdiction::new("Germany", "DE"),
    Jurisdiction::new("Greece", "GR"),
    Jurisdiction::new("Hungary", "HU"),
    Jurisdiction::new("Iceland", "IS"),
    Jurisdiction::new("Ireland", "IE"),
    Jurisdiction::new("Italy", "IT"),
    Jurisdiction::new("Latvia", "LV"),
    Jurisdiction::new("Liechtenstein", "LI"),
    Jurisdiction::new("Lithuania", "LT"),
    Jurisdiction::new("Luxembourg", "LU"),
    Jurisdiction::new("Malta", "MT"),
    Jurisdiction::new("Netherlands", "NL"),
    Jurisdiction::new("Norway", "NO"),
    Jurisdiction::new("Poland", "PL"),
    Jurisdiction::new("Portugal", "PT"),
    Jurisdiction::new("Romania", "RO"),
    Jurisdiction::new("Slovakia", "SK"),
    Jurisdiction::new("Slovenia", "SI"),
    Jurisdiction::new("Spain", "ES"),
    Jurisdiction::new("Sweden", "SE"),
];

/// Classify a country as restricted (`true`) or not.
///
/// Unknown or empty input is never restricted.
///
/// Comparison uppercases the input with full Unicode case mapping, so a
/// dotless `ı` matches `I`.
pub fn is_private_region(country: &str) -> bool {
    let upper = country.to_uppercase();
    RESTRICTED_JURISDICTIONS
        .iter()
        .any(|jurisdiction| jurisdiction.matches_upper(&upper))
}

/// The data center this deployment runs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCenter {
    /// Provider region identifier, e.g. `gdn-eu-west`
    pub region: String,
    pub city: String,
    pub country_code: String,
}

impl DataCenter {
    /// Whether the region identifier names an EU data center
    pub fn is_eu(&self) -> bool {
        is_eu_region(&self.region)
    }

    /// Human-readable label, e.g. `Frankfurt, DE`
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.country_code)
    }
}

pub fn is_eu_region(region: &str) -> bool {
    region.contains("-eu-")
}
