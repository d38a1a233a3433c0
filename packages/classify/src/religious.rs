//! Religious-historic sites.
//!
//! Historic churches, chapels, shrines, and similar, identified either by
//! a religious `historic=*` value or by a religious building or place of
//! worship that is also tagged `historic=yes`.

use std::sync::LazyLock;

use crate::rules::{Outcome, Rule, RuleSet, Signals};

pub const RELIGIOUS_BUILDINGS: &[&str] = &[
    "church",
    "chapel",
    "cathedral",
    "monastery",
    "abbey",
    "basilica",
    "mosque",
    "synagogue",
    "temple",
    "shrine",
];

pub const RELIGIOUS_HISTORIC: &[&str] = &[
    "church",
    "chapel",
    "cathedral",
    "monastery",
    "abbey",
    "basilica",
    "mosque",
    "synagogue",
    "temple",
    "wayside_shrine",
    "wayside_cross",
    "religious",
];

/// Tried in order for the civilization column.
pub const CIVILIZATION_KEYS: &[&str] = &[
    "historic:civilization",
    "civilization",
    "archaeological_site:civilization",
    "culture",
];

const GENERIC_HISTORIC_VALUES: &[&str] = &["yes", "1", "true"];

static RULES: LazyLock<RuleSet> = LazyLock::new(|| RuleSet {
    name: "religious_historic",
    text_keys: &[],
    inclusion: None,
    exclusion: None,
    rules: vec![
        Rule {
            name: "religious_historic_value",
            evaluate: religious_historic_value,
        },
        Rule {
            name: "historic_religious_building",
            evaluate: historic_religious_building,
        },
        Rule {
            name: "historic_place_of_worship",
            evaluate: historic_place_of_worship,
        },
    ],
});

#[must_use]
pub fn rule_set() -> &'static RuleSet {
    &RULES
}

fn generic_historic(s: &Signals<'_>) -> bool {
    GENERIC_HISTORIC_VALUES.contains(&s.tags.lower("historic").as_str())
}

fn religious_historic_value(s: &Signals<'_>) -> Outcome {
    let hist = s.tags.lower("historic");
    if RELIGIOUS_HISTORIC.contains(&hist.as_str()) {
        Outcome::Accept(format!("historic:{hist}"))
    } else {
        Outcome::Continue
    }
}

/// Takes precedence over a plain historic place of worship, so a
/// historic church building is labelled by its building type.
fn historic_religious_building(s: &Signals<'_>) -> Outcome {
    let building = s.tags.lower("building");
    if RELIGIOUS_BUILDINGS.contains(&building.as_str()) && generic_historic(s) {
        Outcome::Accept(format!("historic_building:{building}"))
    } else {
        Outcome::Continue
    }
}

fn historic_place_of_worship(s: &Signals<'_>) -> Outcome {
    if s.tags.lower("amenity") == "place_of_worship" && generic_historic(s) {
        Outcome::Accept("historic:place_of_worship".to_string())
    } else {
        Outcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use osm_sites_feature_models::Tags;

    use super::*;

    fn classify(pairs: &[(&str, &str)]) -> Option<String> {
        let tags: Tags = pairs.iter().copied().collect();
        rule_set().classify(&tags)
    }

    #[test]
    fn religious_historic_value_is_the_label() {
        assert_eq!(
            classify(&[("historic", "Wayside_Cross")]),
            Some("historic:wayside_cross".to_string())
        );
    }

    #[test]
    fn historic_building_beats_historic_place_of_worship() {
        assert_eq!(
            classify(&[
                ("historic", "yes"),
                ("building", "cathedral"),
                ("amenity", "place_of_worship"),
            ]),
            Some("historic_building:cathedral".to_string())
        );
        assert_eq!(
            classify(&[("historic", "1"), ("amenity", "place_of_worship")]),
            Some("historic:place_of_worship".to_string())
        );
    }

    #[test]
    fn religious_value_beats_building() {
        assert_eq!(
            classify(&[("historic", "monastery"), ("building", "church")]),
            Some("historic:monastery".to_string())
        );
    }

    #[test]
    fn non_historic_religious_features_are_rejected() {
        assert_eq!(classify(&[("building", "church")]), None);
        assert_eq!(classify(&[("amenity", "place_of_worship")]), None);
        assert_eq!(classify(&[("historic", "castle"), ("building", "church")]), None);
    }
}
