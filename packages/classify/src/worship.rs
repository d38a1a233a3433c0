//! Places of worship.
//!
//! Every `amenity=place_of_worship` is accepted; there is no era filter.
//! The category columns (denomination, religion) come straight from tags
//! and may be empty.

use std::sync::LazyLock;

use crate::rules::{Outcome, Rule, RuleSet, Signals};

pub const LABEL: &str = "place_of_worship";

/// Tried in order for the denomination column.
pub const DENOMINATION_KEYS: &[&str] = &["denomination", "religion:denomination"];

static RULES: LazyLock<RuleSet> = LazyLock::new(|| RuleSet {
    name: "worship",
    text_keys: &[],
    inclusion: None,
    exclusion: None,
    rules: vec![Rule {
        name: "place_of_worship",
        evaluate: place_of_worship,
    }],
});

#[must_use]
pub fn rule_set() -> &'static RuleSet {
    &RULES
}

fn place_of_worship(s: &Signals<'_>) -> Outcome {
    if s.tags.lower("amenity") == LABEL {
        Outcome::Accept(LABEL.to_string())
    } else {
        Outcome::Reject
    }
}

#[cfg(test)]
mod tests {
    use osm_sites_feature_models::Tags;

    use super::*;

    #[test]
    fn accepts_only_places_of_worship() {
        let church: Tags = [("amenity", "place_of_worship"), ("religion", "christian")]
            .into_iter()
            .collect();
        let school: Tags = [("amenity", "school")].into_iter().collect();
        let bare: Tags = [("building", "church")].into_iter().collect();

        assert_eq!(rule_set().classify(&church), Some(LABEL.to_string()));
        assert_eq!(rule_set().classify(&school), None);
        assert_eq!(rule_set().classify(&bare), None);
    }

    #[test]
    fn amenity_match_is_case_insensitive() {
        let tags: Tags = [("amenity", "Place_Of_Worship")].into_iter().collect();
        assert!(rule_set().classify(&tags).is_some());
    }
}
