//! Pre-modern conflict site rules.
//!
//! Accepts battlefields, fortifications, war memorials, and military
//! features tied to conflicts before the World Wars. Anything mentioning
//! a modern war (1914 onward) in its free text is excluded, whatever its
//! tags say.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::{Outcome, Rule, RuleSet, Signals};

/// Era markers for conflicts predating the modern wars.
pub static OLD_CONFLICT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(crusade|crusader|holy\s*war|templar|teutonic|hospitaller|reconquista|reconquest|byzantine|ottoman|turkish\s+war|austro[-\s]*turkish|habsburg[-\s]*ottoman|thirty\s*years'? war|hundred\s*years'? war|napoleonic|napoleon|medieval|middle\s+ages|roman|frankish|carolingian|saxon\s+war)",
    )
    .expect("valid regex")
});

/// Markers of the World Wars and later conflicts.
pub static MODERN_EXCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(world\s*war|ww1|wwi|ww2|wwii|191[4-9]|1939|194[0-5]|cold\s*war|korean\s*war|vietnam\s*war|gulf\s*war|iraq\s*war|afghanistan\s*war|nato)",
    )
    .expect("valid regex")
});

/// Tag keys whose values make up the free-text blob.
pub const TEXT_KEYS: &[&str] = &[
    "name",
    "name:en",
    "alt_name",
    "description",
    "inscription",
    "note",
    "memorial",
    "memorial:conflict",
    "subject",
    "subject:wikidata",
    "wikidata",
    "wikipedia",
];

const BATTLE_VALUES: &[&str] = &["battlefield", "battle_site", "battle"];
const MEMORIAL_VALUES: &[&str] = &["memorial", "monument"];
const FORTIFICATION_VALUES: &[&str] = &["fort", "castle", "bunker", "trench", "pillbox", "ruins"];
const WAR_OBJECT_VALUES: &[&str] = &["tank", "aircraft", "ship", "bomb_crater"];
const GENERIC_HISTORIC_VALUES: &[&str] = &["yes", "1", "true"];

static RULES: LazyLock<RuleSet> = LazyLock::new(|| RuleSet {
    name: "conflict",
    text_keys: TEXT_KEYS,
    inclusion: Some(&*OLD_CONFLICT_PATTERN),
    exclusion: Some(&*MODERN_EXCLUDE_PATTERN),
    rules: vec![
        Rule {
            name: "battlefield",
            evaluate: battlefield,
        },
        Rule {
            name: "war_memorial",
            evaluate: war_memorial,
        },
        Rule {
            name: "memorial_or_monument",
            evaluate: memorial_or_monument,
        },
        Rule {
            name: "fortification",
            evaluate: fortification,
        },
        Rule {
            name: "military",
            evaluate: military,
        },
        Rule {
            name: "military_landuse",
            evaluate: military_landuse,
        },
        Rule {
            name: "war_object",
            evaluate: war_object,
        },
        Rule {
            name: "generic_historic",
            evaluate: generic_historic,
        },
    ],
});

/// The conflict-site rule set.
#[must_use]
pub fn rule_set() -> &'static RuleSet {
    &RULES
}

fn historic(s: &Signals<'_>) -> String {
    s.tags.lower("historic")
}

fn accept(label: &str) -> Outcome {
    Outcome::Accept(label.to_string())
}

/// Battlefields are accepted unless the tag value itself names a modern
/// war; a non-deciding battlefield falls through.
fn battlefield(s: &Signals<'_>) -> Outcome {
    let hist = historic(s);
    if !BATTLE_VALUES.contains(&hist.as_str()) {
        return Outcome::Continue;
    }
    if s.inclusion || !MODERN_EXCLUDE_PATTERN.is_match(&hist) {
        accept("pre_modern_battlefield")
    } else {
        Outcome::Continue
    }
}

fn war_memorial(s: &Signals<'_>) -> Outcome {
    if historic(s) != "war_memorial" {
        return Outcome::Continue;
    }
    if s.inclusion {
        accept("pre_modern_war_memorial")
    } else {
        Outcome::Reject
    }
}

fn memorial_or_monument(s: &Signals<'_>) -> Outcome {
    if !MEMORIAL_VALUES.contains(&historic(s).as_str()) {
        return Outcome::Continue;
    }
    if s.inclusion {
        accept("pre_modern_memorial_or_monument")
    } else {
        Outcome::Reject
    }
}

/// Fortifications need an era marker or military landuse; otherwise they
/// fall through so `military=*` can still claim them.
fn fortification(s: &Signals<'_>) -> Outcome {
    if !FORTIFICATION_VALUES.contains(&historic(s).as_str()) {
        return Outcome::Continue;
    }
    let military_landuse = s.tags.lower("landuse") == "military";
    if s.inclusion || (military_landuse && !s.exclusion) {
        accept("pre_modern_fortification_or_military_site")
    } else {
        Outcome::Continue
    }
}

/// Any `military=*` value; the label carries the value.
fn military(s: &Signals<'_>) -> Outcome {
    let Some(value) = s.tags.display("military") else {
        return Outcome::Continue;
    };
    if s.inclusion && !s.exclusion {
        Outcome::Accept(format!("pre_modern_military_site:{}", value.to_lowercase()))
    } else {
        Outcome::Reject
    }
}

fn military_landuse(s: &Signals<'_>) -> Outcome {
    if s.tags.lower("landuse") != "military" {
        return Outcome::Continue;
    }
    if s.inclusion && !s.exclusion {
        accept("pre_modern_military_landuse")
    } else {
        Outcome::Reject
    }
}

fn war_object(s: &Signals<'_>) -> Outcome {
    if !WAR_OBJECT_VALUES.contains(&historic(s).as_str()) {
        return Outcome::Continue;
    }
    if s.inclusion && !s.exclusion {
        accept("pre_modern_war_object")
    } else {
        Outcome::Reject
    }
}

fn generic_historic(s: &Signals<'_>) -> Outcome {
    if GENERIC_HISTORIC_VALUES.contains(&historic(s).as_str()) && s.inclusion {
        accept("pre_modern_historic_conflict_feature")
    } else {
        Outcome::Continue
    }
}
