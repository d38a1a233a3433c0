//! Ordered rule engine.
//!
//! A [`RuleSet`] classifies a record in three stages:
//!
//! 1. The record's free-text tags are flattened into one lowercase blob.
//! 2. If the rule set has an exclusion pattern and it matches the blob,
//!    the record is rejected outright.
//! 3. Otherwise the [`Rule`]s run in order. The first rule that returns
//!    anything but [`Outcome::Continue`] decides; if every rule continues,
//!    the record is rejected.
//!
//! Every decision carries the name of the rule that made it, so a
//! rejected or accepted record can be traced back to a single predicate.

use osm_sites_feature_models::Tags;
use regex::Regex;

use crate::text::normalize_text;

/// Everything a rule may look at, computed once per record.
#[derive(Debug)]
pub struct Signals<'a> {
    pub tags: &'a Tags,
    /// Lowercased, flattened free text (see [`normalize_text`]).
    pub text: String,
    /// Whether the inclusion pattern matched [`Self::text`].
    pub inclusion: bool,
    /// Whether the exclusion pattern matched [`Self::text`].
    pub exclusion: bool,
}

impl<'a> Signals<'a> {
    /// Computes signals for `tags` against optional patterns.
    #[must_use]
    pub fn compute(
        tags: &'a Tags,
        text_keys: &[&str],
        inclusion: Option<&Regex>,
        exclusion: Option<&Regex>,
    ) -> Self {
        let text = normalize_text(tags, text_keys);
        let inclusion = inclusion.is_some_and(|re| re.is_match(&text));
        let exclusion = exclusion.is_some_and(|re| re.is_match(&text));
        Self {
            tags,
            text,
            inclusion,
            exclusion,
        }
    }
}

/// What a single rule concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Accept the record with this category label.
    Accept(String),
    /// Reject the record; later rules are not consulted.
    Reject,
    /// This rule does not decide; try the next one.
    Continue,
}

/// A named predicate over [`Signals`].
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub evaluate: fn(&Signals<'_>) -> Outcome,
}

/// Rule name recorded when the exclusion pattern rejects a record.
pub const EXCLUSION_RULE: &str = "exclusion_pattern";

/// Rule name recorded when no rule decided.
pub const NO_MATCH_RULE: &str = "no_match";

/// The final classification of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Category label, or `None` when the record is rejected.
    pub label: Option<String>,
    /// Name of the rule that decided.
    pub rule: &'static str,
}

/// An ordered classification rule set for one pipeline.
#[derive(Debug)]
pub struct RuleSet {
    pub name: &'static str,
    /// Tag keys flattened into the free-text blob.
    pub text_keys: &'static [&'static str],
    pub inclusion: Option<&'static Regex>,
    pub exclusion: Option<&'static Regex>,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Classifies `tags`, reporting which rule decided.
    #[must_use]
    pub fn decide(&self, tags: &Tags) -> Decision {
        let signals = Signals::compute(tags, self.text_keys, self.inclusion, self.exclusion);

        if signals.exclusion {
            return Decision {
                label: None,
                rule: EXCLUSION_RULE,
            };
        }

        for rule in &self.rules {
            match (rule.evaluate)(&signals) {
                Outcome::Accept(label) => {
                    return Decision {
                        label: Some(label),
                        rule: rule.name,
                    };
                }
                Outcome::Reject => {
                    return Decision {
                        label: None,
                        rule: rule.name,
                    };
                }
                Outcome::Continue => {}
            }
        }

        Decision {
            label: None,
            rule: NO_MATCH_RULE,
        }
    }

    /// Returns the category label for `tags`, or `None` if rejected.
    #[must_use]
    pub fn classify(&self, tags: &Tags) -> Option<String> {
        self.decide(tags).label
    }
}
