//! Tier → collection matching rules.
//!
//! Collection titles are maintained by hand in Shopify admin, so a tier is
//! matched by a short prioritized list of title predicates rather than by an
//! exact handle. When no listed collection matches, or the match has no
//! products, a fixed list of conventional handles is tried instead.

use lookout_core::{CameraLevel, Collection};

/// A predicate on a lower-cased collection title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// Title contains the needle.
    Contains(&'static str),
    /// Title contains every needle.
    ContainsAll(&'static [&'static str]),
}

impl TitleRule {
    /// Whether a lower-cased title satisfies the rule.
    #[must_use]
    pub fn matches(&self, title: &str) -> bool {
        match self {
            Self::Contains(needle) => title.contains(needle),
            Self::ContainsAll(needles) => needles.iter().all(|needle| title.contains(needle)),
        }
    }
}

const ENTRY_RULES: &[TitleRule] = &[
    TitleRule::Contains("entry"),
    TitleRule::Contains("basic"),
    TitleRule::ContainsAll(&["level", "1"]),
];

const MID_RULES: &[TitleRule] = &[
    TitleRule::Contains("mid"),
    TitleRule::Contains("standard"),
    TitleRule::ContainsAll(&["range", "2"]),
];

const HIGH_RULES: &[TitleRule] = &[
    TitleRule::Contains("high"),
    TitleRule::Contains("premium"),
    TitleRule::Contains("end"),
    TitleRule::ContainsAll(&["range", "3"]),
];

/// Title predicates for a tier.
#[must_use]
pub const fn title_rules(level: CameraLevel) -> &'static [TitleRule] {
    match level {
        CameraLevel::Entry => ENTRY_RULES,
        CameraLevel::Mid => MID_RULES,
        CameraLevel::High => HIGH_RULES,
    }
}

/// Handles tried in order when title matching finds nothing usable.
#[must_use]
pub const fn fallback_handles(level: CameraLevel) -> &'static [&'static str] {
    match level {
        CameraLevel::Entry => &["entry-level", "entrylevel", "entry", "basic"],
        CameraLevel::Mid => &["mid-range", "midrange", "mid", "standard"],
        CameraLevel::High => &["high-end", "highend", "high", "premium"],
    }
}

/// Handles tried in order when loading add-ons.
pub const ADDON_HANDLES: &[&str] = &[
    "add-extras",
    "add-ons",
    "addons",
    "extras",
    "extra",
    "accessories",
    "add",
];

/// First collection, in listing order, whose title matches the tier.
#[must_use]
pub fn resolve_tier_collection(level: CameraLevel, collections: &[Collection]) -> Option<&Collection> {
    let rules = title_rules(level);
    collections.iter().find(|collection| {
        let title = collection.title.to_lowercase();
        rules.iter().any(|rule| rule.matches(&title))
    })
}
