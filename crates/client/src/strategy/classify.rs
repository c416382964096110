//! URL → strategy classification.

use regex::RegexSet;

use offgrid_core::Error;
use offgrid_core::config::StrategyPatterns;

use super::{DEFAULT_STRATEGY, StrategyLabel};

/// Ordered (label, patterns) groups.
///
/// Groups are scanned in priority order (cache-first, stale-while-revalidate,
/// network-first) and the first group with any matching pattern wins, no
/// matter how specific a later group's pattern is.
#[derive(Debug, Clone)]
pub struct PatternTable {
    groups: Vec<(StrategyLabel, RegexSet)>,
}

impl PatternTable {
    /// Compile a table from configured patterns.
    pub fn new(patterns: &StrategyPatterns) -> Result<Self, Error> {
        let groups = [
            (StrategyLabel::CacheFirst, &patterns.cache_first),
            (StrategyLabel::StaleWhileRevalidate, &patterns.stale_while_revalidate),
            (StrategyLabel::NetworkFirst, &patterns.network_first),
        ]
        .into_iter()
        .map(|(label, sources)| {
            RegexSet::new(sources)
                .map(|set| (label, set))
                .map_err(|e| Error::InvalidInput(format!("invalid {label} pattern: {e}")))
        })
        .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self { groups })
    }

    /// Pick the strategy for `url`. Total and side-effect free.
    pub fn classify(&self, url: &str) -> StrategyLabel {
        self.groups
            .iter()
            .find(|(_, set)| set.is_match(url))
            .map(|(label, _)| *label)
            .unwrap_or(DEFAULT_STRATEGY)
    }
}
