use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::warn;

use crate::config::SearchConfig;

static STRATEGY_CACHE: Lazy<DashMap<StrategyKey, MatchStrategy>> = Lazy::new(DashMap::new);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StrategyKey {
    pattern: String,
    fixed: bool,
}

/// Strategy for matching a single line against the pattern
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// Substring containment of a literal pattern
    Literal(String),
    /// Unanchored regex containment search
    Regex(Arc<Regex>),
    /// The pattern failed to compile; matches nothing.
    ///
    /// Rejection is fail-open by design: a bad pattern silently selects no
    /// lines instead of aborting the pass. Callers that want to surface it
    /// can check [`LineMatcher::is_rejected`].
    Rejected,
}

/// Decides whether one line satisfies the pattern under the active mode
/// flags. Pure: no state changes after construction.
///
/// Case-insensitive matching lowercase-folds both sides: the pattern text is
/// folded once at construction (before compilation, so the fold is textual),
/// each candidate line at match time.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    strategy: MatchStrategy,
    fold_case: bool,
}

impl LineMatcher {
    /// Creates a matcher for `pattern` under the given mode flags.
    ///
    /// Compiled strategies are cached process-wide, so repeated invocations
    /// with the same pattern and flags skip recompilation. Rejected patterns
    /// are cached too.
    pub fn new(pattern: &str, fixed_string: bool, ignore_case: bool) -> Self {
        let folded = if ignore_case {
            pattern.to_lowercase()
        } else {
            pattern.to_owned()
        };
        let key = StrategyKey {
            pattern: folded,
            fixed: fixed_string,
        };

        let strategy = if let Some(entry) = STRATEGY_CACHE.get(&key) {
            entry.clone()
        } else {
            let strategy = if fixed_string {
                MatchStrategy::Literal(key.pattern.clone())
            } else {
                match Regex::new(&key.pattern) {
                    Ok(regex) => MatchStrategy::Regex(Arc::new(regex)),
                    Err(e) => {
                        warn!("Rejecting unparsable pattern {:?}: {}", pattern, e);
                        MatchStrategy::Rejected
                    }
                }
            };
            STRATEGY_CACHE.insert(key, strategy.clone());
            strategy
        };

        Self {
            strategy,
            fold_case: ignore_case,
        }
    }

    /// Creates a matcher from the relevant config fields
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(&config.pattern, config.fixed_string, config.ignore_case)
    }

    /// Whether the pattern was rejected at compile time
    pub fn is_rejected(&self) -> bool {
        matches!(self.strategy, MatchStrategy::Rejected)
    }

    /// Does `line` contain the pattern?
    ///
    /// Inversion is not applied here; the engine XORs this with the invert
    /// flag to form the inclusion predicate.
    pub fn is_match(&self, line: &str) -> bool {
        let line: Cow<str> = if self.fold_case {
            Cow::Owned(line.to_lowercase())
        } else {
            Cow::Borrowed(line)
        };

        match &self.strategy {
            MatchStrategy::Literal(pattern) => line.contains(pattern.as_str()),
            MatchStrategy::Regex(regex) => regex.is_match(&line),
            MatchStrategy::Rejected => false,
        }
    }
}
