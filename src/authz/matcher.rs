use std::cmp::{Ordering, Reverse};

use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ComposedMenuRecord, MatchMode};

/// Match strength. Variant order is significant: `Exact` is the strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchRank {
    Regex,
    Prefix,
    Exact,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchCandidate<'a> {
    pub record: &'a ComposedMenuRecord,
    pub rank: MatchRank,
    /// Length of the literal that matched; `usize::MAX` for exact matches.
    pub score: usize,
}

impl MatchCandidate<'_> {
    /// Total order where the better candidate is greater.
    fn strength(&self) -> (MatchRank, usize, Reverse<Uuid>) {
        (self.rank, self.score, Reverse(self.record.id))
    }
}

impl PartialEq for MatchCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.strength() == other.strength()
    }
}

impl Eq for MatchCandidate<'_> {}

impl PartialOrd for MatchCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatchCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.strength().cmp(&other.strength())
    }
}

/// Picks the composed record that best describes a request path.
///
/// Regex patterns are compiled once when the matcher is built; a pattern
/// that does not compile never matches.
pub struct PathMatcher<'a> {
    entries: Vec<(&'a ComposedMenuRecord, Option<Regex>)>,
}

impl<'a> PathMatcher<'a> {
    pub fn new(records: &'a [ComposedMenuRecord]) -> Self {
        let entries = records
            .iter()
            .filter(|r| r.effective_is_active)
            .map(|r| {
                let compiled = match (r.match_mode, r.pattern.as_deref()) {
                    (MatchMode::Regex, Some(pattern)) => compile(r.id, pattern),
                    _ => None,
                };
                (r, compiled)
            })
            .collect();
        Self { entries }
    }

    /// Every eligible record that matches `path`, unordered.
    pub fn candidates(&self, path: &str) -> Vec<MatchCandidate<'a>> {
        let mut out = Vec::new();
        for (record, compiled) in &self.entries {
            let record: &'a ComposedMenuRecord = *record;
            match record.match_mode {
                MatchMode::Exact => {
                    if record.href.as_deref() == Some(path) {
                        out.push(MatchCandidate {
                            record,
                            rank: MatchRank::Exact,
                            score: usize::MAX,
                        });
                    }
                }
                MatchMode::Prefix => {
                    if let Some(href) = record.href.as_deref() {
                        if path.starts_with(href) {
                            out.push(MatchCandidate {
                                record,
                                rank: MatchRank::Prefix,
                                score: href.len(),
                            });
                        }
                    }
                }
                MatchMode::Regex => {
                    if let (Some(re), Some(pattern)) = (compiled, record.pattern.as_deref()) {
                        if re.is_match(path) {
                            out.push(MatchCandidate {
                                record,
                                rank: MatchRank::Regex,
                                score: pattern.len(),
                            });
                        }
                    }
                }
            }
        }
        out
    }

    pub fn best_match(&self, path: &str) -> Option<MatchCandidate<'a>> {
        self.candidates(path).into_iter().max()
    }
}

fn compile(menu_id: Uuid, pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            let err = AppError::invalid_pattern(format!("{pattern}: {err}"));
            tracing::debug!(%menu_id, error = %err, "menu pattern never matches");
            None
        }
    }
}

/// One-shot convenience over [`PathMatcher`].
pub fn pick_best_match<'a>(records: &'a [ComposedMenuRecord], path: &str) -> Option<&'a ComposedMenuRecord> {
    PathMatcher::new(records).best_match(path).map(|c| c.record)
}
