//! Rule matching.
//!
//! Each item's rules are evaluated in declared order and the first rule whose
//! predicates all hold claims the file. Items are visited in declared order
//! too, so a file claimed by an earlier item is not offered to later ones.

use crate::models::classify::{ClassifyItem, ClassifyRule, MatchRule};
use crate::models::media::ScannedFile;
use std::collections::HashSet;

const MIB: u64 = 1024 * 1024;

/// Whether every specified predicate of `rule` holds for `file`.
pub fn rule_matches(rule: &MatchRule, file: &ScannedFile) -> bool {
    if let Some(pattern) = rule.directory.as_deref() {
        let pattern = pattern.to_lowercase();
        let in_dir = file.directory.to_lowercase().contains(&pattern);
        if !in_dir && !file.path.to_lowercase().contains(&pattern) {
            return false;
        }
    }

    if let Some(pattern) = rule.filename.as_deref() {
        if !file.name.to_lowercase().contains(&pattern.to_lowercase()) {
            return false;
        }
    }

    if let Some([min, max]) = rule.episode_range {
        match file.raw_episode {
            Some(ep) if ep >= min && ep <= max => {}
            _ => return false,
        }
    }

    if let Some(mb) = rule.size_mb_greater {
        if file.size <= mb.saturating_mul(MIB) {
            return false;
        }
    }

    true
}

/// Index of the first rule matching `file`, if any.
pub fn first_match(rules: &[ClassifyRule], file: &ScannedFile) -> Option<usize> {
    rules.iter().position(|rule| rule_matches(&rule.matcher, file))
}

/// A file claimed by an item's rule.
#[derive(Debug, Clone)]
pub struct Matched<'a> {
    pub item: usize,
    pub rule: usize,
    pub file: &'a ScannedFile,
}

/// Matching result over all items.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome<'a> {
    /// Claimed files, grouped by item in declared order, files in input order.
    pub matched: Vec<Matched<'a>>,
    /// Videos no item claimed.
    pub unclassified: Vec<&'a ScannedFile>,
}

/// Match videos against every item.
///
/// Subtitles are not candidates; they follow their paired video.
pub fn match_files<'a>(files: &'a [ScannedFile], items: &[ClassifyItem]) -> MatchOutcome<'a> {
    let videos: Vec<&ScannedFile> = files.iter().filter(|f| f.is_video()).collect();
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut outcome = MatchOutcome::default();

    for (item_idx, item) in items.iter().enumerate() {
        let mut count = 0usize;
        for &file in &videos {
            if claimed.contains(file.path.as_str()) {
                continue;
            }
            if let Some(rule) = first_match(&item.rules, file) {
                claimed.insert(file.path.as_str());
                outcome.matched.push(Matched {
                    item: item_idx,
                    rule,
                    file,
                });
                count += 1;
            }
        }
        tracing::debug!("Item {} ({}) matched {} files", item.id, item.name, count);
    }

    outcome.unclassified = videos
        .into_iter()
        .filter(|f| !claimed.contains(f.path.as_str()))
        .collect();
    outcome
}
