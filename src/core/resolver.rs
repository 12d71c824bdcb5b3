//! Season/episode resolution.
//!
//! Auto-season files treat the raw episode sequence as contiguous across the
//! regular seasons of a series: with seasons of 12 and 10 episodes, raw 13 is
//! season 2 episode 1. The rule's episode offset is applied afterwards, to
//! the in-season episode number. Nothing is guessed: a file that cannot be
//! placed comes back with the reason.

use crate::models::classify::{ClassifyRule, ResolveGapReason, SeasonAssignment, SeasonTable};

/// Map a cumulative episode number onto `(season, episode)`.
///
/// Season 0 (specials) never takes part. Returns `None` when `raw` lies past
/// the last season of the table.
pub fn resolve_cumulative(raw: u32, table: &SeasonTable) -> Option<(u32, u32)> {
    if raw == 0 {
        return None;
    }
    let mut consumed = 0u32;
    for (&season, &count) in table.0.iter().filter(|(season, _)| **season > 0) {
        if raw <= consumed + count {
            return Some((season, raw - consumed));
        }
        consumed += count;
    }
    None
}

fn apply_offset(episode: u32, offset: i32) -> Result<u32, ResolveGapReason> {
    let adjusted = i64::from(episode) + i64::from(offset);
    if adjusted < 1 {
        return Err(ResolveGapReason::EpisodeBelowOne);
    }
    u32::try_from(adjusted).map_err(|_| ResolveGapReason::BeyondLastSeason)
}

/// Resolve the season and episode of a tv file matched by `rule`.
///
/// `table` is the item's season table, `None` when the provider had none.
pub fn resolve_episode(
    raw: Option<u32>,
    rule: &ClassifyRule,
    table: Option<&SeasonTable>,
) -> Result<(u32, u32), ResolveGapReason> {
    let raw = raw.filter(|&r| r > 0).ok_or(ResolveGapReason::MissingEpisode)?;

    match rule.season {
        SeasonAssignment::Fixed(season) => Ok((season, apply_offset(raw, rule.episode_offset)?)),
        SeasonAssignment::Auto => {
            let table = table
                .filter(|t| !t.is_empty())
                .ok_or(ResolveGapReason::NoSeasonData)?;
            let (season, episode) =
                resolve_cumulative(raw, table).ok_or(ResolveGapReason::BeyondLastSeason)?;
            Ok((season, apply_offset(episode, rule.episode_offset)?))
        }
    }
}
