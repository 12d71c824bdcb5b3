//! Filename heuristics.
//!
//! Extracts raw episode numbers and subtitle languages from file names, and
//! computes the stems used to pair subtitles with videos. Everything here is
//! a pure function of the name: a name without a clear marker yields `None`,
//! never a guess.

use regex::Regex;

/// Codec, resolution and audio tokens that look like episode numbers.
const NOISE_PATTERN: &str = r"(?i)[xh]\.?26[45]|hevc|avc|ma10p|1[02]bit|8bit|\d{3,4}[pi]\b|\b4k\b|\baac\d?\b|\bflac\b|\bddp?\d\.\d|\b[57]\.1\b";

const MAX_EPISODE: u32 = 999;

/// Language tags kept as-is (dual-language subtitles).
const COMPOUND_TAGS: &[&str] = &["scjp", "tcjp", "chsjp", "chtjp", "chs_jp", "cht_jp"];

/// Suffixes stripped from a subtitle stem before pairing.
const STEM_LANGUAGE_SUFFIXES: &[&str] = &[
    "chs", "cht", "chi", "eng", "jpn", "jap", "kor", "und", "sc", "tc", "scjp", "tcjp", "chtjp",
    "chsjp", "chs_jp", "cht_jp", "zh-cn", "zh-tw", "en", "ja", "jp", "ko", "gb", "big5", "zho",
];

/// Map a single token to a normalized language tag.
pub fn normalize_language(token: &str) -> Option<&'static str> {
    let lang = match token.to_lowercase().as_str() {
        "chs" | "chi" | "sc" | "gb" | "zh-cn" | "zho" => "chs",
        "cht" | "tc" | "big5" | "zh-tw" => "cht",
        "eng" | "en" => "eng",
        "jpn" | "jap" | "jp" | "ja" => "jpn",
        "kor" | "ko" => "kor",
        "scjp" => "scjp",
        "tcjp" => "tcjp",
        "chsjp" => "chsjp",
        "chtjp" => "chtjp",
        "chs_jp" => "chs_jp",
        "cht_jp" => "cht_jp",
        _ => return None,
    };
    Some(lang)
}

/// File name without its final extension.
pub fn stem(name: &str) -> &str {
    crate::utils::path::split_extension(name).0
}

/// Extension of a name, lowercase, without the dot.
pub fn extension(name: &str) -> Option<String> {
    crate::utils::path::split_extension(name)
        .1
        .map(|e| e.to_lowercase())
}

/// Language tag of a subtitle file name.
///
/// The last dot-separated part is checked first, then `.tag.` / `_tag_`
/// occurrences inside the name.
pub fn subtitle_language(name: &str) -> Option<String> {
    let stem = stem(name);
    let lower = stem.to_lowercase();

    if let Some(last) = lower.rsplit('.').next() {
        if COMPOUND_TAGS.contains(&last) {
            return Some(last.to_string());
        }
        if lower.contains('.') {
            if let Some(lang) = normalize_language(last) {
                return Some(lang.to_string());
            }
        }
    }

    for tag in COMPOUND_TAGS {
        if lower.contains(&format!(".{}.", tag)) || lower.contains(&format!("_{}_", tag)) {
            return Some(tag.to_string());
        }
    }

    for part in lower.split(['.', '_']).skip(1) {
        if let Some(lang) = normalize_language(part) {
            let dotted = format!(".{}.", part);
            let underscored = format!("_{}_", part);
            if lower.contains(&dotted) || lower.contains(&underscored) {
                return Some(lang.to_string());
            }
        }
    }

    None
}

/// Subtitle stem with the language suffix removed.
pub fn subtitle_base(name: &str) -> &str {
    let stem = stem(name);
    if let Some((base, last)) = stem.rsplit_once('.') {
        if !base.is_empty() && STEM_LANGUAGE_SUFFIXES.contains(&last.to_lowercase().as_str()) {
            return base;
        }
    }
    stem
}

/// Stem key used for subtitle pairing: lowercase, separators collapsed.
pub fn pairing_key(stem: &str) -> String {
    stem.to_lowercase()
        .split(|c: char| c == '.' || c == '_' || c == '-' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a directory or file name matches an exclusion pattern.
///
/// `.*` excludes dot-entries; other patterns compare the whole name.
pub fn is_excluded(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        if pattern == ".*" {
            name.starts_with('.')
        } else {
            name.eq_ignore_ascii_case(pattern)
        }
    })
}

fn episode_in_range(value: u32) -> Option<u32> {
    (1..=MAX_EPISODE).contains(&value).then_some(value)
}

fn capture_number(pattern: &str, text: &str, group: usize) -> Option<u32> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)?
        .get(group)?
        .as_str()
        .parse::<u32>()
        .ok()
}

/// Raw episode number from a file name.
///
/// Explicit markers win (`S01E05`, `EP05`, `E05`, `第5集`, `[05]`). Otherwise a
/// single bare 2–3 digit number between separators is accepted; several
/// distinct bare numbers are ambiguous and yield `None`.
pub fn extract_episode(name: &str) -> Option<u32> {
    let stem = stem(name);
    let cleaned = match Regex::new(NOISE_PATTERN) {
        Ok(re) => re.replace_all(stem, " ").into_owned(),
        Err(_) => stem.to_string(),
    };

    let explicit = [
        (r"(?i)S\d{1,2}[\s._-]?E(\d{1,4})", 1),
        (r"(?i)(?:^|[^a-z])EP?[\s.]?(\d{1,4})(?:\D|$)", 1),
        (r"第\s*(\d{1,4})\s*[集话話]", 1),
        (r"\[(\d{2,4})(?:v\d)?\]", 1),
    ];
    for (pattern, group) in explicit {
        if let Some(value) = capture_number(pattern, &cleaned, group) {
            return episode_in_range(value);
        }
    }

    let mut bare: Vec<u32> = cleaned
        .split(|c: char| {
            matches!(c, '.' | '-' | '_' | '[' | ']' | '(' | ')' | '【' | '】') || c.is_whitespace()
        })
        .filter_map(|token| {
            let token = strip_version(token);
            let is_bare = (2..=3).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_digit());
            if is_bare {
                token.parse().ok()
            } else {
                None
            }
        })
        .collect();
    bare.sort_unstable();
    bare.dedup();

    match bare.as_slice() {
        [only] => episode_in_range(*only),
        _ => None,
    }
}

/// `05v2` → `05`.
fn strip_version(token: &str) -> &str {
    match token.rsplit_once(['v', 'V']) {
        Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => head,
        _ => token,
    }
}
