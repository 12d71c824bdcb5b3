//! Filename generator.

use crate::models::classify::Classification;
use crate::models::config::NamingLanguage;

/// Extract disc/part identifier from filename.
///
/// Detects patterns like: cd1, cd2, disc1, disc2, part1, part2, dvd1, dvd2, etc.
/// Returns the identifier in lowercase format (e.g., "cd1", "part2").
pub fn extract_disc_identifier(filename: &str) -> Option<String> {
    let filename_lower = filename.to_lowercase();

    let patterns = [
        r"[_\s\-\.](cd|disc|disk|part|dvd)(\d+)",
        r"(cd|disc|disk|part|dvd)(\d+)\.[a-z0-9]+$",
    ];

    for pattern in &patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            if let Some(caps) = re.captures(&filename_lower) {
                if let (Some(prefix), Some(num)) = (caps.get(1), caps.get(2)) {
                    return Some(format!("{}{}", prefix.as_str(), num.as_str()));
                }
            }
        }
    }

    None
}

/// Make a string safe as a single path segment.
///
/// Reserved characters become `.`, `~` becomes `-`, apostrophes are dropped,
/// and leading/trailing `!`, `.` and spaces are trimmed.
pub fn sanitize_filename(s: &str) -> String {
    let mut out: String = s
        .chars()
        .filter(|&c| c != '\'')
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '.',
            '~' => '-',
            c => c,
        })
        .collect();
    while out.contains("..") {
        out = out.replace("..", ".");
    }
    out.trim_matches(|c: char| c == '!' || c == '.' || c.is_whitespace())
        .to_string()
}

/// Title of a classification in the naming language.
///
/// Falls back to the other language, then to the display name. A title
/// that sanitizes to nothing counts as missing.
pub fn display_title(classification: &Classification, language: NamingLanguage) -> String {
    let titles = &classification.titles;
    let (first, second) = match language {
        NamingLanguage::Zh => (&titles.zh, &titles.en),
        NamingLanguage::En => (&titles.en, &titles.zh),
    };
    [first.as_deref(), second.as_deref()]
        .into_iter()
        .flatten()
        .map(sanitize_filename)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| sanitize_filename(&classification.name))
}

/// `Title (Year)`, or just `Title` without a year.
pub fn title_with_year(title: &str, year: Option<u16>) -> String {
    match year {
        Some(year) => format!("{} ({})", title, year),
        None => title.to_string(),
    }
}

/// Episode stem: `Series S01E02`.
pub fn episode_stem(series: &str, season: u32, episode: u32) -> String {
    format!("{} S{:02}E{:02}", series, season, episode)
}

/// Movie stem: `Title (Year)`, with ` - cd1` for multi-part movies.
pub fn movie_stem(title: &str, year: Option<u16>, disc_id: Option<&str>) -> String {
    let base = title_with_year(title, year);
    match disc_id {
        Some(disc) => format!("{} - {}", base, disc),
        None => base,
    }
}

/// `stem.ext`
pub fn with_extension(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, extension.to_lowercase())
    }
}

/// Subtitle name sharing the video stem: `stem.lang.ext`.
pub fn subtitle_filename(video_stem: &str, language: Option<&str>, extension: &str) -> String {
    with_extension(
        &format!("{}.{}", video_stem, language.unwrap_or("und")),
        extension,
    )
}
