//! Library directory layout.

use crate::generators::filename::title_with_year;
use crate::models::classify::SubCategory;
use crate::models::config::NamingLanguage;
use crate::models::media::MediaType;

/// Top-level directory for a media type.
pub fn type_directory(media_type: MediaType, language: NamingLanguage) -> &'static str {
    match (media_type, language) {
        (MediaType::Tv, NamingLanguage::Zh) => "剧集",
        (MediaType::Movie, NamingLanguage::Zh) => "电影",
        (MediaType::Tv, NamingLanguage::En) => "TV",
        (MediaType::Movie, NamingLanguage::En) => "Movies",
    }
}

/// Sub-category directory below the type directory.
pub fn category_directory(
    media_type: MediaType,
    category: SubCategory,
    language: NamingLanguage,
) -> &'static str {
    match (category, language) {
        (SubCategory::Animation, NamingLanguage::Zh) => "动漫",
        (SubCategory::Documentary, NamingLanguage::Zh) => "纪录片",
        (SubCategory::Music, NamingLanguage::Zh) => "音乐",
        (SubCategory::Variety, NamingLanguage::Zh) => "综艺",
        (SubCategory::Animation, NamingLanguage::En) => "Animation",
        (SubCategory::Documentary, NamingLanguage::En) => "Documentary",
        (SubCategory::Music, NamingLanguage::En) => "Music",
        (SubCategory::Variety, NamingLanguage::En) => "Variety",
        (SubCategory::Default, NamingLanguage::Zh) => match media_type {
            MediaType::Tv => "电视剧",
            MediaType::Movie => "电影",
        },
        (SubCategory::Default, NamingLanguage::En) => match media_type {
            MediaType::Tv => "TV Shows",
            MediaType::Movie => "Movies",
        },
    }
}

/// Series or movie folder: `Title (Year)`.
pub fn title_folder(title: &str, year: Option<u16>) -> String {
    title_with_year(title, year)
}

/// Season folder: `Season 01`.
pub fn season_folder(season: u32) -> String {
    format!("Season {:02}", season)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_and_category_directories() {
        assert_eq!(type_directory(MediaType::Tv, NamingLanguage::Zh), "剧集");
        assert_eq!(type_directory(MediaType::Movie, NamingLanguage::En), "Movies");
        assert_eq!(
            category_directory(MediaType::Tv, SubCategory::Animation, NamingLanguage::Zh),
            "动漫"
        );
        assert_eq!(
            category_directory(MediaType::Tv, SubCategory::Default, NamingLanguage::En),
            "TV Shows"
        );
        assert_eq!(
            category_directory(MediaType::Movie, SubCategory::Default, NamingLanguage::Zh),
            "电影"
        );
    }

    #[test]
    fn test_folders() {
        assert_eq!(title_folder("Show", Some(2020)), "Show (2020)");
        assert_eq!(title_folder("Show", None), "Show");
        assert_eq!(season_folder(0), "Season 00");
        assert_eq!(season_folder(12), "Season 12");
    }
}
