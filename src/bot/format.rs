//! User-facing message formatting.

use crate::api::{AgePrediction, GenderPrediction};
use crate::storage::{Category, FavoriteEntry, HistoryEntry, StatsReport};

/// Favorites shown per page.
const FAVORITES_SHOWN: usize = 10;
/// History entries shown.
const HISTORY_SHOWN: usize = 10;
const FAVORITE_CLIP_CHARS: usize = 100;
const HISTORY_CLIP_CHARS: usize = 80;

/// Emoji tag for a content category.
pub fn category_emoji(category: Category) -> &'static str {
    match category {
        Category::CatFact => "🐱",
        Category::Joke => "😄",
        Category::RandomFact => "🎲",
        Category::Prediction => "🔮",
        Category::Other => "📝",
    }
}

/// Render a favorites list, truncated to the first ten entries.
pub fn format_favorites(favorites: &[FavoriteEntry]) -> String {
    if favorites.is_empty() {
        return "❌ You have no favorites yet.\n\nUse the ⭐ button after a response to save it!"
            .to_string();
    }

    let mut out = String::from("⭐ Your favorites:\n\n");
    for (i, favorite) in favorites.iter().take(FAVORITES_SHOWN).enumerate() {
        out.push_str(&format!(
            "{}. {} {}\n   📅 Added: {}\n\n",
            i + 1,
            category_emoji(favorite.category),
            clip(&favorite.content, FAVORITE_CLIP_CHARS),
            favorite.added_at.format("%d.%m.%Y"),
        ));
    }
    if favorites.len() > FAVORITES_SHOWN {
        out.push_str(&format!("... and {} more", favorites.len() - FAVORITES_SHOWN));
    }
    out
}

/// Render the latest ten history entries, newest first.
pub fn format_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "❌ Your history is empty.".to_string();
    }

    let mut out = String::from("📋 Your history:\n\n");
    for entry in history.iter().rev().take(HISTORY_SHOWN) {
        out.push_str(&format!(
            "{} {}\n   🕐 {}\n\n",
            category_emoji(entry.command),
            clip(&entry.content, HISTORY_CLIP_CHARS),
            entry.timestamp.format("%d.%m %H:%M"),
        ));
    }
    if history.len() > HISTORY_SHOWN {
        out.push_str(&format!("... and {} older entries", history.len() - HISTORY_SHOWN));
    }
    out
}

/// Render the aggregate stats report.
pub fn format_stats(stats: &StatsReport) -> String {
    format!(
        "📊 Bot statistics:\n\n\
         👥 Total users: {}\n\
         ✅ Active users: {}\n\
         📝 Total requests: {}\n\
         ⭐ Total favorites: {}\n\n\
         🚀 Running since: {}",
        stats.total_users,
        stats.active_users,
        stats.total_requests,
        stats.total_favorites,
        stats.created_at.format("%d.%m.%Y"),
    )
}

/// Render an age prediction.
pub fn format_age_prediction(prediction: &AgePrediction) -> String {
    format!(
        "🎂 Age prediction for {}:\n\nEstimated age: {} years\nBased on {} records",
        title_case(&prediction.name),
        prediction.age,
        prediction.count,
    )
}

/// Render a gender prediction.
pub fn format_gender_prediction(prediction: &GenderPrediction) -> String {
    format!(
        "👫 Gender prediction for {}:\n\nEstimated gender: {}\nProbability: {:.0}%\nBased on {} records",
        title_case(&prediction.name),
        prediction.gender,
        prediction.probability * 100.0,
        prediction.count,
    )
}

/// Char-safe truncation with a trailing ellipsis.
fn clip(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let clipped: String = s.chars().take(max_chars).collect();
    format!("{}...", clipped)
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn favorite(content: &str) -> FavoriteEntry {
        FavoriteEntry {
            content: content.to_string(),
            category: Category::Joke,
            added_at: Utc::now(),
        }
    }

    fn history_entry(content: &str) -> HistoryEntry {
        HistoryEntry {
            command: Category::CatFact,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_favorites_message() {
        assert!(format_favorites(&[]).contains("no favorites"));
    }

    #[test]
    fn favorites_truncated_to_ten() {
        let favorites: Vec<_> = (0..12).map(|i| favorite(&format!("fav {i}"))).collect();
        let out = format_favorites(&favorites);
        assert!(out.contains("fav 9"));
        assert!(!out.contains("fav 10"));
        assert!(out.contains("and 2 more"));
    }

    #[test]
    fn long_favorite_content_is_clipped() {
        let long = "x".repeat(150);
        let out = format_favorites(&[favorite(&long)]);
        assert!(out.contains(&format!("{}...", "x".repeat(100))));
        assert!(!out.contains(&"x".repeat(101)));
    }

    #[test]
    fn history_newest_first() {
        let entries: Vec<_> = (0..3).map(|i| history_entry(&format!("entry {i}"))).collect();
        let out = format_history(&entries);
        let newest = out.find("entry 2").unwrap();
        let oldest = out.find("entry 0").unwrap();
        assert!(newest < oldest);
    }

    #[test]
    fn history_counts_older_entries() {
        let entries: Vec<_> = (0..15).map(|i| history_entry(&format!("e{i}"))).collect();
        let out = format_history(&entries);
        assert!(out.contains("and 5 older entries"));
    }

    #[test]
    fn clip_is_char_safe() {
        // Multibyte chars must not be split.
        let s = "é".repeat(120);
        let out = clip(&s, 100);
        assert_eq!(out.chars().count(), 103);
    }

    #[test]
    fn stats_report_fields_present() {
        let out = format_stats(&StatsReport {
            total_users: 3,
            total_requests: 5,
            created_at: Utc::now(),
            active_users: 2,
            total_favorites: 7,
        });
        assert!(out.contains("Total users: 3"));
        assert!(out.contains("Active users: 2"));
        assert!(out.contains("Total requests: 5"));
        assert!(out.contains("Total favorites: 7"));
    }

    #[test]
    fn prediction_formats_name_title_case() {
        let out = format_age_prediction(&AgePrediction {
            name: "anna".into(),
            age: 34,
            count: 1000,
        });
        assert!(out.contains("Anna"));
        assert!(out.contains("34 years"));
    }
}
