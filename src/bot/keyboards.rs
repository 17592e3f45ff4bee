//! Inline keyboard layouts.
//!
//! Callback data grammar: plain verbs (`favorites`, `back_to_main`),
//! `get:<category-tag>` for content fetches, `add_favorite` for saving the
//! pending response, and `remove_favorite:<index>` for deletions.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::storage::{Category, FavoriteEntry};

use super::format::category_emoji;

fn get_button(label: &str, category: Category) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, format!("get:{}", category.as_str()))
}

/// Main menu with every content source plus favorites and history.
pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            get_button("🐱 Cat fact", Category::CatFact),
            get_button("😄 Joke", Category::Joke),
        ],
        vec![
            get_button("🎲 Random fact", Category::RandomFact),
            InlineKeyboardButton::callback("🔮 Prediction", "prediction"),
        ],
        vec![
            InlineKeyboardButton::callback("⭐ Favorites", "favorites"),
            InlineKeyboardButton::callback("📋 History", "history"),
        ],
    ])
}

/// Actions attached to a content response: save it, fetch another, go back.
pub fn content_actions(category: Category) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("⭐ Add to favorites", "add_favorite"),
            InlineKeyboardButton::callback("🔄 Another one", format!("get:{}", category.as_str())),
        ],
        vec![back_to_main_button()],
    ])
}

/// Favorites management menu.
pub fn favorites_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "📋 Show favorites",
            "show_favorites",
        )],
        vec![InlineKeyboardButton::callback(
            "❌ Remove a favorite",
            "remove_favorite_menu",
        )],
        vec![back_to_main_button()],
    ])
}

/// One numbered delete button per favorite (first ten), plus back.
pub fn remove_favorites_list(favorites: &[FavoriteEntry]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = favorites
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, favorite)| {
            let label = format!(
                "{}. {} {}",
                i + 1,
                category_emoji(favorite.category),
                preview(&favorite.content),
            );
            vec![InlineKeyboardButton::callback(
                label,
                format!("remove_favorite:{}", i),
            )]
        })
        .collect();
    rows.push(vec![back_to_main_button()]);
    InlineKeyboardMarkup::new(rows)
}

/// A single back-to-main-menu row.
pub fn back_button() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![back_to_main_button()]])
}

fn back_to_main_button() -> InlineKeyboardButton {
    InlineKeyboardButton::callback("🔙 Main menu", "back_to_main")
}

/// Button labels are capped well below Telegram's 64-byte limit on data,
/// but content can be arbitrarily long; clip hard.
fn preview(content: &str) -> String {
    const PREVIEW_CHARS: usize = 30;
    if content.chars().count() <= PREVIEW_CHARS {
        content.to_string()
    } else {
        let clipped: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", clipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn main_menu_has_six_buttons() {
        let markup = main_menu();
        let total: usize = markup.inline_keyboard.iter().map(|row| row.len()).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn remove_list_caps_at_ten_rows_plus_back() {
        let favorites: Vec<_> = (0..15)
            .map(|i| FavoriteEntry {
                content: format!("fav {i}"),
                category: Category::Joke,
                added_at: Utc::now(),
            })
            .collect();
        let markup = remove_favorites_list(&favorites);
        assert_eq!(markup.inline_keyboard.len(), 11);
    }
}
