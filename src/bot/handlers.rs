//! Command and callback-query handlers.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{MaybeInaccessibleMessage, User};
use teloxide::utils::command::BotCommands;
use tracing::{error, warn};

use crate::cache::keys;
use crate::storage::Category;

use super::{format, keyboards, BotContext, CachedResponse};

const UNAVAILABLE_MSG: &str = "😿 That service is unavailable right now. Please try again later.";
const THROTTLED_MSG: &str = "⏳ Too many requests! Give it a second.";

/// Bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "a random cat fact")]
    Catfact,
    #[command(description = "a random joke")]
    Joke,
    #[command(description = "a random fact")]
    Randomfact,
    #[command(description = "predict age and gender for a name")]
    Predict(String),
    #[command(description = "manage your favorites")]
    Favorites,
    #[command(description = "your request history")]
    History,
    #[command(description = "bot statistics (admins only)")]
    Stats,
    #[command(description = "discard the pending response")]
    Cancel,
}

/// Handle a parsed command message.
pub async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<BotContext>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;

    if !ctx.throttle.allow(user_id) {
        bot.send_message(msg.chat.id, THROTTLED_MSG).await?;
        return Ok(());
    }

    ensure_user(&ctx, &user);

    match cmd {
        Command::Start => {
            let name = user.first_name.clone();
            let text = format!(
                "👋 Hi, {name}!\n\nWelcome to FactBot! 🎲\n\nI can offer you:\n\
                 🐱 Cat facts\n😄 Jokes\n🎲 Random facts\n🔮 Name predictions\n\
                 ⭐ A favorites list\n\nPick something below!"
            );
            bot.send_message(msg.chat.id, text)
                .reply_markup(keyboards::main_menu())
                .await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .reply_markup(keyboards::main_menu())
                .await?;
        }
        Command::Catfact => {
            respond_with_content(&bot, &ctx, msg.chat.id, user_id, Category::CatFact).await?;
        }
        Command::Joke => {
            respond_with_content(&bot, &ctx, msg.chat.id, user_id, Category::Joke).await?;
        }
        Command::Randomfact => {
            respond_with_content(&bot, &ctx, msg.chat.id, user_id, Category::RandomFact).await?;
        }
        Command::Predict(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                bot.send_message(msg.chat.id, "Usage: /predict <first name>")
                    .await?;
            } else {
                respond_with_prediction(&bot, &ctx, msg.chat.id, user_id, &name).await?;
            }
        }
        Command::Favorites => {
            bot.send_message(msg.chat.id, "⭐ Favorites — pick an action:")
                .reply_markup(keyboards::favorites_menu())
                .await?;
        }
        Command::History => {
            let history = ctx
                .store
                .get_user(user_id)
                .map(|u| u.history)
                .unwrap_or_default();
            bot.send_message(msg.chat.id, format::format_history(&history))
                .reply_markup(keyboards::back_button())
                .await?;
        }
        Command::Stats => {
            if ctx.settings.is_admin(user_id) {
                let stats = ctx.store.get_stats();
                bot.send_message(msg.chat.id, format::format_stats(&stats))
                    .await?;
            } else {
                bot.send_message(msg.chat.id, "🚫 This command is for admins only.")
                    .await?;
            }
        }
        Command::Cancel => {
            ctx.pending.take(user_id);
            bot.send_message(msg.chat.id, "Cancelled.")
                .reply_markup(keyboards::main_menu())
                .await?;
        }
    }

    Ok(())
}

/// Handle an inline-keyboard callback.
pub async fn on_callback(bot: Bot, q: CallbackQuery, ctx: Arc<BotContext>) -> ResponseResult<()> {
    let user_id = q.from.id.0 as i64;
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    if !ctx.throttle.allow(user_id) {
        bot.answer_callback_query(q.id.clone())
            .text(THROTTLED_MSG)
            .await?;
        return Ok(());
    }

    ensure_user(&ctx, &q.from);

    // Acknowledge up front so the client stops its spinner even if a
    // slow upstream call follows.
    bot.answer_callback_query(q.id.clone()).await?;

    let chat_id = ChatId(user_id);
    match data.as_str() {
        "back_to_main" => {
            edit_or_send(&bot, &q, chat_id, "What shall we look at?", keyboards::main_menu())
                .await?;
        }
        "favorites" => {
            edit_or_send(
                &bot,
                &q,
                chat_id,
                "⭐ Favorites — pick an action:",
                keyboards::favorites_menu(),
            )
            .await?;
        }
        "show_favorites" => {
            let favorites = ctx
                .store
                .get_user(user_id)
                .map(|u| u.favorites)
                .unwrap_or_default();
            edit_or_send(
                &bot,
                &q,
                chat_id,
                &format::format_favorites(&favorites),
                keyboards::back_button(),
            )
            .await?;
        }
        "remove_favorite_menu" => {
            let favorites = ctx
                .store
                .get_user(user_id)
                .map(|u| u.favorites)
                .unwrap_or_default();
            if favorites.is_empty() {
                edit_or_send(
                    &bot,
                    &q,
                    chat_id,
                    "❌ You have no favorites yet.",
                    keyboards::back_button(),
                )
                .await?;
            } else {
                edit_or_send(
                    &bot,
                    &q,
                    chat_id,
                    "❌ Tap a favorite to remove it:",
                    keyboards::remove_favorites_list(&favorites),
                )
                .await?;
            }
        }
        "history" => {
            let history = ctx
                .store
                .get_user(user_id)
                .map(|u| u.history)
                .unwrap_or_default();
            edit_or_send(
                &bot,
                &q,
                chat_id,
                &format::format_history(&history),
                keyboards::back_button(),
            )
            .await?;
        }
        "prediction" => {
            edit_or_send(
                &bot,
                &q,
                chat_id,
                "🔮 Send /predict <first name> and I will guess the age and gender.",
                keyboards::back_button(),
            )
            .await?;
        }
        "add_favorite" => {
            let reply = match ctx.pending.take(user_id) {
                Some(pending) => {
                    match ctx
                        .store
                        .add_favorite(user_id, &pending.content, pending.category)
                    {
                        Ok(true) => "⭐ Added to favorites!",
                        Ok(false) => "❌ Could not find your profile. Send /start first.",
                        Err(e) => {
                            error!(user_id, "Failed to persist favorite: {}", e);
                            UNAVAILABLE_MSG
                        }
                    }
                }
                None => "❌ Nothing to save. Request something first!",
            };
            bot.send_message(chat_id, reply).await?;
        }
        other if other.starts_with("remove_favorite:") => {
            let reply = match other["remove_favorite:".len()..].parse::<usize>() {
                Ok(index) => match ctx.store.remove_favorite(user_id, index) {
                    Ok(Some(removed)) => {
                        format!("🗑 Removed: {}", removed.content)
                    }
                    Ok(None) => "❌ That favorite no longer exists.".to_string(),
                    Err(e) => {
                        error!(user_id, "Failed to persist favorite removal: {}", e);
                        UNAVAILABLE_MSG.to_string()
                    }
                },
                Err(_) => {
                    warn!(data = other, "Malformed removal callback");
                    return Ok(());
                }
            };
            bot.send_message(chat_id, reply).await?;
        }
        other if other.starts_with("get:") => {
            let category = Category::from_tag(&other["get:".len()..]);
            if category == Category::Prediction {
                edit_or_send(
                    &bot,
                    &q,
                    chat_id,
                    "🔮 Send /predict <first name> and I will guess the age and gender.",
                    keyboards::back_button(),
                )
                .await?;
            } else {
                respond_with_content(&bot, &ctx, chat_id, user_id, category).await?;
            }
        }
        other => {
            warn!(data = other, "Unknown callback data");
        }
    }

    Ok(())
}

// ============================================================================
// Shared handler plumbing
// ============================================================================

/// Lazily create the user record on first contact. Persist failures are
/// logged and the interaction proceeds without a profile.
fn ensure_user(ctx: &BotContext, user: &User) {
    let user_id = user.id.0 as i64;
    if ctx.store.get_user(user_id).is_some() {
        return;
    }
    if let Err(e) = ctx.store.create_user(
        user_id,
        user.username.clone(),
        Some(user.first_name.clone()),
    ) {
        error!(user_id, "Failed to create user record: {}", e);
    }
}

/// Fetch a content response through the cache, record it, and send it with
/// the save/again keyboard.
async fn respond_with_content(
    bot: &Bot,
    ctx: &BotContext,
    chat_id: ChatId,
    user_id: i64,
    category: Category,
) -> ResponseResult<()> {
    let Some(text) = fetch_content(ctx, category).await else {
        bot.send_message(chat_id, UNAVAILABLE_MSG).await?;
        return Ok(());
    };

    record_interaction(ctx, user_id, category, &text);
    let display = format!("{} {}", format::category_emoji(category), text);
    bot.send_message(chat_id, display)
        .reply_markup(keyboards::content_actions(category))
        .await?;
    Ok(())
}

/// Fetch both predictions for a name, record, and send.
async fn respond_with_prediction(
    bot: &Bot,
    ctx: &BotContext,
    chat_id: ChatId,
    user_id: i64,
    name: &str,
) -> ResponseResult<()> {
    let age = fetch_age_prediction(ctx, name).await;
    let gender = fetch_gender_prediction(ctx, name).await;

    let mut parts = Vec::new();
    if let Some(prediction) = &age {
        parts.push(format::format_age_prediction(prediction));
    }
    if let Some(prediction) = &gender {
        parts.push(format::format_gender_prediction(prediction));
    }
    if parts.is_empty() {
        bot.send_message(chat_id, UNAVAILABLE_MSG).await?;
        return Ok(());
    }

    let text = parts.join("\n\n");
    record_interaction(ctx, user_id, Category::Prediction, &text);
    bot.send_message(chat_id, text)
        .reply_markup(keyboards::content_actions(Category::Prediction))
        .await?;
    Ok(())
}

/// Append history and remember the response for a favorite-save. Store
/// failures degrade silently; the user still gets their content.
fn record_interaction(ctx: &BotContext, user_id: i64, category: Category, content: &str) {
    match ctx.store.add_history(user_id, category, content) {
        Ok(true) => {}
        Ok(false) => warn!(user_id, "History append skipped: no user record"),
        Err(e) => error!(user_id, "Failed to persist history: {}", e),
    }
    ctx.pending.remember(user_id, content, category);
}

/// Cache-through fetch for the fixed-key content categories.
async fn fetch_content(ctx: &BotContext, category: Category) -> Option<String> {
    let key = match category {
        Category::CatFact => keys::CAT_FACT,
        Category::Joke => keys::JOKE,
        Category::RandomFact => keys::RANDOM_FACT,
        Category::Prediction | Category::Other => return None,
    };

    if let Some(CachedResponse::Text(text)) = ctx.cache.lock().await.get(key) {
        return Some(text);
    }

    let text = match category {
        Category::CatFact => ctx.api.cat_fact().await,
        Category::Joke => ctx.api.joke().await,
        Category::RandomFact => ctx.api.random_fact().await,
        _ => None,
    }?;

    ctx.cache
        .lock()
        .await
        .set(key, CachedResponse::Text(text.clone()));
    Some(text)
}

async fn fetch_age_prediction(
    ctx: &BotContext,
    name: &str,
) -> Option<crate::api::AgePrediction> {
    let key = keys::prediction("age", name);
    if let Some(CachedResponse::Age(prediction)) = ctx.cache.lock().await.get(&key) {
        return Some(prediction);
    }
    let prediction = ctx.api.age_prediction(name).await?;
    ctx.cache
        .lock()
        .await
        .set(key, CachedResponse::Age(prediction.clone()));
    Some(prediction)
}

async fn fetch_gender_prediction(
    ctx: &BotContext,
    name: &str,
) -> Option<crate::api::GenderPrediction> {
    let key = keys::prediction("gender", name);
    if let Some(CachedResponse::Gender(prediction)) = ctx.cache.lock().await.get(&key) {
        return Some(prediction);
    }
    let prediction = ctx.api.gender_prediction(name).await?;
    ctx.cache
        .lock()
        .await
        .set(key, CachedResponse::Gender(prediction.clone()));
    Some(prediction)
}

/// Edit the message the keyboard hangs off when it is still accessible,
/// otherwise send a fresh one.
async fn edit_or_send(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    text: &str,
    markup: teloxide::types::InlineKeyboardMarkup,
) -> ResponseResult<()> {
    match &q.message {
        Some(MaybeInaccessibleMessage::Regular(message)) => {
            bot.edit_message_text(message.chat.id, message.id, text)
                .reply_markup(markup)
                .await?;
        }
        _ => {
            bot.send_message(chat_id, text).reply_markup(markup).await?;
        }
    }
    Ok(())
}
