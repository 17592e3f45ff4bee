//! Telegram presentation layer.
//!
//! Thin glue over the core: handlers consult the cache, fall back to the
//! upstream adapters, and record everything in the record store. Any core
//! failure degrades to a generic retry-later message.

pub mod format;
pub mod handlers;
pub mod keyboards;
pub mod throttle;

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use tokio::sync::Mutex;
use tracing::info;

use crate::api::{AgePrediction, ApiClient, GenderPrediction};
use crate::cache::TtlCache;
use crate::config::Settings;
use crate::error::Result;
use crate::session::PendingStore;
use crate::storage::RecordStore;

use handlers::Command;
use throttle::Throttle;

/// Payload cached per logical request.
#[derive(Debug, Clone)]
pub enum CachedResponse {
    Text(String),
    Age(AgePrediction),
    Gender(GenderPrediction),
}

/// Everything the handlers need, shared across dispatcher tasks.
pub struct BotContext {
    pub store: RecordStore,
    pub cache: Mutex<TtlCache<CachedResponse>>,
    pub api: ApiClient,
    pub pending: PendingStore,
    pub throttle: Throttle,
    pub settings: Settings,
}

impl BotContext {
    pub fn new(settings: Settings) -> Result<Self> {
        Ok(Self {
            store: RecordStore::new(&settings.storage_path),
            cache: Mutex::new(TtlCache::new(settings.cache_ttl_secs)),
            api: ApiClient::new()?,
            pending: PendingStore::new(settings.cache_ttl_secs),
            throttle: Throttle::new(Duration::from_millis(settings.throttle_ms)),
            settings,
        })
    }
}

/// Run the bot until shutdown.
pub async fn run(settings: Settings) -> Result<()> {
    let bot = Bot::new(settings.bot_token.clone());
    let ctx = Arc::new(BotContext::new(settings)?);

    info!("Starting factbot");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handlers::on_command),
        )
        .branch(Update::filter_callback_query().endpoint(handlers::on_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .build()
        .dispatch()
        .await;

    info!("factbot stopped");
    Ok(())
}
