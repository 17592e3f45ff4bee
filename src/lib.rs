//! FactBot: a Telegram bot proxying public content APIs (cat facts, jokes,
//! random facts, name-based predictions) with per-user favorites, a bounded
//! request history, and a short-lived response cache.
//!
//! Core components:
//! - [`storage`]: durable single-writer JSON record store with atomic
//!   replace-on-write.
//! - [`cache`]: in-memory TTL cache in front of the upstream adapters.
//!
//! Everything else is glue: [`api`] wraps the upstream providers, [`session`]
//! tracks the last response shown per user, [`bot`] is the Telegram surface.

pub mod api;
pub mod bot;
pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;

pub use error::{BotError, Result};
