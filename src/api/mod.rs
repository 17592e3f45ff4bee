//! Outbound adapters for the public content APIs.

pub mod client;

pub use client::{AgePrediction, ApiClient, GenderPrediction};
