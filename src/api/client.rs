//! HTTP client for the upstream content providers.
//!
//! Every lookup returns `Option<_>`: `None` on any transport error,
//! non-success status, timeout, or unexpected payload shape. The adapter
//! owns the timeout policy; callers never see status codes or errors.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;

const CAT_FACTS_URL: &str = "https://catfact.ninja/fact";
const JOKE_URL: &str = "https://v2.jokeapi.dev/joke/Any?safe-mode";
const RANDOM_FACTS_URL: &str = "https://uselessfacts.jsph.pl/random.json?language=en";
const AGIFY_URL: &str = "https://api.agify.io";
const GENDERIZE_URL: &str = "https://api.genderize.io";

/// Total per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Age prediction for a first name, from agify.io.
#[derive(Debug, Clone, PartialEq)]
pub struct AgePrediction {
    pub name: String,
    pub age: u32,
    /// Number of samples behind the prediction.
    pub count: u64,
}

/// Gender prediction for a first name, from genderize.io.
#[derive(Debug, Clone, PartialEq)]
pub struct GenderPrediction {
    pub name: String,
    pub gender: String,
    pub probability: f64,
    pub count: u64,
}

#[derive(Deserialize)]
struct CatFactPayload {
    fact: String,
}

#[derive(Deserialize)]
struct JokePayload {
    #[serde(default)]
    error: bool,
    #[serde(rename = "type", default)]
    kind: String,
    joke: Option<String>,
    setup: Option<String>,
    delivery: Option<String>,
}

#[derive(Deserialize)]
struct RandomFactPayload {
    text: String,
}

#[derive(Deserialize)]
struct AgifyPayload {
    #[serde(default)]
    name: String,
    age: Option<u32>,
    #[serde(default)]
    count: u64,
}

#[derive(Deserialize)]
struct GenderizePayload {
    #[serde(default)]
    name: String,
    gender: Option<String>,
    #[serde(default)]
    probability: f64,
    #[serde(default)]
    count: u64,
}

/// Shared client over all five content providers.
pub struct ApiClient {
    http: Client,
}

impl ApiClient {
    /// Build a client with the standard timeout.
    pub fn new() -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http })
    }

    /// A random cat fact, or `None` if the provider is unavailable.
    pub async fn cat_fact(&self) -> Option<String> {
        let payload: CatFactPayload = self.fetch(CAT_FACTS_URL, &[]).await?;
        Some(payload.fact)
    }

    /// A random (safe-mode) joke. Two-part jokes are joined as
    /// `"{setup}\n\n{delivery}"`.
    pub async fn joke(&self) -> Option<String> {
        let payload: JokePayload = self.fetch(JOKE_URL, &[]).await?;
        if payload.error {
            warn!("Joke API returned an error payload");
            return None;
        }
        if payload.kind == "single" {
            return payload.joke;
        }
        match (payload.setup, payload.delivery) {
            (Some(setup), Some(delivery)) => Some(format!("{}\n\n{}", setup, delivery)),
            _ => None,
        }
    }

    /// A random trivia fact, or `None` if the provider is unavailable.
    pub async fn random_fact(&self) -> Option<String> {
        let payload: RandomFactPayload = self.fetch(RANDOM_FACTS_URL, &[]).await?;
        Some(payload.text)
    }

    /// Predict an age for `name`. `None` when the provider has no data
    /// for the name (null `age`) or is unavailable.
    pub async fn age_prediction(&self, name: &str) -> Option<AgePrediction> {
        let payload: AgifyPayload = self.fetch(AGIFY_URL, &[("name", name)]).await?;
        let age = payload.age?;
        Some(AgePrediction {
            name: payload.name,
            age,
            count: payload.count,
        })
    }

    /// Predict a gender for `name`. `None` when the provider has no data
    /// for the name (null `gender`) or is unavailable.
    pub async fn gender_prediction(&self, name: &str) -> Option<GenderPrediction> {
        let payload: GenderizePayload = self.fetch(GENDERIZE_URL, &[("name", name)]).await?;
        let gender = payload.gender?;
        Some(GenderPrediction {
            name: payload.name,
            gender,
            probability: payload.probability,
            count: payload.count,
        })
    }

    /// GET `url` and deserialize the JSON body. All failures collapse to
    /// `None` with a warning; retry policy belongs to the user, not here.
    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Option<T> {
        let request = self.http.get(url).query(params);
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, "Upstream request failed: {}", e);
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(url, status = %response.status(), "Upstream returned non-success status");
            return None;
        }
        match response.json::<T>().await {
            Ok(payload) => {
                debug!(url, "Upstream request succeeded");
                Some(payload)
            }
            Err(e) => {
                warn!(url, "Upstream payload did not match expected shape: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joke_payload_single() {
        let raw = r#"{"error":false,"type":"single","joke":"ha"}"#;
        let payload: JokePayload = serde_json::from_str(raw).unwrap();
        assert!(!payload.error);
        assert_eq!(payload.kind, "single");
        assert_eq!(payload.joke.as_deref(), Some("ha"));
    }

    #[test]
    fn joke_payload_twopart() {
        let raw = r#"{"error":false,"type":"twopart","setup":"knock","delivery":"who"}"#;
        let payload: JokePayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.setup.as_deref(), Some("knock"));
        assert_eq!(payload.delivery.as_deref(), Some("who"));
    }

    #[test]
    fn agify_payload_null_age() {
        let raw = r#"{"name":"xqzj","age":null,"count":0}"#;
        let payload: AgifyPayload = serde_json::from_str(raw).unwrap();
        assert!(payload.age.is_none());
    }

    #[test]
    fn genderize_payload_full() {
        let raw = r#"{"name":"anna","gender":"female","probability":0.98,"count":12345}"#;
        let payload: GenderizePayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.gender.as_deref(), Some("female"));
        assert!(payload.probability > 0.9);
    }
}
