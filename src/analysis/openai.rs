//! Analysis backed by an OpenAI-compatible chat completions API.
//!
//! Every request asks for a JSON object reply. Transport failures, timeouts,
//! rate limiting and server errors are retried with exponential backoff up
//! to `max_retries` extra attempts. Whatever still fails is logged and
//! replaced by the degraded result, so the public methods never fail.

use super::{
    Alternative, DEFAULT_REFLECTION_QUESTIONS, PriceAnalysis, PriceAnalyzer, PriceTrend,
    SustainabilityAnalysis,
};
use crate::{
    config::settings::AnalysisConfig,
    core::schedule::IntervalLabel,
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

const PRICE_SYSTEM_PROMPT: &str =
    "You are a price analysis expert. Provide realistic market analysis and suggest practical alternatives.";
const SUSTAINABILITY_SYSTEM_PROMPT: &str =
    "You are a sustainability expert. Analyze products for environmental impact and ethical considerations.";
const QUESTIONS_SYSTEM_PROMPT: &str = "You are a mindfulness coach helping people make thoughtful purchasing decisions. Generate introspective questions.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Price reply as sent by the model; every field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PriceReply {
    current_price: Option<f64>,
    trend: Option<String>,
    price_change: Option<f64>,
    confidence: Option<f64>,
    recommendation: Option<String>,
    alternatives: Option<Vec<Alternative>>,
}

impl PriceReply {
    fn into_analysis(self, tracked_price: f64) -> PriceAnalysis {
        let trend = match self.trend.as_deref() {
            Some("up") => PriceTrend::Up,
            Some("down") => PriceTrend::Down,
            _ => PriceTrend::Stable,
        };
        PriceAnalysis {
            current_price: self
                .current_price
                .filter(|p| p.is_finite() && *p >= 0.0)
                .unwrap_or(tracked_price),
            trend,
            price_change: self.price_change.filter(|c| c.is_finite()).unwrap_or(0.0),
            confidence: self
                .confidence
                .filter(|c| c.is_finite())
                .unwrap_or(0.5)
                .clamp(0.0, 1.0),
            recommendation: self
                .recommendation
                .unwrap_or_else(|| "Monitor for price changes".to_string()),
            alternatives: self.alternatives.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SustainabilityReply {
    rating: Option<f64>,
    factors: Option<Vec<String>>,
    recommendation: Option<String>,
    alternatives: Option<Vec<String>>,
}

impl SustainabilityReply {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn into_analysis(self) -> SustainabilityAnalysis {
        let rating = self
            .rating
            .filter(|r| r.is_finite())
            .map_or(3, |r| r.round().clamp(1.0, 5.0) as u8);
        SustainabilityAnalysis {
            rating,
            factors: self
                .factors
                .unwrap_or_else(|| vec!["Unable to analyze sustainability factors".to_string()]),
            recommendation: self
                .recommendation
                .unwrap_or_else(|| "Consider the long-term environmental impact".to_string()),
            alternatives: self.alternatives.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuestionsReply {
    questions: Option<Vec<String>>,
}

/// Whether a failed request is worth repeating.
fn is_transient(error: &Error) -> bool {
    match error {
        Error::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e
                    .status()
                    .is_some_and(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
        }
        _ => false,
    }
}

fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let multiplier = 1u64.checked_shl(attempt.min(16)).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(multiplier))
}

/// Analyzer talking to `{base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiAnalyzer {
    config: AnalysisConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiAnalyzer {
    /// Creates an analyzer. Without an API key every call returns the
    /// degraded result without touching the network.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AnalysisConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        })
    }

    /// Whether an API key is configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn request_once<T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Analysis {
                message: "Completion contained no message".to_string(),
            })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Sends one chat request and decodes the JSON object in the reply.
    async fn chat_json<T: DeserializeOwned>(&self, system: &str, prompt: &str) -> Result<T> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::Analysis {
                message: "No API key configured".to_string(),
            });
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "response_format": { "type": "json_object" },
        });

        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            match self.request_once(&url, api_key, &body).await {
                Ok(reply) => return Ok(reply),
                Err(e) if attempt + 1 < max_attempts && is_transient(&e) => {
                    let delay = backoff_delay(self.config.retry_backoff_ms, attempt);
                    debug!(attempt, ?delay, "Analysis request failed, retrying: {e}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Asks the service about a product's price, without falling back.
    ///
    /// # Errors
    /// Returns an error if no API key is configured or every attempt fails.
    pub async fn request_price_analysis(
        &self,
        name: &str,
        current_price: f64,
        product_url: Option<&str>,
    ) -> Result<PriceAnalysis> {
        let prompt = format!(
            "Analyze the price and suggest alternatives for this product:\n\
             Item: {name}\n\
             Current Price: ${current_price}\n\
             URL: {}\n\n\
             Provide analysis in JSON format with:\n\
             - currentPrice: number\n\
             - trend: \"up\" | \"down\" | \"stable\"\n\
             - priceChange: number (positive for increase, negative for decrease)\n\
             - confidence: number (0-1)\n\
             - recommendation: string\n\
             - alternatives: array of {{name, price, reason}}",
            product_url.unwrap_or("Not provided")
        );
        let reply: PriceReply = self.chat_json(PRICE_SYSTEM_PROMPT, &prompt).await?;
        Ok(reply.into_analysis(current_price))
    }

    /// Rates a product's environmental impact.
    pub async fn analyze_sustainability(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> SustainabilityAnalysis {
        let prompt = format!(
            "Analyze the sustainability impact of this product:\n\
             Item: {name}\n\
             Description: {}\n\n\
             Provide analysis in JSON format with:\n\
             - rating: number (1-5, where 5 is most sustainable)\n\
             - factors: array of strings (environmental considerations)\n\
             - recommendation: string\n\
             - alternatives: array of more sustainable options",
            description.unwrap_or("Not provided")
        );
        match self
            .chat_json::<SustainabilityReply>(SUSTAINABILITY_SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(reply) => reply.into_analysis(),
            Err(e) => {
                warn!("Sustainability analysis for '{name}' failed: {e}");
                SustainabilityAnalysis::degraded()
            }
        }
    }

    /// Generates reflection questions for a checkpoint of `label`.
    pub async fn generate_questions(
        &self,
        name: &str,
        label: IntervalLabel,
        notes: Option<&str>,
    ) -> Vec<String> {
        let prompt = format!(
            "Generate thoughtful reflection questions for a {label} review of this item:\n\
             Item: {name}\n\
             User Notes: {}\n\n\
             Provide 2-3 personalized questions as a JSON object with a \"questions\" array of strings.\n\
             Questions should encourage mindful consumption and self-reflection.",
            notes.unwrap_or("None")
        );
        match self
            .chat_json::<QuestionsReply>(QUESTIONS_SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(QuestionsReply {
                questions: Some(questions),
            }) if !questions.is_empty() => questions,
            Ok(_) => DEFAULT_REFLECTION_QUESTIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            Err(e) => {
                warn!("Question generation for '{name}' failed: {e}");
                DEFAULT_REFLECTION_QUESTIONS
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            }
        }
    }
}

#[async_trait]
impl PriceAnalyzer for OpenAiAnalyzer {
    async fn analyze_price(
        &self,
        name: &str,
        current_price: f64,
        product_url: Option<&str>,
    ) -> Result<PriceAnalysis> {
        if !self.is_enabled() {
            debug!("No analysis API key, keeping price of '{name}'");
            return Ok(PriceAnalysis::degraded(current_price));
        }
        match self
            .request_price_analysis(name, current_price, product_url)
            .await
        {
            Ok(analysis) => Ok(analysis),
            Err(e) => {
                warn!("Price analysis for '{name}' failed: {e}");
                Ok(PriceAnalysis::degraded(current_price))
            }
        }
    }
}
