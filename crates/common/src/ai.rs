//! Patent analyses backed by a hosted language model.
//!
//! Every analysis follows the same shape: structured input is turned into
//! a prompt, the model is asked for a JSON object, and the reply is parsed
//! into a typed result. Missing reply fields fall back to their defaults.
//!
//! Each analysis is available in two flavours. `try_*` methods return any
//! model or parsing failure to the caller, while the plain methods absorb
//! failures and return a fallback value instead. Fallback values always have
//! their `available` flag unset, so that callers can tell "analysis
//! unavailable" apart from a negative finding.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use derive_more::{Display, Error, From};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::config;

/// Categories the classifier is allowed to pick from.
pub const CATEGORIES: [&str; 8] = [
    "medical_technology",
    "software_ai",
    "renewable_energy",
    "manufacturing",
    "biotechnology",
    "automotive",
    "telecommunications",
    "other",
];

/// Language model errors.
#[derive(Debug, Display, From, Error)]
pub enum Error {
    /// HTTP transport error.
    Http(reqwest::Error),

    /// Model reply was not a valid JSON object of the expected shape.
    Json(serde_json::Error),

    /// Model reply had no content.
    #[display(fmt = "language model returned an empty response")]
    EmptyResponse,

    /// No language model is configured.
    #[display(fmt = "language model is not configured")]
    NotConfigured,
}

/// A single request to a language model.
pub struct Prompt<'a> {
    /// Instructions describing the expected role of the model.
    pub system: &'a str,

    /// Request text.
    pub user: String,

    /// Upper limit on the reply size.
    pub max_tokens: u32,
}

/// Chat-style language model that replies with a JSON object.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a prompt and return the raw reply content.
    async fn complete(&self, prompt: &Prompt<'_>) -> Result<String, Error>;
}

/// OpenAI-compatible chat completions client.
pub struct OpenAi {
    client: reqwest::Client,
    config: config::Ai,
}

impl OpenAi {
    /// Create new [`OpenAi`] client from the provided configuration.
    pub fn new(config: config::Ai) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self { client, config })
    }
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAi {
    async fn complete(&self, prompt: &Prompt<'_>) -> Result<String, Error> {
        let completion: Completion = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": self.config.model,
                "messages": [
                    { "role": "system", "content": prompt.system },
                    { "role": "user", "content": prompt.user },
                ],
                "response_format": { "type": "json_object" },
                "max_tokens": prompt.max_tokens,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(Error::EmptyResponse)
    }
}

/// Model used when no language model is configured.
struct Unconfigured;

#[async_trait]
impl ChatModel for Unconfigured {
    async fn complete(&self, _: &Prompt<'_>) -> Result<String, Error> {
        Err(Error::NotConfigured)
    }
}

/// Potentially conflicting prior patent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriorArt {
    /// External patent identifier.
    pub patent_id: String,
    pub title: String,
    pub description: String,

    /// Similarity to the analyzed description, between 0 and 1.
    pub similarity_score: f64,

    /// Patent office or database the result was found in.
    pub source: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PriorArtReply {
    results: Vec<PriorArt>,
}

/// Estimated commercial value of a patent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Valuation {
    pub estimated_value: f64,
    pub confidence: f64,
    pub factors: Vec<String>,
    pub market_analysis: String,
    pub recommendations: Vec<String>,

    /// Whether the valuation was produced by the model.
    #[serde(skip_deserializing)]
    pub available: bool,
}

impl Valuation {
    fn unavailable() -> Self {
        Self {
            market_analysis: String::from("Valuation analysis unavailable"),
            ..Default::default()
        }
    }
}

/// Infringement risk level derived from a similarity analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Similarity of two patent descriptions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Similarity {
    pub similarity_score: f64,
    pub confidence: f64,
    pub analysis: String,
    pub risk_level: RiskLevel,

    /// Whether the analysis was produced by the model.
    #[serde(skip_deserializing)]
    pub available: bool,
}

impl Similarity {
    fn unavailable() -> Self {
        Self {
            analysis: String::from("Similarity analysis unavailable"),
            ..Default::default()
        }
    }
}

/// Input for a patent application draft.
#[derive(Clone, Debug, Deserialize)]
pub struct DraftInput {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Generated patent application draft.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Draft {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub background: String,
    pub summary: String,
    pub detailed_description: String,
    pub claims: Vec<String>,
    pub drawings: Vec<String>,

    /// Whether the draft was produced by the model.
    #[serde(skip_deserializing)]
    pub available: bool,
}

/// Innovation classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Classification {
    /// One of the [`CATEGORIES`] values.
    pub category: String,
    pub confidence: f64,
    pub subcategories: Vec<String>,
    pub analysis: String,

    /// Whether the classification was produced by the model.
    #[serde(skip_deserializing)]
    pub available: bool,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            category: String::from("other"),
            confidence: 0.0,
            subcategories: Vec::new(),
            analysis: String::new(),
            available: false,
        }
    }
}

impl Classification {
    fn unavailable() -> Self {
        Self {
            analysis: String::from("Classification analysis unavailable"),
            ..Default::default()
        }
    }
}

/// Patent fields used to build valuation prompts.
pub struct PatentSummary<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub status: &'a str,
}

/// Patent analysis adapter.
#[derive(Clone)]
pub struct Analyst {
    model: Arc<dyn ChatModel>,
}

impl Analyst {
    /// Create new [`Analyst`] backed by the provided model.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Create new [`Analyst`] from the optional model configuration.
    ///
    /// Without a configuration every analysis returns its fallback value.
    pub fn from_config(config: Option<&config::Ai>) -> Result<Self, Error> {
        let model: Arc<dyn ChatModel> = match config {
            Some(config) => Arc::new(OpenAi::new(config.clone())?),
            None => Arc::new(Unconfigured),
        };

        Ok(Self::new(model))
    }

    async fn ask<T: DeserializeOwned>(
        &self,
        system: &str,
        user: String,
        max_tokens: u32,
    ) -> Result<T, Error> {
        let content = self
            .model
            .complete(&Prompt {
                system,
                user,
                max_tokens,
            })
            .await?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Search for prior art that may conflict with the provided description.
    pub async fn try_search_prior_art(&self, description: &str) -> Result<Vec<PriorArt>, Error> {
        let reply: PriorArtReply = self
            .ask(
                "You are a patent research expert who identifies prior art. Reply with a JSON object only.",
                format!(
                    r#"List existing patents that may constitute prior art for the invention below.
Reply with an object of the form
{{"results": [{{"patentId": "US-1234567", "title": "...", "description": "...", "similarityScore": 0.85, "source": "USPTO"}}]}}
where similarityScore is between 0 and 1.

Invention: {description}"#
                ),
                2000,
            )
            .await?;

        Ok(reply.results)
    }

    /// Search for prior art, returning an empty list if the analysis is unavailable.
    pub async fn search_prior_art(&self, description: &str) -> Vec<PriorArt> {
        self.try_search_prior_art(description)
            .await
            .unwrap_or_else(|err| {
                warn!(%err, "prior art search unavailable");
                Vec::new()
            })
    }

    /// Estimate commercial value of a patent.
    pub async fn try_evaluate_value(&self, patent: &PatentSummary<'_>) -> Result<Valuation, Error> {
        let mut valuation: Valuation = self
            .ask(
                "You are a patent valuation expert who estimates realistic commercial value. Reply with a JSON object only.",
                format!(
                    r#"Estimate the commercial value of the patent below, in US dollars.
Reply with an object of the form
{{"estimatedValue": 450000, "confidence": 0.78, "factors": ["..."], "marketAnalysis": "...", "recommendations": ["..."]}}
where confidence is between 0 and 1.

Title: {}
Description: {}
Category: {}
Status: {}"#,
                    patent.title, patent.description, patent.category, patent.status
                ),
                1500,
            )
            .await?;

        valuation.available = true;

        Ok(valuation)
    }

    /// Estimate commercial value of a patent, returning a zero valuation if unavailable.
    pub async fn evaluate_value(&self, patent: &PatentSummary<'_>) -> Valuation {
        self.try_evaluate_value(patent).await.unwrap_or_else(|err| {
            warn!(%err, "patent valuation unavailable");
            Valuation::unavailable()
        })
    }

    /// Compare two patent descriptions.
    pub async fn try_detect_similarity(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Similarity, Error> {
        let mut similarity: Similarity = self
            .ask(
                "You are a patent similarity expert who assesses conflicts between inventions. Reply with a JSON object only.",
                format!(
                    r#"Compare the two invention descriptions below for overlapping concepts and infringement risk.
Reply with an object of the form
{{"similarityScore": 0.75, "confidence": 0.85, "analysis": "...", "riskLevel": "low" | "medium" | "high"}}

First: {source}
Second: {target}"#
                ),
                1000,
            )
            .await?;

        similarity.available = true;

        Ok(similarity)
    }

    /// Compare two patent descriptions, returning a low-risk zero score if unavailable.
    pub async fn detect_similarity(&self, source: &str, target: &str) -> Similarity {
        self.try_detect_similarity(source, target)
            .await
            .unwrap_or_else(|err| {
                warn!(%err, "similarity detection unavailable");
                Similarity::unavailable()
            })
    }

    /// Generate a patent application draft.
    pub async fn try_generate_draft(&self, input: &DraftInput) -> Result<Draft, Error> {
        let mut draft: Draft = self
            .ask(
                "You are a patent attorney who writes patent applications in precise legal and technical language. Reply with a JSON object only.",
                format!(
                    r#"Write a patent application draft for the invention below, with several detailed claims.
Reply with an object of the form
{{"title": "...", "abstract": "...", "background": "...", "summary": "...", "detailedDescription": "...", "claims": ["..."], "drawings": ["..."]}}

Title: {}
Description: {}
Category: {}"#,
                    input.title, input.description, input.category
                ),
                3000,
            )
            .await?;

        if draft.title.is_empty() {
            draft.title = input.title.clone();
        }

        draft.available = true;

        Ok(draft)
    }

    /// Generate a patent application draft, returning an empty draft if unavailable.
    pub async fn generate_draft(&self, input: &DraftInput) -> Draft {
        self.try_generate_draft(input).await.unwrap_or_else(|err| {
            warn!(%err, "patent drafting unavailable");

            Draft {
                title: input.title.clone(),
                abstract_text: String::from("Patent draft generation unavailable"),
                ..Default::default()
            }
        })
    }

    /// Classify an innovation into one of the [`CATEGORIES`].
    pub async fn try_classify(&self, description: &str) -> Result<Classification, Error> {
        let mut classification: Classification = self
            .ask(
                "You are an innovation classification expert. Reply with a JSON object only.",
                format!(
                    r#"Classify the innovation below into one of these categories: {}.
Reply with an object of the form
{{"category": "software_ai", "confidence": 0.92, "subcategories": ["..."], "analysis": "..."}}

Innovation: {description}"#,
                    CATEGORIES.join(", ")
                ),
                800,
            )
            .await?;

        if !CATEGORIES.contains(&classification.category.as_str()) {
            classification.category = String::from("other");
        }

        classification.available = true;

        Ok(classification)
    }

    /// Classify an innovation, returning the `other` category if unavailable.
    pub async fn classify(&self, description: &str) -> Classification {
        self.try_classify(description).await.unwrap_or_else(|err| {
            warn!(%err, "innovation classification unavailable");
            Classification::unavailable()
        })
    }
}
