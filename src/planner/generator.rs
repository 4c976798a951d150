use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::goals::model::NutritionGoals;
use crate::recipes::model::{Macros, Recipe};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("meal generation is not configured")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generator returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("reply contains no JSON object")]
    NoJson,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Recipe as the generator sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub macros: Macros,
    pub prep_time: i32,
    pub cook_time: i32,
}

impl From<&Recipe> for CatalogEntry {
    fn from(r: &Recipe) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
            kind: r.kind.clone(),
            macros: r.macros,
            prep_time: r.prep_time,
            cook_time: r.cook_time,
        }
    }
}

/// Locked contents of the day being regenerated; `None` means free to fill.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LockedMeals {
    pub breakfast: Option<Vec<CatalogEntry>>,
    pub lunch: Option<Vec<CatalogEntry>>,
    pub dinner: Option<Vec<CatalogEntry>>,
    pub snacks: Vec<Option<CatalogEntry>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub user_goals: NutritionGoals,
    pub locked_meals: LockedMeals,
    pub available_recipes: Vec<CatalogEntry>,
    pub current_day: usize,
}

/// A recipe reference in the reply: a bare id or an object carrying one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecipeRef {
    Id(Uuid),
    Object { id: Uuid },
}

impl RecipeRef {
    pub fn id(self) -> Uuid {
        match self {
            RecipeRef::Id(id) | RecipeRef::Object { id } => id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratedMeals {
    #[serde(default)]
    pub breakfast: Option<RecipeRef>,
    #[serde(default)]
    pub lunch: Option<RecipeRef>,
    #[serde(default)]
    pub dinner: Option<RecipeRef>,
    #[serde(default)]
    pub snacks: Vec<Option<RecipeRef>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReply {
    pub meal_plan: GeneratedMeals,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[async_trait]
pub trait MealGenerator: Send + Sync {
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationReply, GeneratorError>;
}

/// Used when no generation endpoint is configured.
pub struct DisabledGenerator;

#[async_trait]
impl MealGenerator for DisabledGenerator {
    async fn generate(&self, _req: &GenerationRequest) -> Result<GenerationReply, GeneratorError> {
        Err(GeneratorError::Disabled)
    }
}

/// Calls the remote meal-plan function over HTTP.
#[derive(Clone)]
pub struct HttpMealGenerator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpMealGenerator {
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            api_key,
        })
    }

    pub fn from_config(cfg: &GeneratorConfig) -> anyhow::Result<Option<Self>> {
        cfg.url
            .clone()
            .map(|url| {
                Self::new(
                    url,
                    cfg.api_key.clone(),
                    Duration::from_secs(cfg.timeout_secs),
                )
            })
            .transpose()
    }
}

#[async_trait]
impl MealGenerator for HttpMealGenerator {
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationReply, GeneratorError> {
        let mut call = self.client.post(&self.url).json(req);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }
        let response = call.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%status, "meal generator returned an error status");
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        debug!(bytes = body.len(), "meal generator replied");
        parse_reply(&body)
    }
}

/// Parse a reply that may be bare JSON, fenced in a ```json block, or wrapped
/// in prose.
pub fn parse_reply(text: &str) -> Result<GenerationReply, GeneratorError> {
    let json = extract_json_object(text).ok_or(GeneratorError::NoJson)?;
    Ok(serde_json::from_str(json)?)
}

pub fn extract_json_object(text: &str) -> Option<&str> {
    lazy_static! {
        static ref FENCED: Regex = Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").unwrap();
    }
    if let Some(inner) = FENCED.captures(text).and_then(|c| c.get(1)) {
        return Some(inner.as_str());
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
