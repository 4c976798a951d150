use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

/// Remote meal generation endpoint. Without a url every regenerate uses the
/// local random fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub fallback_delay_ms: u64,
}

impl GeneratorConfig {
    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub generator: GeneratorConfig,
    /// Number of days in a freshly created plan.
    pub plan_days: usize,
    /// Drafts untouched for this long are dropped from memory.
    pub draft_idle_minutes: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "mealplanner".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "mealplanner-users".into()),
        };
        let generator = GeneratorConfig {
            url: std::env::var("GENERATOR_URL").ok().filter(|v| !v.is_empty()),
            api_key: std::env::var("GENERATOR_API_KEY").ok().filter(|v| !v.is_empty()),
            timeout_secs: env_parse("GENERATOR_TIMEOUT_SECS", 30),
            fallback_delay_ms: env_parse("FALLBACK_DELAY_MS", 1000),
        };
        let plan_days: usize = env_parse("PLAN_DAYS", 7);
        anyhow::ensure!(plan_days > 0, "PLAN_DAYS must be positive");

        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            jwt,
            generator,
            plan_days,
            draft_idle_minutes: env_parse::<u64>("DRAFT_IDLE_MINUTES", 720).max(1),
        })
    }

    pub fn draft_idle(&self) -> Duration {
        Duration::from_secs(self.draft_idle_minutes * 60)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
