use axum::extract::FromRef;
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::debug;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

/// Verification keys for access tokens issued by the identity provider.
#[derive(Clone)]
pub struct JwtKeys {
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    #[cfg(test)]
    encoding: jsonwebtoken::EncodingKey,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            #[cfg(test)]
            encoding: jsonwebtoken::EncodingKey::from_secret(cfg.secret.as_bytes()),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
impl JwtKeys {
    /// Mint a five minute token the way the identity provider would.
    pub fn sign(&self, user_id: uuid::Uuid) -> anyhow::Result<String> {
        let now = time::OffsetDateTime::now_utc();
        self.sign_claims(&Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: (now + time::Duration::minutes(5)).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        })
    }

    pub fn sign_claims(&self, claims: &Claims) -> anyhow::Result<String> {
        let header = jsonwebtoken::Header::default();
        Ok(jsonwebtoken::encode(&header, claims, &self.encoding)?)
    }
}
