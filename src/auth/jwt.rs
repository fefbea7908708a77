use std::collections::HashMap;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token signed with unknown key id")]
    UnknownKeyId,
    #[error("failed to fetch JWKS: {0}")]
    KeyFetch(String),
}

/// Claims the gateway reads from a validated token. `iss`, `aud` and `exp`
/// are enforced by the validator itself and need not be materialized here.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Authenticated caller as established by the token authenticator.
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject: String,
    pub permissions: Vec<String>,
}

/// Seam between the gateway and the token authenticator, so tests can
/// substitute a local verifier for the issuer-backed one.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kty: String,
    #[serde(default)]
    kid: Option<String>,
    #[serde(rename = "use", default)]
    key_use: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// Validates RS256 bearer tokens against the issuer's published key set.
///
/// Keys are fetched from `<issuer>.well-known/jwks.json`, cached by key id,
/// and refreshed once when a token arrives signed with an unknown `kid`
/// (issuer key rotation).
pub struct JwksVerifier {
    http: reqwest::Client,
    jwks_uri: String,
    validation: Validation,
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl JwksVerifier {
    pub fn new(issuer: &str, audience: &str) -> Self {
        let issuer = if issuer.ends_with('/') {
            issuer.to_string()
        } else {
            format!("{}/", issuer)
        };
        let jwks_uri = format!("{}.well-known/jwks.json", issuer);

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&issuer]);
        validation.set_audience(&[audience]);

        Self {
            http: reqwest::Client::new(),
            jwks_uri,
            validation,
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the issuer's JWKS and replace the cached key set.
    pub async fn refresh_keys(&self) -> Result<(), AuthError> {
        let jwks: JwkSet = self
            .http
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;
        self.install_keys(jwks);
        Ok(())
    }

    fn install_keys(&self, jwks: JwkSet) {
        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty != "RSA" {
                continue;
            }
            if matches!(jwk.key_use.as_deref(), Some(key_use) if key_use != "sig") {
                continue;
            }
            let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
                continue;
            };
            match DecodingKey::from_rsa_components(&n, &e) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(err) => log::warn!("skipping malformed JWK {}: {}", kid, err),
            }
        }
        log::info!("loaded {} signing key(s) from JWKS", keys.len());
        *self.keys.write() = keys;
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.keys.read().get(kid) {
            return Ok(key.clone());
        }
        self.refresh_keys().await?;
        self.keys
            .read()
            .get(kid)
            .cloned()
            .ok_or(AuthError::UnknownKeyId)
    }
}

#[async_trait::async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let header =
            decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("token header has no kid".to_string()))?;
        let key = self.key_for(&kid).await?;

        let data = decode::<Claims>(token, &key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(Identity {
            subject: data.claims.sub,
            permissions: data.claims.permissions,
        })
    }
}
