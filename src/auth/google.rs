use axum::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::ProviderError;

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

/// Verifies the ID token Google Identity Services hands the frontend and
/// extracts the email it asserts.
#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    async fn verify_credential(&self, credential: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    email: String,
}

pub struct GoogleIdVerifier {
    http: reqwest::Client,
    client_id: String,
}

impl GoogleIdVerifier {
    pub fn new(client_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.to_owned(),
        }
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, ProviderError> {
        self.http
            .get(GOOGLE_JWKS_URL)
            .send()
            .await
            .map_err(|e| ProviderError::Upstream(format!("jwks fetch failed: {e}")))?
            .json::<JwkSet>()
            .await
            .map_err(|e| ProviderError::Upstream(format!("jwks response unusable: {e}")))
    }
}

#[async_trait]
impl GoogleVerifier for GoogleIdVerifier {
    async fn verify_credential(&self, credential: &str) -> Result<String, ProviderError> {
        let header = decode_header(credential)
            .map_err(|e| ProviderError::Rejected(format!("malformed credential: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| ProviderError::Rejected("credential has no key id".into()))?;

        // Keys rotate; Google serves the current set with cache headers.
        let jwks = self.fetch_jwks().await?;
        let jwk = jwks
            .find(&kid)
            .ok_or_else(|| ProviderError::Rejected(format!("unknown signing key {kid}")))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| ProviderError::Upstream(format!("unusable jwk: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(std::slice::from_ref(&self.client_id));
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<GoogleClaims>(credential, &key, &validation)
            .map_err(|e| ProviderError::Rejected(format!("credential rejected: {e}")))?;
        Ok(data.claims.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_credential_is_rejected_before_any_fetch() {
        let verifier = GoogleIdVerifier::new("client-id");
        let err = verifier.verify_credential("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected(_)));
    }

    #[tokio::test]
    async fn credential_without_key_id_is_rejected() {
        #[derive(serde::Serialize)]
        struct Dummy {
            exp: usize,
        }
        // HS256 default header carries no kid.
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &Dummy { exp: 0 },
            &jsonwebtoken::EncodingKey::from_secret(b"irrelevant"),
        )
        .expect("encode");
        let verifier = GoogleIdVerifier::new("client-id");
        let err = verifier.verify_credential(&token).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected(_)));
    }
}
