use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client id this service is registered under; verified ID tokens
    /// must carry it as their audience.
    pub client_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with GitHub. Used both when building the
    /// authorize redirect and when exchanging the code.
    pub callback_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub google: GoogleConfig,
    pub github: GithubConfig,
    /// Base URL the GitHub callback redirects back to with the issued token.
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let google = GoogleConfig {
            client_id: std::env::var("GOOGLE_CLIENT_ID").context("GOOGLE_CLIENT_ID is not set")?,
        };
        let github = GithubConfig {
            client_id: std::env::var("GITHUB_CLIENT_ID").context("GITHUB_CLIENT_ID is not set")?,
            client_secret: std::env::var("GITHUB_CLIENT_SECRET")
                .context("GITHUB_CLIENT_SECRET is not set")?,
            callback_url: std::env::var("GITHUB_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api/auth/github/callback".into()),
        };
        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        Ok(Self {
            database_url,
            jwt_secret,
            google,
            github,
            frontend_url,
        })
    }
}
