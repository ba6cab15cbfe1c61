use axum::async_trait;
use reqwest::header;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::form_urlencoded;

use crate::config::GithubConfig;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";
const EMAILS_URL: &str = "https://api.github.com/user/emails";

const GITHUB_JSON: &str = "application/vnd.github+json";
// GitHub's REST API refuses requests without a User-Agent.
const USER_AGENT: &str = "autorent";

/// Failure messages double as the plain-text bodies of the callback route.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub token exchange failed")]
    TokenExchange,
    #[error("Could not retrieve email from GitHub")]
    NoEmail,
    #[error("GitHub login failed")]
    Http(#[from] reqwest::Error),
}

/// Turns a callback `code` into the account's email address.
#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn resolve_email(&self, code: &str) -> Result<String, GithubError>;
}

/// The URL the authorize route redirects the user agent to.
pub fn authorize_url(client_id: &str, callback_url: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", callback_url)
        .append_pair("scope", "user:email")
        .finish();
    format!("{AUTHORIZE_URL}?{query}")
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// Primary verified address wins, otherwise the first listed one.
fn select_email(mut emails: Vec<GithubEmail>) -> Option<String> {
    if let Some(pos) = emails.iter().position(|e| e.primary && e.verified) {
        return Some(emails.swap_remove(pos).email);
    }
    emails.into_iter().next().map(|e| e.email)
}

pub struct GithubOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
}

impl GithubOAuth {
    pub fn new(config: &GithubConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: config.callback_url.clone(),
        }
    }
}

#[async_trait]
impl GithubClient for GithubOAuth {
    async fn resolve_email(&self, code: &str) -> Result<String, GithubError> {
        let token: AccessTokenResponse = self
            .http
            .post(TOKEN_URL)
            .header(header::ACCEPT, "application/json")
            .json(&json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "code": code,
                "redirect_uri": self.callback_url,
            }))
            .send()
            .await?
            .json()
            .await?;
        let access_token = token.access_token.ok_or(GithubError::TokenExchange)?;

        let user: GithubUser = self
            .http
            .get(USER_URL)
            .bearer_auth(&access_token)
            .header(header::ACCEPT, GITHUB_JSON)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .json()
            .await?;

        let email = match user.email {
            Some(email) if !email.is_empty() => Some(email),
            _ => {
                let emails: Vec<GithubEmail> = self
                    .http
                    .get(EMAILS_URL)
                    .bearer_auth(&access_token)
                    .header(header::ACCEPT, GITHUB_JSON)
                    .header(header::USER_AGENT, USER_AGENT)
                    .send()
                    .await?
                    .json()
                    .await?;
                select_email(emails)
            }
        };

        email.ok_or(GithubError::NoEmail)
    }
}
