//! Facebook Graph API client used by `POST /users/login/facebook`.

use reqwest::Client;
use serde::Deserialize;

use crate::error::AppError;

/// The part of the Graph API `/me` profile the service cares about.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FacebookProfile {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct FacebookClient {
    client: Client,
    base_url: String,
}

impl FacebookClient {
    /// `base_url` is `https://graph.facebook.com` in production.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Exchanges a client-side access token for the user's profile.
    ///
    /// A token Facebook refuses is reported as 401; a provider that cannot be reached as 502.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<FacebookProfile, AppError> {
        let response = self
            .client
            .get(format!("{}/v4.0/me", self.base_url))
            .query(&[("fields", "email"), ("access_token", access_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            log::info!("Facebook rejected a login token with {}", response.status());
            return Err(AppError::Unauthorized("Invalid Facebook token".into()));
        }

        let profile = response
            .json::<FacebookProfile>()
            .await
            .map_err(|e| {
                AppError::BadGateway(format!("Unexpected Facebook response: {}", e.without_url()))
            })?;
        Ok(profile)
    }
}
