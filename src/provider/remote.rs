//! Adapter for a configured upstream identity provider.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::Error;
use crate::fetch::Fetch;
use crate::identity::{Identity, IdentityPatch};
use crate::provider::IdentityProvider;

/// HTTP adapter forwarding each verb 1:1 to the upstream provider.
///
/// The provider-issued access token from the most recent sign-in or
/// sign-up authenticates subsequent profile updates and sign-out.
pub struct RemoteProvider {
    url: String,
    key: String,
    client: Client,
    access_token: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,
    user: Identity,
}

impl RemoteProvider {
    pub fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            access_token: Mutex::new(None),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    async fn execute_auth(
        &self,
        builder: crate::fetch::FetchBuilder<'_>,
        verb: &str,
    ) -> Result<AuthResponse, Error> {
        let response = builder.execute_raw().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!("{} failed ({}): {}", verb, status, text)));
        }

        Ok(response.json::<AuthResponse>().await?)
    }

    // Store the token when one was returned; a token-less response (e.g. a
    // profile update) leaves the current one in place.
    fn retain_token(&self, response: &AuthResponse) {
        if let Some(token) = &response.access_token {
            *self.access_token.lock().unwrap() = Some(token.clone());
        }
    }

    fn current_token(&self) -> Option<String> {
        self.access_token.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for RemoteProvider {
    async fn sign_in_with_provider(&self, provider_token: &str) -> Result<Identity, Error> {
        let url = self.auth_url("/token?grant_type=id_token");
        let builder = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .json(&json!({ "id_token": provider_token }))?;
        let response = self.execute_auth(builder, "social sign-in").await?;
        self.retain_token(&response);
        Ok(response.user)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, Error> {
        let url = self.auth_url("/token?grant_type=password");
        let builder = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .json(&json!({ "email": email, "password": password }))?;
        let response = self.execute_auth(builder, "sign-in").await?;
        self.retain_token(&response);
        Ok(response.user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, Error> {
        let url = self.auth_url("/signup");
        let builder = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .json(&json!({ "email": email, "password": password }))?;
        let response = self.execute_auth(builder, "sign-up").await?;
        self.retain_token(&response);
        Ok(response.user)
    }

    async fn update_profile(
        &self,
        _current: &Identity,
        patch: &IdentityPatch,
    ) -> Result<Identity, Error> {
        let token = self
            .current_token()
            .ok_or_else(|| Error::auth("not signed in to the identity provider"))?;

        let url = self.auth_url("/user");
        let builder = Fetch::put(&self.client, &url)
            .header("apikey", &self.key)
            .bearer_auth(&token)
            .json(patch)?;
        let response = self.execute_auth(builder, "profile update").await?;
        self.retain_token(&response);
        Ok(response.user)
    }

    async fn sign_out(&self) -> Result<(), Error> {
        let token = self.access_token.lock().unwrap().take();

        let url = self.auth_url("/logout");
        let mut builder = Fetch::post(&self.client, &url).header("apikey", &self.key);
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        builder.execute_raw().await?;
        Ok(())
    }
}
