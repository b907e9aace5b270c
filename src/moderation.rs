//! Moderation service client.
//!
//! `/here` asks this service whether the invoking user may ping a channel.
//! A denied request (status >= 400 or an empty authorization list) is an
//! ordinary `Ok(false)`; only transport failures surface as errors.

use anyhow::Result;
use log::debug;
use serde_json::Value;

#[derive(Clone)]
pub struct ModerationClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl ModerationClient {
    pub fn new(host: &str, port: u16, token: String) -> Self {
        ModerationClient {
            base_url: format!("http://{}:{}", host, port),
            token,
            client: reqwest::Client::new(),
        }
    }

    pub async fn is_authorized(&self, user_id: &str, channel_id: &str) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/mods/", self.base_url))
            .query(&[("slack_id", user_id), ("channel_id", channel_id)])
            .header("Authorization", format!("Token {}", self.token))
            .send()
            .await?;

        debug!("moderation service status: {}", response.status());
        if response.status().as_u16() >= 400 {
            return Ok(false);
        }

        let mods: Vec<Value> = response.json().await?;
        debug!("moderation service returned {} record(s)", mods.len());
        Ok(!mods.is_empty())
    }
}
