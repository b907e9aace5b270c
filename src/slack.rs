//! Slack Web API client.
//!
//! Thin adapter over the handful of methods the command handlers need. The
//! Web API reports failures as HTTP 200 with `{"ok": false, "error": "..."}`,
//! so every response goes through [`api_result`] before fields are read.

use log::{debug, error};
use serde_json::{json, Value};
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Failure raised by the Slack client. The dispatcher recovers this kind
/// (and only this kind) with an ephemeral fallback notice.
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("slack transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("slack api {method} failed: {reason}")]
    Api { method: String, reason: String },
    #[error("missing field in slack response: {0}")]
    MissingField(&'static str),
}

/// Web API method selector for pre-built message payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    PostMessage,
    PostEphemeral,
}

impl ApiMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMethod::PostMessage => "chat.postMessage",
            ApiMethod::PostEphemeral => "chat.postEphemeral",
        }
    }
}

/// A message accepted by the chat API, with its server-assigned timestamp.
#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub ts: String,
}

#[derive(Clone)]
pub struct SlackClient {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(token: String) -> Self {
        SlackClient {
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Post a message to a channel (or a user's DM). Returns the posted
    /// message's `ts`, which threading replies reference.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: Option<Value>,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage, SlackError> {
        let payload = message_payload(channel, text, attachments, thread_ts);
        let body = self.call(ApiMethod::PostMessage.as_str(), payload).await?;
        let ts = body
            .get("ts")
            .and_then(Value::as_str)
            .ok_or(SlackError::MissingField("ts"))?;
        Ok(PostedMessage { ts: ts.to_string() })
    }

    /// Post a message visible only to `user` within `channel`.
    pub async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        text: &str,
        attachments: Option<Value>,
    ) -> Result<(), SlackError> {
        let mut payload = json!({ "channel": channel, "user": user, "text": text });
        if let Some(attachments) = attachments {
            payload["attachments"] = attachments;
        }
        self.call(ApiMethod::PostEphemeral.as_str(), payload)
            .await?;
        Ok(())
    }

    /// Forward a pre-built payload to the given chat method.
    pub async fn send(&self, method: ApiMethod, payload: Value) -> Result<(), SlackError> {
        self.call(method.as_str(), payload).await?;
        Ok(())
    }

    /// Open a modal dialog against a one-time trigger id.
    pub async fn open_dialog(&self, trigger_id: &str, dialog: Value) -> Result<(), SlackError> {
        let payload = json!({ "trigger_id": trigger_id, "dialog": dialog });
        self.call("dialog.open", payload).await?;
        Ok(())
    }

    /// Look up a user's profile email via `users.info`.
    pub async fn user_email(&self, user_id: &str) -> Result<String, SlackError> {
        let body = self.get("users.info", &[("user", user_id)]).await?;
        body.pointer("/user/profile/email")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or(SlackError::MissingField("user.profile.email"))
    }

    /// List member ids of a channel.
    pub async fn channel_members(&self, channel_id: &str) -> Result<Vec<String>, SlackError> {
        let body = self
            .get("conversations.members", &[("channel", channel_id)])
            .await?;
        let members = body
            .get("members")
            .and_then(Value::as_array)
            .ok_or(SlackError::MissingField("members"))?;
        Ok(members
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.to_string())
            .collect())
    }

    async fn call(&self, method: &str, payload: Value) -> Result<Value, SlackError> {
        debug!("slack call: {}", method);
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        let body: Value = response.json().await?;
        api_result(method, body)
    }

    async fn get(&self, method: &str, params: &[(&str, &str)]) -> Result<Value, SlackError> {
        debug!("slack get: {}", method);
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, method))
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await?;
        let body: Value = response.json().await?;
        api_result(method, body)
    }
}

/// Build a `chat.postMessage` payload. A `thread_ts` makes the message a
/// threaded reply anchored on that timestamp.
fn message_payload(
    channel: &str,
    text: &str,
    attachments: Option<Value>,
    thread_ts: Option<&str>,
) -> Value {
    let mut payload = json!({ "channel": channel, "text": text });
    if let Some(attachments) = attachments {
        payload["attachments"] = attachments;
    }
    if let Some(ts) = thread_ts {
        payload["thread_ts"] = json!(ts);
    }
    payload
}

/// Apply the Web API's `ok`/`error` envelope convention.
fn api_result(method: &str, body: Value) -> Result<Value, SlackError> {
    if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        Ok(body)
    } else {
        let reason = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error")
            .to_string();
        error!("slack api {} failed: {}", method, reason);
        Err(SlackError::Api {
            method: method.to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_method_names() {
        assert_eq!(ApiMethod::PostMessage.as_str(), "chat.postMessage");
        assert_eq!(ApiMethod::PostEphemeral.as_str(), "chat.postEphemeral");
    }

    #[test]
    fn test_api_result_ok() {
        let body = json!({ "ok": true, "ts": "1503435956.000247" });
        let value = api_result("chat.postMessage", body).unwrap();
        assert_eq!(value["ts"], "1503435956.000247");
    }

    #[test]
    fn test_api_result_error_envelope() {
        let body = json!({ "ok": false, "error": "channel_not_found" });
        let err = api_result("chat.postMessage", body).unwrap_err();
        match err {
            SlackError::Api { method, reason } => {
                assert_eq!(method, "chat.postMessage");
                assert_eq!(reason, "channel_not_found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_result_missing_ok_is_error() {
        let err = api_result("users.info", json!({})).unwrap_err();
        assert!(matches!(err, SlackError::Api { .. }));
    }

    #[test]
    fn test_message_payload_plain() {
        let payload = message_payload("C1", "hello", None, None);
        assert_eq!(payload["channel"], "C1");
        assert_eq!(payload["text"], "hello");
        assert!(payload.get("thread_ts").is_none());
        assert!(payload.get("attachments").is_none());
    }

    // A reply given a prior message's ts must carry it as its thread anchor.
    #[test]
    fn test_message_payload_threads_on_prior_ts() {
        let first = PostedMessage { ts: "1503435956.000247".to_string() };
        let payload = message_payload("C1", "member list", None, Some(&first.ts));
        assert_eq!(payload["thread_ts"], "1503435956.000247");
    }

    #[test]
    fn test_message_payload_with_attachments() {
        let payload = message_payload("C1", "", Some(json!([{ "text": "claim" }])), None);
        assert_eq!(payload["attachments"][0]["text"], "claim");
    }
}
