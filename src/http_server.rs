use anyhow::{anyhow, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use hmac::{Hmac, Mac};
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use sha2::Sha256;
use tower_http::cors::CorsLayer;

use crate::command::SlashCommand;
use crate::commands::CommandHandler;
use crate::config::Config;

type HmacSha256 = Hmac<Sha256>;

// Slack rejects replayed requests by timestamp; match its 5 minute window.
const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

#[derive(Clone)]
pub struct AppState {
    pub command_handler: CommandHandler,
    pub signing_secret: Option<String>,
}

pub fn create_server(config: &Config, command_handler: CommandHandler) -> Router {
    if config.slack_signing_secret.is_none() {
        warn!("SLACK_SIGNING_SECRET not set; request signature verification is disabled");
    }

    let state = AppState {
        command_handler,
        signing_secret: config.slack_signing_secret.clone(),
    };

    Router::new()
        .route("/", get(health_check))
        .route("/slack/commands", post(handle_slash_command))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Slash command server is running",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Receives the platform's form-encoded slash-command POST. The command is
/// dispatched on its own task so the endpoint can ack within the platform's
/// response deadline; handler outcomes are logged here, the top-level
/// boundary for unrecovered failures.
async fn handle_slash_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let request_id = uuid::Uuid::new_v4();
    debug!("[{}] inbound command payload ({} bytes)", request_id, body.len());

    if let Some(secret) = &state.signing_secret {
        if let Err(err) = verify_slack_signature(secret, &headers, &body) {
            error!("[{}] signature verification failed: {}", request_id, err);
            return StatusCode::UNAUTHORIZED;
        }
        debug!("[{}] signature verified", request_id);
    }

    let command = match SlashCommand::from_form(&body) {
        Ok(command) => command,
        Err(err) => {
            error!("[{}] bad command payload: {}", request_id, err);
            return StatusCode::BAD_REQUEST;
        }
    };

    info!("[{}] dispatching {}", request_id, command.command);
    let handler = state.command_handler.clone();
    tokio::spawn(async move {
        if let Err(err) = handler.dispatch(&command).await {
            error!("[{}] {} failed: {:#}", request_id, command.command, err);
        }
    });

    StatusCode::OK
}

/// Slack signs requests with `v0=hex(hmac_sha256(secret, "v0:{ts}:{body}"))`
/// over the `x-slack-signature` and `x-slack-request-timestamp` headers.
fn verify_slack_signature(secret: &str, headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let signature = headers
        .get("x-slack-signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| anyhow!("missing x-slack-signature header"))?;
    let timestamp = headers
        .get("x-slack-request-timestamp")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| anyhow!("missing x-slack-request-timestamp header"))?;

    let skew = chrono::Utc::now().timestamp()
        - timestamp
            .parse::<i64>()
            .map_err(|_| anyhow!("malformed request timestamp"))?;
    if skew.abs() > MAX_TIMESTAMP_SKEW_SECS {
        return Err(anyhow!("stale request timestamp ({}s skew)", skew));
    }

    let provided = signature
        .strip_prefix("v0=")
        .ok_or_else(|| anyhow!("unsupported signature version"))?;
    let provided = hex::decode(provided).map_err(|_| anyhow!("malformed signature hex"))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| anyhow!("invalid signing secret"))?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| anyhow!("signature mismatch"))?;

    Ok(())
}

pub async fn start_http_server(config: &Config, command_handler: CommandHandler) -> Result<()> {
    let app = create_server(config, command_handler);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", config.port))
        .await
        .map_err(|e| anyhow!("Failed to bind to port {}: {}", config.port, e))?;

    info!("HTTP server starting on port {}", config.port);
    info!(
        "Slash command endpoint: http://0.0.0.0:{}/slack/commands",
        config.port
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
