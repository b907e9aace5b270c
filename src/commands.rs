//! Command dispatch and the per-command handlers.
//!
//! Every registered handler runs through [`CommandHandler::dispatch`], which
//! recovers chat-API posting failures with a single ephemeral notice to the
//! invoking user. Failures from the auxiliary services are not recovered
//! here; they bubble up to the HTTP layer.

use anyhow::Result;
use log::{debug, error, info, warn};
use serde_json::json;

use crate::airtable::AirtableClient;
use crate::command::SlashCommand;
use crate::config::Config;
use crate::dice::{self, DiceRoll};
use crate::lunch::{self, LunchCommand, RestaurantClient};
use crate::message_components;
use crate::moderation::ModerationClient;
use crate::slack::{SlackClient, SlackError};

#[derive(Clone)]
pub struct CommandHandler {
    slack: SlackClient,
    moderation: ModerationClient,
    restaurants: RestaurantClient,
    airtable: Option<AirtableClient>,
    moderator_channel: String,
}

impl CommandHandler {
    pub fn new(config: &Config) -> Self {
        let airtable = match (&config.airtable_api_key, &config.airtable_base_url) {
            (Some(key), Some(url)) => Some(AirtableClient::new(key.clone(), url.clone())),
            _ => None,
        };
        CommandHandler {
            slack: SlackClient::new(config.slack_token.clone()),
            moderation: ModerationClient::new(
                &config.moderation_host,
                config.moderation_port,
                config.moderation_token.clone(),
            ),
            restaurants: RestaurantClient::new(
                config.restaurant_api_key.clone(),
                config.restaurant_api_url.clone(),
            ),
            airtable,
            moderator_channel: config.moderator_channel.clone(),
        }
    }

    /// Route a command to its handler. Chat-API failures are converted into
    /// one ephemeral fallback notice; anything else propagates to the caller
    /// for top-level reporting.
    pub async fn dispatch(&self, command: &SlashCommand) -> Result<()> {
        info!(
            "processing {} from user {} in {}",
            command.command, command.user_id, command.channel_id
        );
        match self.route(command).await {
            Err(err) if is_chat_failure(&err) => {
                warn!(
                    "chat api failure while handling {}: {:#}",
                    command.command, err
                );
                self.post_failure_notice(command).await;
                Ok(())
            }
            other => other,
        }
    }

    async fn route(&self, command: &SlashCommand) -> Result<()> {
        match command.command.as_str() {
            "/here" => self.slash_here(command).await,
            "/lunch" => self.slash_lunch(command).await,
            "/repeat" => self.slash_repeat(command).await,
            "/report" => self.slash_report(command).await,
            "/ticket" => self.slash_ticket(command).await,
            "/roll" => self.slash_roll(command).await,
            other => {
                warn!("unknown command: {}", other);
                self.slack
                    .post_ephemeral(
                        &command.channel_id,
                        &command.user_id,
                        &format!("I don't know the command `{}`.", other),
                        None,
                    )
                    .await?;
                Ok(())
            }
        }
    }

    /// Fallback for the error-wrapping dispatch. A failure here is only
    /// logged; there is nothing left to tell the user through.
    async fn post_failure_notice(&self, command: &SlashCommand) {
        let text = failure_notice_text(command);
        if let Err(err) = self
            .slack
            .post_ephemeral(&command.user_id, &command.user_id, &text, None)
            .await
        {
            error!(
                "failed to deliver fallback notice for {}: {}",
                command.command, err
            );
        }
    }

    /// Look up the requester's email and open the ticket dialog against the
    /// command's one-time trigger id. No channel message is posted.
    async fn slash_ticket(&self, command: &SlashCommand) -> Result<()> {
        let email = self.slack.user_email(&command.user_id).await?;
        let dialog = message_components::ticket_dialog(&email, &command.text);
        self.slack.open_dialog(&command.trigger_id, dialog).await?;
        Ok(())
    }

    /// Forward the report text to the moderator channel with a claim button.
    async fn slash_report(&self, command: &SlashCommand) -> Result<()> {
        let text = format!("<@{}> sent report: {}", command.user_id, command.text);
        let attachments = json!([message_components::not_claimed_attachment()]);
        self.slack
            .post_message(&self.moderator_channel, &text, Some(attachments), None)
            .await?;
        Ok(())
    }

    /// Authorization-gated channel ping. Denial is a silent no-op so the
    /// command never leaks who is authorized. The member list is threaded
    /// under the announcement, so the two posts are strictly sequential.
    async fn slash_here(&self, command: &SlashCommand) -> Result<()> {
        if !self
            .moderation
            .is_authorized(&command.user_id, &command.channel_id)
            .await?
        {
            debug!(
                "/here denied for user {} in {}",
                command.user_id, command.channel_id
            );
            return Ok(());
        }

        let members = self.slack.channel_members(&command.channel_id).await?;
        let (announcement, member_list) =
            message_components::here_messages(&command.user_id, &command.text, &members);

        let posted = self
            .slack
            .post_message(&command.channel_id, &announcement, None, None)
            .await?;
        self.slack
            .post_message(&command.channel_id, &member_list, None, Some(&posted.ts))
            .await?;
        Ok(())
    }

    /// Random restaurant suggestion, delivered privately. Search failures
    /// and an empty result set both propagate as errors.
    async fn slash_lunch(&self, command: &SlashCommand) -> Result<()> {
        let lunch = LunchCommand::new(&command.text);
        let results = self.restaurants.search(&lunch.search_params()).await?;
        let pick = lunch::select_random(&results)?;
        self.slack
            .post_ephemeral(
                &command.channel_id,
                &command.user_id,
                &lunch.format_selection(pick),
                None,
            )
            .await?;
        Ok(())
    }

    /// The selection routine decides which chat method carries the payload;
    /// this handler just forwards the pair.
    async fn slash_repeat(&self, command: &SlashCommand) -> Result<()> {
        let (method, payload) = message_components::repeat_message(
            &command.user_id,
            &command.channel_id,
            &command.text,
        );
        self.slack.send(method, payload).await?;
        Ok(())
    }

    /// Dice roller. Bad input is recovered locally with a usage hint.
    async fn slash_roll(&self, command: &SlashCommand) -> Result<()> {
        match DiceRoll::parse(&command.text) {
            Ok(roll) => {
                let samples = roll.roll();
                let message = roll.format_message(&command.user_id, &samples);
                self.slack
                    .post_message(&command.channel_id, &message, None, None)
                    .await?;
            }
            Err(_) => {
                debug!("invalid input to /roll: {}", command.text);
                self.slack
                    .post_ephemeral(&command.channel_id, &command.user_id, dice::USAGE, None)
                    .await?;
            }
        }
        Ok(())
    }

    /// Mentor request form. Built and kept current but not wired into the
    /// router; the community switched sign-up flows before it shipped.
    pub async fn slash_mentor(&self, command: &SlashCommand) -> Result<()> {
        let airtable = self
            .airtable
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("mentor backend not configured"))?;

        let services = airtable.list_records("Services", "Name").await?;
        let mentors = airtable.list_records("Mentors", "Full Name").await?;
        let skillsets = airtable.list_records("Skillsets", "Skillset").await?;

        let attachments =
            message_components::mentor_request_attachments(&services, &mentors, &skillsets);
        self.slack
            .post_message(&command.user_id, "", Some(attachments), None)
            .await?;
        Ok(())
    }
}

/// True when the error chain bottoms out in the chat client; those are the
/// only failures the dispatcher converts into a fallback notice.
fn is_chat_failure(err: &anyhow::Error) -> bool {
    err.is::<SlackError>()
}

/// The one ephemeral notice sent when a handler's result could not be
/// posted: it names the failed command and the target channel.
fn failure_notice_text(command: &SlashCommand) -> String {
    format!(
        "Could not post result of `{}` to channel <#{}>",
        command.command, command.channel_id
    )
}
