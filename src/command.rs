//! Inbound slash-command payload.
//!
//! Slack delivers slash commands as an `application/x-www-form-urlencoded`
//! POST body. The raw body is needed for signature verification, so parsing
//! happens explicitly here rather than through an extractor.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("missing field in command payload: {0}")]
    Missing(&'static str),
}

/// One parsed slash-command invocation. Read-only to handlers; lives for a
/// single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashCommand {
    pub channel_id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub trigger_id: String,
    pub command: String,
}

impl SlashCommand {
    pub fn from_form(body: &[u8]) -> Result<Self, PayloadError> {
        let mut channel_id = None;
        let mut user_id = None;
        let mut user_name = String::new();
        let mut text = String::new();
        let mut trigger_id = String::new();
        let mut command = None;

        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "channel_id" => channel_id = Some(value.into_owned()),
                "user_id" => user_id = Some(value.into_owned()),
                "user_name" => user_name = value.into_owned(),
                "text" => text = value.into_owned(),
                "trigger_id" => trigger_id = value.into_owned(),
                "command" => command = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(SlashCommand {
            channel_id: channel_id.ok_or(PayloadError::Missing("channel_id"))?,
            user_id: user_id.ok_or(PayloadError::Missing("user_id"))?,
            user_name,
            text,
            trigger_id,
            command: command.ok_or(PayloadError::Missing("command"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let body = b"token=gIkuvaNzQIHg97ATvDxqgjtO&team_id=T0001&channel_id=C2147483705\
&channel_name=test&user_id=U2147483697&user_name=steve\
&command=%2Froll&text=2d6&trigger_id=13345224609.738474920.8088930838d88f008e0";

        let command = SlashCommand::from_form(body).unwrap();
        assert_eq!(command.channel_id, "C2147483705");
        assert_eq!(command.user_id, "U2147483697");
        assert_eq!(command.user_name, "steve");
        assert_eq!(command.command, "/roll");
        assert_eq!(command.text, "2d6");
        assert_eq!(
            command.trigger_id,
            "13345224609.738474920.8088930838d88f008e0"
        );
    }

    #[test]
    fn test_text_is_optional_and_decoded() {
        let body = b"channel_id=C1&user_id=U1&command=%2Fhere";
        let command = SlashCommand::from_form(body).unwrap();
        assert_eq!(command.text, "");
        assert_eq!(command.trigger_id, "");

        let body = b"channel_id=C1&user_id=U1&command=%2Frepeat&text=hello+there%21";
        let command = SlashCommand::from_form(body).unwrap();
        assert_eq!(command.text, "hello there!");
    }

    #[test]
    fn test_missing_required_fields() {
        let err = SlashCommand::from_form(b"user_id=U1&command=%2Froll").unwrap_err();
        assert_eq!(err, PayloadError::Missing("channel_id"));

        let err = SlashCommand::from_form(b"channel_id=C1&user_id=U1").unwrap_err();
        assert_eq!(err, PayloadError::Missing("command"));
    }
}
