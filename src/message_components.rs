//! Builders for outbound rich content: dialogs, attachments and the message
//! pairs some commands post. All pure functions returning Slack-shaped JSON.

use serde_json::{json, Value};

use crate::slack::ApiMethod;

const MASS_MENTIONS: [&str; 3] = ["<!here>", "<!channel>", "<!everyone>"];

/// Modal dialog for `/ticket`, pre-filled with the requester's email and
/// whatever they typed after the command.
pub fn ticket_dialog(email: &str, text: &str) -> Value {
    json!({
        "callback_id": "open_ticket",
        "title": "Open a ticket",
        "submit_label": "Submit",
        "elements": [
            {
                "type": "text",
                "subtype": "email",
                "label": "Email",
                "name": "email",
                "value": email
            },
            {
                "type": "textarea",
                "label": "Description",
                "name": "description",
                "value": text
            }
        ]
    })
}

/// "Claim" button shown under a `/report` message in the moderator channel.
/// Claim-state handling lives with the interactive-message endpoint.
pub fn not_claimed_attachment() -> Value {
    json!({
        "text": "",
        "fallback": "Claim this report",
        "callback_id": "claim_report",
        "color": "danger",
        "actions": [
            {
                "name": "claim",
                "text": "Claim",
                "type": "button",
                "value": "claim"
            }
        ]
    })
}

/// The `/here` message pair: a channel announcement and the member-mention
/// list that gets threaded under it.
pub fn here_messages(user_id: &str, text: &str, members: &[String]) -> (String, String) {
    let announcement = if text.trim().is_empty() {
        format!("<@{}> needs this channel's attention!", user_id)
    } else {
        format!("<@{}>: {}", user_id, text.trim())
    };
    let mentions: Vec<String> = members.iter().map(|m| format!("<@{}>", m)).collect();
    let member_list = format!("Notifying: {}", mentions.join(" "));
    (announcement, member_list)
}

/// Decide what `/repeat` sends: echo ordinary text back to the channel, but
/// refuse privately when the text is empty or smuggles a mass mention.
pub fn repeat_message(user_id: &str, channel_id: &str, text: &str) -> (ApiMethod, Value) {
    let trimmed = text.trim();
    let refused = trimmed.is_empty() || MASS_MENTIONS.iter().any(|m| trimmed.contains(m));
    if refused {
        (
            ApiMethod::PostEphemeral,
            json!({
                "channel": channel_id,
                "user": user_id,
                "text": "Give me something I can repeat (channel-wide pings don't count)."
            }),
        )
    } else {
        (
            ApiMethod::PostMessage,
            json!({ "channel": channel_id, "text": trimmed }),
        )
    }
}

/// Mentor request form, built from the three reference lists.
pub fn mentor_request_attachments(
    services: &[String],
    mentors: &[String],
    skillsets: &[String],
) -> Value {
    json!([
        {
            "title": "Mentor Service Request",
            "text": "Pick a service, an optional mentor and the skillsets involved, then submit.",
            "callback_id": "mentor_request",
            "color": "#3AA3E3",
            "actions": [
                {
                    "name": "service",
                    "text": "Service",
                    "type": "select",
                    "options": select_options(services)
                },
                {
                    "name": "mentor",
                    "text": "Mentor (optional)",
                    "type": "select",
                    "options": select_options(mentors)
                },
                {
                    "name": "skillset",
                    "text": "Skillset",
                    "type": "select",
                    "options": select_options(skillsets)
                },
                {
                    "name": "submit",
                    "text": "Submit request",
                    "type": "button",
                    "style": "primary",
                    "value": "submit"
                }
            ]
        }
    ])
}

fn select_options(values: &[String]) -> Vec<Value> {
    values
        .iter()
        .map(|value| json!({ "text": value, "value": value }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_dialog_prefills_fields() {
        let dialog = ticket_dialog("dev@example.com", "laptop on fire");
        assert_eq!(dialog["callback_id"], "open_ticket");
        assert_eq!(dialog["elements"][0]["value"], "dev@example.com");
        assert_eq!(dialog["elements"][1]["value"], "laptop on fire");
    }

    #[test]
    fn test_not_claimed_attachment_has_claim_button() {
        let attachment = not_claimed_attachment();
        assert_eq!(attachment["callback_id"], "claim_report");
        assert_eq!(attachment["actions"][0]["name"], "claim");
        assert_eq!(attachment["actions"][0]["type"], "button");
    }

    #[test]
    fn test_here_messages_with_text() {
        let members = vec!["U1".to_string(), "U2".to_string()];
        let (announcement, member_list) = here_messages("U0", "standup in 5", &members);
        assert_eq!(announcement, "<@U0>: standup in 5");
        assert_eq!(member_list, "Notifying: <@U1> <@U2>");
    }

    #[test]
    fn test_here_messages_without_text() {
        let (announcement, _) = here_messages("U0", "  ", &[]);
        assert!(announcement.starts_with("<@U0>"));
        assert!(announcement.contains("attention"));
    }

    #[test]
    fn test_repeat_message_echoes_to_channel() {
        let (method, payload) = repeat_message("U1", "C1", "hello world");
        assert_eq!(method, ApiMethod::PostMessage);
        assert_eq!(payload["channel"], "C1");
        assert_eq!(payload["text"], "hello world");
        assert!(payload.get("user").is_none());
    }

    #[test]
    fn test_repeat_message_refuses_empty_and_mass_mentions() {
        for text in ["", "   ", "hey <!here>", "<!channel> wake up", "go <!everyone>"] {
            let (method, payload) = repeat_message("U1", "C1", text);
            assert_eq!(method, ApiMethod::PostEphemeral, "text: {text:?}");
            assert_eq!(payload["user"], "U1");
        }
    }

    #[test]
    fn test_mentor_request_attachments_options() {
        let services = vec!["Resume Review".to_string()];
        let mentors = vec!["Ada Lovelace".to_string(), "Grace Hopper".to_string()];
        let skillsets = vec!["Rust".to_string()];
        let attachments = mentor_request_attachments(&services, &mentors, &skillsets);
        let actions = &attachments[0]["actions"];
        assert_eq!(actions[0]["options"].as_array().unwrap().len(), 1);
        assert_eq!(actions[1]["options"].as_array().unwrap().len(), 2);
        assert_eq!(actions[1]["options"][1]["value"], "Grace Hopper");
        assert_eq!(actions[3]["type"], "button");
    }
}
