//! Content normalization from the chat-completion shape to [`CoreMessage`].
//!
//! | Role      | String content | Part array                                  |
//! |-----------|----------------|---------------------------------------------|
//! | system    | unchanged      | text parts joined with `\n`, others dropped |
//! | user      | unchanged      | text and image parts, order preserved       |
//! | assistant | unchanged      | text only, images become `[Image]`          |
//! | tool      | unchanged      | text only, images become `[Image]`          |

use crate::error::AdapterError;
use crate::providers::types::{
    ChatMessage, ContentPart, CoreContent, CoreMessage, CorePart, MessageContent, MessageRole,
};

/// Text substituted for image parts in messages that cannot carry images.
pub const IMAGE_PLACEHOLDER: &str = "[Image]";

/// Normalize every message, failing on the first part that is neither text
/// nor an image.
pub fn normalize_messages(messages: &[ChatMessage]) -> Result<Vec<CoreMessage>, AdapterError> {
    messages
        .iter()
        .enumerate()
        .map(|(index, msg)| normalize_message(msg).map_err(|e| at_index(index, e)))
        .collect()
}

/// Normalize a single message.
pub fn normalize_message(msg: &ChatMessage) -> Result<CoreMessage, AdapterError> {
    let parts = match &msg.content {
        MessageContent::Text(text) => return Ok(from_text(msg.role, text.clone())),
        MessageContent::Parts(parts) => parts,
    };

    if let Some(position) = parts
        .iter()
        .position(|p| matches!(p, ContentPart::Unsupported))
    {
        return Err(AdapterError::MalformedRequest(format!(
            "content part {position} is neither text nor image"
        )));
    }

    let message = match msg.role {
        MessageRole::System => CoreMessage::System {
            content: join_system_text(parts),
        },
        MessageRole::User => CoreMessage::User {
            content: CoreContent::Parts(parts.iter().filter_map(to_user_part).collect()),
        },
        MessageRole::Assistant => CoreMessage::Assistant {
            content: CoreContent::Parts(parts.iter().filter_map(to_text_part).collect()),
        },
        MessageRole::Tool => CoreMessage::Tool {
            content: CoreContent::Parts(parts.iter().filter_map(to_text_part).collect()),
        },
    };
    Ok(message)
}

fn from_text(role: MessageRole, text: String) -> CoreMessage {
    match role {
        MessageRole::System => CoreMessage::System { content: text },
        MessageRole::User => CoreMessage::User {
            content: CoreContent::Text(text),
        },
        MessageRole::Assistant => CoreMessage::Assistant {
            content: CoreContent::Text(text),
        },
        MessageRole::Tool => CoreMessage::Tool {
            content: CoreContent::Text(text),
        },
    }
}

fn join_system_text(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::Text { text } => Some(text.as_str()),
            ContentPart::ImageUrl { .. } | ContentPart::Unsupported => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_user_part(part: &ContentPart) -> Option<CorePart> {
    match part {
        ContentPart::Text { text } => Some(CorePart::Text { text: text.clone() }),
        ContentPart::ImageUrl { image_url } => Some(CorePart::Image {
            image: image_url.url.clone(),
        }),
        ContentPart::Unsupported => None,
    }
}

fn to_text_part(part: &ContentPart) -> Option<CorePart> {
    match part {
        ContentPart::Text { text } => Some(CorePart::Text { text: text.clone() }),
        ContentPart::ImageUrl { .. } => Some(CorePart::Text {
            text: IMAGE_PLACEHOLDER.to_string(),
        }),
        ContentPart::Unsupported => None,
    }
}

fn at_index(index: usize, err: AdapterError) -> AdapterError {
    match err {
        AdapterError::MalformedRequest(msg) => {
            AdapterError::MalformedRequest(format!("message {index}: {msg}"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(role: MessageRole, parts: Vec<ContentPart>) -> ChatMessage {
        ChatMessage::new(role, MessageContent::Parts(parts))
    }

    #[test]
    fn test_string_content_keeps_role() {
        for role in [
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Tool,
        ] {
            let msg = ChatMessage::new(role, "hello");
            let core = normalize_message(&msg).unwrap();
            assert_eq!(core.role(), role);
            match core {
                CoreMessage::System { content } => assert_eq!(content, "hello"),
                CoreMessage::User { content }
                | CoreMessage::Assistant { content }
                | CoreMessage::Tool { content } => {
                    assert_eq!(content, CoreContent::Text("hello".into()))
                }
            }
        }
    }

    #[test]
    fn test_system_parts_joined_with_newline() {
        let msg = parts(
            MessageRole::System,
            vec![
                ContentPart::text("You extract listings."),
                ContentPart::image_url("https://example.com/logo.png"),
                ContentPart::text("Answer in JSON."),
            ],
        );
        assert_eq!(
            normalize_message(&msg).unwrap(),
            CoreMessage::System {
                content: "You extract listings.\nAnswer in JSON.".into()
            }
        );
    }

    #[test]
    fn test_system_empty_parts() {
        let msg = parts(MessageRole::System, vec![]);
        assert_eq!(
            normalize_message(&msg).unwrap(),
            CoreMessage::System {
                content: String::new()
            }
        );
    }

    #[test]
    fn test_user_images_pass_through() {
        let msg = parts(
            MessageRole::User,
            vec![
                ContentPart::image_url("data:image/png;base64,AAAA"),
                ContentPart::text("What does the filter panel show?"),
            ],
        );
        assert_eq!(
            normalize_message(&msg).unwrap(),
            CoreMessage::User {
                content: CoreContent::Parts(vec![
                    CorePart::Image {
                        image: "data:image/png;base64,AAAA".into()
                    },
                    CorePart::Text {
                        text: "What does the filter panel show?".into()
                    },
                ])
            }
        );
    }

    #[test]
    fn test_assistant_images_become_placeholder() {
        let msg = parts(
            MessageRole::Assistant,
            vec![
                ContentPart::text("Here is the screenshot:"),
                ContentPart::image_url("https://example.com/shot.png"),
            ],
        );
        assert_eq!(
            normalize_message(&msg).unwrap(),
            CoreMessage::Assistant {
                content: CoreContent::Parts(vec![
                    CorePart::Text {
                        text: "Here is the screenshot:".into()
                    },
                    CorePart::Text {
                        text: IMAGE_PLACEHOLDER.into()
                    },
                ])
            }
        );
    }

    #[test]
    fn test_tool_parts_are_text_only() {
        let msg = parts(
            MessageRole::Tool,
            vec![ContentPart::image_url("https://example.com/x.png")],
        );
        assert_eq!(
            normalize_message(&msg).unwrap(),
            CoreMessage::Tool {
                content: CoreContent::Parts(vec![CorePart::Text {
                    text: IMAGE_PLACEHOLDER.into()
                }])
            }
        );
    }

    #[test]
    fn test_unsupported_part_fails_fast() {
        let messages = vec![
            ChatMessage::user("first"),
            parts(
                MessageRole::User,
                vec![ContentPart::text("ok"), ContentPart::Unsupported],
            ),
        ];
        let err = normalize_messages(&messages).unwrap_err();
        match err {
            AdapterError::MalformedRequest(msg) => {
                assert_eq!(msg, "message 1: content part 1 is neither text nor image")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_part_rejected_for_system_too() {
        let msg = parts(MessageRole::System, vec![ContentPart::Unsupported]);
        assert!(matches!(
            normalize_message(&msg),
            Err(AdapterError::MalformedRequest(_))
        ));
    }
}
