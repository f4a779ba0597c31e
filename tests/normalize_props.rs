use chatbridge::adapter::{IMAGE_PLACEHOLDER, normalize_message};
use chatbridge::providers::types::{
    ChatMessage, ContentPart, CoreContent, CoreMessage, CorePart, MessageContent, MessageRole,
};
use proptest::prelude::*;

fn role() -> impl Strategy<Value = MessageRole> {
    prop_oneof![
        Just(MessageRole::System),
        Just(MessageRole::User),
        Just(MessageRole::Assistant),
        Just(MessageRole::Tool),
    ]
}

/// Text or image part; `true` marks an image.
fn part() -> impl Strategy<Value = (bool, String)> {
    prop_oneof![
        ".{0,24}".prop_map(|t| (false, t)),
        "[a-z]{1,12}".prop_map(|p| (true, format!("https://example.com/{p}.png"))),
    ]
}

fn to_content_part((is_image, value): &(bool, String)) -> ContentPart {
    if *is_image {
        ContentPart::image_url(value.clone())
    } else {
        ContentPart::text(value.clone())
    }
}

fn parts_of(content: &CoreContent) -> &[CorePart] {
    match content {
        CoreContent::Parts(parts) => parts,
        CoreContent::Text(_) => panic!("expected part array, got {content:?}"),
    }
}

proptest! {
    #[test]
    fn string_content_is_unchanged(role in role(), text in ".{0,64}") {
        let normalized = normalize_message(&ChatMessage::new(role, text.clone())).unwrap();
        prop_assert_eq!(normalized.role(), role);
        match normalized {
            CoreMessage::System { content } => prop_assert_eq!(content, text),
            CoreMessage::User { content }
            | CoreMessage::Assistant { content }
            | CoreMessage::Tool { content } => prop_assert_eq!(content, CoreContent::Text(text)),
        }
    }

    #[test]
    fn system_parts_join_with_newline(texts in prop::collection::vec(".{0,16}", 0..6)) {
        let parts: Vec<ContentPart> = texts.iter().cloned().map(ContentPart::text).collect();
        let msg = ChatMessage::new(MessageRole::System, MessageContent::Parts(parts));
        let normalized = normalize_message(&msg).unwrap();
        prop_assert_eq!(normalized, CoreMessage::System { content: texts.join("\n") });
    }

    #[test]
    fn user_parts_keep_order_and_count(parts in prop::collection::vec(part(), 0..8)) {
        let msg = ChatMessage::user(parts.iter().map(to_content_part).collect::<Vec<_>>());
        let CoreMessage::User { content } = normalize_message(&msg).unwrap() else {
            panic!("role changed");
        };
        let normalized = parts_of(&content);
        prop_assert_eq!(normalized.len(), parts.len());
        for (out, (is_image, value)) in normalized.iter().zip(&parts) {
            let expected = if *is_image {
                CorePart::Image { image: value.clone() }
            } else {
                CorePart::Text { text: value.clone() }
            };
            prop_assert_eq!(out, &expected);
        }
    }

    #[test]
    fn assistant_images_become_placeholders(parts in prop::collection::vec(part(), 0..8)) {
        let msg = ChatMessage::assistant(parts.iter().map(to_content_part).collect::<Vec<_>>());
        let CoreMessage::Assistant { content } = normalize_message(&msg).unwrap() else {
            panic!("role changed");
        };
        let normalized = parts_of(&content);
        prop_assert_eq!(normalized.len(), parts.len());
        for (out, (is_image, value)) in normalized.iter().zip(&parts) {
            let expected = if *is_image { IMAGE_PLACEHOLDER } else { value.as_str() };
            prop_assert_eq!(out, &CorePart::Text { text: expected.to_string() });
        }
    }
}
