//! Conversion of normalized messages into `generateContent` request bodies.
//!
//! | Core message | Gemini                                      |
//! |--------------|---------------------------------------------|
//! | system       | `system_instruction` (joined with `\n\n`)   |
//! | user         | `role: "user"`                              |
//! | assistant    | `role: "model"`                             |
//! | tool         | `role: "user"`, text parts                  |

use serde_json::{Map, Value, json};

use super::schema::{is_empty_parameters, sanitize_schema};
use crate::providers::types::{CallSettings, CoreContent, CoreMessage, CorePart, ToolSet};

/// Body for free-form generation, with optional function declarations.
pub fn build_text_body(
    messages: &[CoreMessage],
    tools: Option<&ToolSet>,
    settings: &CallSettings,
) -> Value {
    let mut body = base_body(messages);

    if let Some(tools) = tools.filter(|t| !t.is_empty()) {
        body["tools"] = json!([{ "functionDeclarations": convert_tools(tools) }]);
    }
    if !settings.is_empty() {
        body["generationConfig"] = Value::Object(generation_config(settings));
    }

    body
}

/// Body for JSON-mode generation constrained by `schema`.
pub fn build_object_body(messages: &[CoreMessage], schema: &Value, settings: &CallSettings) -> Value {
    let mut body = base_body(messages);
    let mut config = generation_config(settings);
    config.insert("responseMimeType".into(), json!("application/json"));
    config.insert("responseSchema".into(), sanitize_schema(schema));
    body["generationConfig"] = Value::Object(config);
    body
}

fn generation_config(settings: &CallSettings) -> Map<String, Value> {
    let mut config = Map::new();
    if let Some(temperature) = settings.temperature {
        config.insert("temperature".into(), json!(temperature));
    }
    if let Some(max_tokens) = settings.max_tokens {
        config.insert("maxOutputTokens".into(), json!(max_tokens));
    }
    config
}

fn base_body(messages: &[CoreMessage]) -> Value {
    let mut body = json!({});

    if let Some(text) = system_instruction(messages) {
        body["system_instruction"] = json!({ "parts": [{ "text": text }] });
    }

    let contents: Vec<Value> = messages.iter().filter_map(convert_message).collect();
    body["contents"] = json!(contents);
    body
}

/// Concatenate all non-empty system messages.
fn system_instruction(messages: &[CoreMessage]) -> Option<String> {
    let texts: Vec<&str> = messages
        .iter()
        .filter_map(|m| match m {
            CoreMessage::System { content } if !content.is_empty() => Some(content.as_str()),
            _ => None,
        })
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n\n"))
    }
}

fn convert_message(msg: &CoreMessage) -> Option<Value> {
    let (role, content) = match msg {
        CoreMessage::System { .. } => return None,
        CoreMessage::User { content } | CoreMessage::Tool { content } => ("user", content),
        CoreMessage::Assistant { content } => ("model", content),
    };
    Some(json!({ "role": role, "parts": ensure_non_empty_parts(convert_content(content)) }))
}

fn convert_content(content: &CoreContent) -> Vec<Value> {
    match content {
        CoreContent::Text(text) if text.is_empty() => Vec::new(),
        CoreContent::Text(text) => vec![json!({ "text": text })],
        CoreContent::Parts(parts) => parts.iter().map(convert_part).collect(),
    }
}

fn convert_part(part: &CorePart) -> Value {
    match part {
        CorePart::Text { text } => json!({ "text": text }),
        CorePart::Image { image } => match parse_image_url(image) {
            ImageSource::Inline { mime_type, data } => json!({
                "inlineData": { "mimeType": mime_type, "data": data }
            }),
            ImageSource::Remote { mime_type, uri } => json!({
                "fileData": { "mimeType": mime_type, "fileUri": uri }
            }),
        },
    }
}

/// Ensure the parts array is never empty; inject a placeholder if needed.
fn ensure_non_empty_parts(parts: Vec<Value>) -> Vec<Value> {
    if parts.is_empty() {
        vec![json!({ "text": " " })]
    } else {
        parts
    }
}

fn convert_tools(tools: &ToolSet) -> Vec<Value> {
    tools
        .iter()
        .map(|(name, tool)| {
            let mut decl = json!({ "name": name });
            if let Some(desc) = &tool.description {
                decl["description"] = Value::String(desc.clone());
            }
            if !is_empty_parameters(&tool.parameters) {
                decl["parameters"] = sanitize_schema(&tool.parameters);
            }
            decl
        })
        .collect()
}

#[derive(Debug, PartialEq)]
enum ImageSource<'a> {
    Inline { mime_type: &'a str, data: &'a str },
    Remote { mime_type: &'static str, uri: &'a str },
}

/// Split a `data:` URI into MIME type and payload, or guess the MIME type of
/// a remote URL from its extension.
fn parse_image_url(url: &str) -> ImageSource<'_> {
    if let Some(rest) = url.strip_prefix("data:") {
        let (header, data) = rest.split_once(',').unwrap_or((rest, ""));
        let mime_type = header.split(';').next().filter(|m| !m.is_empty());
        return ImageSource::Inline {
            mime_type: mime_type.unwrap_or("image/png"),
            data,
        };
    }

    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    let mime_type = if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else {
        "image/png"
    };
    ImageSource::Remote { mime_type, uri: url }
}
