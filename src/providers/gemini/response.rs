//! Conversion of `generateContent` responses into provider results.

use serde_json::Value;
use uuid::Uuid;

use crate::providers::ProviderError;
use crate::providers::types::{FinishReason, GenerateTextResponse, GeneratedToolCall, Usage};

/// Parse the first candidate of a `generateContent` response.
pub fn parse_text_response(response: &Value) -> Result<GenerateTextResponse, ProviderError> {
    let candidate = first_candidate(response)?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();

    if let Some(parts) = candidate["content"]["parts"].as_array() {
        for part in parts {
            // Thought summaries are not part of the answer.
            if part["thought"].as_bool() == Some(true) {
                continue;
            }
            if let Some(t) = part["text"].as_str() {
                text.push_str(t);
            }
            if let Some(fc) = part.get("functionCall") {
                tool_calls.push(GeneratedToolCall {
                    tool_call_id: format!("call_{}", Uuid::new_v4()),
                    tool_name: fc["name"].as_str().unwrap_or_default().to_string(),
                    args: match &fc["args"] {
                        Value::Null => Value::Object(Default::default()),
                        args => args.clone(),
                    },
                });
            }
        }
    }

    let finish_reason = map_finish_reason(candidate["finishReason"].as_str(), !tool_calls.is_empty());

    Ok(GenerateTextResponse {
        text,
        tool_calls,
        finish_reason,
        usage: parse_usage(response),
    })
}

/// Parse generated JSON text, tolerating a Markdown code fence around it.
pub fn parse_json_text(text: &str) -> Result<Value, ProviderError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced.trim()).map_err(|e| ProviderError::SchemaValidation {
        message: format!("output is not valid JSON: {e}"),
    })
}

fn first_candidate(response: &Value) -> Result<&Value, ProviderError> {
    if let Some(candidate) = response["candidates"].as_array().and_then(|c| c.first()) {
        return Ok(candidate);
    }

    match response["promptFeedback"]["blockReason"].as_str() {
        Some(reason) => Err(ProviderError::Api {
            status: 400,
            message: format!("Prompt blocked: {reason}"),
        }),
        None => Err(ProviderError::ResponseParsing(
            "Missing candidates array".into(),
        )),
    }
}

/// Map a Gemini finish reason.
pub fn map_finish_reason(reason: Option<&str>, has_tool_calls: bool) -> FinishReason {
    if has_tool_calls {
        return FinishReason::ToolCalls;
    }
    match reason {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII") => {
            FinishReason::ContentFilter
        }
        Some("MALFORMED_FUNCTION_CALL") => FinishReason::Error,
        Some(_) => FinishReason::Other,
        None => FinishReason::Unknown,
    }
}

fn parse_usage(response: &Value) -> Usage {
    let usage_meta = &response["usageMetadata"];
    let count = |key: &str| {
        usage_meta[key]
            .as_u64()
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
    };
    let prompt_tokens = count("promptTokenCount").unwrap_or(0);
    let completion_tokens = count("candidatesTokenCount").unwrap_or(0);
    let total_tokens = count("totalTokenCount")
        .unwrap_or_else(|| prompt_tokens.saturating_add(completion_tokens));

    Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_and_usage() {
        let response = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "world" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 5, "candidatesTokenCount": 2 }
        });
        let parsed = parse_text_response(&response).unwrap();
        assert_eq!(parsed.text, "Hello world");
        assert!(parsed.tool_calls.is_empty());
        assert_eq!(parsed.finish_reason, FinishReason::Stop);
        assert_eq!(
            parsed.usage,
            Usage {
                prompt_tokens: 5,
                completion_tokens: 2,
                total_tokens: 7
            }
        );
    }

    #[test]
    fn test_usage_saturates_instead_of_overflowing() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "x" }] } }],
            "usageMetadata": { "promptTokenCount": 4294967295u64, "candidatesTokenCount": 2 }
        });
        let usage = parse_text_response(&response).unwrap().usage;
        assert_eq!(usage.prompt_tokens, u32::MAX);
        assert_eq!(usage.completion_tokens, 2);
        assert_eq!(usage.total_tokens, u32::MAX);

        let response = json!({
            "candidates": [{ "content": { "parts": [] } }],
            "usageMetadata": { "promptTokenCount": 5_000_000_000u64, "totalTokenCount": 5_000_000_001u64 }
        });
        let usage = parse_text_response(&response).unwrap().usage;
        assert_eq!(usage.prompt_tokens, u32::MAX);
        assert_eq!(usage.total_tokens, u32::MAX);
    }

    #[test]
    fn test_parse_function_calls() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [
                    { "functionCall": { "name": "click", "args": { "selector": "#beds-1" } } },
                    { "functionCall": { "name": "scroll" } }
                ] },
                "finishReason": "STOP"
            }]
        });
        let parsed = parse_text_response(&response).unwrap();
        assert_eq!(parsed.text, "");
        assert_eq!(parsed.finish_reason, FinishReason::ToolCalls);
        assert_eq!(parsed.tool_calls.len(), 2);
        assert_eq!(parsed.tool_calls[0].tool_name, "click");
        assert_eq!(parsed.tool_calls[0].args, json!({ "selector": "#beds-1" }));
        assert!(parsed.tool_calls[0].tool_call_id.starts_with("call_"));
        assert_eq!(parsed.tool_calls[1].args, json!({}));
        assert_ne!(parsed.tool_calls[0].tool_call_id, parsed.tool_calls[1].tool_call_id);
    }

    #[test]
    fn test_thought_parts_skipped() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "answer" }
                ] }
            }]
        });
        let parsed = parse_text_response(&response).unwrap();
        assert_eq!(parsed.text, "answer");
        assert_eq!(parsed.finish_reason, FinishReason::Unknown);
    }

    #[test]
    fn test_missing_candidates() {
        let err = parse_text_response(&json!({})).unwrap_err();
        assert!(matches!(err, ProviderError::ResponseParsing(_)));

        let err = parse_text_response(&json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "API error (400): Prompt blocked: SAFETY");
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason(Some("MAX_TOKENS"), false), FinishReason::Length);
        assert_eq!(map_finish_reason(Some("SAFETY"), false), FinishReason::ContentFilter);
        assert_eq!(map_finish_reason(Some("OTHER"), false), FinishReason::Other);
        assert_eq!(map_finish_reason(Some("STOP"), true), FinishReason::ToolCalls);
    }

    #[test]
    fn test_parse_json_text() {
        assert_eq!(parse_json_text(r#"{"a": 1}"#).unwrap(), json!({ "a": 1 }));
        assert_eq!(
            parse_json_text("```json\n{\"a\": 1}\n```\n").unwrap(),
            json!({ "a": 1 })
        );
        assert_eq!(parse_json_text("```\n[1, 2]\n```").unwrap(), json!([1, 2]));
        assert!(matches!(
            parse_json_text("Sure! Here is the data"),
            Err(ProviderError::SchemaValidation { .. })
        ));
    }
}
