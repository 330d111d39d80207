use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

pub const RECEIPT_PROMPT: &str = r#"Analyze this shopping receipt and extract all food items. For each item, provide:
- name (lowercase, singular form)
- quantity (as a number)
- unit (e.g., pieces, bottles, kg, etc.)
- estimated days until expiry (reasonable estimate based on item type)

Return ONLY a valid JSON array in this exact format:
[{"name": "tomato", "quantity": 3, "unit": "pieces", "expiry_days": 5}]

Do not include any other text or explanation."#;

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

/// One user turn carrying the receipt prompt and the image.
#[must_use]
pub fn receipt_request(model: &str, image_data_url: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    text: RECEIPT_PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_data_url.to_string(),
                    },
                },
            ],
        }],
    }
}

/// Text of the first choice, if the model produced any.
#[must_use]
pub fn response_text(response: ChatResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()?
        .message
        .content
        .filter(|c| !c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_request_shape() {
        let req = receipt_request(DEFAULT_MODEL, "data:image/png;base64,aGVsbG8=");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "anthropic/claude-3.5-sonnet");
        assert_eq!(json["messages"][0]["role"], "user");

        let content = &json["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert!(content[0]["text"].as_str().unwrap().contains("expiry_days"));
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(
            content[1]["image_url"]["url"],
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[test]
    fn test_response_text_first_choice() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"id": "gen-1", "choices": [
                {"message": {"role": "assistant", "content": "[]"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(response_text(resp).as_deref(), Some("[]"));
    }

    #[test]
    fn test_response_text_missing() {
        let resp: ChatResponse = serde_json::from_str(r#"{"error": {"message": "no"}}"#).unwrap();
        assert!(response_text(resp).is_none());

        let resp: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(response_text(resp).is_none());
    }
}
