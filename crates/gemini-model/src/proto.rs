use devsquad_model::{ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: Option<String>,
}

impl GenerateContentChunk {
    /// Concatenated text of the first candidate.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

// -----------------
// Types both ways
// -----------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: req.messages.iter().map(create_content).collect(),
        system_instruction: req
            .system_instruction
            .as_ref()
            .map(|text| Content {
                role: None,
                parts: vec![Part {
                    text: Some(text.clone()),
                }],
            }),
        generation_config: GenerationConfig {
            temperature: req.generation.temperature,
            max_output_tokens: req.generation.max_output_tokens,
        },
    }
}

#[inline]
fn create_content(msg: &ModelMessage) -> Content {
    let role = match msg {
        ModelMessage::User(_) => "user",
        ModelMessage::Model(_) => "model",
    };
    Content {
        role: Some(role.to_owned()),
        parts: vec![Part {
            text: Some(msg.text().to_owned()),
        }],
    }
}

#[cfg(test)]
mod tests {
    use devsquad_model::GenerationConfig as ModelGenerationConfig;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            system_instruction: Some("You are DevSquad.".to_owned()),
            messages: vec![
                ModelMessage::User("Build a blog".to_owned()),
                ModelMessage::Model("[Atlas]: Sure.".to_owned()),
                ModelMessage::User("@Neo Start coding".to_owned()),
            ],
            generation: ModelGenerationConfig {
                temperature: Some(0.5),
                max_output_tokens: None,
            },
        };
        let expected = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "Build a blog" }] },
                { "role": "model", "parts": [{ "text": "[Atlas]: Sure." }] },
                { "role": "user", "parts": [{ "text": "@Neo Start coding" }] },
            ],
            "systemInstruction": { "parts": [{ "text": "You are DevSquad." }] },
            "generationConfig": { "temperature": 0.5 },
        });
        let actual = serde_json::to_value(create_request(&request)).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_chunk_text() {
        let chunk: GenerateContentChunk = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "[Atlas]: " }, { "text": "Hi" }]
                },
                "index": 0
            }],
            "usageMetadata": { "promptTokenCount": 3 }
        }))
        .unwrap();
        assert_eq!(chunk.text(), "[Atlas]: Hi");
        assert_eq!(chunk.candidates[0].finish_reason, None);
    }
}
