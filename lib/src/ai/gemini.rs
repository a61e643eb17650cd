//! Client for the Google Generative Language REST API.

use std::time::Duration;

use async_trait::async_trait;

use crate::image::DataUri;
use crate::{config, ErrorKind, Result};

use super::Generator;

#[derive(Clone, Debug)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

/// Content filters applied to text requests. Love notes sit well inside
/// them; only clearly harmful output is blocked.
fn safety_settings() -> Vec<SafetySetting> {
    [
        ("HARM_CATEGORY_HATE_SPEECH", "BLOCK_ONLY_HIGH"),
        ("HARM_CATEGORY_DANGEROUS_CONTENT", "BLOCK_NONE"),
        ("HARM_CATEGORY_HARASSMENT", "BLOCK_MEDIUM_AND_ABOVE"),
        ("HARM_CATEGORY_SEXUALLY_EXPLICIT", "BLOCK_MEDIUM_AND_ABOVE"),
    ]
    .into_iter()
    .map(|(category, threshold)| SafetySetting {
        category,
        threshold,
    })
    .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates.iter().flat_map(|c| c.content.parts.iter())
    }

    fn text(&self) -> Option<String> {
        let text = self
            .parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn image_data_uri(&self) -> Option<String> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| d.mime_type.starts_with("image/"))
            .map(|d| format!("data:{};base64,{}", d.mime_type, d.data))
    }
}

impl GeminiGenerator {
    pub fn new(config: &config::Generation) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn generate(&self, model: &str, request: &GenerateRequest<'_>) -> Result<GenerateResponse> {
        if self.api_key.is_empty() {
            return Err(ErrorKind::Generation("api key is not configured".to_string()).into());
        }
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<GenerateResponse>().await?)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    #[tracing::instrument(skip_all, fields(model = %self.text_model))]
    async fn text(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            prompt_preview = %prompt.chars().take(100).collect::<String>(),
            "text generation request"
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: None,
            safety_settings: safety_settings(),
        };
        self.generate(&self.text_model, &request)
            .await?
            .text()
            .ok_or_else(|| ErrorKind::Generation("no text in response".to_string()).into())
    }

    #[tracing::instrument(skip_all, fields(model = %self.image_model))]
    async fn image(&self, prompt: &str) -> Result<String> {
        tracing::info!(
            prompt_preview = %prompt.chars().take(100).collect::<String>(),
            "image generation request"
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT", "IMAGE"],
            }),
            safety_settings: Vec::new(),
        };
        let uri = self
            .generate(&self.image_model, &request)
            .await?
            .image_data_uri()
            .ok_or_else(|| ErrorKind::Generation("no image in response".to_string()))?;
        let uri = checked_image(uri)?;
        tracing::info!("image generation completed");
        Ok(uri)
    }
}

/// Rejects image payloads that wouldn't render. A malformed payload is a bad
/// reply from the service, not a local failure.
fn checked_image(uri: String) -> Result<String> {
    match DataUri::parse(&uri) {
        Ok(_) => Ok(uri),
        Err(e) => Err(ErrorKind::Generation(format!("malformed image in response: {}", e.kind)).into()),
    }
}
