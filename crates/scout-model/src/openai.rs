use super::types::*;
use async_trait::async_trait;
use reqwest::Client;
use scout_core::{
    Embedder, EmbeddingVector, Error, GenerationReply, Result, ScoutConfig, StructuredGenerator,
};

/// OpenAI-compatible backend implementing the embedding and
/// structured-generation capabilities.
pub struct OpenAIBackend {
    client: Client,
    api_key: String,
    model_name: String,
    embedding_model: String,
    base_url: String,
}

impl OpenAIBackend {
    pub fn new(api_key: String, model_name: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model_name,
            embedding_model: "text-embedding-3-large".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_embedding_model(mut self, embedding_model: String) -> Self {
        self.embedding_model = embedding_model;
        self
    }

    /// Build a backend from a loaded configuration.
    pub fn from_config(config: &ScoutConfig) -> Result<Self> {
        let api_key = config
            .model
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("model.api_key is not configured".into()))?;

        let mut backend = Self::new(api_key, config.model.model_name.clone())
            .with_embedding_model(config.model.embedding_model.clone());
        if let Some(base_url) = &config.model.base_url {
            backend = backend.with_base_url(base_url.clone());
        }

        Ok(backend)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl Embedder for OpenAIBackend {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let request = OpenAIEmbeddingRequest {
            model: self.embedding_model.clone(),
            input: vec![text.to_string()],
        };

        let response = self
            .client
            .post(self.build_url("embeddings"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let embedding_response: OpenAIEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        let first = embedding_response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("response contained no embeddings".to_string()))?;

        Ok(EmbeddingVector::new(first.embedding))
    }
}

#[async_trait]
impl StructuredGenerator for OpenAIBackend {
    async fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        response_schema: serde_json::Value,
    ) -> Result<GenerationReply> {
        let request = OpenAIChatRequest {
            model: self.model_name.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            response_format: Some(ResponseFormat::json_schema(
                "retrieval_schema",
                response_schema,
            )),
            temperature: None,
        };

        let response = self
            .client
            .post(self.build_url("chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let chat_response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Failed to parse response: {}", e)))?;

        let replies = chat_response
            .choices
            .into_iter()
            .map(|choice| choice.message.content)
            .collect();

        Ok(GenerationReply { replies })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_style_configuration() {
        let backend = OpenAIBackend::new("key".into(), "gpt-4o-mini".into())
            .with_base_url("http://localhost:8080/v1".into())
            .with_embedding_model("text-embedding-3-small".into());

        assert_eq!(backend.model_name(), "gpt-4o-mini");
        assert_eq!(
            backend.build_url("embeddings"),
            "http://localhost:8080/v1/embeddings"
        );
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = ScoutConfig::default();
        // default config carries no api key unless the env provides one
        if config.model.api_key.is_none() {
            assert!(matches!(
                OpenAIBackend::from_config(&config),
                Err(Error::Config(_))
            ));
        }
    }
}
