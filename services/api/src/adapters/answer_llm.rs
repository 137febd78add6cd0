//! services/api/src/adapters/answer_llm.rs
//!
//! This module contains the adapter for the answer-generating LLM.
//! It implements the `AnswerGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use medreport_core::ports::{AnswerGenerationService, PortError, PortResult};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a helpful medical AI assistant. Your role is to help \
patients understand their medical reports in simple, clear language. Always remind users that \
this is for educational purposes only and they should consult their healthcare provider for \
medical advice.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AnswerGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAnswerAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiAnswerAdapter {
    /// Creates a new `OpenAiAnswerAdapter`. The timeout bounds every call to the
    /// remote service; hitting it is treated like any other generation failure.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

//=========================================================================================
// `AnswerGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnswerGenerationService for OpenAiAnswerAdapter {
    async fn generate_answer(&self, prompt: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| PortError::Unexpected("Answer generation timed out".to_string()))?
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Answer LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Answer LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
