// src/services/responder.rs
use std::sync::Arc;

use chrono::NaiveDate;
use rand::Rng;

use crate::{
    config::{FallbackDelay, ResponderConfig},
    error::ProviderError,
    message::{Message, Role},
    rules::{RuleTable, Topic, last_user_text},
    services::gemini::{
        GeminiClient, GenerateContentRequest, GenerationConfig, ModelProvider, Turn, TurnRole,
    },
};

pub const ROLE_ACKNOWLEDGEMENT: &str = "I understand my role as a travel assistant.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplySource {
    Live,
    Fallback(Topic),
}

impl ReplySource {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplySource::Live => "live",
            ReplySource::Fallback(_) => "fallback",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub message: Message,
    pub source: ReplySource,
}

/// Produces one assistant message for a conversation history, from the
/// model when one is configured and from the rule table otherwise.
pub struct Responder {
    provider: Option<Arc<dyn ModelProvider>>,
    rules: RuleTable,
    system_prompt: String,
    generation: GenerationConfig,
    fallback_delay: FallbackDelay,
}

impl Responder {
    pub fn new(
        config: &ResponderConfig,
        provider: Option<Arc<dyn ModelProvider>>,
        rules: RuleTable,
    ) -> Self {
        Self {
            provider,
            rules,
            system_prompt: config.system_prompt.clone(),
            generation: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
            fallback_delay: config.fallback_delay,
        }
    }

    /// Build a responder that talks to Gemini when `api_key` is set.
    pub fn from_config(config: &ResponderConfig) -> Result<Self, ProviderError> {
        let provider: Option<Arc<dyn ModelProvider>> = match &config.api_key {
            Some(key) => Some(Arc::new(GeminiClient::new(
                config.model_endpoint.clone(),
                key.clone(),
                config.request_timeout,
            )?)),
            None => None,
        };
        Ok(Self::new(config, provider, RuleTable::travel()))
    }

    pub fn is_live(&self) -> bool {
        self.provider.is_some()
    }

    pub fn system_instruction(&self, today: NaiveDate) -> String {
        self.system_prompt
            .replace("{date}", &today.format("%-m/%-d/%Y").to_string())
    }

    /// Map the history onto model turns. System messages are dropped; when
    /// anything remains the role acknowledgement and the instruction are
    /// placed in front of it.
    pub fn build_contents(&self, history: &[Message], today: NaiveDate) -> Vec<Turn> {
        let mut turns: Vec<Turn> = history
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => TurnRole::Model,
                    _ => TurnRole::User,
                };
                Turn::new(role, m.content.clone())
            })
            .collect();

        if !turns.is_empty() {
            turns.splice(
                0..0,
                [
                    Turn::new(TurnRole::Model, ROLE_ACKNOWLEDGEMENT),
                    Turn::new(TurnRole::User, self.system_instruction(today)),
                ],
            );
        }

        turns
    }

    pub fn build_request(&self, history: &[Message], today: NaiveDate) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.build_contents(history, today),
            generation_config: self.generation,
        }
    }

    pub async fn respond(&self, history: &[Message]) -> Message {
        self.reply(history).await.message
    }

    pub async fn reply(&self, history: &[Message]) -> Reply {
        if let Some(provider) = &self.provider {
            let request = self.build_request(history, chrono::Local::now().date_naive());
            match provider.generate(&request).await {
                Ok(text) => {
                    return Reply {
                        message: Message::assistant(text),
                        source: ReplySource::Live,
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "model call failed, falling back to canned replies"
                    );
                }
            }
        }

        self.fallback(history).await
    }

    async fn fallback(&self, history: &[Message]) -> Reply {
        let text = last_user_text(history);
        let matched = self.rules.resolve(text);
        tracing::info!(topic = matched.topic.as_str(), "using canned reply");

        let delay = self.sample_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Reply {
            message: Message::assistant(matched.reply),
            source: ReplySource::Fallback(matched.topic),
        }
    }

    fn sample_delay(&self) -> std::time::Duration {
        let FallbackDelay { min, max } = self.fallback_delay;
        if self.fallback_delay.is_disabled() || min >= max {
            return min;
        }
        rand::rng().random_range(min..=max)
    }
}
