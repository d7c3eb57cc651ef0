use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::error::SdkError;
use aws_sdk_bedrockruntime::operation::converse::ConverseError;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use tracing::debug;

use chatmetric_core::BoxFuture;

use crate::error::BedrockError;

/// A black-box grader: system rubric and user text in, free text out.
pub trait ScoringOracle: Send + Sync {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, BedrockError>>;

    /// Model identifier, for logs.
    fn model_id(&self) -> &str;
}

/// Scoring oracle backed by the Bedrock Converse API.
pub struct BedrockOracle {
    client: Client,
    model_id: String,
    temperature: f32,
}

impl BedrockOracle {
    pub fn new(config: &aws_config::SdkConfig, model_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(config),
            model_id: model_id.into(),
            temperature: 0.0,
        }
    }

    async fn converse(&self, system: &str, user: &str) -> Result<String, BedrockError> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(user.to_string()))
            .build()
            .map_err(|e| BedrockError::Invocation(e.to_string()))?;

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(system.to_string()))
            .messages(message)
            .inference_config(
                InferenceConfiguration::builder()
                    .temperature(self.temperature)
                    .build(),
            )
            .send()
            .await
            .map_err(classify_converse_error)?;

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

        let text = output_message
            .content()
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(text) = block {
                    Some(text.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        if let Some(usage) = response.usage() {
            debug!(
                model_id = %self.model_id,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "converse complete"
            );
        }

        Ok(text)
    }
}

impl ScoringOracle for BedrockOracle {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, BedrockError>> {
        Box::pin(self.converse(system, user))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Split Converse failures into retryable and permanent errors.
fn classify_converse_error<R>(err: SdkError<ConverseError, R>) -> BedrockError
where
    R: std::fmt::Debug,
{
    match err {
        SdkError::ServiceError(ctx) => {
            let err = ctx.into_err();
            if err.is_throttling_exception() {
                BedrockError::Throttled(err.to_string())
            } else if err.is_internal_server_exception()
                || err.is_model_timeout_exception()
                || err.is_model_not_ready_exception()
            {
                BedrockError::Transient(err.to_string())
            } else {
                BedrockError::Invocation(err.to_string())
            }
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            BedrockError::Transient(format!("{err:?}"))
        }
        other => BedrockError::Invocation(format!("{other:?}")),
    }
}
