//! Query planning and answer synthesis over the model cascade.

use llm_client::{
    invoke_structured_with_fallback, invoke_with_fallback, ChatModel, Message, ModelConfig,
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::{Result, ToolkitError};
use crate::usage::LlmUsage;

/// Structured output for subquery generation.
#[derive(Debug, Deserialize, JsonSchema)]
struct SubqueriesOutput {
    /// Search queries that together cover the topic.
    queries: Vec<String>,
}

/// Generated subqueries plus the model work that produced them.
#[derive(Debug, Clone)]
pub struct Subqueries {
    pub queries: Vec<String>,
    pub model: String,
    pub usage: LlmUsage,
}

/// A synthesized answer with its producing model.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub answer: String,
    pub model: String,
    pub usage: LlmUsage,
}

/// Break a research topic into focused search queries.
pub async fn generate_subqueries(
    backend: &impl ChatModel,
    model_config: &ModelConfig,
    topic: &str,
    count: usize,
) -> Result<Subqueries> {
    if count == 0 {
        return Err(ToolkitError::Input("Subquery count must be positive".into()));
    }

    let system = format!(
        "You are a research planner. Break the user's topic into exactly {count} \
         focused web search queries. Each query should target a distinct aspect \
         and be phrased the way a person would type it into a search engine."
    );
    let messages = vec![Message::system(system), Message::user(topic)];

    let response =
        invoke_structured_with_fallback::<SubqueriesOutput, _>(backend, model_config, &messages)
            .await?;

    let mut queries = response.value.queries;
    queries.truncate(count);
    tracing::debug!(topic = %topic, generated = queries.len(), "Generated subqueries");

    let mut usage = LlmUsage::default();
    usage.add_call(response.usage.as_ref());

    Ok(Subqueries {
        queries,
        model: response.model,
        usage,
    })
}

/// Synthesize an answer to a question from formatted search context.
pub async fn synthesize_results(
    backend: &impl ChatModel,
    model_config: &ModelConfig,
    question: &str,
    context: &str,
) -> Result<Synthesis> {
    let system = "You are a research analyst. Answer the user's question using only \
                  the provided sources. Cite sources by their number. Say so \
                  explicitly when the sources do not cover something.";
    let user = format!("Question: {question}\n\n{context}");
    let messages = vec![Message::system(system), Message::user(user)];

    let response = invoke_with_fallback(backend, model_config, &messages).await?;

    let mut usage = LlmUsage::default();
    usage.add_call(response.usage.as_ref());

    Ok(Synthesis {
        answer: response.content,
        model: response.model,
        usage,
    })
}
