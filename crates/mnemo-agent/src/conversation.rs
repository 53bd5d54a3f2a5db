// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session: one user's turn-by-turn exchange with the
//! assistant.
//!
//! Each turn runs intent recognition, derives behavior flags, applies
//! memory side effects, assembles grounding context, and generates the
//! response (blocking or streamed). Generation failures never escape:
//! they become a fixed apology that is appended to history like any
//! other assistant turn, so the session stays consistent.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use mnemo_core::error::MnemoError;
use mnemo_core::traits::GenerationAdapter;
use mnemo_core::types::{ChatTurn, Role};
use mnemo_intent::IntentRecognizer;
use mnemo_memory::MemoryEngine;
use rand::Rng;
use tracing::{debug, warn};

use crate::behavior::{derive_behaviors, BehaviorFlags};
use crate::context::build_context;
use crate::insights::InsightStore;

/// Entries retrieved to ground a response.
const RETRIEVAL_TOP_K: usize = 3;
/// Entries degraded by a forget request.
const FORGET_TOP_K: usize = 2;
/// Entries at or below this token count are immune to forgetting.
const MIN_FORGETTABLE_TOKENS: usize = 5;
/// Fraction of tokens removed by one forgetting pass.
const FORGET_RATIO_MIN: f64 = 0.2;
const FORGET_RATIO_MAX: f64 = 0.3;
/// Conversation turns included in the response prompt.
const PROMPT_HISTORY_TURNS: usize = 5;

/// A conversation session holding process-lifetime turn history.
///
/// History is append-only and cleared only via [`clear_history`].
/// Sessions are single-threaded: callers serialize access.
///
/// [`clear_history`]: ConversationSession::clear_history
pub struct ConversationSession {
    memory: Arc<MemoryEngine>,
    provider: Arc<dyn GenerationAdapter>,
    recognizer: IntentRecognizer,
    insights: InsightStore,
    persona: String,
    history: Vec<ChatTurn>,
}

impl ConversationSession {
    pub fn new(
        memory: Arc<MemoryEngine>,
        provider: Arc<dyn GenerationAdapter>,
        insights: InsightStore,
        persona: impl Into<String>,
    ) -> Self {
        let recognizer = IntentRecognizer::new(provider.clone());
        Self {
            memory,
            provider,
            recognizer,
            insights,
            persona: persona.into(),
            history: Vec::new(),
        }
    }

    /// The session's turn history so far.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Clears the turn history. The memory store is untouched.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Processes a message and returns the full response.
    pub async fn chat(&mut self, message: &str) -> String {
        self.history.push(ChatTurn::user(message));

        let outcome = self.run_turn(message, None).await;
        self.finish_turn(outcome)
    }

    /// Processes a message, pushing response chunks to `on_chunk` as they
    /// arrive, and returns the accumulated response.
    pub async fn chat_streamed<F>(&mut self, message: &str, mut on_chunk: F) -> String
    where
        F: FnMut(&str),
    {
        self.history.push(ChatTurn::user(message));

        let outcome = self.run_turn(message, Some(&mut on_chunk)).await;
        self.finish_turn(outcome)
    }

    /// Appends the turn's assistant response (or the apology for its
    /// failure) to history and returns it.
    fn finish_turn(&mut self, outcome: Result<String, MnemoError>) -> String {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "turn failed, responding with apology");
                apology_for(&e)
            }
        };
        self.history.push(ChatTurn::assistant(&response));
        response
    }

    async fn run_turn(
        &self,
        message: &str,
        on_chunk: Option<&mut dyn FnMut(&str)>,
    ) -> Result<String, MnemoError> {
        let intent = self.recognizer.recognize(message, &self.history).await?;
        let behaviors = derive_behaviors(&intent);
        debug!(
            primary = %intent.primary_intent,
            confidence = intent.confidence,
            retrieval = behaviors.retrieval,
            memory_gain = behaviors.memory_gain,
            memory_loss = behaviors.memory_loss,
            "turn behaviors derived"
        );

        if behaviors.memory_loss {
            self.apply_memory_loss(message).await;
        }

        let memory_results = if behaviors.retrieval {
            match self.memory.search(message, RETRIEVAL_TOP_K).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(error = %e, "memory search failed, continuing without results");
                    vec![]
                }
            }
        } else {
            vec![]
        };

        let insights = self.insights.load_latest();
        let context = build_context(&memory_results, insights.as_ref());
        let prompt = self.build_prompt(&context, behaviors);

        let raw = match on_chunk {
            Some(on_chunk) => self.generate_streamed(&prompt, on_chunk).await?,
            None => self.provider.generate(&prompt).await?,
        };
        let response = raw.trim().to_lowercase();

        if behaviors.memory_gain {
            self.apply_memory_gain(message, &response).await;
        }

        Ok(response)
    }

    /// Consumes the chunk stream to completion, pushing each chunk to the
    /// callback. A transport error after the first chunk ends the stream
    /// early with the text accumulated so far.
    async fn generate_streamed(
        &self,
        prompt: &str,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, MnemoError> {
        let mut stream = self.provider.generate_stream(prompt).await?;
        let mut full = String::new();

        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    on_chunk(&chunk);
                    full.push_str(&chunk);
                }
                Err(e) => {
                    if full.is_empty() {
                        return Err(e);
                    }
                    warn!(error = %e, "stream ended early, keeping partial response");
                    break;
                }
            }
        }

        Ok(full)
    }

    /// Degrades the entries most relevant to the message by removing a
    /// random 20-30% of their tokens. Short entries are left untouched.
    /// Irreversible by design. Store failures degrade to a no-op.
    async fn apply_memory_loss(&self, message: &str) {
        let results = match self.memory.search(message, FORGET_TOP_K).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "memory search failed, skipping forgetting pass");
                return;
            }
        };

        // Sample the surviving tokens up front so the RNG is not held
        // across await points.
        let mut degraded = Vec::new();
        {
            let mut rng = rand::thread_rng();
            for result in &results {
                let Some(id) = result.entry.id.clone() else {
                    continue;
                };
                if let Some(text) = degrade_text(&result.entry.raw_text, &mut rng) {
                    degraded.push((id, text));
                }
            }
        }

        for (id, text) in degraded {
            match self.memory.update_entry(&id, &text).await {
                Ok(true) => debug!(id = id.as_str(), "applied partial forgetting"),
                Ok(false) => warn!(id = id.as_str(), "entry vanished before forgetting"),
                Err(e) => warn!(id = id.as_str(), error = %e, "failed to degrade entry"),
            }
        }
    }

    /// Writes the exchange back to memory under today's date.
    async fn apply_memory_gain(&self, message: &str, response: &str) {
        let content = format!("User: {message}\nResponse: {response}");
        let today = Utc::now().format("%Y-%m-%d").to_string();

        match self.memory.add_entry_for_date(&today, &content).await {
            Ok(id) if !id.is_empty() => debug!(id = id.as_str(), "stored memory gain entry"),
            Ok(_) => warn!("memory gain entry was not stored"),
            Err(e) => warn!(error = %e, "failed to store memory gain entry"),
        }
    }

    /// Builds the response prompt: persona preamble, recent turns, the
    /// context block, and behavior guidance lines.
    fn build_prompt(&self, context: &str, behaviors: BehaviorFlags) -> String {
        let mut history_text = String::new();
        let start = self.history.len().saturating_sub(PROMPT_HISTORY_TURNS);
        for turn in &self.history[start..] {
            let speaker = match turn.role {
                Role::User => "you",
                Role::Assistant => self.persona.as_str(),
            };
            history_text.push_str(&format!("{speaker}: {}\n", turn.content));
        }

        let mut guidance = String::new();
        if behaviors.memory_loss {
            guidance.push_str(
                "the user seems to want to forget or disregard something. acknowledge this appropriately.\n",
            );
        }
        if behaviors.memory_gain {
            guidance.push_str(
                "the user mentioned something important. acknowledge the importance of what they said.\n",
            );
        }

        format!(
            "you are {persona}, a helpful and casual ai assistant that helps users understand \
             their projects and notes.\n\
             you speak in lowercase only and have a laid-back style.\n\n\
             ### INSTRUCTIONS ###\n\
             1. Only use \"hey there\" or \"hi\" in the very first message\n\
             2. For all follow-up messages, respond directly without any greeting phrases\n\
             3. Keep responses friendly, casual, and concise\n\
             4. Don't mention \"memory\", \"logs\", or \"entries\" - incorporate information naturally\n\
             5. All responses must be in lowercase only\n\
             {guidance}\n\
             conversation history:\n\
             {history_text}\n\
             context information:\n\
             {context}\n\n\
             respond to the user's most recent message in a conversational way that continues \
             the existing conversation.\n\
             be helpful and informative.\n",
            persona = self.persona,
        )
    }
}

/// Removes a random 20-30% of whitespace-delimited tokens, rejoining the
/// survivors with single spaces. Returns `None` for entries too short to
/// degrade.
fn degrade_text(text: &str, rng: &mut impl Rng) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() <= MIN_FORGETTABLE_TOKENS {
        return None;
    }

    let ratio = rng.gen_range(FORGET_RATIO_MIN..FORGET_RATIO_MAX);
    let num_to_remove = ((ratio * tokens.len() as f64) as usize).max(1);
    let removed: HashSet<usize> = rand::seq::index::sample(rng, tokens.len(), num_to_remove)
        .into_iter()
        .collect();

    let kept: Vec<&str> = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, token)| *token)
        .collect();

    Some(kept.join(" "))
}

/// The fixed, user-readable apologies for failed turns. Connection
/// failures name the backend URL; everything else gets the generic form.
fn apology_for(error: &MnemoError) -> String {
    match error {
        MnemoError::Connection { url, .. } => {
            format!("sorry, i can't think right now. make sure ollama is running ({url})")
        }
        other => format!("sorry, i'm having trouble thinking right now. error: {other}"),
    }
}
