//! Submission pipeline: one prompt in, one assistant turn out.
//!
//! The pipeline is owned by the host's event loop. `submit` appends the user
//! turn and spawns the provider call; the spawned task never touches the
//! transcript. It hands a [`Completion`] to a [`CompletionSink`], and the host
//! feeds that back into [`SubmissionPipeline::complete`] on its own thread.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};

use crate::ai::InferenceProvider;
use crate::error::ChatError;
use crate::state::ChatTurn;
use crate::transcript::Transcript;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const WELCOME_MESSAGE: &str =
    "Welcome! I'm your AI assistant powered by Ollama. How can I help you today?";
pub const CLEARED_MESSAGE: &str = "Chat cleared. How can I help you?";
pub const NO_RESPONSE_FALLBACK: &str = "No response received.";

/// Observable pipeline state for the host's status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Ready,
    Busy,
    Error,
}

impl PipelineStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStatus::Ready => "Ready",
            PipelineStatus::Busy => "Generating response...",
            PipelineStatus::Error => "Error occurred",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    InFlight,
    Succeeded,
    Failed,
}

/// The single outstanding request, if any.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: u64,
    pub prompt: String,
    pub status: RequestStatus,
}

/// Result of a provider call, produced off the owning thread.
#[derive(Debug)]
pub struct Completion {
    pub id: u64,
    pub outcome: Result<Option<String>, ChatError>,
}

/// Where finished provider calls are delivered.
///
/// Implementations forward into the host's event loop; they must not
/// touch the transcript themselves.
pub trait CompletionSink: Send + Sync + 'static {
    fn deliver(&self, completion: Completion);
}

impl CompletionSink for mpsc::UnboundedSender<Completion> {
    fn deliver(&self, completion: Completion) {
        if self.send(completion).is_err() {
            warn!("completion dropped: host loop has shut down");
        }
    }
}

pub struct SubmissionPipeline {
    transcript: Transcript,
    provider: Arc<dyn InferenceProvider>,
    sink: Arc<dyn CompletionSink>,
    timeout: Duration,
    pending: Option<PendingRequest>,
    next_id: u64,
    status: watch::Sender<PipelineStatus>,
}

impl SubmissionPipeline {
    /// Create a pipeline whose transcript starts with the welcome turn.
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        sink: Arc<dyn CompletionSink>,
        timeout: Duration,
    ) -> Self {
        let mut transcript = Transcript::new();
        transcript.append(ChatTurn::assistant(WELCOME_MESSAGE));
        let (status, _) = watch::channel(PipelineStatus::Ready);

        Self {
            transcript,
            provider,
            sink,
            timeout,
            pending: None,
            next_id: 1,
            status,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn status(&self) -> PipelineStatus {
        *self.status.borrow()
    }

    /// Receive every status transition without polling.
    pub fn subscribe_status(&self) -> watch::Receiver<PipelineStatus> {
        self.status.subscribe()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Record `prompt` as a user turn and dispatch it to the provider.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, prompt: &str) -> Result<u64, ChatError> {
        if prompt.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        if self.pending.is_some() {
            return Err(ChatError::RequestInFlight);
        }

        self.transcript.append(ChatTurn::user(prompt));

        let id = self.next_id;
        self.next_id += 1;
        self.pending = Some(PendingRequest {
            id,
            prompt: prompt.to_string(),
            status: RequestStatus::InFlight,
        });
        self.status.send_replace(PipelineStatus::Busy);

        info!(
            "dispatching request {} to {} (model={}, prompt_len={})",
            id,
            self.provider.name(),
            self.provider.model(),
            prompt.len()
        );

        let provider = Arc::clone(&self.provider);
        let sink = Arc::clone(&self.sink);
        let timeout = self.timeout;
        let prompt = prompt.to_string();
        tokio::spawn(async move {
            // Inner task so a panicking provider still yields a completion
            let mut call = tokio::spawn(async move { provider.generate(&prompt).await });
            let outcome = match tokio::time::timeout(timeout, &mut call).await {
                Ok(Ok(Err(ChatError::ProviderTimeout(_)))) => {
                    Err(ChatError::ProviderTimeout(timeout))
                }
                Ok(Ok(result)) => result,
                Ok(Err(err)) => {
                    error!("provider task for request {} failed: {}", id, err);
                    Err(ChatError::ProviderError(format!("provider task failed: {}", err)))
                }
                Err(_) => {
                    call.abort();
                    Err(ChatError::ProviderTimeout(timeout))
                }
            };
            sink.deliver(Completion { id, outcome });
        });

        Ok(id)
    }

    /// Apply a finished request. Returns false for a completion that does
    /// not match the outstanding request.
    pub fn complete(&mut self, completion: Completion) -> bool {
        let mut pending = match self.pending.take() {
            Some(pending) if pending.id == completion.id => pending,
            other => {
                warn!("ignoring completion for unknown request {}", completion.id);
                self.pending = other;
                return false;
            }
        };

        let (turn, status) = match completion.outcome {
            Ok(text) => {
                pending.status = RequestStatus::Succeeded;
                let text = text.unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string());
                (ChatTurn::assistant(text), PipelineStatus::Ready)
            }
            Err(err) => {
                pending.status = RequestStatus::Failed;
                warn!("request {} failed: {}", pending.id, err);
                (ChatTurn::assistant(err.user_message()), PipelineStatus::Error)
            }
        };

        debug!("request {} resolved as {:?}", pending.id, pending.status);
        self.transcript.append(turn);
        self.status.send_replace(status);
        true
    }

    /// Empty the transcript and reseed the greeting.
    pub fn clear(&mut self) -> Result<(), ChatError> {
        if self.pending.is_some() {
            return Err(ChatError::RequestInFlight);
        }
        self.transcript.clear();
        self.transcript.append(ChatTurn::assistant(CLEARED_MESSAGE));
        self.status.send_replace(PipelineStatus::Ready);
        debug!("transcript cleared");
        Ok(())
    }
}
