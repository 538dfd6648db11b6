pub mod ai;
pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod state;
pub mod transcript;

// Re-export main types for convenience
pub use ai::{InferenceProvider, OllamaClient};
pub use auth::{AuthProvider, AuthUser, SignUpResult, SupabaseAuth};
pub use config::Config;
pub use error::{AuthError, ChatError};
pub use gate::{Authenticated, SessionGate, SignUpOutcome};
pub use pipeline::{Completion, CompletionSink, PipelineStatus, SubmissionPipeline};
pub use state::{ChatRole, ChatTurn};
pub use transcript::Transcript;
