//! # gemchat Telemetry
//!
//! Logging and tracing setup shared by the gemchat crates.
//!
//! Installs a `tracing` subscriber with an `RUST_LOG` filter, human-readable
//! output on stderr (stdout belongs to the chat) and an OpenTelemetry layer
//! that turns each chat turn into a span.

mod spans;
mod tracer;

pub use spans::{TurnOutcomeKind, TurnSpanAttributes, trace_turn};
pub use tracer::{init_telemetry, tracer_provider};

/// Span attribute names for chat turns.
///
/// Generic names follow the OpenTelemetry semantic conventions for
/// generative AI; the rest are namespaced under `gemchat.`.
pub mod attributes {
    pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";
    pub const GEN_AI_SYSTEM: &str = "gen_ai.system";
    pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

    pub const GEMCHAT_MESSAGE_ID: &str = "gemchat.turn.message_id";
    pub const GEMCHAT_GENERATION: &str = "gemchat.session.generation";
    pub const GEMCHAT_CHUNK_COUNT: &str = "gemchat.turn.chunk_count";
    pub const GEMCHAT_RESPONSE_CHARS: &str = "gemchat.turn.response_chars";
    pub const GEMCHAT_OUTCOME: &str = "gemchat.turn.outcome";

    pub const SYSTEM_NAME: &str = "gemchat";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_constants() {
        assert_eq!(attributes::GEN_AI_OPERATION_NAME, "gen_ai.operation.name");
        assert_eq!(attributes::GEN_AI_SYSTEM, "gen_ai.system");
        assert_eq!(attributes::SYSTEM_NAME, "gemchat");
    }
}
