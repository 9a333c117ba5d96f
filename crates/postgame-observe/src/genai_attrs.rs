//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! Used as field names on the span wrapped around each generation call so
//! that exported traces line up with other GenAI instrumentation.

/// The name of the operation being performed (e.g., "chat").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "gemini").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

/// The model ID requested (e.g., "gemini-2.5-pro").
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reason reported by the backend (e.g., "STOP", "SAFETY").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Values ---

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

/// Google Gemini provider identifier.
pub const PROVIDER_GEMINI: &str = "gemini";
