//! In-character fallback lines.
//!
//! When generation fails the client still gets a reply: a fixed line that
//! sounds like the persona dodging the question. Each failure reason maps to
//! exactly one line.

use postgame_types::llm::GenerationFailure;

/// Fallback text per failure reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackLines {
    pub empty: String,
    pub timeout: String,
    pub blocked: String,
    pub rate_limited: String,
    pub backend: String,
}

impl Default for FallbackLines {
    fn default() -> Self {
        Self {
            empty: "You know, that's a great question. We're just focused on taking it one day \
                    at a time and doing what's best for the team."
                .to_string(),
            timeout: "Hey, we're taking it one play at a time out here. We'll watch the film and \
                      get back to work."
                .to_string(),
            blocked: "I'm just focused on football and helping my team. Everything else is just \
                      noise."
                .to_string(),
            rate_limited: "Look, we've got a lot of guys who want to talk. We're just trying to \
                           stay humble and keep grinding."
                .to_string(),
            backend: "We don't really focus on things we can't control. We just go out there and \
                      play our game."
                .to_string(),
        }
    }
}

impl FallbackLines {
    /// The line substituted for a generation that failed with `reason`.
    pub fn for_failure(&self, reason: GenerationFailure) -> &str {
        match reason {
            GenerationFailure::Empty => &self.empty,
            GenerationFailure::Timeout => &self.timeout,
            GenerationFailure::Blocked => &self.blocked,
            GenerationFailure::RateLimited => &self.rate_limited,
            GenerationFailure::Backend => &self.backend,
        }
    }
}
