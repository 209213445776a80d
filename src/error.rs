use thiserror::Error;

/// Everything that can go wrong between sending a transcript and reading a reply.
///
/// The `Display` text of each variant is what ends up in the conversation,
/// prefixed with `"Error: "`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// Non-2xx response. `message` is `error.message` from the body, or
    /// `"HTTP <status>: <reason>"` when the body has none.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("{0}")]
    Transport(String),

    /// A 2xx response whose body is not the expected completion shape.
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Text shown in the assistant bubble for this failure.
    pub fn to_chat_text(&self) -> String {
        format!("Error: {}", self)
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_text_is_prefixed() {
        let err = CompletionError::Api {
            status: 401,
            message: "No auth credentials found".to_string(),
        };
        assert_eq!(err.to_chat_text(), "Error: No auth credentials found");
    }

    #[test]
    fn malformed_response_names_the_problem() {
        let err = CompletionError::MalformedResponse("no choices returned".to_string());
        assert_eq!(
            err.to_chat_text(),
            "Error: Malformed completion response: no choices returned"
        );
    }
}
