use std::fmt;

/// Why a submission did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// The backend rejected the job; carries the backend's error text.
    Backend(String),
    /// No response from the backend.
    Network(String),
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::Backend(message) => write!(f, "Error: {message}"),
            SubmissionError::Network(message) => write!(f, "Network error: {message}"),
        }
    }
}

impl std::error::Error for SubmissionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalError {
    MissingId,
    NotReady,
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalError::MissingId => write!(f, "Download ID is missing"),
            RetrievalError::NotReady => write!(f, "Download is not ready yet"),
        }
    }
}

impl std::error::Error for RetrievalError {}
