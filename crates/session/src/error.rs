use std::fmt;

use thiserror::Error;

/// High-level error categories surfaced by a tab session.
#[derive(Clone, Debug, Error)]
pub enum SessionErrorKind {
    #[error("protocol i/o failure")]
    ProtocolIo,
    #[error("evaluation failed")]
    Evaluation,
    #[error("navigation rejected")]
    NavigationRejected,
    #[error("internal error")]
    Internal,
}

/// Session error with an optional human-readable hint.
#[derive(Clone, Debug)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub hint: Option<String>,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind) -> Self {
        Self { kind, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for SessionError {}
