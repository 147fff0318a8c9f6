use crate::Rule;
use privscan_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("Line {line}: {message}")]
    Semantic { line: usize, message: String },

    #[error("Line {line}: {source}")]
    Core {
        line: usize,
        #[source]
        source: CoreError,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },
}

impl ParseError {
    pub fn semantic(line: usize, message: impl Into<String>) -> Self {
        ParseError::Semantic {
            line,
            message: message.into(),
        }
    }

    /// Line the error was found on, when it is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax(err) => match err.line_col {
                pest::error::LineColLocation::Pos((line, _)) => Some(line),
                pest::error::LineColLocation::Span((line, _), _) => Some(line),
            },
            ParseError::Semantic { line, .. } | ParseError::Core { line, .. } => Some(*line),
            ParseError::Io { .. } | ParseError::Walk { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
