use thiserror::Error;

/// Errors produced while turning a token stream into statements.
///
/// During speculative parsing these are ordinary values: the body loop
/// catches them, restores the stream and tries the next candidate. Only the
/// error left over when every candidate failed reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected end of token stream")]
    EndOfStream,

    #[error("line {line}: unexpected token `{found}`, expected {expected}")]
    UnexpectedToken {
        found: String,
        line: u32,
        expected: String,
    },

    #[error("line {line}: malformed conditional: {reason}")]
    MalformedConditional { line: u32, reason: String },

    #[error("line {line}: malformed changelog item: {reason}")]
    MalformedChangelogItem { line: u32, reason: String },

    #[error("line {line}: conditionals nested deeper than {limit} levels")]
    NestingTooDeep { line: u32, limit: usize },
}

impl ParseError {
    pub fn line(&self) -> Option<u32> {
        match self {
            ParseError::EndOfStream => None,
            ParseError::UnexpectedToken { line, .. }
            | ParseError::MalformedConditional { line, .. }
            | ParseError::MalformedChangelogItem { line, .. }
            | ParseError::NestingTooDeep { line, .. } => Some(*line),
        }
    }
}
