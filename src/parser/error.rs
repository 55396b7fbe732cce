use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Go grammar could not be loaded: {0}")]
    LanguageSetupFailed(String),

    #[error("tree-sitter returned no tree")]
    ParseFailed,

    #[error("{line}:{column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ParseError>;
