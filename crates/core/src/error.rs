use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to load the JavaScript grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}
