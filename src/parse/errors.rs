use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to set grammar for parser")]
    LanguageSet,

    #[error("parser returned no tree")]
    ParseFailed,

    #[error("syntax error at byte {byte_start}..{byte_end} (line {row}, column {column})")]
    Syntax {
        byte_start: usize,
        byte_end: usize,
        row: usize,
        column: usize,
    },
}
