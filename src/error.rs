use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while tokenizing/parsing a scene description file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{path}:{line}:{column}: unterminated string")]
    UnterminatedString { path: PathBuf, line: u32, column: u32 },

    #[error("{path}:{line}:{column}: unknown keyword '{keyword}'")]
    UnknownKeyword {
        path: PathBuf,
        line: u32,
        column: u32,
        keyword: String,
    },

    #[error("{path}:{line}:{column}: circular include of '{included}'")]
    CircularInclude {
        path: PathBuf,
        line: u32,
        column: u32,
        included: PathBuf,
    },

    #[error("{path}:{line}:{column}: unexpected token: {message}")]
    UnexpectedToken {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("{path}:{line}:{column}: malformed number: {message}")]
    MalformedNumber {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating a parsed scene (`Scene::init`).
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("singular transform")]
    SingularTransform,

    #[error("duplicate shader slot '{slot}' on {entity}")]
    DuplicateShaderSlot { entity: String, slot: String },

    #[error("empty CSG group: {entity}")]
    EmptyCsg { entity: String },

    #[error("invalid parameter '{param}' on {entity}: {message}")]
    InvalidParameter {
        entity: String,
        param: String,
        message: String,
    },

    #[error("degenerate vup vector on camera")]
    DegenerateVup,
}

/// Errors surfaced by the render phase and by image output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("image encode failed: {0}")]
    Encode(String),
}
