use thiserror::Error;

/// Everything that can go wrong between receiving image bytes and handing
/// back a finished palette card.
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("Unable to decode image: {0}")]
    Decode(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("{what} exceeds limit: {actual} (max {max})")]
    ResourceExceeded {
        what: &'static str,
        actual: u64,
        max: u64,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Temporary storage error: {0}")]
    TransientIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PaletteError>;
