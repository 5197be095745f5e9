//! Error types for attachment intake

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AttachmentError>;

/// Why a selected file was not accepted
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("File is too large. Max size is {}.", size_label(.limit))]
    TooLarge { size: u64, limit: u64 },

    #[error("Only image files are allowed.")]
    UnsupportedType(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode file: {0}")]
    Encoding(String),
}

/// Whole megabytes when the limit allows it, else kilobytes, else bytes
fn size_label(bytes: &u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    match *bytes {
        b if b >= MB && b % MB == 0 => format!("{}MB", b / MB),
        b if b >= KB => format!("{}KB", b / KB),
        b => format!("{} bytes", b),
    }
}
