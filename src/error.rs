use thiserror::Error;

/// Error kinds surfaced by the roster, gallery, and delivery layers.
///
/// The domain variants are recoverable rejections that are rendered back
/// to the requesting group. None of them are fatal to the process; the
/// only fatal condition is bad startup configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Name cannot be empty.")]
    EmptyName,

    #[error("'{0}' is not a valid name, only letters and spaces are allowed.")]
    InvalidName(String),

    #[error("'{0}' is already on the list.")]
    DuplicateName(String),

    #[error("'{0}' is not on the list.")]
    NotFound(String),

    #[error("The participant list is complete with {0} names. Try again in the next game!")]
    RoundFull(usize),

    #[error("The participant list is not yet complete ({got} of {want} names).")]
    NotFull { got: usize, want: usize },

    #[error("A winner has already been drawn for this round.")]
    AlreadyDrawn,

    #[error("No prize at position {index}, the gallery holds {len} images.")]
    OutOfRange { index: usize, len: usize },

    #[error("Failed to deliver message: {0}")]
    Delivery(String),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
