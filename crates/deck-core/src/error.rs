use std::path::PathBuf;

use thiserror::Error;

/// An image that could not be opened or decoded. The image is dropped from the batch.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Why an image ended up in the `unknown` bucket.
#[derive(Debug, Error)]
pub enum ClassificationFailure {
    #[error("cannot read image for upload: {0}")]
    Encode(#[from] std::io::Error),
    #[error("no API key configured")]
    MissingCredentials,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("service reply had no choices")]
    EmptyResponse,
    #[error("no digit in reply {0:?}")]
    NoDigit(String),
    #[error("category code {0} outside 1-4")]
    OutOfRange(u64),
}

/// Failure to write the output deck. Fatal to the run.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot package presentation: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("cannot embed {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot format slide xml: {0}")]
    Format(#[from] std::fmt::Error),
}
