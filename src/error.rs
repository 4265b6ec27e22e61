use std::path::PathBuf;

use thiserror::Error;

use crate::{DescriptorType, DetectorType};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),
    #[error("failed to load frame '{}': {source}", path.display())]
    Frame {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown {kind} selector '{value}'")]
    UnknownSelector { kind: &'static str, value: String },
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("{descriptor} descriptors cannot be computed on {detector} keypoints")]
    UnsupportedCombination {
        detector: DetectorType,
        descriptor: DescriptorType,
    },
    #[error("{0} descriptors need OpenCV's xfeatures2d module")]
    Unavailable(DescriptorType),
    #[error("image conversion: {0}")]
    Conversion(&'static str),
    #[error("unexpected array shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
