use std::fmt;
use std::str::FromStr;

use opencv::core::{no_array, Mat, MatTraitConst, Point2f, Vector};
use opencv::features2d::{
    FastFeatureDetector, FastFeatureDetector_DetectorType, Feature2DTrait, AKAZE, BRISK, ORB, SIFT,
};
use opencv::imgproc::good_features_to_track;
use serde::{Deserialize, Serialize};

use crate::harris::{self, HarrisParams};
use crate::{from_cv_keypoints, Error, KeyPoint, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectorType {
    ShiTomasi,
    Harris,
    Fast,
    Brisk,
    Orb,
    Akaze,
    Sift,
}

impl DetectorType {
    pub const ALL: [DetectorType; 7] = [
        DetectorType::ShiTomasi,
        DetectorType::Harris,
        DetectorType::Fast,
        DetectorType::Brisk,
        DetectorType::Orb,
        DetectorType::Akaze,
        DetectorType::Sift,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DetectorType::ShiTomasi => "SHITOMASI",
            DetectorType::Harris => "HARRIS",
            DetectorType::Fast => "FAST",
            DetectorType::Brisk => "BRISK",
            DetectorType::Orb => "ORB",
            DetectorType::Akaze => "AKAZE",
            DetectorType::Sift => "SIFT",
        }
    }
}

impl fmt::Display for DetectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DetectorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DetectorType::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownSelector {
                kind: "detector",
                value: s.to_string(),
            })
    }
}

/// Detects keypoints in an 8-bit grayscale image.
pub fn detect(image: &Mat, ty: DetectorType) -> Result<Vec<KeyPoint>> {
    match ty {
        DetectorType::ShiTomasi => shi_tomasi(image),
        DetectorType::Harris => harris::detect(image, &HarrisParams::default()),
        DetectorType::Fast => {
            let mut detector =
                FastFeatureDetector::create(30, true, FastFeatureDetector_DetectorType::TYPE_9_16)?;
            detect_with(&mut detector, image)
        }
        DetectorType::Brisk => detect_with(&mut BRISK::create(30, 3, 1.0)?, image),
        DetectorType::Orb => detect_with(&mut ORB::create_def()?, image),
        DetectorType::Akaze => detect_with(&mut AKAZE::create_def()?, image),
        DetectorType::Sift => detect_with(&mut SIFT::create_def()?, image),
    }
}

fn detect_with(detector: &mut impl Feature2DTrait, image: &Mat) -> Result<Vec<KeyPoint>> {
    let mut keypoints = Vector::new();
    detector.detect(image, &mut keypoints, &no_array())?;
    Ok(from_cv_keypoints(&keypoints))
}

fn shi_tomasi(image: &Mat) -> Result<Vec<KeyPoint>> {
    // Size of the block used for the derivative covariation matrix around every pixel.
    let block_size = 4;
    let max_overlap = 0.0;
    let min_distance = (1.0 - max_overlap) * block_size as f64;
    let max_corners = ((image.rows() * image.cols()) as f64 / min_distance.max(1.0)) as i32;
    let quality_level = 0.01;
    let k = 0.04;

    let mut corners: Vector<Point2f> = Vector::new();
    good_features_to_track(
        image,
        &mut corners,
        max_corners,
        quality_level,
        min_distance,
        &no_array(),
        block_size,
        false,
        k,
    )?;
    Ok(corners
        .iter()
        .map(|corner| KeyPoint::new(corner.x, corner.y, block_size as f32))
        .collect())
}
