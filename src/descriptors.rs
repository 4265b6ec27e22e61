use std::fmt;
use std::str::FromStr;

use opencv::core::{Mat, Vector};
use opencv::features2d::{Feature2DTrait, AKAZE, BRISK, ORB, SIFT};
use serde::{Deserialize, Serialize};

use crate::{from_cv_keypoints, to_cv_keypoints, Error, KeyPoint, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DescriptorType {
    Brisk,
    Brief,
    Orb,
    Freak,
    Akaze,
    Sift,
}

/// How descriptor distances are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorFormat {
    /// Bit strings compared with the Hamming distance.
    #[serde(rename = "DES_BINARY")]
    Binary,
    /// Gradient histograms compared with the L2 norm.
    #[serde(rename = "DES_HOG")]
    Hog,
}

impl DescriptorType {
    pub const ALL: [DescriptorType; 6] = [
        DescriptorType::Brisk,
        DescriptorType::Brief,
        DescriptorType::Orb,
        DescriptorType::Freak,
        DescriptorType::Akaze,
        DescriptorType::Sift,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DescriptorType::Brisk => "BRISK",
            DescriptorType::Brief => "BRIEF",
            DescriptorType::Orb => "ORB",
            DescriptorType::Freak => "FREAK",
            DescriptorType::Akaze => "AKAZE",
            DescriptorType::Sift => "SIFT",
        }
    }

    pub fn format(&self) -> DescriptorFormat {
        match self {
            DescriptorType::Sift => DescriptorFormat::Hog,
            _ => DescriptorFormat::Binary,
        }
    }
}

impl DescriptorFormat {
    pub fn name(&self) -> &'static str {
        match self {
            DescriptorFormat::Binary => "DES_BINARY",
            DescriptorFormat::Hog => "DES_HOG",
        }
    }
}

impl fmt::Display for DescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for DescriptorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DescriptorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DescriptorType::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownSelector {
                kind: "descriptor",
                value: s.to_string(),
            })
    }
}

/// Computes one descriptor row per keypoint.
///
/// Extractors drop keypoints they cannot describe (too close to the border, for instance), so
/// `keypoints` is replaced with the keypoints that actually got a descriptor and stays aligned
/// with the returned rows.
pub fn describe(keypoints: &mut Vec<KeyPoint>, image: &Mat, ty: DescriptorType) -> Result<Mat> {
    if keypoints.is_empty() {
        return Ok(Mat::default());
    }
    let mut cvkps = to_cv_keypoints(keypoints)?;
    let descriptors = match ty {
        DescriptorType::Brisk => {
            // FAST/AGAST threshold, detection octaves, sampling pattern scale
            let mut extractor = BRISK::create(30, 3, 1.0)?;
            compute(&mut extractor, image, &mut cvkps)?
        }
        DescriptorType::Orb => compute(&mut ORB::create_def()?, image, &mut cvkps)?,
        DescriptorType::Akaze => compute(&mut AKAZE::create_def()?, image, &mut cvkps)?,
        DescriptorType::Sift => compute(&mut SIFT::create_def()?, image, &mut cvkps)?,
        DescriptorType::Brief | DescriptorType::Freak => contrib_compute(ty, image, &mut cvkps)?,
    };
    *keypoints = from_cv_keypoints(&cvkps);
    Ok(descriptors)
}

fn compute(
    extractor: &mut impl Feature2DTrait,
    image: &Mat,
    keypoints: &mut Vector<opencv::core::KeyPoint>,
) -> Result<Mat> {
    let mut descriptors = Mat::default();
    extractor.compute(image, keypoints, &mut descriptors)?;
    Ok(descriptors)
}

#[cfg(feature = "xfeatures2d")]
fn contrib_compute(
    ty: DescriptorType,
    image: &Mat,
    keypoints: &mut Vector<opencv::core::KeyPoint>,
) -> Result<Mat> {
    use opencv::xfeatures2d::{BriefDescriptorExtractor, FREAK};

    match ty {
        DescriptorType::Brief => compute(&mut BriefDescriptorExtractor::create_def()?, image, keypoints),
        DescriptorType::Freak => compute(&mut FREAK::create_def()?, image, keypoints),
        _ => unreachable!("{ty} is part of the main features2d module"),
    }
}

#[cfg(not(feature = "xfeatures2d"))]
fn contrib_compute(
    ty: DescriptorType,
    _image: &Mat,
    _keypoints: &mut Vector<opencv::core::KeyPoint>,
) -> Result<Mat> {
    Err(Error::Unavailable(ty))
}
