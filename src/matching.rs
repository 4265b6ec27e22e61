use std::fmt;
use std::str::FromStr;

use log::trace;
use opencv::core::{no_array, DMatch, Mat, MatTraitConst, Vector, CV_32F, NORM_HAMMING, NORM_L2};
use opencv::features2d::{BFMatcher, DescriptorMatcherTraitConst, FlannBasedMatcher};
use serde::{Deserialize, Serialize};

use crate::{DescriptorFormat, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatcherType {
    #[serde(rename = "MAT_BF")]
    BruteForce,
    #[serde(rename = "MAT_FLANN")]
    Flann,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorType {
    /// Best match only.
    #[serde(rename = "SEL_NN")]
    NearestNeighbor,
    /// Two best matches followed by a distance ratio test.
    #[serde(rename = "SEL_KNN")]
    KNearestNeighbor,
}

impl MatcherType {
    pub fn name(&self) -> &'static str {
        match self {
            MatcherType::BruteForce => "MAT_BF",
            MatcherType::Flann => "MAT_FLANN",
        }
    }
}

impl SelectorType {
    pub fn name(&self) -> &'static str {
        match self {
            SelectorType::NearestNeighbor => "SEL_NN",
            SelectorType::KNearestNeighbor => "SEL_KNN",
        }
    }
}

impl fmt::Display for MatcherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for SelectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatcherType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MAT_BF" | "BF" => Ok(MatcherType::BruteForce),
            "MAT_FLANN" | "FLANN" => Ok(MatcherType::Flann),
            _ => Err(Error::UnknownSelector {
                kind: "matcher",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for SelectorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SEL_NN" | "NN" => Ok(SelectorType::NearestNeighbor),
            "SEL_KNN" | "KNN" => Ok(SelectorType::KNearestNeighbor),
            _ => Err(Error::UnknownSelector {
                kind: "selector",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Row in the source (previous frame) descriptors.
    pub query_idx: usize,
    /// Row in the reference (latest frame) descriptors.
    pub train_idx: usize,
    pub distance: f32,
}

impl From<DMatch> for Match {
    fn from(m: DMatch) -> Self {
        Match {
            query_idx: m.query_idx as usize,
            train_idx: m.train_idx as usize,
            distance: m.distance,
        }
    }
}

impl From<&Match> for DMatch {
    fn from(m: &Match) -> Self {
        DMatch {
            query_idx: m.query_idx as i32,
            train_idx: m.train_idx as i32,
            img_idx: -1,
            distance: m.distance,
        }
    }
}

pub fn to_cv_matches(matches: &[Match]) -> Vector<DMatch> {
    matches.iter().map(DMatch::from).collect()
}

/// Keeps the best candidate of every query whose distance is clearly smaller than that of the
/// runner-up: `best < ratio * second`. Queries with fewer than two candidates are dropped.
pub fn ratio_test(knn_matches: &[Vec<Match>], ratio: f32) -> Vec<Match> {
    knn_matches
        .iter()
        .filter_map(|candidates| match candidates.as_slice() {
            [best, second, ..] if best.distance < ratio * second.distance => Some(*best),
            _ => None,
        })
        .collect()
}

/// Finds matches for the `source` descriptors among the `reference` descriptors.
pub fn match_descriptors(
    source: &Mat,
    reference: &Mat,
    format: DescriptorFormat,
    matcher: MatcherType,
    selector: SelectorType,
    ratio: f32,
) -> Result<Vec<Match>> {
    if source.empty() || reference.empty() {
        return Ok(Vec::new());
    }
    match matcher {
        MatcherType::BruteForce => {
            let norm = match format {
                DescriptorFormat::Hog => NORM_L2,
                DescriptorFormat::Binary => NORM_HAMMING,
            };
            let bf = BFMatcher::create(norm, false)?;
            select(&bf, source, reference, selector, ratio)
        }
        MatcherType::Flann => {
            // FLANN's kd-trees only work on floating point descriptors.
            let source = to_f32(source)?;
            let reference = to_f32(reference)?;
            let flann = FlannBasedMatcher::create()?;
            select(&flann, &source, &reference, selector, ratio)
        }
    }
}

fn to_f32(descriptors: &Mat) -> Result<Mat> {
    if descriptors.typ() == CV_32F {
        return Ok(descriptors.try_clone()?);
    }
    let mut converted = Mat::default();
    descriptors.convert_to(&mut converted, CV_32F, 1., 0.)?;
    Ok(converted)
}

fn select(
    matcher: &impl DescriptorMatcherTraitConst,
    source: &Mat,
    reference: &Mat,
    selector: SelectorType,
    ratio: f32,
) -> Result<Vec<Match>> {
    match selector {
        SelectorType::NearestNeighbor => {
            let mut matches = Vector::new();
            matcher.train_match(source, reference, &mut matches, &no_array())?;
            Ok(matches.iter().map(Match::from).collect())
        }
        SelectorType::KNearestNeighbor => {
            let mut knn: Vector<Vector<DMatch>> = Vector::new();
            matcher.knn_train_match(source, reference, &mut knn, 2, &no_array(), false)?;
            let knn = knn
                .iter()
                .map(|candidates| candidates.iter().map(Match::from).collect())
                .collect::<Vec<Vec<Match>>>();
            let kept = ratio_test(&knn, ratio);
            trace!(
                "ratio test kept {} of {} candidate matches",
                kept.len(),
                knn.len()
            );
            Ok(kept)
        }
    }
}
