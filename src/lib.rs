//! This crate benchmarks the keypoint detectors, descriptor extractors and descriptor matchers
//! shipped with OpenCV's `features2d` and `xfeatures2d` modules on a sequence of camera frames.
//!
//! Each run loads the frames one by one into a small ring buffer, detects keypoints in the
//! latest frame, optionally restricts them to a region of interest (the preceding vehicle in the
//! KITTI sequences this was written for), computes descriptors and matches them against the
//! previous frame. Every stage is timed and the per-frame numbers are folded into a [`Summary`].
//!
//! Detectors, descriptors and matchers are picked with the same string selectors the OpenCV
//! tutorials use (`"HARRIS"`, `"BRIEF"`, `"MAT_FLANN"`, `"SEL_KNN"`, ...), see
//! [`DetectorType`], [`DescriptorType`], [`MatcherType`] and [`SelectorType`].

use std::cmp::Ordering;
use std::f32::consts::PI as PI32;

use opencv::core::{KeyPointTrait, KeyPointTraitConst, Point2f};

mod config;
mod descriptors;
mod detectors;
mod error;
mod frames;
pub mod harris;
mod matching;
mod pipeline;
mod ring_buffer;
mod roi;
mod stats;
mod sweep;
pub mod visualize;

pub use config::{SequenceSettings, Settings};
pub use descriptors::{describe, DescriptorFormat, DescriptorType};
pub use detectors::{detect, DetectorType};
pub use error::{Error, Result};
pub use frames::{frame_count, frame_path, gray_to_mat, load_gray, mat_to_gray, DataFrame};
pub use matching::{
    match_descriptors, ratio_test, to_cv_matches, Match, MatcherType, SelectorType,
};
pub use pipeline::run;
pub use ring_buffer::RingBuffer;
pub use roi::{filter_keypoints, Rect};
pub use stats::{render_table, FrameRecord, RunReport, StageTimings, Summary, SummaryAccumulator};
pub use sweep::{combinations, default_combinations, is_supported, run_sweep, Combination};

#[derive(Debug, Clone, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct KeyPoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the meaningful neighbourhood.
    pub size: f32,
    /// Orientation in degrees, `-1` if the detector does not compute one.
    pub angle: f32,
    pub response: f32,
    /// Pyramid layer, packed differently by each detector. AKAZE and SIFT read it back when
    /// computing descriptors, so it must survive the round trip through this type.
    pub octave: i32,
    pub class_id: i32,
}

impl Default for KeyPoint {
    fn default() -> Self {
        KeyPoint {
            x: 0.,
            y: 0.,
            size: 0.,
            angle: -1.,
            response: 0.,
            octave: 0,
            class_id: -1,
        }
    }
}

impl KeyPoint {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        KeyPoint {
            x,
            y,
            size,
            ..Default::default()
        }
    }

    /// Intersection over union of the two keypoint discs. Matches `cv::KeyPoint::overlap`.
    pub fn overlap(&self, other: &KeyPoint) -> f32 {
        let a = self.size * 0.5;
        let b = other.size * 0.5;
        let a_2 = a * a;
        let b_2 = b * b;
        let c = ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt();

        if a.min(b) + c <= a.max(b) {
            // one disc lies inside the other
            let (min, max) = (a.min(b), a.max(b));
            if max == 0. {
                return 0.;
            }
            (min * min) / (max * max)
        } else if c < a + b {
            let c_2 = c * c;
            let cos_alpha = (b_2 + c_2 - a_2) / (other.size * c);
            let cos_beta = (a_2 + c_2 - b_2) / (self.size * c);
            let alpha = cos_alpha.clamp(-1., 1.).acos();
            let beta = cos_beta.clamp(-1., 1.).acos();
            let segment_a = a_2 * beta;
            let segment_b = b_2 * alpha;
            let triangle_a = a_2 * beta.sin() * cos_beta;
            let triangle_b = b_2 * alpha.sin() * cos_alpha;
            let intersection = segment_a + segment_b - triangle_a - triangle_b;
            let union = (a_2 + b_2) * PI32 - intersection;
            intersection / union
        } else {
            0.
        }
    }

    pub fn to_cv(&self) -> Result<opencv::core::KeyPoint> {
        let mut cvkp = opencv::core::KeyPoint::default()?;
        cvkp.set_pt(Point2f::new(self.x, self.y));
        cvkp.set_size(self.size);
        cvkp.set_angle(self.angle);
        cvkp.set_response(self.response);
        cvkp.set_octave(self.octave);
        cvkp.set_class_id(self.class_id);
        Ok(cvkp)
    }

    pub fn from_cv(cvkp: &opencv::core::KeyPoint) -> Self {
        let pt = cvkp.pt();
        KeyPoint {
            x: pt.x,
            y: pt.y,
            size: cvkp.size(),
            angle: cvkp.angle(),
            response: cvkp.response(),
            octave: cvkp.octave(),
            class_id: cvkp.class_id(),
        }
    }
}

pub fn to_cv_keypoints(keypoints: &[KeyPoint]) -> Result<opencv::core::Vector<opencv::core::KeyPoint>> {
    keypoints.iter().map(KeyPoint::to_cv).collect()
}

pub fn from_cv_keypoints(keypoints: &opencv::core::Vector<opencv::core::KeyPoint>) -> Vec<KeyPoint> {
    keypoints.iter().map(|kp| KeyPoint::from_cv(&kp)).collect()
}

/// Keeps the `limit` keypoints with the highest response.
///
/// The sort is stable, so detectors that leave the response at zero (Shi-Tomasi returns its
/// corners best first) keep their first `limit` keypoints.
pub fn retain_best(keypoints: &mut Vec<KeyPoint>, limit: usize) {
    if limit < keypoints.len() {
        keypoints.sort_by(|kp1, kp2| {
            kp2.response
                .partial_cmp(&kp1.response)
                .unwrap_or(Ordering::Equal)
        });
        keypoints.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f32, y: f32, size: f32) -> KeyPoint {
        KeyPoint::new(x, y, size)
    }

    #[test]
    fn overlap_of_identical_keypoints_is_one() {
        let a = kp(10., 10., 6.);
        assert!((a.overlap(&a) - 1.).abs() < 1e-6);
    }

    #[test]
    fn overlap_of_distant_keypoints_is_zero() {
        assert_eq!(kp(0., 0., 6.).overlap(&kp(6., 0., 6.)), 0.);
        assert_eq!(kp(0., 0., 6.).overlap(&kp(20., 20., 6.)), 0.);
    }

    #[test]
    fn overlap_of_nested_discs_is_area_ratio() {
        let big = kp(0., 0., 10.);
        let small = kp(1., 0., 4.);
        let expected = (2. * 2.) / (5. * 5.);
        assert!((big.overlap(&small) - expected).abs() < 1e-6);
        assert!((small.overlap(&big) - expected).abs() < 1e-6);
    }

    #[test]
    fn overlap_of_adjacent_pixels() {
        // Two Harris keypoints one pixel apart: r = 3, d = 1.
        let a = kp(0., 0., 6.);
        let b = kp(1., 0., 6.);
        let r: f32 = 3.;
        let d: f32 = 1.;
        let intersection = 2. * r * r * (d / (2. * r)).acos() - 0.5 * d * (4. * r * r - d * d).sqrt();
        let union = 2. * PI32 * r * r - intersection;
        let overlap = a.overlap(&b);
        assert!((overlap - intersection / union).abs() < 1e-4, "{overlap}");
        assert!((overlap - b.overlap(&a)).abs() < 1e-6);
    }

    #[test]
    fn opencv_conversion_is_lossless() {
        let kp = KeyPoint {
            x: 12.25,
            y: 340.5,
            size: 7.3,
            angle: 271.5,
            response: 0.0425,
            // SIFT packs layer and octave into this field
            octave: 0x00ff0201,
            class_id: 17,
        };
        assert_eq!(KeyPoint::from_cv(&kp.to_cv().unwrap()), kp);

        let keypoints = vec![kp.clone(), KeyPoint::new(1., 2., 3.), KeyPoint::default()];
        let cvkps = to_cv_keypoints(&keypoints).unwrap();
        assert_eq!(cvkps.len(), 3);
        assert_eq!(cvkps.get(0).unwrap().octave(), 0x00ff0201);
        assert_eq!(from_cv_keypoints(&cvkps), keypoints);
    }

    #[test]
    fn retain_best_keeps_strongest() {
        let mut kps: Vec<KeyPoint> = [3., 9., 1., 7.]
            .into_iter()
            .enumerate()
            .map(|(i, response)| KeyPoint {
                response,
                ..kp(i as f32, 0., 1.)
            })
            .collect();
        retain_best(&mut kps, 2);
        let responses: Vec<f32> = kps.iter().map(|kp| kp.response).collect();
        assert_eq!(responses, vec![9., 7.]);
    }

    #[test]
    fn retain_best_keeps_order_without_responses() {
        let mut kps: Vec<KeyPoint> = (0..5).map(|i| kp(i as f32, 0., 4.)).collect();
        retain_best(&mut kps, 3);
        let xs: Vec<f32> = kps.iter().map(|kp| kp.x).collect();
        assert_eq!(xs, vec![0., 1., 2.]);

        retain_best(&mut kps, 10);
        assert_eq!(kps.len(), 3);
    }
}
