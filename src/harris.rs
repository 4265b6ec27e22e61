//! Harris corners with a greedy non-maximum suppression over keypoint overlap.
//!
//! OpenCV only provides the corner response map. Turning the map into keypoints is done here:
//! every pixel above a threshold becomes a candidate and is compared against all keypoints
//! found so far. A candidate that overlaps an existing keypoint replaces it when its response
//! is stronger and is dropped otherwise. This is quadratic in the number of keypoints.

use ndarray::{Array2, ArrayView2};
use opencv::core::{
    no_array, normalize, Mat, MatTraitConst, MatTraitConstManual, BORDER_DEFAULT, CV_32FC1,
    NORM_MINMAX,
};
use opencv::imgproc::corner_harris;

use crate::{KeyPoint, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct HarrisParams {
    /// Every pixel looks at a `block_size` x `block_size` neighbourhood.
    pub block_size: i32,
    /// Sobel aperture, must be odd.
    pub aperture_size: i32,
    pub k: f64,
    /// Minimum value in the response map scaled to `[0, 255]`.
    pub min_response: i32,
    /// Maximum permissible overlap between two keypoints.
    pub max_overlap: f32,
}

impl Default for HarrisParams {
    fn default() -> Self {
        HarrisParams {
            block_size: 2,
            aperture_size: 3,
            k: 0.04,
            min_response: 100,
            max_overlap: 0.0,
        }
    }
}

pub fn detect(image: &Mat, params: &HarrisParams) -> Result<Vec<KeyPoint>> {
    let response = corner_response(image, params)?;
    Ok(suppress(response.view(), params))
}

/// Harris response of every pixel, min-max normalised into `[0, 255]`.
pub fn corner_response(image: &Mat, params: &HarrisParams) -> Result<Array2<f32>> {
    let mut dst = Mat::default();
    corner_harris(
        image,
        &mut dst,
        params.block_size,
        params.aperture_size,
        params.k,
        BORDER_DEFAULT,
    )?;
    let mut dst_norm = Mat::default();
    normalize(&dst, &mut dst_norm, 0., 255., NORM_MINMAX, CV_32FC1, &no_array())?;
    let shape = (dst_norm.rows() as usize, dst_norm.cols() as usize);
    let response = ArrayView2::from_shape(shape, dst_norm.data_typed::<f32>()?)?;
    Ok(response.to_owned())
}

/// Raster scan of `response`, keeping the strongest of every group of overlapping candidates.
pub fn suppress(response: ArrayView2<f32>, params: &HarrisParams) -> Vec<KeyPoint> {
    let size = (2 * params.aperture_size) as f32;
    let mut keypoints: Vec<KeyPoint> = Vec::new();

    for ((row, col), &value) in response.indexed_iter() {
        let value = value as i32;
        if value <= params.min_response {
            continue;
        }
        let candidate = KeyPoint {
            response: value as f32,
            ..KeyPoint::new(col as f32, row as f32, size)
        };

        let mut overlapping = false;
        for kp in keypoints.iter_mut() {
            if candidate.overlap(kp) > params.max_overlap {
                overlapping = true;
                if candidate.response > kp.response {
                    *kp = candidate.clone();
                    break;
                }
            }
        }
        if !overlapping {
            keypoints.push(candidate);
        }
    }
    keypoints
}
