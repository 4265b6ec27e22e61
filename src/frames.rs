use std::path::{Path, PathBuf};

use image::GrayImage;
use nshare::AsNdarray2;
use opencv::core::{Mat, MatTraitConst, MatTraitConstManual};

use crate::{Error, KeyPoint, Match, Result, SequenceSettings};

/// Everything the pipeline knows about one frame.
pub struct DataFrame {
    /// Index of the frame within the sequence, counted from `start_index`.
    pub index: usize,
    /// 8-bit single channel camera image.
    pub image: Mat,
    pub keypoints: Vec<KeyPoint>,
    /// One row per keypoint.
    pub descriptors: Mat,
    /// Matches from the previous frame's keypoints (query) to this frame's keypoints (train).
    pub matches: Vec<Match>,
}

impl DataFrame {
    pub fn new(index: usize, image: Mat) -> Self {
        DataFrame {
            index,
            image,
            keypoints: Vec::new(),
            descriptors: Mat::default(),
            matches: Vec::new(),
        }
    }
}

/// File name of the `index`-th frame of the sequence, e.g.
/// `../images/KITTI/2011_09_26/image_00/data/0000000003.png`.
pub fn frame_path(sequence: &SequenceSettings, index: usize) -> PathBuf {
    let number = sequence.start_index + index;
    let name = format!(
        "{}{:0width$}{}",
        sequence.prefix,
        number,
        sequence.extension,
        width = sequence.fill_width
    );
    sequence.base_path.join(name)
}

pub fn frame_count(sequence: &SequenceSettings) -> usize {
    (sequence.end_index + 1).saturating_sub(sequence.start_index)
}

/// Decodes an image file and converts it to an 8-bit grayscale `Mat`.
pub fn load_gray(path: impl AsRef<Path>) -> Result<Mat> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|source| Error::Frame {
            path: path.to_owned(),
            source,
        })?
        .into_luma8();
    gray_to_mat(&image)
}

pub fn gray_to_mat(image: &GrayImage) -> Result<Mat> {
    let view = image.as_ndarray2();
    let data = view
        .as_slice()
        .ok_or(Error::Conversion("grayscale image is not contiguous"))?;
    let mat = Mat::new_rows_cols_with_data(view.shape()[0] as i32, view.shape()[1] as i32, data)?;
    Ok(mat.try_clone()?)
}

pub fn mat_to_gray(mat: &Mat) -> Result<GrayImage> {
    if mat.typ() != opencv::core::CV_8UC1 {
        return Err(Error::Conversion("expected an 8-bit single channel image"));
    }
    GrayImage::from_vec(
        mat.cols() as u32,
        mat.rows() as u32,
        mat.data_typed::<u8>()?.to_vec(),
    )
    .ok_or(Error::Conversion("pixel buffer does not match image size"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_kitti_names() {
        let sequence = SequenceSettings::default();
        assert_eq!(
            frame_path(&sequence, 0),
            PathBuf::from("../images/KITTI/2011_09_26/image_00/data/0000000000.png")
        );
        assert_eq!(
            frame_path(&sequence, 9),
            PathBuf::from("../images/KITTI/2011_09_26/image_00/data/0000000009.png")
        );
        assert_eq!(frame_count(&sequence), 10);
    }

    #[test]
    fn index_is_offset_and_padded() {
        let sequence = SequenceSettings {
            base_path: PathBuf::from("/data"),
            prefix: "img-".to_string(),
            extension: ".png".to_string(),
            start_index: 98,
            end_index: 101,
            fill_width: 4,
        };
        assert_eq!(frame_path(&sequence, 0), PathBuf::from("/data/img-0098.png"));
        assert_eq!(frame_path(&sequence, 3), PathBuf::from("/data/img-0101.png"));
        assert_eq!(frame_count(&sequence), 4);
    }

    #[test]
    fn wider_numbers_are_not_truncated() {
        let sequence = SequenceSettings {
            base_path: PathBuf::new(),
            prefix: String::new(),
            extension: ".jpg".to_string(),
            start_index: 12345,
            end_index: 12345,
            fill_width: 2,
        };
        assert_eq!(frame_path(&sequence, 0), PathBuf::from("12345.jpg"));
    }

    #[test]
    fn gray_roundtrip_through_mat() {
        let image = GrayImage::from_fn(7, 5, |x, y| image::Luma([(x * 10 + y) as u8]));
        let mat = gray_to_mat(&image).unwrap();
        assert_eq!(mat.rows(), 5);
        assert_eq!(mat.cols(), 7);
        assert_eq!(*mat.at_2d::<u8>(4, 6).unwrap(), 64);
        assert_eq!(mat_to_gray(&mat).unwrap(), image);
    }

    #[test]
    fn missing_frame_reports_path() {
        let err = load_gray("/nonexistent/frame.png").unwrap_err();
        assert!(matches!(err, Error::Frame { ref path, .. } if path.ends_with("frame.png")));
    }
}
