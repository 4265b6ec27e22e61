//! Debug views of a run: an OpenCV window with the matches between two frames, and keypoint
//! renderings written to disk for headless runs.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageError, Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_circle_mut, draw_hollow_rect_mut};
use log::info;
use opencv::core::{Mat, Scalar, Vector};
use opencv::features2d::{draw_matches, DrawMatchesFlags};
use opencv::highgui;

use crate::frames::mat_to_gray;
use crate::matching::to_cv_matches;
use crate::{to_cv_keypoints, DataFrame, Error, Rect, Result};

pub const MATCH_WINDOW: &str = "Matching keypoints between two camera images";

const KEYPOINT_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const FOCUS_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Side by side image of both frames with the matches of `latest` drawn between them.
pub fn draw_frame_matches(previous: &DataFrame, latest: &DataFrame) -> Result<Mat> {
    let mut out = Mat::default();
    draw_matches(
        &previous.image,
        &to_cv_keypoints(&previous.keypoints)?,
        &latest.image,
        &to_cv_keypoints(&latest.keypoints)?,
        &to_cv_matches(&latest.matches),
        &mut out,
        Scalar::all(-1.),
        Scalar::all(-1.),
        &Vector::<i8>::new(),
        DrawMatchesFlags::DRAW_RICH_KEYPOINTS,
    )?;
    Ok(out)
}

/// Shows the matches and blocks until a key is pressed.
pub fn show_matches(previous: &DataFrame, latest: &DataFrame) -> Result<()> {
    let image = draw_frame_matches(previous, latest)?;
    highgui::named_window(MATCH_WINDOW, highgui::WINDOW_AUTOSIZE)?;
    highgui::imshow(MATCH_WINDOW, &image)?;
    info!("Press key to continue to next image");
    highgui::wait_key(0)?;
    Ok(())
}

/// Draws every keypoint as a circle of its size (a cross when it has none) and the region of
/// interest as a rectangle.
pub fn render_keypoints(image: &GrayImage, frame: &DataFrame, focus: Option<&Rect>) -> RgbImage {
    let mut canvas = DynamicImage::ImageLuma8(image.clone()).to_rgb8();
    for kp in &frame.keypoints {
        let center = (kp.x.round() as i32, kp.y.round() as i32);
        let radius = (kp.size * 0.5).round() as i32;
        if radius > 0 {
            draw_hollow_circle_mut(&mut canvas, center, radius, KEYPOINT_COLOR);
        } else {
            draw_cross_mut(&mut canvas, KEYPOINT_COLOR, center.0, center.1);
        }
    }
    if let Some(rect) = focus.filter(|r| !r.is_empty()) {
        draw_hollow_rect_mut(
            &mut canvas,
            imageproc::rect::Rect::at(rect.x, rect.y).of_size(rect.width as u32, rect.height as u32),
            FOCUS_COLOR,
        );
    }
    canvas
}

pub fn save_keypoints(frame: &DataFrame, focus: Option<&Rect>, path: impl AsRef<Path>) -> Result<()> {
    let image = mat_to_gray(&frame.image)?;
    render_keypoints(&image, frame, focus)
        .save(path)
        .map_err(|err| match err {
            ImageError::IoError(err) => Error::Io(err),
            err => Error::Image(err),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::gray_to_mat;
    use crate::KeyPoint;

    fn frame(keypoints: Vec<KeyPoint>) -> (GrayImage, DataFrame) {
        let image = GrayImage::from_pixel(40, 30, image::Luma([0]));
        let mut frame = DataFrame::new(0, gray_to_mat(&image).unwrap());
        frame.keypoints = keypoints;
        (image, frame)
    }

    #[test]
    fn keypoints_and_focus_are_drawn() {
        let (image, frame) = frame(vec![KeyPoint::new(10., 10., 6.), KeyPoint::new(30., 20., 0.)]);
        let focus = Rect::new(2, 2, 20, 15);
        let canvas = render_keypoints(&image, &frame, Some(&focus));
        assert_eq!(canvas.dimensions(), (40, 30));
        // circle of radius 3 around (10, 10)
        assert_eq!(*canvas.get_pixel(13, 10), KEYPOINT_COLOR);
        assert_eq!(*canvas.get_pixel(10, 10), Rgb([0, 0, 0]));
        // cross for the keypoint without a size
        assert_eq!(*canvas.get_pixel(30, 20), KEYPOINT_COLOR);
        assert_eq!(*canvas.get_pixel(2, 2), FOCUS_COLOR);
        assert_eq!(*canvas.get_pixel(21, 16), FOCUS_COLOR);
    }

    #[test]
    fn keypoints_outside_the_image_are_clipped() {
        let (image, frame) = frame(vec![KeyPoint::new(-5., 100., 20.)]);
        let canvas = render_keypoints(&image, &frame, Some(&Rect::new(0, 0, 0, 0)));
        assert_eq!(canvas.dimensions(), (40, 30));
    }

    #[test]
    fn save_writes_png() {
        let (_, frame) = frame(vec![KeyPoint::new(5., 5., 4.)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        save_keypoints(&frame, None, &path).unwrap();
        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (40, 30));
    }

    #[test]
    fn unwritable_render_is_an_io_error() {
        let (_, frame) = frame(vec![KeyPoint::new(5., 5., 4.)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("frame.png");
        let result = save_keypoints(&frame, None, &path);
        assert!(matches!(result, Err(Error::Io(_))), "{result:?}");
    }

    #[test]
    fn match_image_is_side_by_side() {
        let (_, previous) = frame(vec![KeyPoint::new(5., 5., 4.)]);
        let (_, mut latest) = frame(vec![KeyPoint::new(6., 5., 4.)]);
        latest.matches = vec![crate::Match {
            query_idx: 0,
            train_idx: 0,
            distance: 1.,
        }];
        let out = draw_frame_matches(&previous, &latest).unwrap();
        assert_eq!(opencv::core::MatTraitConst::cols(&out), 80);
        assert_eq!(opencv::core::MatTraitConst::rows(&out), 30);
    }
}
