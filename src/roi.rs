use serde::{Deserialize, Serialize};

use crate::KeyPoint;

/// Axis aligned integer rectangle, half open on the right and bottom edges like `cv::Rect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Sub-pixel positions are rounded to the nearest pixel first, as OpenCV does when a
    /// floating point position is tested against an integer rectangle.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let px = x.round_ties_even() as i64;
        let py = y.round_ties_even() as i64;
        let (rx, ry) = (self.x as i64, self.y as i64);
        rx <= px && px < rx + self.width as i64 && ry <= py && py < ry + self.height as i64
    }
}

impl From<Rect> for opencv::core::Rect {
    fn from(r: Rect) -> Self {
        opencv::core::Rect::new(r.x, r.y, r.width, r.height)
    }
}

/// Keypoints inside `rect`, in their original order.
pub fn filter_keypoints(keypoints: &[KeyPoint], rect: &Rect) -> Vec<KeyPoint> {
    keypoints
        .iter()
        .filter(|kp| rect.contains(kp.x, kp.y))
        .cloned()
        .collect()
}
