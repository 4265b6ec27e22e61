use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, MatcherType, Rect, Result, SelectorType};

/// Where the frames live and how their file names are put together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    pub base_path: PathBuf,
    pub prefix: String,
    pub extension: String,
    /// First file index to load.
    pub start_index: usize,
    /// Last file index to load, inclusive.
    pub end_index: usize,
    /// Number of digits the file index is zero padded to.
    pub fill_width: usize,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        SequenceSettings {
            base_path: PathBuf::from("../images/"),
            prefix: "KITTI/2011_09_26/image_00/data/000000".to_string(),
            extension: ".png".to_string(),
            start_index: 0,
            end_index: 9,
            fill_width: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sequence: SequenceSettings,
    /// Number of frames held in memory at the same time.
    pub buffer_size: usize,
    /// Only keypoints inside this rectangle are kept. `None` keeps the whole frame.
    pub focus: Option<Rect>,
    pub matcher: MatcherType,
    pub selector: SelectorType,
    /// Descriptor distance ratio for `SEL_KNN`.
    pub ratio: f32,
    /// Keep only the strongest keypoints of each frame, handy when stepping through frames.
    pub max_keypoints: Option<usize>,
    /// Show matches in a window and wait for a key press after every frame.
    pub visualize: bool,
    /// Directory to write keypoint renderings of every frame into.
    pub keypoint_renders: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sequence: SequenceSettings::default(),
            buffer_size: 2,
            focus: Some(Rect::new(535, 180, 180, 150)),
            matcher: MatcherType::BruteForce,
            selector: SelectorType::KNearestNeighbor,
            ratio: 0.8,
            max_keypoints: None,
            visualize: false,
            keypoint_renders: None,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file. Fields missing from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Settings = serde_json::from_str(&fs::read_to_string(path)?)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::InvalidSettings(
                "buffer_size must hold at least one frame".to_string(),
            ));
        }
        if self.sequence.end_index < self.sequence.start_index {
            return Err(Error::InvalidSettings(format!(
                "end_index {} is before start_index {}",
                self.sequence.end_index, self.sequence.start_index
            )));
        }
        if !(self.ratio > 0. && self.ratio <= 1.) {
            return Err(Error::InvalidSettings(format!(
                "ratio {} is outside (0, 1]",
                self.ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "sequence": { "end_index": 3 },
                "matcher": "MAT_FLANN",
                "focus": null
            }"#,
        )
        .unwrap();
        assert_eq!(settings.sequence.end_index, 3);
        assert_eq!(settings.sequence.fill_width, 4);
        assert_eq!(settings.matcher, MatcherType::Flann);
        assert_eq!(settings.selector, SelectorType::KNearestNeighbor);
        assert_eq!(settings.focus, None);
        assert_eq!(settings.buffer_size, 2);
        settings.validate().unwrap();
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "ratio": 0.7, "max_keypoints": 50 }"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.ratio, 0.7);
        assert_eq!(settings.max_keypoints, Some(50));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut settings = Settings::default();
        settings.buffer_size = 0;
        assert!(matches!(settings.validate(), Err(Error::InvalidSettings(_))));

        let mut settings = Settings::default();
        settings.sequence.start_index = 5;
        settings.sequence.end_index = 4;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.ratio = 1.5;
        assert!(settings.validate().is_err());
        settings.ratio = 0.;
        assert!(settings.validate().is_err());
    }
}
