use std::time::Duration;

use average::{Estimate, Mean};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{DescriptorType, DetectorType, MatcherType, SelectorType};

/// Wall clock time spent in each stage for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    /// Detection, region of interest filtering and keypoint limiting.
    pub detection: Duration,
    pub description: Duration,
    /// `None` for the first frame, which has nothing to be matched against.
    pub matching: Option<Duration>,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.detection + self.description + self.matching.unwrap_or_default()
    }
}

/// What one frame contributed to a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Keypoints returned by the detector.
    pub keypoints: usize,
    /// Keypoints left after the region of interest filter and limit.
    pub focused_keypoints: usize,
    pub matches: Option<usize>,
    pub timings: StageTimings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub frames: u64,
    pub matched_frames: u64,
    pub mean_keypoints: f64,
    pub mean_focused_keypoints: f64,
    pub mean_matches: f64,
    pub mean_detection_ms: f64,
    pub mean_description_ms: f64,
    pub mean_matching_ms: f64,
}

/// Running means over the frames of one run. Each mean only counts the frames that produced the
/// quantity, so matches and matching time are averaged over the matched frames.
#[derive(Debug, Clone)]
pub struct SummaryAccumulator {
    keypoints: Mean,
    focused_keypoints: Mean,
    matches: Mean,
    detection_ms: Mean,
    description_ms: Mean,
    matching_ms: Mean,
}

impl Default for SummaryAccumulator {
    fn default() -> Self {
        SummaryAccumulator {
            keypoints: Mean::new(),
            focused_keypoints: Mean::new(),
            matches: Mean::new(),
            detection_ms: Mean::new(),
            description_ms: Mean::new(),
            matching_ms: Mean::new(),
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.
}

impl SummaryAccumulator {
    pub fn add(&mut self, record: &FrameRecord) {
        self.keypoints.add(record.keypoints as f64);
        self.focused_keypoints.add(record.focused_keypoints as f64);
        self.detection_ms.add(millis(record.timings.detection));
        self.description_ms.add(millis(record.timings.description));
        if let Some(matches) = record.matches {
            self.matches.add(matches as f64);
        }
        if let Some(matching) = record.timings.matching {
            self.matching_ms.add(millis(matching));
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            frames: self.keypoints.len(),
            matched_frames: self.matches.len(),
            mean_keypoints: self.keypoints.mean(),
            mean_focused_keypoints: self.focused_keypoints.mean(),
            mean_matches: self.matches.mean(),
            mean_detection_ms: self.detection_ms.mean(),
            mean_description_ms: self.description_ms.mean(),
            mean_matching_ms: self.matching_ms.mean(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub detector: DetectorType,
    pub descriptor: DescriptorType,
    pub matcher: MatcherType,
    pub selector: SelectorType,
    pub summary: Summary,
}

/// Fixed width table with one line per run.
pub fn render_table(reports: &[RunReport]) -> String {
    let header = format!(
        "{:<10} {:<10} {:>9} {:>9} {:>8} {:>10} {:>11} {:>9}\n",
        "detector",
        "descriptor",
        "keypoints",
        "in focus",
        "matches",
        "detect ms",
        "describe ms",
        "match ms"
    );
    let rows = reports
        .iter()
        .map(|report| {
            let s = &report.summary;
            format!(
                "{:<10} {:<10} {:>9.1} {:>9.1} {:>8.1} {:>10.3} {:>11.3} {:>9.3}\n",
                report.detector.name(),
                report.descriptor.name(),
                s.mean_keypoints,
                s.mean_focused_keypoints,
                s.mean_matches,
                s.mean_detection_ms,
                s.mean_description_ms,
                s.mean_matching_ms,
            )
        })
        .join("");
    header + &rows
}
