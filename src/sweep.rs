use std::fmt;
use std::iter;

use itertools::Itertools;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::{run, DescriptorType, DetectorType, Error, Result, RunReport, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combination {
    pub detector: DetectorType,
    pub descriptor: DescriptorType,
}

impl Combination {
    pub fn new(detector: DetectorType, descriptor: DescriptorType) -> Self {
        Combination {
            detector,
            descriptor,
        }
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.detector, self.descriptor)
    }
}

/// AKAZE descriptors read the scale space information AKAZE stores in its keypoints, and ORB
/// cannot describe SIFT keypoints whose octave field packs the scale differently.
pub fn is_supported(combination: &Combination) -> bool {
    match (combination.detector, combination.descriptor) {
        (detector, DescriptorType::Akaze) => detector == DetectorType::Akaze,
        (DetectorType::Sift, DescriptorType::Orb) => false,
        _ => true,
    }
}

/// All supported pairs of the given detectors and descriptors, detector major.
pub fn combinations(detectors: &[DetectorType], descriptors: &[DescriptorType]) -> Vec<Combination> {
    detectors
        .iter()
        .cartesian_product(descriptors)
        .map(|(detector, descriptor)| Combination::new(*detector, *descriptor))
        .filter(is_supported)
        .collect()
}

/// Every classic detector with every descriptor it can feed, followed by AKAZE on its own.
pub fn default_combinations() -> Vec<Combination> {
    let detectors = [
        DetectorType::ShiTomasi,
        DetectorType::Harris,
        DetectorType::Fast,
        DetectorType::Brisk,
        DetectorType::Orb,
        DetectorType::Sift,
    ];
    let descriptors = [
        DescriptorType::Brief,
        DescriptorType::Orb,
        DescriptorType::Freak,
        DescriptorType::Sift,
    ];
    combinations(&detectors, &descriptors)
        .into_iter()
        .chain(iter::once(Combination::new(
            DetectorType::Akaze,
            DescriptorType::Akaze,
        )))
        .collect()
}

/// Runs every combination on the same sequence.
///
/// A combination OpenCV fails on is logged and skipped. Failing to read the sequence itself
/// aborts the sweep, since every other combination would fail the same way.
pub fn run_sweep(settings: &Settings, combinations: &[Combination]) -> Result<Vec<RunReport>> {
    settings.validate()?;
    let mut reports = Vec::with_capacity(combinations.len());
    for (i, combination) in combinations.iter().enumerate() {
        if !is_supported(combination) {
            warn!("skipping unsupported combination {combination}");
            continue;
        }
        info!("[{}/{}] running {combination}", i + 1, combinations.len());
        match run(settings, combination.detector, combination.descriptor) {
            Ok(report) => reports.push(report),
            Err(err @ (Error::Frame { .. } | Error::Io(_) | Error::InvalidSettings(_))) => {
                return Err(err)
            }
            Err(err) => error!("{combination} failed: {err}"),
        }
    }
    Ok(reports)
}
