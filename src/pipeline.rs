use std::time::Instant;

use log::{debug, info};

use crate::stats::FrameRecord;
use crate::sweep::{is_supported, Combination};
use crate::{
    describe, detect, filter_keypoints, frame_count, frame_path, load_gray, match_descriptors,
    retain_best, visualize, DataFrame, DescriptorType, DetectorType, Error, Result, RingBuffer,
    RunReport, Settings, StageTimings, SummaryAccumulator,
};

/// Runs the whole sequence through one detector / descriptor pair.
pub fn run(settings: &Settings, detector: DetectorType, descriptor: DescriptorType) -> Result<RunReport> {
    settings.validate()?;
    if !is_supported(&Combination::new(detector, descriptor)) {
        return Err(Error::UnsupportedCombination {
            detector,
            descriptor,
        });
    }
    if let Some(dir) = &settings.keypoint_renders {
        std::fs::create_dir_all(dir)?;
    }

    let mut buffer: RingBuffer<DataFrame> = RingBuffer::new(settings.buffer_size);
    let mut accumulator = SummaryAccumulator::default();

    for index in 0..frame_count(&settings.sequence) {
        let path = frame_path(&settings.sequence, index);
        let mut frame = DataFrame::new(index, load_gray(&path)?);
        debug!("#1 : LOAD IMAGE {} done", path.display());

        let start = Instant::now();
        let mut keypoints = detect(&frame.image, detector)?;
        let detected = keypoints.len();
        if let Some(focus) = &settings.focus {
            keypoints = filter_keypoints(&keypoints, focus);
        }
        if let Some(limit) = settings.max_keypoints {
            retain_best(&mut keypoints, limit);
            debug!("keypoints limited to {limit}");
        }
        let detection = start.elapsed();
        debug!(
            "#2 : DETECT KEYPOINTS done: {detector} found {detected}, {} kept",
            keypoints.len()
        );
        frame.keypoints = keypoints;
        let focused = frame.keypoints.len();

        let start = Instant::now();
        frame.descriptors = describe(&mut frame.keypoints, &frame.image, descriptor)?;
        let description = start.elapsed();
        debug!("#3 : EXTRACT DESCRIPTORS done");

        if let Some(dir) = &settings.keypoint_renders {
            let render = dir.join(format!("{detector}_{descriptor}_{index:04}.png"));
            visualize::save_keypoints(&frame, settings.focus.as_ref(), &render)?;
        }

        buffer.push(frame);

        let mut record = FrameRecord {
            keypoints: detected,
            focused_keypoints: focused,
            matches: None,
            timings: StageTimings {
                detection,
                description,
                matching: None,
            },
        };

        // Wait until at least two frames have been processed.
        if let Some((previous, latest)) = buffer.previous_and_latest_mut() {
            let start = Instant::now();
            latest.matches = match_descriptors(
                &previous.descriptors,
                &latest.descriptors,
                descriptor.format(),
                settings.matcher,
                settings.selector,
                settings.ratio,
            )?;
            let matching = start.elapsed();
            debug!("#4 : MATCH KEYPOINT DESCRIPTORS done");

            record.matches = Some(latest.matches.len());
            record.timings.matching = Some(matching);
            info!(
                "frame {index}: {detector}/{descriptor}, {} matches, detection {:.3}ms, description {:.3}ms, matching {:.3}ms, total {:.3}ms",
                latest.matches.len(),
                detection.as_secs_f64() * 1000.,
                description.as_secs_f64() * 1000.,
                matching.as_secs_f64() * 1000.,
                record.timings.total().as_secs_f64() * 1000.,
            );

            if settings.visualize {
                visualize::show_matches(previous, latest)?;
            }
        }
        accumulator.add(&record);
    }

    let summary = accumulator.summary();
    info!(
        "{detector}/{descriptor}: {:.1} keypoints, {:.1} matches, detection {:.3}ms, description {:.3}ms on average",
        summary.mean_keypoints,
        summary.mean_matches,
        summary.mean_detection_ms,
        summary.mean_description_ms,
    );
    Ok(RunReport {
        detector,
        descriptor,
        matcher: settings.matcher,
        selector: settings.selector,
        summary,
    })
}
