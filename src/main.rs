use std::path::PathBuf;
use std::process::exit;

use keypoint_bench::{
    combinations, default_combinations, render_table, run_sweep, DescriptorType, DetectorType,
    MatcherType, SelectorType, Settings,
};
use log::{error, info};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "keypoint-bench",
    about = "Times OpenCV keypoint detectors, descriptors and matchers on an image sequence"
)]
struct Opt {
    /// JSON settings file, see `keypoint_bench::Settings`.
    ///
    /// Fields missing from the file keep their defaults.
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Detector to run: SHITOMASI, HARRIS, FAST, BRISK, ORB, AKAZE or SIFT.
    ///
    /// May be repeated. Without detectors and descriptors the default sweep runs.
    #[structopt(short, long)]
    detector: Vec<DetectorType>,
    /// Descriptor to run: BRISK, BRIEF, ORB, FREAK, AKAZE or SIFT.
    ///
    /// May be repeated. Unsupported detector / descriptor pairs are left out.
    #[structopt(short = "e", long)]
    descriptor: Vec<DescriptorType>,
    /// MAT_BF or MAT_FLANN.
    #[structopt(short, long)]
    matcher: Option<MatcherType>,
    /// SEL_NN or SEL_KNN.
    #[structopt(short, long)]
    selector: Option<SelectorType>,
    /// Distance ratio for SEL_KNN.
    #[structopt(long)]
    ratio: Option<f32>,
    /// Directory the sequence's file prefix is relative to.
    #[structopt(short, long, parse(from_os_str))]
    images: Option<PathBuf>,
    /// Keep only the strongest keypoints of every frame.
    #[structopt(long)]
    max_keypoints: Option<usize>,
    /// Use keypoints from the whole frame instead of the region of interest.
    #[structopt(long)]
    no_focus: bool,
    /// Show the matches of every frame and wait for a key press.
    #[structopt(long)]
    visualize: bool,
    /// Write keypoint renderings of every frame into this directory.
    #[structopt(long, parse(from_os_str))]
    renders: Option<PathBuf>,
    /// Write the per run summaries as JSON.
    #[structopt(short, long, parse(from_os_str))]
    report: Option<PathBuf>,
}

impl Opt {
    fn settings(&self) -> keypoint_bench::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(images) = &self.images {
            settings.sequence.base_path = images.clone();
        }
        if let Some(matcher) = self.matcher {
            settings.matcher = matcher;
        }
        if let Some(selector) = self.selector {
            settings.selector = selector;
        }
        if let Some(ratio) = self.ratio {
            settings.ratio = ratio;
        }
        if self.max_keypoints.is_some() {
            settings.max_keypoints = self.max_keypoints;
        }
        if self.no_focus {
            settings.focus = None;
        }
        settings.visualize |= self.visualize;
        if self.renders.is_some() {
            settings.keypoint_renders = self.renders.clone();
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn run(opt: &Opt) -> keypoint_bench::Result<()> {
    let settings = opt.settings()?;
    let combos = if opt.detector.is_empty() && opt.descriptor.is_empty() {
        default_combinations()
    } else {
        let detectors = if opt.detector.is_empty() {
            DetectorType::ALL.to_vec()
        } else {
            opt.detector.clone()
        };
        let descriptors = if opt.descriptor.is_empty() {
            DescriptorType::ALL.to_vec()
        } else {
            opt.descriptor.clone()
        };
        combinations(&detectors, &descriptors)
    };
    info!(
        "running {} combinations with {}/{} on {}",
        combos.len(),
        settings.matcher,
        settings.selector,
        settings.sequence.base_path.display()
    );

    let reports = run_sweep(&settings, &combos)?;
    print!("{}", render_table(&reports));

    if let Some(path) = &opt.report {
        std::fs::write(path, serde_json::to_string_pretty(&reports)?)?;
        info!("wrote report to {}", path.display());
    }
    Ok(())
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();
    if let Err(err) = run(&opt) {
        error!("{err}");
        exit(1);
    }
}
