//! Command-Line Interface

use crate::capture::input::types::Dataset;
use crate::capture::monitor::{MonitorRect, Resolution};
use crate::processing::compositor::{MergeMode, PixelFormat, Resample};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// trackmap - accumulate pointer tracks and render them as images
#[derive(Parser, Debug)]
#[command(name = "trackmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Monitor resolution, e.g. 2560x1440; repeat for monitors laid out left to right
    #[arg(short, long, global = true, value_parser = parse_resolution)]
    pub monitor: Vec<Resolution>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Feed a recorded event list through the tracker and save every profile
    Replay {
        /// JSON array of tracker events
        events: PathBuf,

        /// Profile active before the first profile change
        #[arg(short, long)]
        profile: Option<String>,

        /// Directory receiving one <profile>.json per profile
        #[arg(short, long, default_value = "profiles")]
        out: PathBuf,
    },

    /// Render a saved profile to a PNG
    Render {
        /// Saved profile
        profile: PathBuf,

        /// cursor, left-stick, right-stick, clicks-left, clicks-middle or clicks-right
        #[arg(short, long, default_value = "cursor")]
        dataset: Dataset,

        /// Output image
        #[arg(short, long)]
        out: PathBuf,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Preset or gradient name such as Ice or BlackToRedToWhite
        #[arg(long)]
        colour: Option<String>,

        /// sum or max
        #[arg(long)]
        mode: Option<MergeMode>,

        /// nearest or area
        #[arg(long)]
        resample: Option<Resample>,

        /// luma, rgb or rgba
        #[arg(long)]
        format: Option<PixelFormat>,

        #[arg(long)]
        blur: Option<f64>,

        /// Clip the normalisation ceiling at this percentile of non-zero pixels
        #[arg(long)]
        clip: Option<f64>,

        #[arg(long)]
        contrast: Option<f64>,

        #[arg(long, default_value = "1")]
        sampling: u32,
    },

    /// Print per-channel stats of a saved profile
    Stats {
        profile: PathBuf,
    },

    /// List the preset colour maps
    Colours,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Monitors from `--monitor`, side by side, or a single 1920x1080 one
    pub fn monitor_rects(&self) -> Vec<MonitorRect> {
        if self.monitor.is_empty() {
            return vec![MonitorRect::from_origin(0, 0, 1920, 1080)];
        }
        let mut x = 0i32;
        self.monitor
            .iter()
            .map(|resolution| {
                let rect = MonitorRect::from_origin(x, 0, resolution.width, resolution.height);
                x = rect.x2;
                rect
            })
            .collect()
    }
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width: u32 = width.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let height: u32 = height.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    if width == 0 || height == 0 {
        return Err("monitor dimensions must be > 0".to_string());
    }
    if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
        return Err(format!("monitor dimensions must be at most {}", i32::MAX));
    }
    Ok(Resolution::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::input::types::{Channel, MouseButton};

    #[test]
    fn test_parse_render_args() {
        let cli = Cli::try_parse_from([
            "trackmap",
            "render",
            "main.json",
            "--dataset",
            "clicks-left",
            "--out",
            "out.png",
            "--mode",
            "sum",
            "--monitor",
            "2560x1440",
            "--monitor",
            "1920x1080",
        ])
        .unwrap();

        match &cli.command {
            Commands::Render { dataset, mode, .. } => {
                assert_eq!(*dataset, Dataset::Clicks(MouseButton::Left));
                assert_eq!(*mode, Some(MergeMode::Sum));
            }
            other => panic!("unexpected command {:?}", other),
        }
        let rects = cli.monitor_rects();
        assert_eq!(rects[1], MonitorRect::new(2560, 0, 4480, 1080));
    }

    #[test]
    fn test_default_dataset_and_monitor() {
        let cli = Cli::try_parse_from(["trackmap", "render", "p.json", "-o", "x.png"]).unwrap();
        match cli.command {
            Commands::Render { dataset, .. } => {
                assert_eq!(dataset, Dataset::Movement(Channel::Cursor))
            }
            _ => unreachable!(),
        }
        assert_eq!(cli.monitor_rects(), vec![MonitorRect::new(0, 0, 1920, 1080)]);
    }

    #[test]
    fn test_bad_resolution() {
        assert!(parse_resolution("1920").is_err());
        assert!(parse_resolution("0x10").is_err());
        assert_eq!(parse_resolution("800X600"), Ok(Resolution::new(800, 600)));
        assert!(parse_resolution("2147483648x10").is_err());
        assert!(parse_resolution("10x4294967295").is_err());
        assert!(parse_resolution("2147483647x10").is_ok());
    }
}
