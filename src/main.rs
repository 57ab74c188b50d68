use anyhow::Context;
use std::path::{Path, PathBuf};
use trackmap_lib::capture::input::types::Dataset;
use trackmap_lib::capture::monitor::MonitorLayout;
use trackmap_lib::cli::{Cli, Commands};
use trackmap_lib::commands::render::{export_image, get_colour_presets};
use trackmap_lib::commands::tracking::{
    get_channel_stats, load_events, load_profile, replay_events, save_profile, TrackerState,
};
use trackmap_lib::config::EngineConfig;
use trackmap_lib::recorder::state::{ColourSpec, RenderRequest};
use trackmap_lib::Tracker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    trackmap_lib::init_tracing(cli.verbose);

    tracing::info!("Starting trackmap v{}", env!("CARGO_PKG_VERSION"));

    let mut config = EngineConfig::load_or_default(cli.config.as_deref())?;
    let layout = MonitorLayout::unscaled(cli.monitor_rects())?;

    match cli.command {
        Commands::Replay {
            events,
            profile,
            out,
        } => {
            if let Some(profile) = profile {
                config.capture.default_profile = profile;
            }
            let state = TrackerState::new(Tracker::new(config, layout)?);
            run_replay(&state, &events, &out)?;
        }
        Commands::Render {
            profile,
            dataset,
            out,
            width,
            height,
            colour,
            mode,
            resample,
            format,
            blur,
            clip,
            contrast,
            sampling,
        } => {
            let state = TrackerState::new(Tracker::new(config, layout)?);
            let name = load_profile(&state, &profile).map_err(anyhow::Error::msg)?;

            let mut request = RenderRequest::new(name, dataset, &state.tracker.config().render);
            request.width = width;
            request.height = height;
            request.sampling = sampling;
            if let Some(colour) = colour {
                request.colour = ColourSpec::Named(colour);
            }
            if let Some(mode) = mode {
                request.mode = mode;
            }
            if let Some(resample) = resample {
                request.resample = resample;
            }
            if let Some(format) = format {
                request.format = format;
            }
            if let Some(blur) = blur {
                request.blur_sigma = blur;
            }
            if let Some(clip) = clip {
                request.clip_percentile = clip;
            }
            if let Some(contrast) = contrast {
                request.contrast_exponent = contrast;
            }

            let result = export_image(&state, request, out.clone())
                .await
                .map_err(anyhow::Error::msg)?;
            if result.is_empty() {
                println!("No {} data in {}", dataset, profile.display());
            } else {
                println!("Wrote {}x{} {}", result.width, result.height, out.display());
            }
        }
        Commands::Stats { profile } => {
            let state = TrackerState::new(Tracker::new(config, layout)?);
            let name = load_profile(&state, &profile).map_err(anyhow::Error::msg)?;
            print_stats(&state, &name);
        }
        Commands::Colours => {
            for name in get_colour_presets() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn run_replay(state: &TrackerState, events: &Path, out: &Path) -> anyhow::Result<()> {
    let events = load_events(events).map_err(anyhow::Error::msg)?;
    let total = events.len();
    let applied = replay_events(state, events);
    println!("Applied {}/{} events", applied, total);

    for name in state.tracker.profile_names() {
        let path = profile_path(out, &name);
        save_profile(state, &name, &path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("saving profile '{}'", name))?;
        print_stats(state, &name);
        println!("  saved to {}", path.display());
    }
    Ok(())
}

fn print_stats(state: &TrackerState, profile: &str) {
    println!("{}", profile);
    for stats in get_channel_stats(state, Some(profile)) {
        let dataset = Dataset::Movement(stats.channel);
        let pixels: u64 = state
            .tracker
            .snapshot(profile, dataset)
            .values()
            .map(|a| a.total())
            .sum();
        println!(
            "  {:<12} distance={:.1}px events={} pixels={}",
            stats.channel.to_string(),
            stats.distance,
            stats.event_counter,
            pixels
        );
    }
}

/// File name for a profile, with path separators replaced
fn profile_path(dir: &Path, profile: &str) -> PathBuf {
    let safe: String = profile
        .chars()
        .map(|c| if c.is_alphanumeric() || "-_.".contains(c) { c } else { '_' })
        .collect();
    dir.join(format!("{}.json", safe))
}
