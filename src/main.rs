mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cli::Cli;
use islandviz::color::ColorSampler;
use islandviz::config::{self, Config};
use islandviz::host::replay::ReplayHost;
use islandviz::surface::{style, TerminalSurface};
use islandviz::{AnalysisSet, SourceRef, TrackInfo, Visualizer};

/// Used when the analysis cannot be read and no --seconds was given.
const FALLBACK_RUN_SECS: f64 = 10.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut cfg = match config::discover_config(cli.config.as_deref()) {
        Some(path) => {
            let cfg = config::load_config(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };
    // CLI values apply only when changed from their defaults
    if cli.fps != 60 {
        cfg.driver.fps = cli.fps;
    }
    if cli.normalize_frame_time {
        cfg.physics.normalize_frame_time = true;
    }
    cfg.validate().context("Invalid configuration")?;

    if cli.print_css {
        let fallback = ColorSampler::new(&cfg.color).fallback_sample();
        print!("{}", style::stylesheet(&fallback, cfg.physics.floor));
        println!("{}", style::container_markup());
        return Ok(());
    }

    let analysis_src = cli
        .analysis
        .as_deref()
        .context("--analysis is required (path or URL to an audio-analysis JSON)")?;
    let analysis_ref = SourceRef::parse(analysis_src);

    // The visualizer fetches through the host on its own; this read only sizes the run.
    let track_secs = match analysis_ref
        .load_bytes()
        .map_err(anyhow::Error::from)
        .and_then(|bytes| AnalysisSet::from_json(bytes).map_err(anyhow::Error::from))
    {
        Ok(analysis) => {
            log::info!(
                "Track: {} segments, {} beats, {:.1}s",
                analysis.segments().len(),
                analysis.beats().len(),
                analysis.duration()
            );
            Some(analysis.duration())
        }
        Err(err) => {
            log::warn!("Could not read analysis ({}); bars will stay at rest", err);
            None
        }
    };
    let run_secs = cli
        .seconds
        .or_else(|| track_secs.map(|d| (d - cli.start).max(0.0)))
        .unwrap_or(FALLBACK_RUN_SECS);
    let run = Duration::try_from_secs_f64(run_secs)
        .with_context(|| format!("Invalid run length {}s", run_secs))?;
    let step = cli
        .toggle_every
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .with_context(|| format!("Invalid --toggle-every {}s", secs))
        })
        .transpose()?
        .filter(|step| !step.is_zero());

    let host = Arc::new(ReplayHost::new());
    host.load_track(
        TrackInfo {
            id: cli.track_id.clone(),
            artwork: cli.artwork.as_deref().map(SourceRef::parse),
        },
        analysis_ref,
    );
    host.seek(cli.start * 1000.0);

    let mut viz = Visualizer::new(host.clone(), TerminalSurface::new(), cfg);
    viz.mount_with_retry().context("Failed to mount visualizer")?;
    host.play();

    log::info!("Playing from {:.1}s for {:.1}s", cli.start, run_secs);
    let deadline = Instant::now() + run;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match step {
            Some(step) => {
                std::thread::sleep(step.min(remaining));
                if Instant::now() < deadline {
                    host.toggle();
                }
            }
            None => std::thread::sleep(remaining),
        }
    }

    viz.unmount();
    log::info!("Done");
    Ok(())
}
