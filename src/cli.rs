use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "islandviz", about = "Replay a track analysis as an audio-reactive bar indicator")]
pub struct Cli {
    /// Audio-analysis JSON (file path or http(s) URL)
    #[arg(short, long)]
    pub analysis: Option<String>,

    /// Artwork image used for the bar color (file path or http(s) URL)
    #[arg(long)]
    pub artwork: Option<String>,

    /// Track identifier reported by the simulated player
    #[arg(long, default_value = "local-track")]
    pub track_id: String,

    /// Start position in seconds
    #[arg(long, default_value_t = 0.0, value_parser = parse_seconds)]
    pub start: f64,

    /// How long to play, in seconds (defaults to the rest of the track)
    #[arg(long, value_parser = parse_seconds)]
    pub seconds: Option<f64>,

    /// Pause and resume every N seconds to exercise play/pause handling
    #[arg(long, value_parser = parse_seconds)]
    pub toggle_every: Option<f64>,

    /// Frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Scale attack/decay by the real frame interval
    #[arg(long)]
    pub normalize_frame_time: bool,

    /// Config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the container stylesheet and markup, then exit
    #[arg(long)]
    pub print_css: bool,
}

/// A finite, non-negative number of seconds.
fn parse_seconds(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if secs.is_finite() && secs >= 0.0 {
        Ok(secs)
    } else {
        Err(format!("'{}' must be a finite, non-negative number of seconds", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_must_be_finite_and_non_negative() {
        assert_eq!(parse_seconds("2.5"), Ok(2.5));
        assert_eq!(parse_seconds("0"), Ok(0.0));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("NaN").is_err());
        assert!(parse_seconds("inf").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn bad_durations_are_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["islandviz", "--seconds", "-3"]).is_err());
        assert!(Cli::try_parse_from(["islandviz", "--toggle-every", "nan"]).is_err());
        let cli = Cli::try_parse_from(["islandviz", "-a", "a.json", "--seconds", "4"]).unwrap();
        assert_eq!(cli.seconds, Some(4.0));
        assert_eq!(cli.start, 0.0);
    }
}
