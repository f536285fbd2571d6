use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use domecal_core::PixelCoord;
use domecal_pipeline::{
    format_centroid_list, io::write_text_file, load_json_file, pair_with_canonical_directions,
    read_centroid_list, run_calibration, run_simulation, run_warp_to_file, write_json_file,
    CalibrationConfig, CalibrationInput, CalibrationReport, SimulationConfig, WarpConfig,
};
use log::{info, warn};
use serde::Serialize;

/// Calibration CLI for spherical-mirror dome displays.
#[derive(Debug, Parser)]
#[command(author, version, about = "Dome display calibration pipeline")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fit the rig geometry to measured correspondences.
    #[command(group(ArgGroup::new("data").required(true).args(["input", "centroids"])))]
    Calibrate {
        /// JSON file containing CalibrationInput.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Centroid list of the reference calibration image.
        #[arg(long)]
        centroids: Option<PathBuf>,
        /// Optional JSON CalibrationConfig. Defaults are used if omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where to write the JSON report (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build the warp table of a calibrated display.
    Warp {
        /// JSON CalibrationReport produced by `calibrate`.
        #[arg(long)]
        report: PathBuf,
        /// Optional JSON WarpConfig describing the source image.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Warp table file, `.exr` or `.json`.
        #[arg(long)]
        output: PathBuf,
    },
    /// Synthesize reference correspondences for a known rig.
    Simulate {
        /// Optional JSON SimulationConfig.
        #[arg(long)]
        config: Option<PathBuf>,
        /// `.json` writes CalibrationInput, anything else a centroid list.
        #[arg(long)]
        output: PathBuf,
    },
}

fn config_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match path {
        Some(path) => Ok(load_json_file(path)?),
        None => Ok(T::default()),
    }
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => write_json_file(path, value)?,
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn calibrate_from_files(
    input: Option<&Path>,
    centroids: Option<&Path>,
    config: Option<&Path>,
) -> Result<CalibrationReport> {
    let input: CalibrationInput = match (input, centroids) {
        (Some(path), _) => load_json_file(path)?,
        (None, Some(path)) => pair_with_canonical_directions(&read_centroid_list(path)?)
            .with_context(|| format!("pairing centroids from {}", path.display()))?,
        (None, None) => bail!("either --input or --centroids is required"),
    };
    let config: CalibrationConfig = config_or_default(config)?;
    Ok(run_calibration(&input, &config)?)
}

fn simulate_to_file(config: Option<&Path>, output: &Path) -> Result<usize> {
    let config: SimulationConfig = config_or_default(config)?;
    let input = run_simulation(&config)?;
    let is_json = output
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        write_json_file(output, &input)?;
    } else {
        let pixels: Vec<PixelCoord> = input
            .correspondences
            .iter()
            .map(|r| PixelCoord::new(r.pixel_row, r.pixel_col))
            .collect();
        write_text_file(output, &format_centroid_list(&pixels))?;
    }
    Ok(input.correspondences.len())
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match args.command {
        Command::Calibrate {
            input,
            centroids,
            config,
            output,
        } => {
            let report =
                calibrate_from_files(input.as_deref(), centroids.as_deref(), config.as_deref())?;
            emit_json(&report, output.as_deref())?;
            if !report.converged {
                bail!("geometry fit did not converge ({})", report.termination);
            }
        }
        Command::Warp {
            report,
            config,
            output,
        } => {
            let report: CalibrationReport = load_json_file(&report)?;
            let config: WarpConfig = config_or_default(config.as_deref())?;
            if !report.converged {
                warn!("building a warp table from an unconverged fit");
            }
            let summary = run_warp_to_file(&report.display(), &config, &output)?;
            info!("wrote {}", output.display());
            emit_json(&summary, None)?;
        }
        Command::Simulate { config, output } => {
            let count = simulate_to_file(config.as_deref(), &output)?;
            info!("wrote {count} correspondences to {}", output.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use domecal_core::{GeometryParam, GeometryParameters, PlaneOffset, ProjectorIntrinsics};
    use std::fs;

    fn write_json<T: Serialize>(value: &T, path: &Path) {
        serde_json::to_writer_pretty(fs::File::create(path).unwrap(), value).unwrap();
    }

    fn small_intrinsics() -> ProjectorIntrinsics {
        ProjectorIntrinsics::from_throw_ratio(160, 90, 1.39, 0.15)
    }

    fn gauge_fixed_config() -> CalibrationConfig {
        CalibrationConfig {
            intrinsics: small_intrinsics(),
            initial_geometry: GeometryParameters {
                mirror_radius: 22.86,
                dome_radius: 67.0,
                plane_x: 0.0,
                projector: PlaneOffset::new(-77.5, 1.0),
                dome_center: PlaneOffset::new(1.5, 11.5),
                observer: PlaneOffset::new(23.5, 19.5),
            },
            fixed: vec![GeometryParam::MirrorRadius],
            ..Default::default()
        }
    }

    #[test]
    fn arguments_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn simulate_calibrate_and_warp_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let sim_config = dir.path().join("simulation.json");
        let data = dir.path().join("data.json");
        let config = dir.path().join("config.json");
        write_json(
            &SimulationConfig {
                intrinsics: small_intrinsics(),
                ..Default::default()
            },
            &sim_config,
        );
        write_json(&gauge_fixed_config(), &config);

        let count = simulate_to_file(Some(&sim_config), &data).unwrap();
        assert_eq!(count, 37);

        let report = calibrate_from_files(Some(&data), None, Some(&config)).unwrap();
        assert!(report.converged, "termination {}", report.termination);
        assert!(
            (report.geometry.dome_radius - 70.0).abs() < 1e-3,
            "dome radius {}",
            report.geometry.dome_radius
        );

        let report_path = dir.path().join("report.json");
        emit_json(&report, Some(&report_path)).unwrap();
        let report: CalibrationReport = load_json_file(&report_path).unwrap();

        let table = dir.path().join("warp.exr");
        let summary = run_warp_to_file(&report.display(), &WarpConfig::default(), &table).unwrap();
        assert!(table.exists());
        assert_eq!(summary.width, 160);
        assert!(summary.mapped > 0);
    }

    #[test]
    fn centroid_list_input_matches_json_input() {
        let dir = tempfile::tempdir().unwrap();
        let sim_config = dir.path().join("simulation.json");
        let centroids = dir.path().join("centroids.txt");
        let config = dir.path().join("config.json");
        write_json(
            &SimulationConfig {
                intrinsics: small_intrinsics(),
                ..Default::default()
            },
            &sim_config,
        );
        write_json(&gauge_fixed_config(), &config);

        simulate_to_file(Some(&sim_config), &centroids).unwrap();
        let text = fs::read_to_string(&centroids).unwrap();
        assert_eq!(text.lines().count(), 37);

        let report = calibrate_from_files(None, Some(&centroids), Some(&config)).unwrap();
        assert!(report.converged);
        assert_eq!(report.points.len(), 37);
    }

    #[test]
    fn short_centroid_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let centroids = dir.path().join("centroids.txt");
        fs::write(&centroids, "row, column\n10, 20\n30, 40\n").unwrap();
        let err = calibrate_from_files(None, Some(&centroids), None).unwrap_err();
        assert!(format!("{err:#}").contains("expected 37"), "message: {err:#}");
    }
}
