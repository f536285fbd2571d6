use domecal_core::synthetic::CANONICAL_DIRECTION_COUNT;
use domecal_core::{
    DomeDisplay, GeometryParam, GeometryParameters, PixelCoord, PlaneOffset, ProjectorIntrinsics,
};
use domecal_pipeline::{
    format_centroid_list, pair_with_canonical_directions, read_centroid_list, run_calibration,
    run_simulation, run_warp, CalibrationConfig, CalibrationInput, SimulationConfig, WarpConfig,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Rig guess a few units off the scenario geometry in every scalar.
fn initial_guess() -> GeometryParameters {
    GeometryParameters {
        mirror_radius: 23.5,
        dome_radius: 67.0,
        plane_x: 0.0,
        projector: PlaneOffset::new(-77.5, 1.0),
        dome_center: PlaneOffset::new(1.5, 11.5),
        observer: PlaneOffset::new(23.5, 19.5),
    }
}

fn pixels(input: &CalibrationInput) -> Vec<PixelCoord> {
    input
        .correspondences
        .iter()
        .map(|r| PixelCoord::new(r.pixel_row, r.pixel_col))
        .collect()
}

#[test]
fn reference_directions_sit_where_the_rig_puts_them() {
    init_logging();
    let input = run_simulation(&SimulationConfig::default()).unwrap();
    assert_eq!(input.correspondences.len(), CANONICAL_DIRECTION_COUNT);

    let straight_ahead = &input.correspondences[4];
    assert_eq!((straight_ahead.yaw_deg, straight_ahead.pitch_deg), (0.0, 0.0));
    assert!(
        (straight_ahead.pixel_col - 640.0).abs() < 1e-4,
        "yaw 0 column {}",
        straight_ahead.pixel_col
    );
    let zenith = &input.correspondences[36];
    assert!((zenith.pixel_col - 640.0).abs() < 1e-4, "zenith column {}", zenith.pixel_col);
    assert!(zenith.pixel_row < straight_ahead.pixel_row);

    // Mirror-image yaws land on mirror-image columns.
    for (left, right) in [(0, 8), (10, 16), (21, 23)] {
        let (l, r) = (&input.correspondences[left], &input.correspondences[right]);
        assert_eq!(l.yaw_deg, -r.yaw_deg);
        assert!((l.pixel_row - r.pixel_row).abs() < 1e-4);
        assert!(
            (l.pixel_col + r.pixel_col - 1280.0).abs() < 1e-4,
            "columns {} and {}",
            l.pixel_col,
            r.pixel_col
        );
    }
}

#[test]
fn all_free_fit_recovers_the_scenario_rig() {
    init_logging();
    let input = run_simulation(&SimulationConfig::default()).unwrap();
    let config = CalibrationConfig {
        initial_geometry: initial_guess(),
        ..Default::default()
    };

    let report = run_calibration(&input, &config).unwrap();
    assert!(report.converged, "termination {}", report.termination);
    assert!(report.final_cost < 1e-12, "final cost {}", report.final_cost);
    assert_eq!(report.unreachable, 0);
    assert!(report.max_angular_error_deg < 1e-4);

    let g = report.geometry;
    assert!((g.dome_radius - 70.0).abs() < 1.0, "dome radius {}", g.dome_radius);
    assert!((g.mirror_radius - 22.86).abs() < 0.5, "mirror radius {}", g.mirror_radius);

    // The fit may settle on a uniformly scaled copy of the rig.
    let s = g.mirror_radius / 22.86;
    let truth = GeometryParameters::default().scaled(s);
    assert!((g.projector.y - truth.projector.y).abs() < 1e-3 * s);
    assert!((g.observer.z - truth.observer.z).abs() < 1e-3 * s);

    let straight_ahead = &input.correspondences[4];
    let v = report
        .display()
        .viewing_direction(PixelCoord::new(straight_ahead.pixel_row, straight_ahead.pixel_col))
        .unwrap();
    assert!(v.x.abs() < 1e-5, "horizontal component {}", v.x);
    let fitted_yaw = report.points[4].fitted_yaw_deg.unwrap();
    assert!(fitted_yaw.abs() < 1e-4, "fitted yaw {fitted_yaw}");
}

#[test]
fn centroid_file_feeds_the_same_fit() {
    init_logging();
    let simulated = run_simulation(&SimulationConfig::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("centroids.txt");
    let text = format!(
        "calibration image centroids\nrow, column\n{}",
        format_centroid_list(&pixels(&simulated))
    );
    std::fs::write(&path, text).unwrap();

    let centroids = read_centroid_list(&path).unwrap();
    let input = pair_with_canonical_directions(&centroids).unwrap();
    for (a, b) in input.correspondences.iter().zip(&simulated.correspondences) {
        assert!((a.pixel_row - b.pixel_row).abs() < 1e-9);
        assert!((a.pixel_col - b.pixel_col).abs() < 1e-9);
        assert_eq!((a.yaw_deg, a.pitch_deg), (b.yaw_deg, b.pitch_deg));
    }

    let mut guess = initial_guess();
    guess.mirror_radius = 22.86;
    let config = CalibrationConfig {
        initial_geometry: guess,
        fixed: vec![GeometryParam::MirrorRadius],
        ..Default::default()
    };
    let report = run_calibration(&input, &config).unwrap();
    assert!(report.converged);
    let truth = GeometryParameters::default();
    assert!((report.geometry.dome_radius - truth.dome_radius).abs() < 1e-4);
    assert!((report.geometry.dome_center.z - truth.dome_center.z).abs() < 1e-4);
}

#[test]
fn warp_of_a_small_display_covers_only_reachable_pixels() {
    init_logging();
    let display = DomeDisplay::new(
        ProjectorIntrinsics::from_throw_ratio(160, 90, 1.39, 0.15),
        GeometryParameters::default(),
    );
    let output = run_warp(&display, &WarpConfig::default());

    assert_eq!((output.table.width(), output.table.height()), (160, 90));
    let summary = output.summary;
    assert_eq!(summary.mapped + summary.unmapped, 160 * 90);
    assert!(summary.mapped > 0 && summary.unmapped > 0, "{summary:?}");
    assert!(output.table.get(0, 0).is_none());

    let fov = summary.field_of_view.unwrap();
    assert!(fov.max_pitch_deg > 80.0 && fov.min_pitch_deg < 0.0, "{fov:?}");
}
