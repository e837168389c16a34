use clap::Parser;
use ndarray::{Array1, Array2};
use netcdf::{create, open, AttributeValue};
use std::path::Path;
use tempfile::tempdir;
use voxel_aggregate::cli::Args;
use voxel_aggregate::netcdf_io::{output_variable_name, read_volume_from_path, VolumeWriter};
use voxel_aggregate::pipeline::{aggregate_volumes, init_output, replace_nan, AggregateOptions};
use voxel_aggregate::statistics::{
    descriptive, gini_coefficient, AggregationMode, NormalizationMode, MAX_BINS,
};
use voxel_aggregate::{AggregateError, OutputVolume, Volume, VolumeAttributes};

fn volume(name: &str, values: &[f64]) -> Volume {
    Volume::new(name, values.to_vec(), VolumeAttributes::from_shape(&[2, 2]))
        .expect("Failed to create volume")
}

fn assert_close(actual: f32, expected: f32, tol: f32) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual} (tolerance {tol})"
    );
}

#[test]
fn test_mean_of_identical_volumes() {
    let inputs = vec![
        volume("a", &[1.0, 2.0, 3.0, 4.0]),
        volume("b", &[1.0, 2.0, 3.0, 4.0]),
    ];
    let outcome = aggregate_volumes(inputs, &AggregateOptions::new(AggregationMode::Mean))
        .expect("Aggregation failed");

    assert_eq!(outcome.output.samples(), &[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(outcome.foreground_voxels, 4);
    assert_eq!(outcome.background_voxels, 0);
    assert_eq!(outcome.replaced_nan, 0);
}

#[test]
fn test_stddev_and_median() {
    let inputs = || {
        vec![
            volume("a", &[1.0, 2.0, 3.0, 4.0]),
            volume("b", &[1.0, 2.0, 3.0, 4.0]),
        ]
    };
    let outcome = aggregate_volumes(inputs(), &AggregateOptions::new(AggregationMode::StDev))
        .expect("Aggregation failed");
    assert_eq!(outcome.output.samples(), &[0.0; 4]);

    let inputs = vec![
        volume("a", &[1.0, 10.0, 3.0, 4.0]),
        volume("b", &[2.0, 20.0, 3.0, 4.0]),
        volume("c", &[9.0, 30.0, 3.0, 4.0]),
    ];
    let outcome = aggregate_volumes(inputs, &AggregateOptions::new(AggregationMode::Median))
        .expect("Aggregation failed");
    assert_eq!(outcome.output.samples(), &[2.0, 20.0, 3.0, 4.0]);
}

#[test]
fn test_gini_of_equal_values_is_zero() {
    let inputs = vec![volume("a", &[10.0; 4]), volume("b", &[10.0; 4])];
    let outcome = aggregate_volumes(inputs, &AggregateOptions::new(AggregationMode::Gini))
        .expect("Aggregation failed");
    for &value in outcome.output.samples() {
        assert_close(value, 0.0, 1e-6);
    }
}

#[test]
fn test_theil_across_volumes() {
    let inputs = vec![
        volume("a", &[1.0; 4]),
        volume("b", &[2.0; 4]),
        volume("c", &[3.0; 4]),
    ];
    let outcome = aggregate_volumes(inputs, &AggregateOptions::new(AggregationMode::Theil))
        .expect("Aggregation failed");

    // The global minimum is already 1, so no shift is applied
    let expected = ((0.5 * 0.5_f64.ln() + 1.5 * 1.5_f64.ln()) / 3.0) as f32;
    for &value in outcome.output.samples() {
        assert_close(value, expected, 1e-6);
    }
}

#[test]
fn test_entropy_modes() {
    let inputs = vec![volume("a", &[5.0; 4]), volume("b", &[5.0; 4])];
    let outcome = aggregate_volumes(inputs, &AggregateOptions::new(AggregationMode::Entropy))
        .expect("Aggregation failed");
    assert_eq!(outcome.output.samples(), &[0.0; 4]);

    let inputs = vec![volume("a", &[0.0; 4]), volume("b", &[1.0; 4])];
    // The smoothed two-bin histogram stays balanced
    let options = AggregateOptions::new(AggregationMode::Entropy)
        .with_bins(2)
        .with_parzen(true);
    let outcome = aggregate_volumes(inputs, &options).expect("Aggregation failed");
    for &value in outcome.output.samples() {
        assert_close(value, 2.0_f32.ln(), 1e-6);
    }
}

#[test]
fn test_union_policy() {
    let inputs = vec![
        volume("a", &[0.0, 2.0, 3.0, 4.0]),
        volume("b", &[1.0, 2.0, 3.0, 4.0]),
    ];
    let options = AggregateOptions::new(AggregationMode::Mean).with_padding(0.0);
    let outcome = aggregate_volumes(inputs, &options).expect("Aggregation failed");

    // Voxel 0 is foreground in b only and averages over that single value
    assert_eq!(outcome.output.samples(), &[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(outcome.background_voxels, 0);
}

#[test]
fn test_intersection_policy() {
    let inputs = || {
        vec![
            volume("a", &[0.0, 2.0, 3.0, 4.0]),
            volume("b", &[1.0, 2.0, 3.0, 4.0]),
        ]
    };

    // The mean leaves background voxels NaN, which cleanup moves below the minimum
    let options = AggregateOptions::new(AggregationMode::Mean)
        .with_padding(0.0)
        .with_intersection(true);
    let outcome = aggregate_volumes(inputs(), &options).expect("Aggregation failed");
    assert_eq!(outcome.background_voxels, 1);
    assert_eq!(outcome.replaced_nan, 1);
    assert_close(outcome.output.get(0), 2.0 - 1e-3, 1e-7);
    assert_eq!(&outcome.output.samples()[1..], &[2.0, 3.0, 4.0]);

    // Every other mode fills background with 1e-3
    let options = AggregateOptions::new(AggregationMode::Median)
        .with_padding(0.0)
        .with_intersection(true);
    let outcome = aggregate_volumes(inputs(), &options).expect("Aggregation failed");
    assert_eq!(outcome.output.get(0), 1e-3);
    assert_eq!(outcome.replaced_nan, 0);
}

#[test]
fn test_gini_union_and_intersection() {
    let inputs = || {
        vec![
            volume("a", &[0.0, 5.0, 5.0, 5.0]),
            volume("b", &[5.0, 5.0, 5.0, 5.0]),
        ]
    };

    // After the shift a holds [0, 1, 1, 1] and b holds [1, 1, 1, 1]
    let options = AggregateOptions::new(AggregationMode::Gini).with_padding(0.0);
    let outcome = aggregate_volumes(inputs(), &options).expect("Aggregation failed");
    assert_close(outcome.output.get(0), 0.5, 1e-5);
    for &value in &outcome.output.samples()[1..] {
        assert_close(value, 0.0, 1e-6);
    }

    let options = options.with_intersection(true);
    let outcome = aggregate_volumes(inputs(), &options).expect("Aggregation failed");
    assert_eq!(outcome.output.get(0), 1e-3);
    assert_eq!(outcome.background_voxels, 1);
}

#[test]
fn test_normalization_before_aggregation() {
    // b is an affine copy of a, so both z-scores coincide
    let inputs = vec![
        volume("a", &[1.0, 2.0, 3.0, 4.0]),
        volume("b", &[2.0, 4.0, 6.0, 8.0]),
    ];
    let options =
        AggregateOptions::new(AggregationMode::Mean).with_normalization(NormalizationMode::ZScore);
    let outcome = aggregate_volumes(inputs, &options).expect("Aggregation failed");

    let sigma = 1.25_f64.sqrt();
    for (i, &value) in outcome.output.samples().iter().enumerate() {
        let expected = ((i as f64 + 1.0 - 2.5) / sigma) as f32;
        assert_close(value, expected, 1e-6);
    }
}

#[test]
fn test_nan_cleanup() {
    // Without padding, NaN samples are background
    let inputs = vec![
        volume("a", &[f64::NAN, 2.0, 3.0, 4.0]),
        volume("b", &[f64::NAN, 2.0, 5.0, 6.0]),
    ];
    let outcome = aggregate_volumes(inputs, &AggregateOptions::new(AggregationMode::Mean))
        .expect("Aggregation failed");
    assert_eq!(outcome.replaced_nan, 1);
    assert_close(outcome.output.get(0), 2.0 - 1e-3, 1e-7);
    assert!(outcome.output.samples().iter().all(|v| !v.is_nan()));

    // An all-background mean has no minimum and falls back to 0
    let inputs = vec![volume("a", &[0.0; 4]), volume("b", &[0.0; 4])];
    let options = AggregateOptions::new(AggregationMode::Mean).with_padding(0.0);
    let outcome = aggregate_volumes(inputs, &options).expect("Aggregation failed");
    assert_eq!(outcome.foreground_voxels, 0);
    assert_eq!(outcome.replaced_nan, 4);
    for &value in outcome.output.samples() {
        assert_close(value, -1e-3, 1e-9);
    }
}

#[test]
fn test_output_stages() {
    let mut a = volume("a", &[f64::NAN, 1.0, f64::NAN, 2.0]);
    let mut b = volume("b", &[f64::NAN, f64::NAN, 3.0, 4.0]);
    a.set_background_value(f64::NAN);
    b.set_background_value(f64::NAN);
    let volumes = vec![a, b];

    let union = init_output(&volumes, -7.0, false);
    assert_eq!(union.samples(), &[-7.0, 0.0, 0.0, 0.0]);
    let intersection = init_output(&volumes, -7.0, true);
    assert_eq!(intersection.samples(), &[-7.0, -7.0, -7.0, 0.0]);
    assert!(!intersection.is_foreground(0));
    assert!(intersection.is_foreground(3));

    let mut output = OutputVolume::filled(VolumeAttributes::from_shape(&[3]), f32::NAN, f32::NAN);
    output.put(1, 4.0);
    assert_eq!(replace_nan(&mut output), 2);
    assert_close(output.get(0), 4.0 - 1e-3, 1e-7);
    assert_eq!(output.get(1), 4.0);
}

#[test]
fn test_error_conditions() {
    // Fewer than two inputs
    let result = aggregate_volumes(
        vec![volume("a", &[1.0; 4])],
        &AggregateOptions::new(AggregationMode::Mean),
    );
    match result {
        Err(AggregateError::NotEnoughInputs { required, given }) => {
            assert_eq!(required, 2);
            assert_eq!(given, 1);
        }
        other => panic!("Expected NotEnoughInputs error, got {other:?}"),
    }

    // Different grid
    let other = Volume::new("b", vec![1.0; 4], VolumeAttributes::from_shape(&[4])).unwrap();
    let result = aggregate_volumes(
        vec![volume("a", &[1.0; 4]), other],
        &AggregateOptions::new(AggregationMode::Mean),
    );
    match result {
        Err(AggregateError::GeometryMismatch { name }) => assert_eq!(name, "b"),
        other => panic!("Expected GeometryMismatch error, got {other:?}"),
    }

    // Same shape, different dimension names
    let other = Volume::new(
        "c",
        vec![1.0; 4],
        VolumeAttributes::new(vec!["y".into(), "x".into()], vec![2, 2]),
    )
    .unwrap();
    let result = aggregate_volumes(
        vec![volume("a", &[1.0; 4]), other],
        &AggregateOptions::new(AggregationMode::Mean),
    );
    assert!(matches!(result, Err(AggregateError::GeometryMismatch { .. })));

    // No foreground for an inequality measure
    let options = AggregateOptions::new(AggregationMode::Gini).with_padding(0.0);
    let result = aggregate_volumes(
        vec![volume("a", &[0.0; 4]), volume("b", &[0.0; 4])],
        &options,
    );
    match result {
        Err(err @ AggregateError::NoForeground { .. }) => {
            assert!(err.to_string().contains("padding value of 0"));
        }
        other => panic!("Expected NoForeground error, got {other:?}"),
    }

    // Negative alpha
    let options = AggregateOptions::new(AggregationMode::EntropyIndex).with_alpha(-1.0);
    let result = aggregate_volumes(
        vec![volume("a", &[1.0; 4]), volume("b", &[2.0; 4])],
        &options,
    );
    assert!(matches!(result, Err(AggregateError::InvalidArgument { .. })));

    // Too many histogram bins
    let options = AggregateOptions::new(AggregationMode::Entropy).with_bins(MAX_BINS + 1);
    let result = aggregate_volumes(
        vec![volume("a", &[1.0; 4]), volume("b", &[2.0; 4])],
        &options,
    );
    assert!(matches!(result, Err(AggregateError::InvalidArgument { .. })));
}

fn large_volume(name: &str, value: impl Fn(usize) -> f64) -> Volume {
    let data = (0..1000).map(value).collect();
    Volume::new(name, data, VolumeAttributes::from_shape(&[10, 10, 10]))
        .expect("Failed to create volume")
}

#[test]
fn test_large_volume_matches_serial_computation() {
    let inputs = || {
        vec![
            large_volume("a", |i| i as f64),
            large_volume("b", |i| 2.0 * i as f64 + 1.0),
            large_volume("c", |i| ((i * 7) % 13) as f64),
        ]
    };
    let column = |i: usize| vec![i as f64, 2.0 * i as f64 + 1.0, ((i * 7) % 13) as f64];

    let outcome = aggregate_volumes(inputs(), &AggregateOptions::new(AggregationMode::Mean))
        .expect("Aggregation failed");
    assert_eq!(outcome.foreground_voxels, 1000);
    for (i, &value) in outcome.output.samples().iter().enumerate() {
        let expected = descriptive::mean(&column(i)) as f32;
        assert_close(value, expected, 1e-4);
    }

    // The global minimum is 0, so every sample is shifted up by one
    let outcome = aggregate_volumes(inputs(), &AggregateOptions::new(AggregationMode::Gini))
        .expect("Aggregation failed");
    for (i, &value) in outcome.output.samples().iter().enumerate() {
        let mut shifted: Vec<f64> = column(i).iter().map(|x| x + 1.0).collect();
        let expected = gini_coefficient(&mut shifted) as f32;
        assert_close(value, expected, 1e-6);
    }
}

#[test]
fn test_cli_parsing() {
    let args = Args::try_parse_from([
        "aggregate-volumes",
        "ge",
        "a.nc",
        "b.nc",
        "c.nc",
        "--output",
        "out.nc",
        "--padding",
        "-1",
        "--alpha",
        "2",
        "--normalization",
        "--parzen",
    ])
    .expect("Failed to parse arguments");
    assert_eq!(args.mode, AggregationMode::EntropyIndex);
    assert_eq!(args.inputs.len(), 3);
    assert_eq!(args.padding, Some(-1.0));
    assert_eq!(args.normalization, NormalizationMode::ZScore);
    assert!(args.parzen);
    assert!(!args.intersection);

    let options = args.aggregate_options();
    assert_eq!(options.alpha, 2.0);
    assert_eq!(options.padding, -1.0);

    let args = Args::try_parse_from([
        "aggregate-volumes",
        "mean",
        "a.nc",
        "b.nc",
        "-o",
        "out.nc",
        "--normalize",
        "unit",
        "--intersection=yes",
    ])
    .expect("Failed to parse arguments");
    assert_eq!(args.normalization, NormalizationMode::UnitRange);
    assert!(args.intersection);
    assert!(args.aggregate_options().padding.is_nan());

    let args = Args::try_parse_from([
        "aggregate-volumes",
        "entropy",
        "a.nc",
        "b.nc",
        "-o",
        "out.nc",
        "--bins",
        "1000000",
    ])
    .expect("Failed to parse arguments");
    assert!(args.aggregate_options().aggregation_function().is_err());

    // A single input is rejected
    assert!(Args::try_parse_from(["aggregate-volumes", "mean", "a.nc", "-o", "out.nc"]).is_err());
    // Unknown mode
    assert!(
        Args::try_parse_from(["aggregate-volumes", "max", "a.nc", "b.nc", "-o", "out.nc"])
            .is_err()
    );
}

fn write_input(path: &Path, values: [f32; 4]) {
    let mut file = create(path).expect("Failed to create NetCDF file");
    file.add_dimension("y", 2).expect("Failed to add dimension y");
    file.add_dimension("x", 2).expect("Failed to add dimension x");

    // Coordinate variable, skipped when looking for the volume variable
    let mut coord = file
        .add_variable::<f64>("x", &["x"])
        .expect("Failed to add coordinate variable");
    coord
        .put(Array1::from_vec(vec![0.0_f64, 1.0]).view(), ..)
        .expect("Failed to write coordinates");

    let mut var = file
        .add_variable::<f32>("intensity", &["y", "x"])
        .expect("Failed to add variable");
    var.put_attribute("units", "a.u.")
        .expect("Failed to add attribute");
    let data = Array2::from_shape_vec((2, 2), values.to_vec()).expect("Failed to create array");
    var.put(data.view(), ..).expect("Failed to write data");
}

#[test]
fn test_netcdf_round_trip() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path_a = temp_dir.path().join("a.nc");
    let path_b = temp_dir.path().join("b.nc");
    let output_path = temp_dir.path().join("mean.nc");

    write_input(&path_a, [0.0, 2.0, 4.0, 6.0]);
    write_input(&path_b, [0.0, 4.0, 8.0, 10.0]);

    let volumes = vec![
        read_volume_from_path(&path_a, None).expect("Failed to read a"),
        read_volume_from_path(&path_b, None).expect("Failed to read b"),
    ];
    assert_eq!(volumes[0].attributes().dimensions, vec!["y", "x"]);
    assert_eq!(volumes[0].attributes().shape, vec![2, 2]);

    let options = AggregateOptions::new(AggregationMode::Mean).with_padding(0.0);
    let outcome = aggregate_volumes(volumes, &options).expect("Aggregation failed");

    let var_name = output_variable_name("intensity", &options);
    assert_eq!(var_name, "intensity_mean");
    {
        let reference = open(&path_a).expect("Failed to open reference");
        VolumeWriter::new(&reference, &output_path)
            .write_output(&outcome.output, &var_name, "intensity", &options, 2)
            .expect("Failed to write output");
    }

    let file = open(&output_path).expect("Failed to open output");
    let var = file.variable("intensity_mean").expect("Variable not found");
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    assert_eq!(dims, vec!["y", "x"]);

    let values = var.get_values::<f32, _>(..).expect("Failed to read output");
    assert_close(values[0], 3.0 - 1e-3, 1e-6);
    assert_eq!(&values[1..], &[3.0, 6.0, 8.0]);

    match var.attribute("units").map(|a| a.value()) {
        Some(Ok(AttributeValue::Str(units))) => assert_eq!(units, "a.u."),
        other => panic!("Expected copied units attribute, got {other:?}"),
    }
    match var.attribute("aggregation_mode").map(|a| a.value()) {
        Some(Ok(AttributeValue::Str(mode))) => assert_eq!(mode, "mean"),
        other => panic!("Expected aggregation_mode attribute, got {other:?}"),
    }
    match var.attribute("input_count").map(|a| a.value()) {
        Some(Ok(AttributeValue::Int(count))) => assert_eq!(count, 2),
        other => panic!("Expected input_count attribute, got {other:?}"),
    }
    assert!(file.attribute("history").is_some());
}

#[test]
fn test_missing_variable() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("a.nc");
    write_input(&path, [1.0, 2.0, 3.0, 4.0]);

    match read_volume_from_path(&path, Some("density")) {
        Err(AggregateError::VariableNotFound { var }) => assert_eq!(var, "density"),
        other => panic!("Expected VariableNotFound error, got {other:?}"),
    }
}
