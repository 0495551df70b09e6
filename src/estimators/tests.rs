// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use indexmap::{indexmap, IndexMap};
use ndarray::prelude::*;

use super::*;
use crate::{
    source::{NoiseLevels, Probe, RecordingInfo, SortingInfo, SortingResult, Templates, WaveformsExtension},
    Id,
};

fn ids(n: i64) -> Vec<Id> {
    (0..n).map(Id::from).collect()
}

/// A linear probe with 20 um spacing.
fn get_probe() -> Probe {
    Probe::new(array![[0.0, 0.0], [0.0, 20.0], [0.0, 40.0], [0.0, 60.0]]).unwrap()
}

/// 2 units, 5 samples, 4 channels.
fn get_templates_array() -> Array3<f64> {
    let mut templates = Array3::zeros((2, 5, 4));
    templates[(0, 2, 0)] = -5.0;
    templates[(0, 2, 1)] = -10.0;
    templates[(0, 2, 2)] = -5.0;
    templates[(0, 2, 3)] = -1.0;

    templates[(1, 1, 0)] = 6.0;
    templates[(1, 2, 2)] = -4.0;
    templates[(1, 2, 3)] = -8.0;
    templates
}

fn get_templates() -> Templates {
    Templates::new(
        get_templates_array(),
        30000.0,
        2,
        None,
        ids(4),
        ids(2),
        Some(get_probe()),
    )
    .unwrap()
}

fn get_sorting_result(noise_scaled: bool) -> SortingResult {
    let recording = RecordingInfo {
        channel_ids: ids(4),
        sampling_frequency: 30000.0,
        probe: Some(get_probe()),
        properties: indexmap! {
            "group".to_string() => vec![Id::Int(0), Id::Int(0), Id::Int(1), Id::Int(1)],
        },
    };
    let sorting = SortingInfo {
        unit_ids: ids(2),
        properties: indexmap! {"group".to_string() => vec![Id::Int(1), Id::Int(0)]},
    };

    // 4 waveforms of 2 samples for unit 0, 3 for unit 1.
    let mut wfs0 = Array3::zeros((4, 2, 4));
    wfs0.slice_mut(s![.., .., 0]).fill(3.0);
    let mut wfs1 = Array3::zeros((3, 2, 4));
    wfs1.slice_mut(s![.., .., 2]).fill(1.0);
    wfs1.slice_mut(s![.., .., 3]).fill(5.0);
    let waveforms = WaveformsExtension::new(1, 1, vec![wfs0, wfs1], None).unwrap();

    SortingResult::new(recording, sorting, None)
        .unwrap()
        .with_noise_levels(NoiseLevels {
            values: Array1::ones(4),
            scaled: noise_scaled,
        })
        .unwrap()
        .with_waveforms(waveforms)
        .unwrap()
}

#[test]
fn test_best_channels() {
    let templates = get_templates();

    let sparsity = from_best_channels(&templates, 2, PeakSign::Neg).unwrap();
    // Channels 0 and 2 tie for unit 0; channel 0 comes first.
    assert_eq!(
        sparsity.mask(),
        array![[true, true, false, false], [false, false, true, true]]
    );
    assert_eq!(sparsity.max_num_active_channels(), 2);

    let sparsity = from_best_channels(&templates, 1, PeakSign::Pos).unwrap();
    assert_eq!(sparsity.channel_indices(&Id::Int(1)).unwrap(), &[0]);
}

#[test]
fn test_best_channels_all_channels_is_dense() {
    let templates = get_templates();
    for num_channels in [4, 10] {
        let sparsity = from_best_channels(&templates, num_channels, PeakSign::Neg).unwrap();
        assert!(sparsity.mask().iter().all(|&b| b));
        assert_eq!(sparsity, create_dense(&templates).unwrap());
    }
}

#[test]
fn test_radius() {
    let templates = get_templates();

    let sparsity = from_radius(&templates, 0.0, PeakSign::Neg).unwrap();
    assert_eq!(
        sparsity.mask(),
        array![[false, true, false, false], [false, false, false, true]]
    );

    // Inclusive of the radius.
    let sparsity = from_radius(&templates, 20.0, PeakSign::Neg).unwrap();
    assert_eq!(
        sparsity.mask(),
        array![[true, true, true, false], [false, false, true, true]]
    );
}

#[test]
fn test_radius_needs_locations() {
    let templates =
        Templates::new(get_templates_array(), 30000.0, 2, None, ids(4), ids(2), None).unwrap();
    assert!(matches!(
        from_radius(&templates, 50.0, PeakSign::Neg),
        Err(EstimatorError::Source(SourceError::NoProbe("Templates")))
    ));
}

#[test]
fn test_channel_distances() {
    let distances = channel_distances(array![[0.0, 0.0], [3.0, 4.0], [0.0, 10.0]].view());
    assert_abs_diff_eq!(
        distances,
        array![[0.0, 5.0, 10.0], [5.0, 0.0, 45.0_f64.sqrt()], [10.0, 45.0_f64.sqrt(), 0.0]],
        epsilon = 1e-12
    );
}

#[test]
fn test_snr() {
    let templates = get_templates();
    let noise_levels = Array1::ones(4);

    let sparsity = from_snr(&templates, 5.0, Some(noise_levels.view()), PeakSign::Neg).unwrap();
    // An SNR equal to the threshold is kept.
    assert_eq!(
        sparsity.mask(),
        array![[true, true, true, false], [false, false, false, true]]
    );

    let noise_levels = Array1::from_elem(4, 2.0);
    let sparsity = from_snr(&templates, 2.5, Some(noise_levels.view()), PeakSign::Neg).unwrap();
    assert_eq!(
        sparsity.mask(),
        array![[true, true, true, false], [false, false, false, true]]
    );
}

#[test]
fn test_snr_noise_levels() {
    let templates = get_templates();
    assert!(matches!(
        from_snr(&templates, 5.0, None, PeakSign::Neg),
        Err(EstimatorError::NoiseLevelsRequired {
            method: "snr",
            kind: "Templates"
        })
    ));

    let noise_levels = Array1::ones(3);
    assert!(matches!(
        from_snr(&templates, 5.0, Some(noise_levels.view()), PeakSign::Neg),
        Err(EstimatorError::NoiseLevelCount {
            expected: 4,
            got: 3
        })
    ));

    // The source's noise levels must be scaled...
    let sorting_result = get_sorting_result(false).with_templates(get_templates_array()).unwrap();
    assert!(matches!(
        from_snr(&sorting_result, 5.0, None, PeakSign::Neg),
        Err(EstimatorError::Source(SourceError::NoiseLevelsNotScaled))
    ));
    // ... unless noise levels are supplied.
    let noise_levels = Array1::ones(4);
    let sparsity = from_snr(&sorting_result, 5.0, Some(noise_levels.view()), PeakSign::Neg).unwrap();
    assert_eq!(sparsity.num_active_channels(&Id::Int(0)).unwrap(), 3);

    let sorting_result = get_sorting_result(true).with_templates(get_templates_array()).unwrap();
    let from_source = from_snr(&sorting_result, 5.0, None, PeakSign::Neg).unwrap();
    assert_eq!(from_source, sparsity);
}

#[test]
fn test_dense_source_required() {
    let templates = Templates::new(
        get_templates_array(),
        30000.0,
        2,
        Some(Array2::from_elem((2, 4), true)),
        ids(4),
        ids(2),
        Some(get_probe()),
    )
    .unwrap();
    let noise_levels = Array1::ones(4);

    assert!(matches!(
        from_snr(&templates, 5.0, Some(noise_levels.view()), PeakSign::Neg),
        Err(EstimatorError::DenseSourceRequired {
            method: "snr",
            kind: "Templates"
        })
    ));
    assert!(matches!(
        from_ptp(&templates, 5.0, Some(noise_levels.view())),
        Err(EstimatorError::DenseSourceRequired { method: "ptp", .. })
    ));
    assert!(matches!(
        from_energy(&templates, 5.0),
        Err(EstimatorError::DenseSourceRequired {
            method: "energy",
            ..
        })
    ));

    // Other methods are happy with a sparse source.
    assert!(from_best_channels(&templates, 2, PeakSign::Neg).is_ok());
    assert!(from_radius(&templates, 20.0, PeakSign::Neg).is_ok());
}

#[test]
fn test_ptp() {
    let templates = get_templates();
    let noise_levels = Array1::ones(4);
    let sparsity = from_ptp(&templates, 5.0, Some(noise_levels.view())).unwrap();
    assert_eq!(
        sparsity.mask(),
        array![[true, true, true, false], [true, false, false, true]]
    );
}

#[test]
fn test_energy() {
    let sorting_result = get_sorting_result(true);
    let sparsity = from_energy(&sorting_result, 2.5).unwrap();
    assert_eq!(
        sparsity.mask(),
        array![[true, false, false, false], [false, false, false, true]]
    );

    let sparsity = from_energy(&sorting_result, 0.5).unwrap();
    assert_eq!(
        sparsity.mask(),
        array![[true, false, false, false], [false, false, true, true]]
    );
}

#[test]
fn test_energy_requirements() {
    assert!(matches!(
        from_energy(&get_sorting_result(false), 2.5),
        Err(EstimatorError::Source(SourceError::NoiseLevelsNotScaled))
    ));

    let recording = get_sorting_result(true).recording().clone();
    let sorting = get_sorting_result(true).sorting().clone();
    let without_waveforms = SortingResult::new(recording, sorting, None)
        .unwrap()
        .with_noise_levels(NoiseLevels {
            values: Array1::ones(4),
            scaled: true,
        })
        .unwrap();
    assert!(matches!(
        from_energy(&without_waveforms, 2.5),
        Err(EstimatorError::Source(SourceError::MissingExtension {
            extension: "waveforms",
            ..
        }))
    ));
}

#[test]
fn test_property() {
    let sorting_result = get_sorting_result(true);
    let sparsity = from_property(&sorting_result, "group").unwrap();
    assert_eq!(
        sparsity.mask(),
        array![[false, false, true, true], [true, true, false, false]]
    );
    let expected: IndexMap<Id, Vec<Id>> = indexmap! {
        Id::Int(0) => vec![Id::Int(2), Id::Int(3)],
        Id::Int(1) => vec![Id::Int(0), Id::Int(1)],
    };
    assert_eq!(sparsity.unit_id_to_channel_ids(), &expected);
}

#[test]
fn test_property_errors() {
    assert!(matches!(
        from_property(&get_templates(), "group"),
        Err(EstimatorError::Source(SourceError::MissingProperty {
            side: "recording",
            ..
        }))
    ));

    let sorting_result = get_sorting_result(true);
    let mut recording = sorting_result.recording().clone();
    recording
        .properties
        .insert("shank".to_string(), vec![Id::from("a"); 4]);
    let mut sorting = sorting_result.sorting().clone();
    let with_shank = SortingResult::new(recording.clone(), sorting.clone(), None).unwrap();
    assert!(matches!(
        from_property(&with_shank, "shank"),
        Err(EstimatorError::Source(SourceError::MissingProperty {
            side: "sorting",
            ..
        }))
    ));

    sorting
        .properties
        .insert("shank".to_string(), vec![Id::from("a"), Id::from("b")]);
    let with_shank = SortingResult::new(recording, sorting, None).unwrap();
    match from_property(&with_shank, "shank") {
        Err(EstimatorError::PropertyValueWithoutChannels { property, value }) => {
            assert_eq!(property, "shank");
            assert_eq!(value, Id::from("b"));
        }
        other => panic!("Unexpected result: {other:?}"),
    }
}

#[test]
fn test_no_units() {
    let templates = Templates::new(
        Array3::zeros((0, 5, 4)),
        30000.0,
        2,
        None,
        ids(4),
        vec![],
        Some(get_probe()),
    )
    .unwrap();

    let sparsity = from_best_channels(&templates, 2, PeakSign::Neg).unwrap();
    assert_eq!(sparsity.mask().dim(), (0, 4));
    assert_eq!(sparsity.max_num_active_channels(), 0);

    let sparsity = from_radius(&templates, 50.0, PeakSign::Neg).unwrap();
    assert_eq!(sparsity.num_units(), 0);
}
