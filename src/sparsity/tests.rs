// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use super::*;

fn ids(range: std::ops::Range<i64>) -> Vec<Id> {
    range.map(Id::from).collect()
}

/// 3 units, 4 channels.
fn get_sparsity() -> ChannelSparsity {
    let mask = array![
        [true, false, true, false],
        [false, true, true, false],
        [false, false, false, true]
    ];
    ChannelSparsity::new(mask, ids(0..3), vec!["a".into(), "b".into(), "c".into(), "d".into()])
        .unwrap()
}

fn get_templates() -> Array3<f64> {
    Array3::from_shape_fn((3, 10, 4), |(u, s, c)| (100 * u + 10 * s + c + 1) as f64)
}

#[test]
fn test_derived_views() {
    let sparsity = get_sparsity();
    assert_eq!(sparsity.max_num_active_channels(), 2);
    assert_eq!(sparsity.num_units(), 3);
    assert_eq!(sparsity.num_channels(), 4);

    let indices = sparsity.unit_id_to_channel_indices();
    assert_eq!(indices[&Id::Int(0)], vec![0, 2]);
    assert_eq!(indices[&Id::Int(1)], vec![1, 2]);
    assert_eq!(indices[&Id::Int(2)], vec![3]);

    let chan_ids = sparsity.unit_id_to_channel_ids();
    assert_eq!(chan_ids[&Id::Int(0)], vec![Id::from("a"), Id::from("c")]);
    assert_eq!(chan_ids[&Id::Int(2)], vec![Id::from("d")]);

    // The id and index views must agree with each other.
    for unit_id in sparsity.unit_ids() {
        let from_indices: Vec<Id> = sparsity
            .channel_indices(unit_id)
            .unwrap()
            .iter()
            .map(|&i| sparsity.channel_ids()[i].clone())
            .collect();
        assert_eq!(from_indices, sparsity.channel_ids_of(unit_id).unwrap());
    }
}

#[test]
fn test_views_are_cached() {
    let sparsity = get_sparsity();
    let first = sparsity.unit_id_to_channel_indices() as *const _;
    let second = sparsity.unit_id_to_channel_indices() as *const _;
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_first_access() {
    let sparsity = get_sparsity();
    let addresses: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| sparsity.unit_id_to_channel_ids() as *const _ as usize))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(sparsity.unit_id_to_channel_ids()[&Id::Int(1)].len(), 2);
}

#[test]
fn test_bad_mask_shape() {
    let result = ChannelSparsity::new(Array2::from_elem((3, 3), true), ids(0..3), ids(0..4));
    assert!(matches!(
        result,
        Err(SparsityError::MaskShape {
            mask: (3, 3),
            num_units: 3,
            num_channels: 4
        })
    ));
}

#[test]
fn test_duplicate_ids() {
    let result = ChannelSparsity::new(
        Array2::from_elem((2, 2), true),
        vec![Id::Int(5), Id::Int(5)],
        ids(0..2),
    );
    assert!(matches!(result, Err(SparsityError::DuplicateId { kind: "unit", .. })));
}

#[test]
fn test_no_units() {
    let sparsity = ChannelSparsity::new(Array2::from_elem((0, 4), false), vec![], ids(0..4)).unwrap();
    assert_eq!(sparsity.max_num_active_channels(), 0);
    assert_abs_diff_eq!(sparsity.density(), 0.0);
    assert!(sparsity.unit_id_to_channel_indices().is_empty());
    let templates = Array3::<f64>::zeros((0, 10, 4));
    assert_eq!(sparsity.sparsify_templates(templates.view()).unwrap().dim(), (0, 10, 0));
}

#[test]
fn test_create_dense() {
    let sparsity = ChannelSparsity::create_dense(&ids(0..2), &ids(0..3)).unwrap();
    assert!(sparsity.mask().iter().all(|&b| b));
    assert_eq!(sparsity.max_num_active_channels(), 3);
    assert_abs_diff_eq!(sparsity.density(), 1.0);
}

#[test]
fn test_sparsify_templates() {
    let sparsity = get_sparsity();
    let templates = get_templates();
    let sparse = sparsity.sparsify_templates(templates.view()).unwrap();
    assert_eq!(sparse.dim(), (3, 10, 2));

    assert_eq!(sparse.slice(s![0, .., 0]), templates.slice(s![0, .., 0]));
    assert_eq!(sparse.slice(s![0, .., 1]), templates.slice(s![0, .., 2]));
    assert_eq!(sparse.slice(s![1, .., 0]), templates.slice(s![1, .., 1]));
    assert_eq!(sparse.slice(s![1, .., 1]), templates.slice(s![1, .., 2]));
    // Unit 2 has a single active channel; the padding column stays zero.
    assert_eq!(sparse.slice(s![2, .., 0]), templates.slice(s![2, .., 3]));
    assert!(sparse.slice(s![2, .., 1]).iter().all(|&v| v == 0.0));
}

#[test]
fn test_sparsify_templates_wrong_unit_count() {
    let sparsity = get_sparsity();
    let templates = Array3::<f64>::ones((2, 10, 4));
    assert!(matches!(
        sparsity.sparsify_templates(templates.view()),
        Err(SparsityError::TemplateUnitCount { expected: 3, got: 2 })
    ));
}

#[test]
fn test_sparsify_waveforms() {
    let sparsity = get_sparsity();
    let waveforms = Array3::from_shape_fn((5, 10, 4), |(w, s, c)| (w + s + c + 1) as f32);
    let unit_id = Id::Int(1);
    let sparse = sparsity.sparsify_waveforms(waveforms.view(), &unit_id).unwrap();
    assert_eq!(sparse.dim(), (5, 10, 2));
    assert_eq!(sparse.slice(s![.., .., 0]), waveforms.slice(s![.., .., 1]));
    assert_eq!(sparse.slice(s![.., .., 1]), waveforms.slice(s![.., .., 2]));
}

#[test]
fn test_sparsify_is_idempotent() {
    let sparsity = get_sparsity();
    let template = get_templates().slice(s![0, .., ..]).to_owned();
    let unit_id = Id::Int(0);
    let sparse = sparsity
        .sparsify_waveforms(template.view(), &unit_id)
        .unwrap()
        .into_owned();
    let again = sparsity.sparsify_waveforms(sparse.view(), &unit_id).unwrap();
    assert!(again.is_view());
    assert_eq!(again, sparse);
}

#[test]
fn test_densify_inverts_sparsify() {
    let sparsity = get_sparsity();
    let waveforms = Array3::from_shape_fn((3, 5, 4), |(w, s, c)| (w as f64 - 1.5) * (s + c + 1) as f64);
    for unit_id in sparsity.unit_ids() {
        let sparse = sparsity.sparsify_waveforms(waveforms.view(), unit_id).unwrap();
        let dense = sparsity.densify_waveforms(sparse.view(), unit_id).unwrap();
        assert_eq!(dense.dim(), waveforms.dim());

        let active = sparsity.channel_indices(unit_id).unwrap();
        for i_chan in 0..4 {
            if active.contains(&i_chan) {
                assert_eq!(dense.slice(s![.., .., i_chan]), waveforms.slice(s![.., .., i_chan]));
            } else {
                assert!(dense.slice(s![.., .., i_chan]).iter().all(|&v| v == 0.0));
            }
        }
    }
}

#[test]
fn test_densify_padded_templates() {
    // Templates from `sparsify_templates` carry zero padding beyond a unit's
    // active channels; they must still densify.
    let sparsity = get_sparsity();
    let templates = get_templates();
    let sparse = sparsity.sparsify_templates(templates.view()).unwrap();
    let unit_id = Id::Int(2);
    let dense: Array2<f64> = sparsity
        .densify_waveforms(sparse.slice(s![2, .., ..]), &unit_id)
        .unwrap();
    assert_eq!(dense.dim(), (10, 4));
    assert_eq!(dense.slice(s![.., 3]), templates.slice(s![2, .., 3]));
    assert!(dense.slice(s![.., ..3]).iter().all(|&v| v == 0.0));
}

#[test]
fn test_densify_rejects_non_sparse() {
    let sparsity = get_sparsity();
    let waveforms = Array2::<f64>::ones((10, 4));
    let result = sparsity.densify_waveforms(waveforms.view(), &Id::Int(2));
    match result {
        Err(e @ SparsityError::NotSparse { .. }) => {
            let msg = e.to_string();
            assert!(msg.contains("The number of active channels is 1"), "{msg}");
            assert!(msg.contains("non-zero values"), "{msg}");
        }
        other => panic!("Expected a NotSparse error, got {other:?}"),
    }
}

#[test]
fn test_unknown_unit() {
    let sparsity = get_sparsity();
    let waveforms = Array2::<f64>::ones((10, 4));
    assert!(matches!(
        sparsity.sparsify_waveforms(waveforms.view(), &Id::from("nope")),
        Err(SparsityError::UnknownUnitId(_))
    ));
}

#[test]
fn test_neither_sparse_nor_dense() {
    let sparsity = get_sparsity();
    let waveforms = Array2::<f64>::ones((10, 3));
    assert!(matches!(
        sparsity.sparsify_waveforms(waveforms.view(), &Id::Int(0)),
        Err(SparsityError::NotDense {
            num_channels: 4,
            got: 3,
            ..
        })
    ));
}

#[test]
fn test_are_waveforms_dense_and_sparse() {
    let sparsity = get_sparsity();
    let dense = Array2::<f64>::ones((10, 4));
    assert!(sparsity.are_waveforms_dense(&dense));
    assert!(!sparsity.are_waveforms_sparse(&dense, &Id::Int(0)).unwrap());

    let mut padded = Array2::<f64>::zeros((10, 4));
    padded.slice_mut(s![.., ..2]).fill(3.0);
    assert!(sparsity.are_waveforms_dense(&padded));
    assert!(sparsity.are_waveforms_sparse(&padded, &Id::Int(0)).unwrap());

    let sparse = Array2::<f64>::ones((10, 2));
    assert!(!sparsity.are_waveforms_dense(&sparse));
    assert!(sparsity.are_waveforms_sparse(&sparse, &Id::Int(1)).unwrap());
}

#[test]
fn test_all_channels_active_looks_sparse() {
    // A unit with every channel active can't be told apart; dense data is
    // handed back unchanged.
    let sparsity = ChannelSparsity::create_dense(&ids(0..1), &ids(0..3)).unwrap();
    let waveforms = Array2::<f64>::ones((4, 3));
    let out = sparsity.sparsify_waveforms(waveforms.view(), &Id::Int(0)).unwrap();
    assert!(out.is_view());
    assert_eq!(out, waveforms);
}

#[test]
fn test_from_unit_id_to_channel_ids() {
    let mut map = IndexMap::new();
    map.insert(Id::Int(0), vec![Id::from("a"), Id::from("c")]);
    map.insert(Id::Int(1), vec![Id::from("b"), Id::from("c")]);
    map.insert(Id::Int(2), vec![Id::from("d")]);
    let sparsity = ChannelSparsity::from_unit_id_to_channel_ids(
        &map,
        ids(0..3),
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
    )
    .unwrap();
    assert_eq!(sparsity, get_sparsity());

    map.insert(Id::Int(2), vec![Id::from("z")]);
    let result = ChannelSparsity::from_unit_id_to_channel_ids(
        &map,
        ids(0..3),
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
    );
    assert!(matches!(result, Err(SparsityError::UnknownChannelId(Id::Str(s))) if s == "z"));

    let result = ChannelSparsity::from_unit_id_to_channel_ids(
        &map,
        ids(0..2),
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
    );
    assert!(matches!(result, Err(SparsityError::UnknownUnitId(Id::Int(2)))));
}

#[test]
fn test_dict_round_trip() {
    let sparsity = get_sparsity();
    let dict = sparsity.to_dict();
    assert_eq!(dict.unit_ids, ids(0..3));
    assert_eq!(ChannelSparsity::from_dict(&dict).unwrap(), sparsity);
}

#[test]
fn test_dict_round_trip_through_json() {
    let sparsity = get_sparsity();
    let json = serde_json::to_string(&sparsity.to_dict()).unwrap();
    // Integer unit ids become string keys.
    assert!(json.contains(r#""0":["a","c"]"#), "{json}");

    let dict: SparsityDict = serde_json::from_str(&json).unwrap();
    assert!(dict.unit_id_to_channel_ids.contains_key(&Id::from("0")));
    assert!(!dict.unit_id_to_channel_ids.contains_key(&Id::Int(0)));
    assert_eq!(dict.unit_ids, ids(0..3));
    assert_eq!(ChannelSparsity::from_dict(&dict).unwrap(), sparsity);
}

#[test]
fn test_from_dict_missing_unit() {
    let mut dict = get_sparsity().to_dict();
    dict.unit_id_to_channel_ids.shift_remove(&Id::Int(1));
    assert!(matches!(
        ChannelSparsity::from_dict(&dict),
        Err(SparsityError::MissingDictEntry(Id::Int(1)))
    ));
}

#[test]
fn test_dict_files() {
    let sparsity = get_sparsity();
    let tmp_dir = tempfile::tempdir().unwrap();
    for filename in ["sparsity.json", "sparsity.toml"] {
        let path = tmp_dir.path().join(filename);
        sparsity.to_dict().write(&path).unwrap();
        let dict = SparsityDict::read(&path).unwrap();
        assert_eq!(ChannelSparsity::from_dict(&dict).unwrap(), sparsity, "{filename}");
    }

    let path = tmp_dir.path().join("sparsity.yaml");
    assert!(matches!(
        sparsity.to_dict().write(&path),
        Err(SparsityDictFileError::UnrecognisedExtension(_))
    ));
}

#[test]
fn test_display() {
    let sparsity = get_sparsity();
    assert_eq!(
        sparsity.to_string(),
        "ChannelSparsity - units: 3 - channels: 4 - density, P(x=1): 0.42"
    );
}
