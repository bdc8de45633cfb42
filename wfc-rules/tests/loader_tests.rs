use proptest::prelude::*;
use std::io::Write;
use tempfile::{tempdir, Builder};
use wfc_core::{RenderTag, Side, TileId, TileSetError};
use wfc_rules::loader::load_from_file;
use wfc_rules::{EdgeSpec, LoadError, RuleFile, TileDefinition};

// Helper function to create the full path to test data
fn test_data_path(filename: &str) -> std::path::PathBuf {
    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("rules_data");
    path.push(filename);
    path
}

#[test]
fn test_load_valid_simple() {
    let path = test_data_path("valid_simple.ron");
    let rules = load_from_file(&path).expect("valid_simple.ron should load");

    let tileset = rules.tileset.tileset();
    assert_eq!(tileset.tile_count(), 2);
    assert_eq!(tileset.edge_limit(), 8);
    assert_eq!(tileset.tile_limit(), 8);
    assert!((rules.distribution.weight(TileId(0)) - 1.0).abs() < f32::EPSILON);
    assert!((rules.distribution.weight(TileId(1)) - 2.0).abs() < f32::EPSILON);

    // Same labels meet, different labels never do.
    assert!(tileset.compatible(TileId(0), Side::Right, TileId(0), Side::Left));
    assert!(tileset.compatible(TileId(1), Side::Top, TileId(1), Side::Bottom));
    assert!(!tileset.compatible(TileId(0), Side::Right, TileId(1), Side::Left));
}

#[test]
fn test_load_json_matches_ron() {
    let from_ron = load_from_file(&test_data_path("valid_simple.ron")).unwrap();
    let from_json = load_from_file(&test_data_path("valid_simple.json")).unwrap();
    assert_eq!(from_ron.names, from_json.names);
    assert_eq!(from_ron.distribution, from_json.distribution);
    for id in 0..2 {
        let tile = TileId(id);
        assert_eq!(
            from_ron.tileset.tileset().edges(tile),
            from_json.tileset.tileset().edges(tile)
        );
    }
}

#[test]
fn test_load_coast_with_variants() {
    let rules = load_from_file(&test_data_path("coast.ron")).unwrap();
    assert_eq!(rules.tile_count(), 6);
    assert_eq!(rules.tileset.tileset().tile_limit(), 16);

    let shore_west = rules.tile_id("shore_west").unwrap();
    assert_eq!(
        rules.tileset.tileset().render_tag(shore_west),
        Some(RenderTag::new(2, 2))
    );
    let beach = rules.tile_id("beach").unwrap();
    assert_eq!(rules.distribution.weight(beach), 0.0);

    let flowers = rules.tile_id("flowers").unwrap();
    assert!(rules.tileset.is_variant_tile(flowers));
    let variants = rules.tileset.variants(flowers).unwrap();
    assert_eq!(
        variants.tags(),
        &[RenderTag::new(5, 0), RenderTag::new(6, 1)]
    );
}

#[test]
fn test_load_invalid_dup_name() {
    let result = load_from_file(&test_data_path("invalid_dup_name.ron"));
    match result {
        Err(LoadError::InvalidData(msg)) => assert!(msg.contains("Duplicate tile name: A")),
        other => panic!("Expected InvalidData error for duplicate name, got {other:?}"),
    }
}

#[test]
fn test_load_invalid_neg_weight() {
    let result = load_from_file(&test_data_path("invalid_neg_weight.ron"));
    match result {
        Err(LoadError::InvalidData(msg)) => {
            assert!(msg.contains("Tile B"), "unexpected message: {msg}");
            assert!(msg.contains("Invalid weight"), "unexpected message: {msg}");
        }
        other => panic!("Expected InvalidData error for negative weight, got {other:?}"),
    }
}

#[test]
fn test_load_invalid_edge_limit() {
    let result = load_from_file(&test_data_path("invalid_edge_limit.ron"));
    assert!(matches!(
        result,
        Err(LoadError::TileSet(TileSetError::EdgeLimitExceeded { edge: 12, limit: 8 }))
    ));
}

#[test]
fn test_load_empty_tiles() {
    let result = load_from_file(&test_data_path("empty_tiles.ron"));
    assert!(matches!(result, Err(LoadError::InvalidData(msg)) if msg.contains("No tiles")));
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let result = load_from_file(&dir.path().join("missing.ron"));
    assert!(matches!(result, Err(LoadError::Io(_))));
}

#[test]
fn test_load_unsupported_extension() {
    let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "tiles: []").unwrap();
    let result = load_from_file(file.path());
    assert!(matches!(result, Err(LoadError::UnsupportedFormat(ext)) if ext == ".yaml"));
}

#[test]
fn test_load_malformed_ron() {
    let mut file = Builder::new().suffix(".ron").tempfile().unwrap();
    writeln!(file, "(tiles: [(name: \"A\", edges: Diagonal(3))])").unwrap();
    let result = load_from_file(file.path());
    assert!(matches!(result, Err(LoadError::ParseError(_))));
}

proptest! {
    #[test]
    fn prop_written_rules_load_back(labels in proptest::collection::vec(0u32..30, 1..12)) {
        let file = RuleFile {
            edge_limit: 0,
            tile_limit: 0,
            tiles: labels
                .iter()
                .enumerate()
                .map(|(i, &label)| TileDefinition {
                    name: format!("t{i}"),
                    texture: i as u16,
                    transformation: 0,
                    edges: EdgeSpec::Axis { horizontal: label, vertical: 0 },
                    weight: 1.0,
                    variants: Vec::new(),
                })
                .collect(),
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.ron");
        std::fs::write(&path, ron::to_string(&file).unwrap()).unwrap();

        let rules = load_from_file(&path).unwrap();
        prop_assert_eq!(rules.tile_count(), labels.len());
        for (i, &label) in labels.iter().enumerate() {
            prop_assert_eq!(rules.tileset.tileset().edge(TileId(i), Side::Left), Some(label));
            let name = format!("t{i}");
            prop_assert_eq!(rules.name(TileId(i)), Some(name.as_str()));
        }
    }
}
