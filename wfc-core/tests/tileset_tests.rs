// wfc-core/tests/tileset_tests.rs
use proptest::prelude::*;
use wfc_core::{Edges, RenderTag, Side, TileId, TileSet, TileSetError};

#[test]
fn test_tile_limit_boundary() {
    let mut tileset = TileSet::new(8, 16);
    for n in 0..16 {
        let id = tileset
            .add_tile(RenderTag::new(n as u16, 0), Edges::uniform(0))
            .expect("tile within limit should be accepted");
        assert_eq!(id, TileId(n));
        assert_eq!(tileset.tile_count(), n + 1);
    }
    assert_eq!(
        tileset.add_tile(RenderTag::default(), Edges::uniform(0)),
        Err(TileSetError::TileLimitExceeded { limit: 16 })
    );
    assert_eq!(tileset.tile_count(), 16);
}

#[test]
fn test_edge_helpers_expand_to_four_sides() {
    let mut tileset = TileSet::new(8, 8);
    let uniform = tileset.add_tile(RenderTag::default(), Edges::uniform(3)).unwrap();
    let axis = tileset
        .add_tile(RenderTag::default(), Edges::axis_symmetric(4, 5))
        .unwrap();

    for side in Side::ALL {
        assert_eq!(tileset.edge(uniform, side), Some(3));
    }
    assert_eq!(tileset.edge(axis, Side::Right), Some(4));
    assert_eq!(tileset.edge(axis, Side::Left), Some(4));
    assert_eq!(tileset.edge(axis, Side::Top), Some(5));
    assert_eq!(tileset.edge(axis, Side::Bottom), Some(5));
}

#[test]
fn test_compatible_requires_facing_sides() {
    let mut tileset = TileSet::new(8, 8);
    let a = tileset.add_tile(RenderTag::default(), Edges::new(2, 0, 1, 0)).unwrap();
    let b = tileset.add_tile(RenderTag::default(), Edges::new(1, 0, 2, 0)).unwrap();

    // A's right (2) meets B's left (2): A may sit left of B.
    assert!(tileset.compatible(a, Side::Right, b, Side::Left));
    assert!(tileset.compatible(b, Side::Left, a, Side::Right));
    // Same labels on non-facing sides never match.
    assert!(!tileset.compatible(a, Side::Right, b, Side::Right));
    assert!(!tileset.compatible(a, Side::Top, b, Side::Left));
    // Top/bottom both carry 0.
    assert!(tileset.compatible(a, Side::Top, b, Side::Bottom));
}

#[test]
fn test_render_tag_packing() {
    let tag = RenderTag::new(0x1234, 0x00AB);
    assert_eq!(tag.raw(), 0x00AB_1234);
    assert_eq!(tag.texture_id(), 0x1234);
    assert_eq!(tag.transformation(), 0x00AB);
}

fn edges_strategy(edge_limit: u32) -> impl Strategy<Value = Edges> {
    (0..edge_limit, 0..edge_limit, 0..edge_limit, 0..edge_limit)
        .prop_map(|(r, t, l, b)| Edges::new(r, t, l, b))
}

proptest! {
    #[test]
    fn prop_tile_count_tracks_successful_adds(tile_limit in 1usize..40, extra in 0usize..5) {
        let mut tileset = TileSet::new(8, tile_limit);
        let limit = tileset.tile_limit();
        for n in 0..limit {
            prop_assert_eq!(tileset.add_tile(RenderTag::default(), Edges::uniform(1)), Ok(TileId(n)));
        }
        for _ in 0..=extra {
            prop_assert_eq!(
                tileset.add_tile(RenderTag::default(), Edges::uniform(1)),
                Err(TileSetError::TileLimitExceeded { limit })
            );
        }
        prop_assert_eq!(tileset.tile_count(), limit);
    }

    #[test]
    fn prop_out_of_range_edge_rejected(
        edge_limit in 1usize..64,
        overshoot in 0u32..100,
        side in 0usize..4,
    ) {
        let mut tileset = TileSet::new(edge_limit, 8);
        let bad = tileset.edge_limit() as u32 + overshoot;
        let mut labels = [0; 4];
        labels[side] = bad;
        let result = tileset.add_tile(
            RenderTag::default(),
            Edges::new(labels[0], labels[1], labels[2], labels[3]),
        );
        prop_assert_eq!(
            result,
            Err(TileSetError::EdgeLimitExceeded { edge: bad, limit: tileset.edge_limit() })
        );
        prop_assert_eq!(tileset.tile_count(), 0);
    }

    #[test]
    fn prop_packed_edges_round_trip(edges in proptest::collection::vec(edges_strategy(24), 1..20)) {
        let mut tileset = TileSet::new(24, 24);
        for e in &edges {
            tileset.add_tile(RenderTag::default(), *e).unwrap();
        }
        for (id, e) in edges.iter().enumerate() {
            prop_assert_eq!(tileset.edges(TileId(id)), Some(*e));
        }
    }

    #[test]
    fn prop_allowed_neighbours_match_pairwise_compatibility(
        edges in proptest::collection::vec(edges_strategy(4), 1..16),
        mask in any::<u16>(),
    ) {
        let mut tileset = TileSet::new(8, 16);
        for e in &edges {
            tileset.add_tile(RenderTag::default(), *e).unwrap();
        }
        let mut candidates = tileset.all_tiles();
        for id in 0..edges.len() {
            candidates.set(id, mask & (1 << id) != 0);
        }

        for side in Side::ALL {
            let allowed = tileset.allowed_neighbours(&candidates, side);
            for neighbour in 0..edges.len() {
                let expected = candidates.iter_ones().any(|source| {
                    tileset.compatible(TileId(source), side, TileId(neighbour), side.opposite())
                });
                prop_assert_eq!(allowed[neighbour], expected, "side {:?}, tile {}", side, neighbour);
            }
        }
    }
}
