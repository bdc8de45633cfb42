// wfc-core/tests/entropy_tests.rs
use wfc_core::entropy::select_lowest_entropy_cell;
use wfc_core::field::{empty_field, prefix_field};
use wfc_core::grid::Grid;
use wfc_core::{Distribution, EntropyHeuristic, Superposition};

fn cell_of(tiles: &[usize]) -> Superposition {
    let mut candidates = empty_field(8);
    for &tile in tiles {
        candidates.set(tile, true);
    }
    Superposition::new(candidates)
}

#[test]
fn test_weighted_count_without_distribution_is_candidate_count() {
    let candidates = prefix_field(8, 5);
    let entropy = EntropyHeuristic::WeightedCount.measure(&candidates, None);
    assert!((entropy - 5.0).abs() < f32::EPSILON);
}

#[test]
fn test_shannon_prefers_skewed_weights() {
    // Same candidate count, but a dominant tile makes the outcome more certain.
    let even = Distribution::from_weights(&[1.0, 1.0, 1.0, 1.0]).unwrap();
    let skewed = Distribution::from_weights(&[10.0, 0.1, 0.1, 0.1]).unwrap();
    let candidates = prefix_field(8, 4);
    let h_even = EntropyHeuristic::Shannon.measure(&candidates, Some(&even));
    let h_skewed = EntropyHeuristic::Shannon.measure(&candidates, Some(&skewed));
    assert!(h_skewed < h_even, "{} should be below {}", h_skewed, h_even);
}

#[test]
fn test_find_lowest_entropy() {
    let mut grid = Grid::filled(3, 1, cell_of(&[0, 1, 2, 3]));
    *grid.get_mut(2, 0).unwrap() = cell_of(&[1, 2]);
    let selected = select_lowest_entropy_cell(&mut grid, None, EntropyHeuristic::WeightedCount);
    assert_eq!(selected, Some(2));
}

#[test]
fn test_find_lowest_entropy_ties_pick_first() {
    let mut grid = Grid::filled(3, 3, cell_of(&[0, 1]));
    // Equal entropy everywhere: the first cell in row-major order wins.
    let selected = select_lowest_entropy_cell(&mut grid, None, EntropyHeuristic::Shannon);
    assert_eq!(selected, Some(0));

    // Collapse the first row: the next open cell is (0, 1).
    for x in 0..3 {
        *grid.get_mut(x, 0).unwrap() = cell_of(&[0]);
    }
    let selected = select_lowest_entropy_cell(&mut grid, None, EntropyHeuristic::Shannon);
    assert_eq!(selected, grid.index(0, 1));
}

#[test]
fn test_find_lowest_entropy_single_cell() {
    let mut grid = Grid::filled(1, 1, cell_of(&[3, 4]));
    assert_eq!(
        select_lowest_entropy_cell(&mut grid, None, EntropyHeuristic::WeightedCount),
        Some(0)
    );
    *grid.get_mut(0, 0).unwrap() = cell_of(&[4]);
    assert_eq!(
        select_lowest_entropy_cell(&mut grid, None, EntropyHeuristic::WeightedCount),
        None
    );
}
