//! Signal-strength weighted triangulation.
//!
//! The estimate is the strength-weighted mean of the dataset coordinates of
//! every visible cell the dataset knows. Accuracy is a heuristic that
//! improves with the number of cells used:
//!
//! ```text
//! accuracy = max(2500, 10000 - 1000 * resolved_cells)   (meters)
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::cache::CellResolver;
use crate::cell::CellObservation;
use crate::position::LocationFix;

/// Best accuracy the heuristic will ever claim, in meters.
pub const MINIMUM_ACCURACY_METERS: f64 = 2500.0;

/// Accuracy with zero cells, before per-cell improvement.
pub const BASE_ACCURACY_METERS: f64 = 10_000.0;

/// Improvement per resolved cell.
pub const PER_CELL_IMPROVEMENT_METERS: f64 = 1000.0;

/// Accuracy heuristic parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangulationConfig {
    pub minimum_accuracy: f64,
    pub base_accuracy: f64,
    pub per_cell_improvement: f64,
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            minimum_accuracy: MINIMUM_ACCURACY_METERS,
            base_accuracy: BASE_ACCURACY_METERS,
            per_cell_improvement: PER_CELL_IMPROVEMENT_METERS,
        }
    }
}

impl TriangulationConfig {
    pub fn accuracy_for(&self, resolved_cells: usize) -> f64 {
        let estimate = self.base_accuracy - self.per_cell_improvement * resolved_cells as f64;
        estimate.max(self.minimum_accuracy)
    }
}

/// Result of one triangulation.
#[derive(Debug, Clone, Copy)]
pub enum Estimate {
    Fix(LocationFix),
    /// No visible cell could be placed, or none had any signal.
    InsufficientData,
}

impl Estimate {
    pub fn fix(self) -> Option<LocationFix> {
        match self {
            Estimate::Fix(fix) => Some(fix),
            Estimate::InsufficientData => None,
        }
    }
}

/// Triangulate a position from the visible cells.
pub fn estimate<R: CellResolver + ?Sized>(
    observations: &[CellObservation],
    resolver: &mut R,
    now_ms: u64,
    config: &TriangulationConfig,
) -> Estimate {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(observations.len());
    let mut total_strength = 0.0_f64;

    for observation in observations {
        if !seen.insert(observation.cell) {
            continue;
        }
        if let Some(coords) = resolver.resolve(&observation.cell).coordinates() {
            debug!(cell = %observation.cell, location = %coords, strength = observation.signal_strength, "Resolved cell");
            let strength = f64::from(observation.signal_strength);
            total_strength += strength;
            resolved.push((coords, strength));
        }
    }

    if resolved.is_empty() {
        debug!(cells = observations.len(), "No visible cell found in dataset");
        return Estimate::InsufficientData;
    }
    if total_strength <= 0.0 {
        debug!(cells = resolved.len(), "Resolved cells carry no signal strength");
        return Estimate::InsufficientData;
    }

    let mut latitude = 0.0;
    let mut longitude = 0.0;
    for (coords, strength) in &resolved {
        let weight = strength / total_strength;
        latitude += coords.latitude * weight;
        longitude += coords.longitude * weight;
    }

    let accuracy = config.accuracy_for(resolved.len());
    match resolved.len() {
        1 => debug!(accuracy, "Only one cell resolved, position will be extremely inaccurate"),
        2 => debug!(accuracy, "Only two cells resolved, position will be highly inaccurate"),
        n => debug!(cells = n, accuracy, "Triangulated position"),
    }

    Estimate::Fix(LocationFix::new(now_ms, latitude, longitude, accuracy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Resolution;
    use crate::cell::{CellTechnology, Coordinates, UniqueCellId};
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapResolver(HashMap<UniqueCellId, Coordinates>);

    impl CellResolver for MapResolver {
        fn resolve(&mut self, id: &UniqueCellId) -> Resolution {
            match self.0.get(id) {
                Some(c) => Resolution::Resolved(*c),
                None => Resolution::Unresolvable,
            }
        }
    }

    fn cell(cid: u32) -> UniqueCellId {
        UniqueCellId::new(CellTechnology::Gsm, cid, 100, 244, 5)
    }

    fn resolver(cells: &[(u32, f64, f64)]) -> MapResolver {
        MapResolver(
            cells
                .iter()
                .map(|&(cid, lat, lon)| (cell(cid), Coordinates::new(lat, lon)))
                .collect(),
        )
    }

    fn run(observations: &[(u32, u32)], resolver: &mut MapResolver) -> Estimate {
        let observations: Vec<_> = observations
            .iter()
            .map(|&(cid, s)| CellObservation::new(cell(cid), s))
            .collect();
        estimate(&observations, resolver, 1_000, &TriangulationConfig::default())
    }

    #[test]
    fn test_no_resolved_cells_is_insufficient() {
        let mut resolver = resolver(&[]);
        assert!(matches!(run(&[(1, 10)], &mut resolver), Estimate::InsufficientData));
        assert!(matches!(run(&[], &mut resolver), Estimate::InsufficientData));
    }

    #[test]
    fn test_zero_total_strength_is_insufficient() {
        let mut resolver = resolver(&[(1, 10.0, 10.0), (2, 20.0, 20.0)]);
        assert!(matches!(
            run(&[(1, 0), (2, 0)], &mut resolver),
            Estimate::InsufficientData
        ));
    }

    #[test]
    fn test_single_cell_returns_its_coordinates() {
        let mut resolver = resolver(&[(1, 60.0, 25.0)]);
        let fix = run(&[(1, 7), (9, 50)], &mut resolver).fix().unwrap();
        assert_eq!(fix.latitude, 60.0);
        assert_eq!(fix.longitude, 25.0);
        assert_eq!(fix.accuracy.horizontal, 9000.0);
        assert!(fix.altitude.is_nan());
        assert_eq!(fix.timestamp_ms, 1_000);
    }

    #[test]
    fn test_weighted_average_of_two_cells() {
        let mut resolver = resolver(&[(1, 10.0, 10.0), (2, 20.0, 20.0)]);
        let fix = run(&[(1, 1), (2, 3)], &mut resolver).fix().unwrap();
        assert!((fix.latitude - 17.5).abs() < 1e-9);
        assert!((fix.longitude - 17.5).abs() < 1e-9);
        assert_eq!(fix.accuracy.horizontal, 8000.0);
    }

    #[test]
    fn test_equal_strengths_give_centroid() {
        let mut resolver = resolver(&[(1, 0.0, 0.0), (2, 0.0, 6.0), (3, 3.0, 3.0)]);
        let fix = run(&[(1, 4), (2, 4), (3, 4)], &mut resolver).fix().unwrap();
        assert!((fix.latitude - 1.0).abs() < 1e-9);
        assert!((fix.longitude - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_observations_count_once() {
        let mut resolver = resolver(&[(1, 10.0, 10.0), (2, 20.0, 20.0)]);
        let fix = run(&[(1, 1), (1, 1), (2, 1)], &mut resolver).fix().unwrap();
        assert!((fix.latitude - 15.0).abs() < 1e-9);
        assert_eq!(fix.accuracy.horizontal, 8000.0);
    }

    #[test]
    fn test_accuracy_floors_at_minimum() {
        let config = TriangulationConfig::default();
        assert_eq!(config.accuracy_for(0), 10_000.0);
        assert_eq!(config.accuracy_for(7), 3000.0);
        assert_eq!(config.accuracy_for(8), 2500.0);
        assert_eq!(config.accuracy_for(40), 2500.0);
    }

    proptest! {
        #[test]
        fn test_estimate_stays_within_bounding_box(
            cells in prop::collection::vec((-80.0f64..80.0, -170.0f64..170.0, 1u32..1000), 1..12)
        ) {
            let entries: Vec<_> = cells
                .iter()
                .enumerate()
                .map(|(i, &(lat, lon, _))| (i as u32, lat, lon))
                .collect();
            let observations: Vec<_> = cells
                .iter()
                .enumerate()
                .map(|(i, &(_, _, s))| (i as u32, s))
                .collect();
            let mut resolver = resolver(&entries);
            let fix = run(&observations, &mut resolver).fix().unwrap();

            let min_lat = cells.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
            let max_lat = cells.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
            let min_lon = cells.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
            let max_lon = cells.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(fix.latitude >= min_lat - 1e-9 && fix.latitude <= max_lat + 1e-9);
            prop_assert!(fix.longitude >= min_lon - 1e-9 && fix.longitude <= max_lon + 1e-9);
            prop_assert!(fix.accuracy.horizontal >= MINIMUM_ACCURACY_METERS);
        }

        #[test]
        fn test_scaling_all_strengths_keeps_estimate(
            cells in prop::collection::vec((-80.0f64..80.0, -170.0f64..170.0, 1u32..100), 1..8),
            factor in 2u32..50,
        ) {
            let entries: Vec<_> = cells
                .iter()
                .enumerate()
                .map(|(i, &(lat, lon, _))| (i as u32, lat, lon))
                .collect();
            let base: Vec<_> = cells.iter().enumerate().map(|(i, c)| (i as u32, c.2)).collect();
            let scaled: Vec<_> = cells.iter().enumerate().map(|(i, c)| (i as u32, c.2 * factor)).collect();

            let mut resolver = resolver(&entries);
            let a = run(&base, &mut resolver).fix().unwrap();
            let b = run(&scaled, &mut resolver).fix().unwrap();
            prop_assert!((a.latitude - b.latitude).abs() < 1e-6);
            prop_assert!((a.longitude - b.longitude).abs() < 1e-6);
        }
    }
}
