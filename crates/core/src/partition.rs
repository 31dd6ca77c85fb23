//! Area locks that serialize concurrent intake for the same category and neighbourhood.
//!
//! The check-then-act sequence in intake (query candidates, then create or increment) is only
//! correct if no other report that could match the same issue runs in between. Reports are keyed
//! by (category, coarse grid cell). A report locks every cell its dedup radius can reach, so two
//! reports within one radius of each other (or of a shared issue) always contend for at least one
//! common cell. Cells hash onto a fixed pool of mutex stripes; stripes are always acquired in
//! ascending index order, so overlapping lock sets cannot deadlock.
//!
//! Reports for different categories, or far apart, take disjoint stripes unless they collide in
//! the hash, which only costs throughput.

use crate::constants::METERS_PER_DEGREE_LATITUDE;
use civic_types::Coordinates;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Poles and very large radii degenerate into "lock everything".
const MAX_CELL_LATITUDE: f64 = 89.0;

#[derive(Debug)]
pub struct AreaLocks {
    stripes: Vec<Mutex<()>>,
    cell_degrees: f64,
}

/// Held stripes. Released on drop.
#[derive(Debug)]
pub struct AreaGuard<'a> {
    stripes: Vec<usize>,
    _guards: Vec<MutexGuard<'a, ()>>,
}

impl AreaGuard<'_> {
    pub fn stripes(&self) -> &[usize] {
        &self.stripes
    }
}

impl AreaLocks {
    /// `cell_degrees` and `stripe_count` come from a validated `CoreConfig`.
    pub fn new(cell_degrees: f64, stripe_count: usize) -> Self {
        Self {
            stripes: (0..stripe_count.max(1)).map(|_| Mutex::new(())).collect(),
            cell_degrees,
        }
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    fn cells_per_row(&self) -> i64 {
        (360.0 / self.cell_degrees).round() as i64
    }

    fn stripe_of(&self, category: &str, row: i64, col: i64) -> usize {
        let mut hasher = DefaultHasher::new();
        category.hash(&mut hasher);
        row.hash(&mut hasher);
        col.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    /// Sorted, de-duplicated stripe indices covering a `radius_meters` disc around `at`.
    pub fn stripes_for(&self, category: &str, at: Coordinates, radius_meters: f64) -> Vec<usize> {
        let all: Vec<usize> = (0..self.stripes.len()).collect();
        let category = category.trim().to_lowercase();

        let d_lat = radius_meters.max(0.0) / METERS_PER_DEGREE_LATITUDE;
        let max_abs_lat = at.latitude().abs() + d_lat;
        if !d_lat.is_finite() || max_abs_lat >= MAX_CELL_LATITUDE {
            return all;
        }
        let d_lng = d_lat / max_abs_lat.to_radians().cos();

        let row_lo = ((at.latitude() - d_lat) / self.cell_degrees).floor() as i64;
        let row_hi = ((at.latitude() + d_lat) / self.cell_degrees).floor() as i64;
        let col_lo = ((at.longitude() - d_lng) / self.cell_degrees).floor() as i64;
        let col_hi = ((at.longitude() + d_lng) / self.cell_degrees).floor() as i64;

        let cells = (row_hi - row_lo + 1).saturating_mul(col_hi - col_lo + 1);
        if cells as usize >= self.stripes.len() || col_hi - col_lo + 1 >= self.cells_per_row() {
            return all;
        }

        let per_row = self.cells_per_row();
        let mut stripes: Vec<usize> = (row_lo..=row_hi)
            .flat_map(|row| (col_lo..=col_hi).map(move |col| (row, col)))
            .map(|(row, col)| self.stripe_of(&category, row, col.rem_euclid(per_row)))
            .collect();
        stripes.sort_unstable();
        stripes.dedup();
        stripes
    }

    /// Block until every stripe for the area is held.
    pub fn lock(&self, category: &str, at: Coordinates, radius_meters: f64) -> AreaGuard<'_> {
        let stripes = self.stripes_for(category, at, radius_meters);
        // A panic while holding a stripe leaves no state behind the `()`, so poisoning is ignored.
        let guards = stripes
            .iter()
            .map(|&i| self.stripes[i].lock().unwrap_or_else(PoisonError::into_inner))
            .collect();
        AreaGuard {
            stripes,
            _guards: guards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::offset_north;

    fn locks() -> AreaLocks {
        AreaLocks::new(0.01, 64)
    }

    fn point(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    fn shares_stripe(a: &[usize], b: &[usize]) -> bool {
        a.iter().any(|s| b.contains(s))
    }

    #[test]
    fn test_stripes_are_sorted_and_unique() {
        let s = locks().stripes_for("Water Supply", point(23.3441, 85.3096), 100.0);
        let mut sorted = s.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(s, sorted);
        assert!(!s.is_empty());
    }

    #[test]
    fn test_nearby_reports_share_a_stripe_across_cell_edges() {
        let locks = locks();
        // Straddle the 23.35 cell boundary.
        let a = point(23.34995, 85.3096);
        let b = offset_north(a, 15.0).unwrap();
        assert!(shares_stripe(
            &locks.stripes_for("Water Supply", a, 20.0),
            &locks.stripes_for("water supply", b, 20.0)
        ));
    }

    #[test]
    fn test_category_changes_the_key() {
        let locks = AreaLocks::new(0.01, 4096);
        let at = point(23.3, 85.3);
        assert_ne!(
            locks.stripes_for("Water Supply", at, 1.0),
            locks.stripes_for("Electricity", at, 1.0)
        );
    }

    #[test]
    fn test_near_pole_locks_everything() {
        let locks = locks();
        assert_eq!(locks.stripes_for("Roads", point(89.5, 0.0), 20.0).len(), 64);
    }

    #[test]
    fn test_antimeridian_wraps() {
        let locks = locks();
        let east = point(0.0, 179.99999);
        let west = point(0.0, -179.99999);
        assert!(shares_stripe(
            &locks.stripes_for("Roads", east, 20.0),
            &locks.stripes_for("Roads", west, 20.0)
        ));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let locks = locks();
        let at = point(23.3441, 85.3096);
        {
            let guard = locks.lock("Roads", at, 20.0);
            assert!(!guard.stripes().is_empty());
        }
        // Would deadlock if the first guard leaked.
        let again = locks.lock("Roads", at, 20.0);
        assert!(!again.stripes().is_empty());
    }
}
