//! Bounded integer lattice scan used as the block/position broad phase

use crate::foundation::math::{Vec3, Vec3Ext};
use crate::world::CellPos;

/// Iterator over every lattice point in a cube around a center point
///
/// The cube reaches `ceil(max_component(half_extents)) + 1` lattice steps from
/// the rounded center on every axis, which covers every unit cell a volume with
/// those half-extents can touch.
#[derive(Debug, Clone)]
pub struct LatticeScan {
    min: CellPos,
    max: CellPos,
    next: Option<CellPos>,
}

impl LatticeScan {
    /// Scan the conservative cube around a volume
    #[allow(clippy::cast_possible_truncation)]
    pub fn around(center: Vec3, half_extents: Vec3) -> Self {
        let radius = half_extents.abs().max_component().ceil() as i64 + 1;
        let origin = center.cell();
        Self::between(
            CellPos::new(origin.x - radius, origin.y - radius, origin.z - radius),
            CellPos::new(origin.x + radius, origin.y + radius, origin.z + radius),
        )
    }

    /// Scan every lattice point of an inclusive range
    pub fn between(min: CellPos, max: CellPos) -> Self {
        let empty = min.x > max.x || min.y > max.y || min.z > max.z;
        Self {
            min,
            max,
            next: if empty { None } else { Some(min) },
        }
    }

    /// Total number of lattice points covered by the scan
    pub fn volume(&self) -> usize {
        let span = |lo: i64, hi: i64| usize::try_from(hi - lo + 1).unwrap_or(0);
        span(self.min.x, self.max.x) * span(self.min.y, self.max.y) * span(self.min.z, self.max.z)
    }

    fn remaining(&self) -> usize {
        let Some(cur) = self.next else {
            return 0;
        };
        let span = |lo: i64, hi: i64| usize::try_from(hi - lo + 1).unwrap_or(0);
        let width = span(self.min.x, self.max.x);
        let layer = width * span(self.min.y, self.max.y);
        let consumed = span(self.min.z, cur.z - 1) * layer
            + span(self.min.y, cur.y - 1) * width
            + span(self.min.x, cur.x - 1);
        self.volume() - consumed
    }
}

impl Iterator for LatticeScan {
    type Item = CellPos;

    fn next(&mut self) -> Option<CellPos> {
        let current = self.next?;
        // x fastest, then y, then z
        self.next = if current.x < self.max.x {
            Some(CellPos::new(current.x + 1, current.y, current.z))
        } else if current.y < self.max.y {
            Some(CellPos::new(self.min.x, current.y + 1, current.z))
        } else if current.z < self.max.z {
            Some(CellPos::new(self.min.x, self.min.y, current.z + 1))
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LatticeScan {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_radius() {
        let scan = LatticeScan::around(Vec3::new(0.2, -0.1, 0.0), Vec3::new(0.5, 0.5, 0.5));
        // ceil(0.5) + 1 = 2 steps each way
        assert_eq!(scan.len(), 125);
        let cells: Vec<_> = scan.collect();
        assert_eq!(cells.first(), Some(&CellPos::new(-2, -2, -2)));
        assert_eq!(cells.last(), Some(&CellPos::new(2, 2, 2)));
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let mut scan = LatticeScan::between(CellPos::new(0, 0, 0), CellPos::new(1, 2, 3));
        assert_eq!(scan.len(), 24);
        for consumed in 1..=24 {
            assert!(scan.next().is_some());
            assert_eq!(scan.len(), 24 - consumed);
        }
        assert!(scan.next().is_none());
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let scan = LatticeScan::between(CellPos::new(1, 0, 0), CellPos::new(0, 0, 0));
        assert_eq!(scan.volume(), 0);
        assert_eq!(scan.count(), 0);
    }

    #[test]
    fn test_zero_extent_scans_neighbourhood() {
        let scan = LatticeScan::around(Vec3::new(5.0, 5.0, 5.0), Vec3::zeros());
        assert_eq!(scan.len(), 27);
    }
}
