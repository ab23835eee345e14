//! Grid traversal along a ray
//!
//! Visits every cell a ray segment passes through, in order, using the
//! Amanatides-Woo incremental traversal. Cells are unit volumes centered on
//! integer lattice points.

use crate::foundation::math::{Vec3, Vec3Ext};
use crate::world::{CellPos, Face};

/// One cell visited by a [`CellWalk`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkStep {
    /// Cell entered
    pub pos: CellPos,
    /// Face the ray entered through, `None` for the starting cell
    pub face: Option<Face>,
    /// Distance along the ray at which the cell was entered
    pub distance: f64,
}

/// Iterator over the cells crossed by a ray segment
#[derive(Debug, Clone)]
pub struct CellWalk {
    current: [i64; 3],
    step: [i64; 3],
    t_max: [f64; 3],
    t_delta: [f64; 3],
    max_distance: f64,
    started: bool,
    finished: bool,
}

impl CellWalk {
    /// Walk from `origin` along `direction` for at most `max_distance`.
    ///
    /// A zero direction visits only the starting cell.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f64) -> Self {
        let direction = direction.normalize_or(Vec3::zeros());
        let mut current = [0; 3];
        let mut step = [0; 3];
        let mut t_max = [f64::INFINITY; 3];
        let mut t_delta = [f64::INFINITY; 3];

        for axis in 0..3 {
            // shift so that cell p spans [p, p + 1) in walk space
            let shifted = origin[axis] + 0.5;
            let cell = shifted.floor();
            current[axis] = cell as i64;

            let d = direction[axis];
            if d > 0.0 {
                step[axis] = 1;
                t_max[axis] = (cell + 1.0 - shifted) / d;
                t_delta[axis] = 1.0 / d;
            } else if d < 0.0 {
                step[axis] = -1;
                t_max[axis] = (shifted - cell) / -d;
                t_delta[axis] = -1.0 / d;
            }
        }

        Self {
            current,
            step,
            t_max,
            t_delta,
            max_distance: max_distance.max(0.0),
            started: false,
            finished: false,
        }
    }

    fn cell_pos(&self) -> CellPos {
        CellPos::new(self.current[0], self.current[1], self.current[2])
    }
}

impl Iterator for CellWalk {
    type Item = WalkStep;

    fn next(&mut self) -> Option<WalkStep> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(WalkStep {
                pos: self.cell_pos(),
                face: None,
                distance: 0.0,
            });
        }

        let axis = (0..3)
            .min_by(|&a, &b| self.t_max[a].total_cmp(&self.t_max[b]))
            .unwrap_or(0);
        let distance = self.t_max[axis];
        if !distance.is_finite() || distance > self.max_distance {
            self.finished = true;
            return None;
        }

        self.current[axis] += self.step[axis];
        self.t_max[axis] += self.t_delta[axis];
        Some(WalkStep {
            pos: self.cell_pos(),
            face: Some(Face::entered_from(axis, self.step[axis])),
            distance,
        })
    }
}
