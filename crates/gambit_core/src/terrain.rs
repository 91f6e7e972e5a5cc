//! Terrain height queries.
//!
//! Terrain only ever supplies a height for rendering; combat and
//! targeting work on the ground plane and never read it.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Height source sampled at placement and after every move.
pub trait Terrain {
    /// Height of the ground at `(x, z)`.
    fn height_at(&self, x: Fixed, z: Fixed) -> Fixed;
}

/// Terrain with a constant height everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlatTerrain {
    /// Ground height.
    #[serde(with = "fixed_serde")]
    pub height: Fixed,
}

impl FlatTerrain {
    /// Flat terrain at the given height.
    #[must_use]
    pub const fn at(height: Fixed) -> Self {
        Self { height }
    }
}

impl Terrain for FlatTerrain {
    fn height_at(&self, _x: Fixed, _z: Fixed) -> Fixed {
        self.height
    }
}

/// Regular grid of height samples with bilinear interpolation.
///
/// Sample `(col, row)` sits at `origin + (col, row) * cell_size` and is
/// stored at `samples[row * width + col]`. Queries outside the grid are
/// clamped to the nearest edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightGrid {
    width: usize,
    depth: usize,
    cell_size: Fixed,
    origin: Vec2Fixed,
    samples: Vec<Fixed>,
}

impl HeightGrid {
    /// Build a grid, validating its dimensions.
    pub fn new(
        width: usize,
        depth: usize,
        cell_size: Fixed,
        origin: Vec2Fixed,
        samples: Vec<Fixed>,
    ) -> Result<Self> {
        if width == 0 || depth == 0 {
            return Err(GameError::InvalidConfig(
                "height grid must have at least one sample per axis".to_string(),
            ));
        }
        if samples.len() != width * depth {
            return Err(GameError::InvalidConfig(format!(
                "height grid expects {} samples, got {}",
                width * depth,
                samples.len()
            )));
        }
        if cell_size <= Fixed::ZERO {
            return Err(GameError::InvalidConfig(
                "height grid cell size must be positive".to_string(),
            ));
        }
        Ok(Self {
            width,
            depth,
            cell_size,
            origin,
            samples,
        })
    }

    /// Samples along x.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Samples along z.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    fn sample(&self, col: usize, row: usize) -> Fixed {
        self.samples[row * self.width + col]
    }

    /// Split a world coordinate into a clamped cell index and the
    /// fractional position inside that cell.
    fn locate(&self, coord: Fixed, origin: Fixed, len: usize) -> (usize, Fixed) {
        let max = Fixed::from_num(len - 1);
        let g = ((coord - origin) / self.cell_size).clamp(Fixed::ZERO, max);
        let cell = g.floor();
        (cell.to_num::<usize>(), g - cell)
    }
}

impl Terrain for HeightGrid {
    fn height_at(&self, x: Fixed, z: Fixed) -> Fixed {
        let (c0, fx) = self.locate(x, self.origin.x, self.width);
        let (r0, fz) = self.locate(z, self.origin.z, self.depth);
        let c1 = (c0 + 1).min(self.width - 1);
        let r1 = (r0 + 1).min(self.depth - 1);

        let top = lerp(self.sample(c0, r0), self.sample(c1, r0), fx);
        let bottom = lerp(self.sample(c0, r1), self.sample(c1, r1), fx);
        lerp(top, bottom, fz)
    }
}

fn lerp(a: Fixed, b: Fixed, t: Fixed) -> Fixed {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> HeightGrid {
        // 2x2 grid, cell size 2, heights 0 1 / 2 3
        HeightGrid::new(
            2,
            2,
            Fixed::from_num(2),
            Vec2Fixed::ZERO,
            [0, 1, 2, 3].into_iter().map(Fixed::from_num).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_flat_terrain() {
        let t = FlatTerrain::at(Fixed::from_num(4));
        assert_eq!(t.height_at(Fixed::from_num(-100), Fixed::from_num(7)), Fixed::from_num(4));
    }

    #[test]
    fn test_grid_hits_samples() {
        let g = grid();
        assert_eq!(g.height_at(Fixed::ZERO, Fixed::ZERO), Fixed::ZERO);
        assert_eq!(g.height_at(Fixed::from_num(2), Fixed::ZERO), Fixed::ONE);
        assert_eq!(g.height_at(Fixed::from_num(2), Fixed::from_num(2)), Fixed::from_num(3));
    }

    #[test]
    fn test_grid_interpolates_centre() {
        let g = grid();
        assert_eq!(g.height_at(Fixed::ONE, Fixed::ONE), Fixed::from_num(1.5));
    }

    #[test]
    fn test_grid_clamps_outside() {
        let g = grid();
        assert_eq!(g.height_at(Fixed::from_num(-50), Fixed::from_num(-50)), Fixed::ZERO);
        assert_eq!(g.height_at(Fixed::from_num(50), Fixed::from_num(50)), Fixed::from_num(3));
    }

    #[test]
    fn test_grid_rejects_bad_dimensions() {
        let err = HeightGrid::new(3, 2, Fixed::ONE, Vec2Fixed::ZERO, vec![Fixed::ZERO; 5]);
        assert!(matches!(err, Err(GameError::InvalidConfig(_))));
        let err = HeightGrid::new(0, 2, Fixed::ONE, Vec2Fixed::ZERO, Vec::new());
        assert!(err.is_err());
    }
}
