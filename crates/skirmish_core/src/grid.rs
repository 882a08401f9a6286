//! Grid snapping and bounds.
//!
//! The grid is centred on the world origin in the X/Z plane. Generating
//! and drawing terrain happens outside the core; the simulation only
//! needs to snap clicked positions to cell centres and reject positions
//! that fall off the board.

use crate::config::GridConfig;
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec3Fixed};

/// Snapping and bounds checks for a square grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    size: u32,
    tile_size: Fixed,
    height_offset: Fixed,
}

impl Grid {
    /// Create a grid. `height_offset` is added to the vertical coordinate
    /// of every snapped position so units rest on top of the clicked cell.
    #[must_use]
    pub fn new(config: &GridConfig, height_offset: Fixed) -> Self {
        Self {
            size: config.size,
            tile_size: config.tile_size,
            height_offset,
        }
    }

    /// Width of one cell.
    #[must_use]
    pub const fn tile_size(&self) -> Fixed {
        self.tile_size
    }

    /// Half the board width; valid positions satisfy `|x|, |z| <= half_extent`.
    #[must_use]
    pub fn half_extent(&self) -> Fixed {
        Fixed::saturating_from_num(self.size)
            .saturating_mul(self.tile_size)
            / Fixed::from_num(2)
    }

    /// Snap to the nearest cell centre and raise by the resting height.
    #[must_use]
    pub fn snap(&self, position: Vec3Fixed) -> Vec3Fixed {
        let cell = |v: Fixed| {
            v.saturating_div(self.tile_size)
                .saturating_round()
                .saturating_mul(self.tile_size)
        };
        Vec3Fixed::new(
            cell(position.x),
            position.y.saturating_add(self.height_offset),
            cell(position.z),
        )
    }

    /// Check whether a position lies on the board (inclusive edges).
    #[must_use]
    pub fn contains(&self, position: Vec3Fixed) -> bool {
        let half = self.half_extent();
        position.x >= -half && position.x <= half && position.z >= -half && position.z <= half
    }

    /// Snap a target and check it lies on the board.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] with the snapped coordinates.
    pub fn snap_target(&self, position: Vec3Fixed) -> Result<Vec3Fixed> {
        let snapped = self.snap(position);
        if self.contains(snapped) {
            Ok(snapped)
        } else {
            Err(GameError::OutOfBounds {
                x: snapped.x,
                z: snapped.z,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(&GridConfig::default(), Fixed::ONE)
    }

    fn v(x: f64, y: f64, z: f64) -> Vec3Fixed {
        Vec3Fixed::new(Fixed::from_num(x), Fixed::from_num(y), Fixed::from_num(z))
    }

    #[test]
    fn test_snap_to_cell_centre() {
        assert_eq!(grid().snap(v(3.2, 1.0, -4.9)), v(4.0, 2.0, -4.0));
        assert_eq!(grid().snap(v(0.9, 0.0, 0.9)), v(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_snap_rounds_half_away_from_zero() {
        // 1.0 / 2.0 = 0.5 rounds to 1 cell, -1.0 / 2.0 = -0.5 rounds to -1 cell.
        assert_eq!(grid().snap(v(1.0, 0.0, -1.0)), v(2.0, 1.0, -2.0));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let grid = grid();
        assert_eq!(grid.half_extent(), Fixed::from_num(17));
        assert!(grid.contains(v(17.0, 0.0, -17.0)));
        assert!(!grid.contains(v(17.5, 0.0, 0.0)));
    }

    #[test]
    fn test_oversized_grid_saturates() {
        let config = GridConfig {
            size: u32::MAX,
            tile_size: Fixed::from_num(2),
        };
        let grid = Grid::new(&config, Fixed::ONE);
        assert_eq!(grid.half_extent(), Fixed::MAX / Fixed::from_num(2));
        assert!(grid.snap_target(v(1000.0, 0.0, 0.0)).is_ok());
    }

    #[test]
    fn test_snap_far_positions_saturate() {
        let far = Vec3Fixed::new(Fixed::MAX, Fixed::MAX, Fixed::MIN);
        let snapped = grid().snap(far);
        assert_eq!(snapped.y, Fixed::MAX);
        assert!(grid().snap_target(far).is_err());
    }

    #[test]
    fn test_snap_target_out_of_bounds() {
        let err = grid().snap_target(v(40.0, 0.0, 0.0)).unwrap_err();
        assert_eq!(
            err,
            GameError::OutOfBounds {
                x: Fixed::from_num(40),
                z: Fixed::ZERO,
            }
        );
        assert!(grid().snap_target(v(16.0, 0.0, 16.0)).is_ok());
    }
}
