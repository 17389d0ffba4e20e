//! A static lattice of arrows showing the field direction on a horizontal plane.

use super::theme::ArrowMaterial;
use crate::magnetic::calculate_field;
use crate::maths::orient_x_along;
use crate::source::SourceView;
use nalgebra::{UnitQuaternion, Vector3};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct GridArrowOptions {
    /// Samples along each horizontal axis.
    pub grid_size: usize,
    /// Side length of the sampled square, centred on the origin.
    pub extent: f64,
    pub y_level: f64,
    /// Samples closer than this to any source are skipped.
    pub exclusion_radius: f64,
    /// Samples with a weaker field are skipped.
    pub min_magnitude: f64,
}

impl Default for GridArrowOptions {
    fn default() -> Self {
        GridArrowOptions {
            grid_size: 10,
            extent: 8.0,
            y_level: 0.0,
            exclusion_radius: 0.6,
            min_magnitude: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridArrow {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub visible: bool,
}

/// Grid arrows of the most recent rebuild.
#[derive(Default, Debug)]
pub struct GridArrows {
    pub arrows: Vec<GridArrow>,
    pub material: ArrowMaterial,
    hidden: bool,
}

impl GridArrows {
    pub fn replace(&mut self, mut arrows: Vec<GridArrow>) {
        for arrow in arrows.iter_mut() {
            arrow.visible = !self.hidden;
        }
        self.arrows = arrows;
    }

    pub fn clear(&mut self) {
        self.arrows.clear();
    }

    /// Shows or hides the whole lattice without resampling it.
    pub fn set_visible(&mut self, visible: bool) {
        self.hidden = !visible;
        for arrow in self.arrows.iter_mut() {
            arrow.visible = visible;
        }
    }
}

/// World positions of the lattice samples.
pub fn grid_positions(options: &GridArrowOptions) -> Vec<Vector3<f64>> {
    let n = options.grid_size;
    let spacing = if n > 1 {
        options.extent / (n - 1) as f64
    } else {
        0.0
    };
    let start = if n > 1 { -options.extent / 2.0 } else { 0.0 };
    let mut positions = Vec::with_capacity(n * n);
    for i in 0..n {
        for k in 0..n {
            positions.push(Vector3::new(
                start + i as f64 * spacing,
                options.y_level,
                start + k as f64 * spacing,
            ));
        }
    }
    positions
}

/// Samples the field on the lattice, one arrow per usable sample, oriented along the field.
pub fn sample_grid_arrows(sources: &[SourceView], options: &GridArrowOptions) -> Vec<GridArrow> {
    grid_positions(options)
        .into_iter()
        .filter(|position| {
            sources
                .iter()
                .all(|view| (position - view.pose.position).norm() >= options.exclusion_radius)
        })
        .filter_map(|position| {
            let field = calculate_field(&position, sources.iter().map(|v| (v.pose, v.source)));
            if field.norm() < options.min_magnitude {
                return None;
            }
            Some(GridArrow {
                position,
                orientation: orient_x_along(&field),
                visible: true,
            })
        })
        .collect()
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::magnetic::bar_magnet::BarMagnet;
    use crate::pose::Pose;
    use crate::source::Source;
    use specs::{Builder, World, WorldExt};

    #[test]
    fn test_grid_excludes_samples_near_sources() {
        let mut world = World::new();
        let entity = world.create_entity().build();
        let pose = Pose::default();
        let source = Source::BarMagnet(BarMagnet::default());
        let views = vec![SourceView {
            entity,
            pose: &pose,
            source: &source,
        }];
        let options = GridArrowOptions {
            grid_size: 9,
            ..Default::default()
        };

        let arrows = sample_grid_arrows(&views, &options);
        assert!(!arrows.is_empty());
        assert!(arrows.len() < 81);
        for arrow in arrows.iter() {
            assert!(arrow.position.norm() >= 0.6);
            let field = source.calculate_field(&pose, &arrow.position).normalize();
            let facing = arrow.orientation * Vector3::x();
            assert!((facing - field).norm() < 1e-6);
        }
    }

    #[test]
    fn test_grid_skips_weak_field() {
        let options = GridArrowOptions::default();
        assert!(sample_grid_arrows(&[], &options).is_empty());
        assert_eq!(grid_positions(&options).len(), 100);
    }

    #[test]
    fn test_visibility_survives_replace() {
        let mut grid = GridArrows::default();
        grid.set_visible(false);
        grid.replace(vec![GridArrow {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            visible: true,
        }]);
        assert!(!grid.arrows[0].visible);
    }
}
