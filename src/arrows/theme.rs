//! Light and dark arrow materials.

use super::grid::GridArrows;
use specs::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Dark
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowMaterial {
    FlowLight,
    FlowDark,
    GridLight,
    GridDark,
}

impl Default for ArrowMaterial {
    fn default() -> Self {
        Theme::default().flow_material()
    }
}

impl Theme {
    pub fn flow_material(self) -> ArrowMaterial {
        match self {
            Theme::Light => ArrowMaterial::FlowLight,
            Theme::Dark => ArrowMaterial::FlowDark,
        }
    }

    pub fn grid_material(self) -> ArrowMaterial {
        match self {
            Theme::Light => ArrowMaterial::GridLight,
            Theme::Dark => ArrowMaterial::GridDark,
        }
    }
}

/// Material of a flow arrow glyph.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArrowStyle {
    pub material: ArrowMaterial,
}

impl Component for ArrowStyle {
    type Storage = VecStorage<Self>;
}

/// The theme requested by the host, and the theme the arrows currently wear.
#[derive(Default, Debug)]
pub struct ThemeState {
    pub requested: Theme,
    applied: Theme,
}

impl ThemeState {
    pub fn applied(&self) -> Theme {
        self.applied
    }
}

/// Reassigns arrow materials after a theme change. Geometry is left untouched.
pub struct ApplyThemeSystem;

impl<'a> System<'a> for ApplyThemeSystem {
    type SystemData = (
        Write<'a, ThemeState>,
        WriteStorage<'a, ArrowStyle>,
        Write<'a, GridArrows>,
    );

    fn run(&mut self, (mut theme, mut styles, mut grid): Self::SystemData) {
        if theme.requested == theme.applied {
            return;
        }
        let flow = theme.requested.flow_material();
        let mut restyled = 0;
        for style in (&mut styles).join() {
            style.material = flow;
            restyled += 1;
        }
        grid.material = theme.requested.grid_material();
        theme.applied = theme.requested;
        tracing::debug!(theme = ?theme.applied, restyled, "arrow materials reassigned");
    }
}
