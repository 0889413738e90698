use crate::{CellKind, Field2, MacGrid, MacVelocity2, Vec2, WallMask};

/// Linear tent weight: 1 at the centre, 0 at `radius` and beyond.
pub fn falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).max(0.0)
}

/// A round stamp centred on a cell, radius in cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    pub center: (usize, usize),
    pub radius: usize,
}

impl Brush {
    pub fn new(center: (usize, usize), radius: usize) -> Self {
        Self { center, radius }
    }

    /// Interior cells under the stamp with a positive weight.
    pub fn cells(&self, grid: MacGrid) -> impl Iterator<Item = (usize, usize, f32)> {
        let n = grid.num_cells();
        let (cx, cy) = self.center;
        let r = self.radius;
        let radius = r as f32;
        let xs = cx.saturating_sub(r).max(1)..(cx + r + 1).min(n - 1);
        let ys = cy.saturating_sub(r).max(1)..(cy + r + 1).min(n - 1);
        ys.flat_map(move |y| xs.clone().map(move |x| (x, y)))
            .filter_map(move |(x, y)| {
                let offset = Vec2::new(x as f32 - cx as f32, y as f32 - cy as f32);
                let weight = falloff(offset.length(), radius);
                (weight > 0.0).then_some((x, y, weight))
            })
    }
}

/// Adds `delta * weight` to the `u` and `v` faces sharing each cell's index.
pub fn paint_velocity(velocity: &mut MacVelocity2, brush: Brush, delta: Vec2) -> usize {
    let grid = velocity.grid();
    let (u, v) = velocity.components_mut();
    let mut touched = 0;
    for (x, y, weight) in brush.cells(grid) {
        u.set(x, y, u.get(x, y) + delta.x * weight);
        v.set(x, y, v.get(x, y) + delta.y * weight);
        touched += 1;
    }
    touched
}

pub fn paint_scalar(field: &mut Field2, grid: MacGrid, brush: Brush, amount: f32) -> usize {
    let mut touched = 0;
    for (x, y, weight) in brush.cells(grid) {
        let value = (field.get(x, y) + amount * weight).clamp(0.0, 1.0);
        field.set(x, y, value);
        touched += 1;
    }
    touched
}

/// Sets `kind` on every cell whose weight still covers at least one cell
/// width of the stamp.
pub fn paint_walls(mask: &mut WallMask, grid: MacGrid, brush: Brush, kind: CellKind) -> usize {
    let diameter = 2.0 * brush.radius as f32;
    let mut touched = 0;
    for (x, y, weight) in brush.cells(grid) {
        if weight * diameter >= 1.0 {
            mask.set(x, y, kind);
            touched += 1;
        }
    }
    touched
}
