use crate::{Field2, MacVelocity2, WallMask};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryCondition {
    /// Solid edge: both velocity components on the outer faces are zero.
    Closed,
    /// Ghost cells: flow leaving the domain is copied outward, inflow is left alone.
    Outflow,
    /// Fixed normal speed into the domain, in m/s.
    Inflow(f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryConfig {
    pub left: BoundaryCondition,
    pub right: BoundaryCondition,
    pub bottom: BoundaryCondition,
    pub top: BoundaryCondition,
}

impl BoundaryConfig {
    pub fn closed() -> Self {
        Self {
            left: BoundaryCondition::Closed,
            right: BoundaryCondition::Closed,
            bottom: BoundaryCondition::Closed,
            top: BoundaryCondition::Closed,
        }
    }

    pub fn wind_tunnel(speed: f32) -> Self {
        Self {
            left: BoundaryCondition::Inflow(speed),
            right: BoundaryCondition::Outflow,
            bottom: BoundaryCondition::Closed,
            top: BoundaryCondition::Closed,
        }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self::closed()
    }
}

/// Zeroes every interior face that touches a wall cell on either side.
pub fn enforce_free_slip(mask: &WallMask, velocity: &mut MacVelocity2) {
    let n = velocity.grid().num_cells();
    assert_eq!(mask.num_cells(), n, "wall mask size mismatch");
    velocity.u_mut().update_with_index(|x, y, value| {
        let interior = (1..n).contains(&x) && (1..n - 1).contains(&y);
        if interior && mask.u_face_blocked(x, y) {
            0.0
        } else {
            value
        }
    });
    velocity.v_mut().update_with_index(|x, y, value| {
        let interior = (1..n - 1).contains(&x) && (1..n).contains(&y);
        if interior && mask.v_face_blocked(x, y) {
            0.0
        } else {
            value
        }
    });
}

pub fn clear_wall_scalar(mask: &WallMask, field: &mut Field2) {
    field.update_with_index(|x, y, value| if mask.is_open(x, y) { value } else { 0.0 });
}

/// Outward-facing sign of the normal component on each edge.
#[derive(Clone, Copy)]
enum Edge {
    Low,
    High,
}

fn normal_face(condition: BoundaryCondition, edge: Edge, edge_value: f32, inner: f32) -> f32 {
    match condition {
        BoundaryCondition::Closed => 0.0,
        BoundaryCondition::Outflow => {
            let leaving = match edge {
                Edge::Low => inner < 0.0,
                Edge::High => inner > 0.0,
            };
            if leaving {
                inner
            } else {
                edge_value
            }
        }
        BoundaryCondition::Inflow(speed) => match edge {
            Edge::Low => speed,
            Edge::High => -speed,
        },
    }
}

fn tangential_face(condition: BoundaryCondition, inner: f32) -> f32 {
    match condition {
        BoundaryCondition::Closed | BoundaryCondition::Inflow(_) => 0.0,
        BoundaryCondition::Outflow => inner,
    }
}

/// Applies the per-edge conditions to the outermost face rows and columns.
pub fn apply_domain_boundaries(velocity: &mut MacVelocity2, config: BoundaryConfig) {
    let n = velocity.grid().num_cells();
    let (u, v) = velocity.components_mut();

    // Normal components first, then tangential rows, so corners follow
    // the tangential rule.
    for y in 0..n {
        let left = normal_face(config.left, Edge::Low, u.get(0, y), u.get(1, y));
        u.set(0, y, left);
        let right = normal_face(config.right, Edge::High, u.get(n, y), u.get(n - 1, y));
        u.set(n, y, right);
    }
    for x in 0..=n {
        let bottom = tangential_face(config.bottom, u.get(x, 1));
        u.set(x, 0, bottom);
        let top = tangential_face(config.top, u.get(x, n - 2));
        u.set(x, n - 1, top);
    }

    for x in 0..n {
        let bottom = normal_face(config.bottom, Edge::Low, v.get(x, 0), v.get(x, 1));
        v.set(x, 0, bottom);
        let top = normal_face(config.top, Edge::High, v.get(x, n), v.get(x, n - 1));
        v.set(x, n, top);
    }
    for y in 0..=n {
        let left = tangential_face(config.left, v.get(1, y));
        v.set(0, y, left);
        let right = tangential_face(config.right, v.get(n - 2, y));
        v.set(n - 1, y, right);
    }
}

/// Free-slip walls, wall-cell scalar clearing and the domain edge pass.
pub fn enforce_boundaries(
    mask: &WallMask,
    config: BoundaryConfig,
    velocity: &mut MacVelocity2,
    scalar: &mut Field2,
) {
    enforce_free_slip(mask, velocity);
    clear_wall_scalar(mask, scalar);
    apply_domain_boundaries(velocity, config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellKind, MacGrid};

    fn noisy_velocity(grid: MacGrid) -> MacVelocity2 {
        let u = Field2::from_fn(grid.u_shape(), |x, y| 1.0e6 * ((x * 31 + y * 17) % 7) as f32 - 3.0e6);
        let v = Field2::from_fn(grid.v_shape(), |x, y| -1.0e6 * ((x * 13 + y * 29) % 5) as f32 + 2.0e6);
        MacVelocity2::from_components(grid, u, v)
    }

    #[test]
    fn free_slip_zeroes_every_wall_adjacent_face() {
        let grid = MacGrid::new(8, 1.0);
        let mut mask = WallMask::closed_box(grid);
        mask.set(3, 4, CellKind::Wall);
        mask.set(5, 2, CellKind::Wall);
        let mut velocity = noisy_velocity(grid);
        enforce_free_slip(&mask, &mut velocity);
        for y in 1..7 {
            for x in 1..8 {
                if mask.u_face_blocked(x, y) {
                    assert_eq!(velocity.u().get(x, y), 0.0, "u at ({x}, {y})");
                }
            }
        }
        for y in 1..8 {
            for x in 1..7 {
                if mask.v_face_blocked(x, y) {
                    assert_eq!(velocity.v().get(x, y), 0.0, "v at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn free_slip_leaves_open_faces_alone() {
        let grid = MacGrid::new(6, 1.0);
        let mask = WallMask::open(grid);
        let mut velocity = noisy_velocity(grid);
        let before = velocity.clone();
        enforce_free_slip(&mask, &mut velocity);
        assert_eq!(velocity, before);
    }

    #[test]
    fn clear_wall_scalar_only_touches_walls() {
        let grid = MacGrid::new(4, 1.0);
        let mask = WallMask::closed_box(grid);
        let mut smoke = Field2::new(grid.cell_shape(), 0.7);
        clear_wall_scalar(&mask, &mut smoke);
        assert_eq!(smoke.get(0, 0), 0.0);
        assert_eq!(smoke.get(3, 2), 0.0);
        assert_eq!(smoke.get(1, 2), 0.7);
    }

    #[test]
    fn closed_domain_zeroes_outer_faces() {
        let grid = MacGrid::new(4, 1.0);
        let mut velocity = noisy_velocity(grid);
        apply_domain_boundaries(&mut velocity, BoundaryConfig::closed());
        for y in 0..4 {
            assert_eq!(velocity.u().get(0, y), 0.0);
            assert_eq!(velocity.u().get(4, y), 0.0);
        }
        for x in 0..4 {
            assert_eq!(velocity.v().get(x, 0), 0.0);
            assert_eq!(velocity.v().get(x, 4), 0.0);
        }
    }

    #[test]
    fn outflow_copies_only_leaving_flow() {
        let grid = MacGrid::new(4, 1.0);
        let mut velocity = MacVelocity2::zeros(grid);
        velocity.u_mut().set(3, 1, 2.0);
        velocity.u_mut().set(3, 2, -2.0);
        velocity.u_mut().set(4, 2, 0.5);
        let config = BoundaryConfig {
            right: BoundaryCondition::Outflow,
            ..BoundaryConfig::closed()
        };
        apply_domain_boundaries(&mut velocity, config);
        assert_eq!(velocity.u().get(4, 1), 2.0);
        assert_eq!(velocity.u().get(4, 2), 0.5);
    }

    #[test]
    fn outflow_copies_tangential_faces_from_inside() {
        let grid = MacGrid::new(5, 1.0);
        let mut velocity = MacVelocity2::zeros(grid);
        velocity.v_mut().set(3, 2, 1.5);
        velocity.v_mut().set(3, 3, -0.75);
        velocity.v_mut().set(4, 2, 9.0);
        velocity.v_mut().set(0, 2, 9.0);
        velocity.u_mut().set(2, 3, 0.25);
        let config = BoundaryConfig {
            right: BoundaryCondition::Outflow,
            top: BoundaryCondition::Outflow,
            ..BoundaryConfig::closed()
        };
        apply_domain_boundaries(&mut velocity, config);
        assert_eq!(velocity.v().get(4, 2), 1.5);
        assert_eq!(velocity.v().get(4, 3), -0.75);
        assert_eq!(velocity.u().get(2, 4), 0.25);
        // Closed edges still zero their tangential faces.
        assert_eq!(velocity.v().get(0, 2), 0.0);
        assert_eq!(velocity.u().get(2, 0), 0.0);
    }

    #[test]
    fn inflow_points_into_domain() {
        let grid = MacGrid::new(4, 1.0);
        let mut velocity = MacVelocity2::zeros(grid);
        apply_domain_boundaries(&mut velocity, BoundaryConfig::wind_tunnel(3.0));
        assert_eq!(velocity.u().get(0, 1), 3.0);
        assert_eq!(velocity.u().get(0, 2), 3.0);
        assert_eq!(velocity.v().get(0, 2), 0.0);
    }
}
