use crate::{Field2, MacGrid, MacVelocity2, WallMask};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SorParams {
    pub iterations: usize,
    /// Over-relaxation factor; 1.0 is plain Gauss-Seidel, unstable near 2.
    pub weight: f32,
}

impl Default for SorParams {
    fn default() -> Self {
        Self {
            iterations: 50,
            weight: 1.6,
        }
    }
}

/// Net outflow per unit area of every open interior cell; zero on walls
/// and on the border ring.
pub fn divergence_into(out: &mut Field2, mask: &WallMask, velocity: &MacVelocity2) {
    let grid = velocity.grid();
    let dx = grid.cell_size();
    let u = velocity.u();
    let v = velocity.v();
    out.fill_with_index(|x, y| {
        if !grid.is_interior(x, y) || !mask.is_open(x, y) {
            return 0.0;
        }
        (u.get(x + 1, y) - u.get(x, y) + v.get(x, y + 1) - v.get(x, y)) / dx
    });
}

/// Gauss-Seidel / SOR relaxation of the pressure Poisson equation.
///
/// `pressure` is zeroed first and then swept `iterations` times in place,
/// rows bottom to top and cells left to right. Each cell reads neighbours
/// already updated earlier in the same sweep, so the sweep stays on one
/// thread. Border cells are never written and hold zero pressure.
#[allow(clippy::too_many_arguments)]
pub fn solve_pressure_into(
    pressure: &mut Field2,
    divergence: &Field2,
    mask: &WallMask,
    grid: MacGrid,
    dt: f32,
    density: f32,
    sor: SorParams,
) {
    let n = grid.num_cells();
    let dx = grid.cell_size();
    let source_scale = dx * dx * density / dt;
    pressure.fill(0.0);
    let width = pressure.width();
    let p = pressure.as_mut_slice();
    let div = divergence.as_slice();

    for _ in 0..sor.iterations {
        for y in 1..n - 1 {
            for x in 1..n - 1 {
                let i = y * width + x;
                let k = mask.open_neighbors(x, y);
                if !mask.is_open(x, y) || k == 0 {
                    p[i] = 0.0;
                    continue;
                }
                let sum = f32::from(mask.openness(x - 1, y)) * p[i - 1]
                    + f32::from(mask.openness(x + 1, y)) * p[i + 1]
                    + f32::from(mask.openness(x, y - 1)) * p[i - width]
                    + f32::from(mask.openness(x, y + 1)) * p[i + width];
                let p_new = (sum - source_scale * div[i]) / f32::from(k);
                p[i] += sor.weight * (p_new - p[i]);
            }
        }
    }
}

/// Subtracts the pressure gradient from every interior face; faces
/// touching a wall are forced to zero instead.
pub fn project(
    velocity: &mut MacVelocity2,
    pressure: &Field2,
    mask: &WallMask,
    dt: f32,
    density: f32,
) {
    let grid = velocity.grid();
    let n = grid.num_cells();
    let scale = dt / (grid.cell_size() * density);
    let (u, v) = velocity.components_mut();

    u.update_with_index(|x, y, value| {
        if !(1..n).contains(&x) || !(1..n - 1).contains(&y) {
            return value;
        }
        if mask.u_face_blocked(x, y) {
            0.0
        } else {
            value - scale * (pressure.get(x, y) - pressure.get(x - 1, y))
        }
    });
    v.update_with_index(|x, y, value| {
        if !(1..n - 1).contains(&x) || !(1..n).contains(&y) {
            return value;
        }
        if mask.v_face_blocked(x, y) {
            0.0
        } else {
            value - scale * (pressure.get(x, y) - pressure.get(x, y - 1))
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{enforce_boundaries, BoundaryConfig};

    const DT: f32 = 1.0 / 60.0;

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn grid34() -> MacGrid {
        MacGrid::new(34, 10.0 / 32.0)
    }

    fn jet(grid: MacGrid, mask: &WallMask) -> MacVelocity2 {
        let mut velocity = MacVelocity2::zeros(grid);
        for y in 13..20 {
            for x in 13..20 {
                let dist = ((x as f32 - 16.0).powi(2) + (y as f32 - 16.0).powi(2)).sqrt();
                let weight = (1.0 - dist / 3.0).max(0.0);
                let u = velocity.u().get(x, y) + 5.0 * weight;
                velocity.u_mut().set(x, y, u);
                let v = velocity.v().get(x, y) - 2.0 * weight;
                velocity.v_mut().set(x, y, v);
            }
        }
        let mut smoke = Field2::new(grid.cell_shape(), 0.0);
        enforce_boundaries(mask, BoundaryConfig::closed(), &mut velocity, &mut smoke);
        velocity
    }

    fn residual_after(iterations: usize, grid: MacGrid, mask: &WallMask) -> (f32, f32) {
        let mut velocity = jet(grid, mask);
        let mut div = Field2::new(grid.cell_shape(), 0.0);
        let mut pressure = Field2::new(grid.cell_shape(), 0.0);
        divergence_into(&mut div, mask, &velocity);
        let before = div.abs_sum();
        let sor = SorParams {
            iterations,
            weight: 1.6,
        };
        solve_pressure_into(&mut pressure, &div, mask, grid, DT, 1.0, sor);
        project(&mut velocity, &pressure, mask, DT, 1.0);
        divergence_into(&mut div, mask, &velocity);
        (before, div.abs_sum())
    }

    #[test]
    fn divergence_of_uniform_flow_is_zero_inside() {
        let grid = MacGrid::new(6, 0.5);
        let mask = WallMask::open(grid);
        let u = Field2::new(grid.u_shape(), 3.0);
        let v = Field2::new(grid.v_shape(), -1.0);
        let velocity = MacVelocity2::from_components(grid, u, v);
        let mut div = Field2::new(grid.cell_shape(), 9.0);
        divergence_into(&mut div, &mask, &velocity);
        assert_eq!(div.abs_sum(), 0.0);
    }

    #[test]
    fn divergence_uses_physical_sign() {
        let grid = MacGrid::new(5, 0.5);
        let mask = WallMask::closed_box(grid);
        let mut velocity = MacVelocity2::zeros(grid);
        velocity.u_mut().set(3, 2, 1.0);
        velocity.v_mut().set(2, 3, 1.0);
        let mut div = Field2::new(grid.cell_shape(), 0.0);
        divergence_into(&mut div, &mask, &velocity);
        assert_close(div.get(2, 2), 4.0, 1e-6);
        assert_close(div.get(3, 2), -2.0, 1e-6);
        assert_close(div.get(2, 3), -2.0, 1e-6);
        assert_eq!(div.get(4, 2), 0.0);
    }

    #[test]
    fn zero_divergence_gives_zero_pressure() {
        let grid = MacGrid::new(10, 1.0);
        let mask = WallMask::closed_box(grid);
        let div = Field2::new(grid.cell_shape(), 0.0);
        let mut pressure = Field2::new(grid.cell_shape(), 123.0);
        for iterations in [0, 1, 7, 200] {
            let sor = SorParams {
                iterations,
                weight: 1.7,
            };
            solve_pressure_into(&mut pressure, &div, &mask, grid, DT, 1.0, sor);
            assert!(pressure.as_slice().iter().all(|p| *p == 0.0));
        }
    }

    #[test]
    fn isolated_cell_gets_zero_pressure() {
        let grid = MacGrid::new(5, 1.0);
        let mask = WallMask::from_fn(grid, |x, y| {
            if (x, y) == (2, 2) {
                crate::CellKind::Open
            } else {
                crate::CellKind::Wall
            }
        });
        let div = Field2::new(grid.cell_shape(), 1.0);
        let mut pressure = Field2::new(grid.cell_shape(), 0.0);
        solve_pressure_into(&mut pressure, &div, &mask, grid, DT, 1.0, SorParams::default());
        assert_eq!(pressure.get(2, 2), 0.0);
    }

    #[test]
    fn residual_shrinks_with_more_iterations() {
        let grid = grid34();
        let mask = WallMask::closed_box(grid);
        let mut last = f32::INFINITY;
        for iterations in [1, 2, 5, 10, 20, 40, 80, 160] {
            let (before, after) = residual_after(iterations, grid, &mask);
            assert!(before > 50.0);
            assert!(after < last, "{iterations} iterations: {after} >= {last}");
            last = after;
        }
        assert!(last < 2.0, "residual {last}");
    }

    #[test]
    fn solve_is_deterministic() {
        let grid = grid34();
        let mask = WallMask::closed_box(grid);
        let velocity = jet(grid, &mask);
        let mut div = Field2::new(grid.cell_shape(), 0.0);
        divergence_into(&mut div, &mask, &velocity);
        let mut a = Field2::new(grid.cell_shape(), 0.0);
        let mut b = Field2::new(grid.cell_shape(), 0.0);
        solve_pressure_into(&mut a, &div, &mask, grid, DT, 1.0, SorParams::default());
        solve_pressure_into(&mut b, &div, &mask, grid, DT, 1.0, SorParams::default());
        assert_eq!(a, b);
    }

    #[test]
    fn project_zeroes_wall_faces() {
        let grid = MacGrid::new(6, 1.0);
        let mask = WallMask::closed_box(grid);
        let velocity_u = Field2::new(grid.u_shape(), 1.0);
        let velocity_v = Field2::new(grid.v_shape(), 1.0);
        let mut velocity = MacVelocity2::from_components(grid, velocity_u, velocity_v);
        let pressure = Field2::from_fn(grid.cell_shape(), |x, _| x as f32);
        project(&mut velocity, &pressure, &mask, 0.5, 1.0);
        assert_eq!(velocity.u().get(1, 2), 0.0);
        assert_eq!(velocity.v().get(2, 5), 0.0);
        assert_close(velocity.u().get(2, 2), 0.5, 1e-6);
        assert_close(velocity.v().get(2, 2), 1.0, 1e-6);
    }
}
