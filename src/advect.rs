use crate::{Field2, MacVelocity2, Vec2, WallMask};

/// Velocity at `pos` in cell units: `u` read on vertical faces, `v` on
/// horizontal faces.
pub fn velocity_at(velocity: &MacVelocity2, pos: (f32, f32)) -> Vec2 {
    velocity.sample_linear(pos)
}

fn backtrack(velocity: &MacVelocity2, pos: (f32, f32), scale: f32) -> (f32, f32) {
    let start = Vec2::new(pos.0, pos.1);
    let end = start - velocity_at(velocity, pos) * scale;
    (end.x, end.y)
}

/// Semi-Lagrangian transport of the velocity field by itself.
///
/// Only interior faces are traced; every other face is copied through
/// and faces touching a wall come out as zero.
pub fn advect_velocity_into(
    out: &mut MacVelocity2,
    mask: &WallMask,
    velocity: &MacVelocity2,
    dt: f32,
) {
    let grid = velocity.grid();
    let n = grid.num_cells();
    let scale = dt / grid.cell_size();
    let u_shape = grid.u_shape();
    let v_shape = grid.v_shape();

    out.u_mut().fill_with_index(|x, y| {
        let value = velocity.u().get(x, y);
        if !(1..n).contains(&x) || !(1..n - 1).contains(&y) {
            return value;
        }
        if mask.u_face_blocked(x, y) {
            return 0.0;
        }
        let back = backtrack(velocity, u_shape.sample_position(x, y), scale);
        velocity.u().sample_linear(back)
    });
    out.v_mut().fill_with_index(|x, y| {
        let value = velocity.v().get(x, y);
        if !(1..n - 1).contains(&x) || !(1..n).contains(&y) {
            return value;
        }
        if mask.v_face_blocked(x, y) {
            return 0.0;
        }
        let back = backtrack(velocity, v_shape.sample_position(x, y), scale);
        velocity.v().sample_linear(back)
    });
}

/// Carries a cell-centred scalar along `velocity`. Wall cells come out
/// empty, the border ring is copied through unchanged.
pub fn advect_scalar_into(
    out: &mut Field2,
    mask: &WallMask,
    velocity: &MacVelocity2,
    scalar: &Field2,
    dt: f32,
) {
    let grid = velocity.grid();
    let scale = dt / grid.cell_size();
    let shape = scalar.shape();
    out.fill_with_index(|x, y| {
        if !grid.is_interior(x, y) {
            return scalar.get(x, y);
        }
        if !mask.is_open(x, y) {
            return 0.0;
        }
        let back = backtrack(velocity, shape.sample_position(x, y), scale);
        scalar.sample_linear(back)
    });
}
