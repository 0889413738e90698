use crate::{Field2, MacGrid, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Wall,
    Open,
}

impl CellKind {
    pub fn as_byte(self) -> u8 {
        match self {
            CellKind::Wall => 0,
            CellKind::Open => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(CellKind::Wall),
            1 => Some(CellKind::Open),
            _ => None,
        }
    }
}

/// Per-cell wall mask, one byte per cell: `0` is a wall, `1` is fluid.
#[derive(Clone, Debug, PartialEq)]
pub struct WallMask {
    num_cells: usize,
    data: Vec<u8>,
}

impl WallMask {
    /// Every cell open, border ring included.
    pub fn open(grid: MacGrid) -> Self {
        let n = grid.num_cells();
        Self {
            num_cells: n,
            data: vec![1; n * n],
        }
    }

    /// Walls along the outer ring, open interior.
    pub fn closed_box(grid: MacGrid) -> Self {
        Self::from_fn(grid, |x, y| {
            if grid.is_interior(x, y) {
                CellKind::Open
            } else {
                CellKind::Wall
            }
        })
    }

    pub fn from_fn(grid: MacGrid, f: impl Fn(usize, usize) -> CellKind) -> Self {
        let n = grid.num_cells();
        let data = (0..n * n).map(|i| f(i % n, i / n).as_byte()).collect();
        Self { num_cells: n, data }
    }

    /// Rebuilds a mask from raw bytes; `None` if the length or any value is off.
    pub fn from_bytes(grid: MacGrid, data: Vec<u8>) -> Option<Self> {
        let n = grid.num_cells();
        if data.len() != n * n || data.iter().any(|b| CellKind::from_byte(*b).is_none()) {
            return None;
        }
        Some(Self { num_cells: n, data })
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> CellKind {
        if self.data[y * self.num_cells + x] == 0 {
            CellKind::Wall
        } else {
            CellKind::Open
        }
    }

    pub fn is_open(&self, x: usize, y: usize) -> bool {
        self.data[y * self.num_cells + x] != 0
    }

    /// 1 for open, 0 for wall; the weight a neighbour carries in the pressure stencil.
    pub fn openness(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.num_cells + x]
    }

    pub fn set(&mut self, x: usize, y: usize, kind: CellKind) {
        self.data[y * self.num_cells + x] = kind.as_byte();
    }

    /// The face between `(x - 1, y)` and `(x, y)` is blocked.
    pub fn u_face_blocked(&self, x: usize, y: usize) -> bool {
        !self.is_open(x, y) || !self.is_open(x - 1, y)
    }

    /// The face between `(x, y - 1)` and `(x, y)` is blocked.
    pub fn v_face_blocked(&self, x: usize, y: usize) -> bool {
        !self.is_open(x, y) || !self.is_open(x, y - 1)
    }

    /// Open orthogonal neighbours of an interior cell.
    pub fn open_neighbors(&self, x: usize, y: usize) -> u8 {
        self.openness(x - 1, y)
            + self.openness(x + 1, y)
            + self.openness(x, y - 1)
            + self.openness(x, y + 1)
    }

    pub fn open_count(&self) -> usize {
        self.data.iter().filter(|b| **b != 0).count()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MacVelocity2 {
    grid: MacGrid,
    u: Field2,
    v: Field2,
}

impl MacVelocity2 {
    pub fn zeros(grid: MacGrid) -> Self {
        Self {
            grid,
            u: Field2::new(grid.u_shape(), 0.0),
            v: Field2::new(grid.v_shape(), 0.0),
        }
    }

    pub fn from_components(grid: MacGrid, u: Field2, v: Field2) -> Self {
        assert_eq!(u.shape(), grid.u_shape(), "u shape mismatch");
        assert_eq!(v.shape(), grid.v_shape(), "v shape mismatch");
        Self { grid, u, v }
    }

    pub fn grid(&self) -> MacGrid {
        self.grid
    }

    pub fn u(&self) -> &Field2 {
        &self.u
    }

    pub fn v(&self) -> &Field2 {
        &self.v
    }

    pub fn u_mut(&mut self) -> &mut Field2 {
        &mut self.u
    }

    pub fn v_mut(&mut self) -> &mut Field2 {
        &mut self.v
    }

    pub fn components_mut(&mut self) -> (&mut Field2, &mut Field2) {
        (&mut self.u, &mut self.v)
    }

    pub fn clone_from(&mut self, other: &Self) {
        self.u.clone_from(&other.u);
        self.v.clone_from(&other.v);
    }

    /// Velocity at `pos` (cell units), each component sampled on its own faces.
    pub fn sample_linear(&self, pos: (f32, f32)) -> Vec2 {
        Vec2::new(self.u.sample_linear(pos), self.v.sample_linear(pos))
    }

    /// Face-averaged velocity at the center of cell `(x, y)`.
    pub fn cell_average(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(
            0.5 * (self.u.get(x, y) + self.u.get(x + 1, y)),
            0.5 * (self.v.get(x, y) + self.v.get(x, y + 1)),
        )
    }

    pub fn max_abs(&self) -> f32 {
        let (u, v) = (self.u.max_abs(), self.v.max_abs());
        if u.is_nan() || v.is_nan() {
            f32::NAN
        } else {
            u.max(v)
        }
    }

    pub fn energy(&self) -> f32 {
        let squares = |field: &Field2| field.as_slice().iter().map(|value| value * value).sum::<f32>();
        squares(&self.u) + squares(&self.v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_box_walls_the_ring() {
        let grid = MacGrid::new(5, 1.0);
        let mask = WallMask::closed_box(grid);
        assert_eq!(mask.get(0, 2), CellKind::Wall);
        assert_eq!(mask.get(4, 4), CellKind::Wall);
        assert_eq!(mask.get(2, 2), CellKind::Open);
        assert_eq!(mask.open_count(), 9);
    }

    #[test]
    fn open_neighbors_counts_orthogonal_fluid() {
        let grid = MacGrid::new(5, 1.0);
        let mut mask = WallMask::closed_box(grid);
        assert_eq!(mask.open_neighbors(2, 2), 4);
        assert_eq!(mask.open_neighbors(1, 1), 2);
        mask.set(2, 1, CellKind::Wall);
        assert_eq!(mask.open_neighbors(2, 2), 3);
    }

    #[test]
    fn from_bytes_rejects_bad_values() {
        let grid = MacGrid::new(3, 1.0);
        assert!(WallMask::from_bytes(grid, vec![1; 9]).is_some());
        assert!(WallMask::from_bytes(grid, vec![1; 8]).is_none());
        assert!(WallMask::from_bytes(grid, vec![2; 9]).is_none());
    }

    #[test]
    fn face_blocking_checks_both_sides() {
        let grid = MacGrid::new(4, 1.0);
        let mask = WallMask::closed_box(grid);
        assert!(mask.u_face_blocked(1, 1));
        assert!(!mask.u_face_blocked(2, 1));
        assert!(mask.v_face_blocked(2, 3));
        assert!(!mask.v_face_blocked(2, 2));
    }

    #[test]
    fn cell_average_uses_both_faces() {
        let grid = MacGrid::new(3, 1.0);
        let u = Field2::from_fn(grid.u_shape(), |x, _| x as f32);
        let v = Field2::from_fn(grid.v_shape(), |_, y| -(y as f32));
        let velocity = MacVelocity2::from_components(grid, u, v);
        assert_eq!(velocity.cell_average(1, 1), Vec2::new(1.5, -1.5));
    }
}
