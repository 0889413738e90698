use std::ops::Range;

/// Where the samples of a field sit along one axis, in cell units.
///
/// `Node` samples live on cell faces (integer coordinates), `Center`
/// samples live half a cell further along (`index + 0.5`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stagger {
    Node,
    Center,
}

impl Stagger {
    pub fn offset(self) -> f32 {
        match self {
            Stagger::Node => 0.0,
            Stagger::Center => 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldShape {
    width: usize,
    height: usize,
    stagger: (Stagger, Stagger),
}

impl FieldShape {
    pub fn new(width: usize, height: usize, stagger: (Stagger, Stagger)) -> Self {
        assert!(width > 0, "width must be > 0");
        assert!(height > 0, "height must be > 0");
        Self {
            width,
            height,
            stagger,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stagger(&self) -> (Stagger, Stagger) {
        self.stagger
    }

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Position of the stored sample `(x, y)` in cell units.
    pub fn sample_position(&self, x: usize, y: usize) -> (f32, f32) {
        (
            x as f32 + self.stagger.0.offset(),
            y as f32 + self.stagger.1.offset(),
        )
    }
}

/// Square staggered grid: `num_cells` cells per side including the
/// one-cell border ring, each `cell_size` metres wide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MacGrid {
    num_cells: usize,
    cell_size: f32,
}

impl MacGrid {
    pub fn new(num_cells: usize, cell_size: f32) -> Self {
        assert!(num_cells >= 3, "num_cells must leave an interior");
        assert!(cell_size > 0.0, "cell_size must be > 0");
        Self {
            num_cells,
            cell_size,
        }
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_shape(&self) -> FieldShape {
        FieldShape::new(
            self.num_cells,
            self.num_cells,
            (Stagger::Center, Stagger::Center),
        )
    }

    /// Horizontal velocity lives on vertical faces: one extra column.
    pub fn u_shape(&self) -> FieldShape {
        FieldShape::new(
            self.num_cells + 1,
            self.num_cells,
            (Stagger::Node, Stagger::Center),
        )
    }

    /// Vertical velocity lives on horizontal faces: one extra row.
    pub fn v_shape(&self) -> FieldShape {
        FieldShape::new(
            self.num_cells,
            self.num_cells + 1,
            (Stagger::Center, Stagger::Node),
        )
    }

    /// Cell indices strictly inside the border ring, on either axis.
    pub fn interior(&self) -> Range<usize> {
        1..self.num_cells - 1
    }

    pub fn is_interior(&self, x: usize, y: usize) -> bool {
        let range = self.interior();
        range.contains(&x) && range.contains(&y)
    }

    pub fn cell_center(&self, x: usize, y: usize) -> (f32, f32) {
        (
            (x as f32 + 0.5) * self.cell_size,
            (y as f32 + 0.5) * self.cell_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staggered_shapes_add_one_along_flow_axis() {
        let grid = MacGrid::new(6, 0.5);
        assert_eq!(grid.u_shape().width(), 7);
        assert_eq!(grid.u_shape().height(), 6);
        assert_eq!(grid.v_shape().width(), 6);
        assert_eq!(grid.v_shape().height(), 7);
        assert_eq!(grid.cell_shape().size(), 36);
    }

    #[test]
    fn sample_positions_follow_stagger() {
        let grid = MacGrid::new(4, 1.0);
        assert_eq!(grid.u_shape().sample_position(2, 1), (2.0, 1.5));
        assert_eq!(grid.v_shape().sample_position(2, 1), (2.5, 1.0));
        assert_eq!(grid.cell_shape().sample_position(2, 1), (2.5, 1.5));
    }

    #[test]
    fn cell_centers_are_in_metres() {
        let grid = MacGrid::new(4, 0.5);
        assert_eq!(grid.cell_center(0, 0), (0.25, 0.25));
        assert_eq!(grid.cell_center(3, 1), (1.75, 0.75));
    }

    #[test]
    fn interior_excludes_border_ring() {
        let grid = MacGrid::new(5, 1.0);
        assert_eq!(grid.interior(), 1..4);
        assert!(grid.is_interior(1, 3));
        assert!(!grid.is_interior(0, 2));
        assert!(!grid.is_interior(2, 4));
    }
}
