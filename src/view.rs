//! Display helpers. Fields are stored with `y` pointing up; images and
//! screen coordinates have row 0 at the top, and this is the only place
//! that flips between the two.

use crate::{Field2, WallMask};
use std::io::{self, Write};

pub const DIVERGENCE_CLIP: f32 = 5.0;
pub const PRESSURE_CLIP_PER_DENSITY: f32 = 5000.0;
pub const WALL_COLOUR: [u8; 3] = [90, 90, 110];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenMap {
    pub num_cells: usize,
    pub cell_px: usize,
}

impl ScreenMap {
    pub fn new(num_cells: usize, cell_px: usize) -> Self {
        Self {
            num_cells,
            cell_px: cell_px.max(1),
        }
    }

    pub fn size_px(&self) -> usize {
        self.num_cells * self.cell_px
    }

    /// Screen row holding cell row `y`.
    pub fn screen_row(&self, y: usize) -> usize {
        self.num_cells - 1 - y
    }

    /// Pixel centre of cell `(x, y)`, relative to the grid's top-left corner.
    pub fn cell_center_px(&self, x: usize, y: usize) -> (usize, usize) {
        let half = self.cell_px / 2;
        (
            x * self.cell_px + half,
            self.screen_row(y) * self.cell_px + half,
        )
    }

    /// Cell under a pointer at `(px, py)` pixels from the grid's top-left
    /// corner, or `None` outside the grid.
    pub fn hovered_cell(&self, px: f32, py: f32) -> Option<(usize, usize)> {
        if !(px >= 0.0 && py >= 0.0) {
            return None;
        }
        let col = (px / self.cell_px as f32) as usize;
        let row = (py / self.cell_px as f32) as usize;
        if col >= self.num_cells || row >= self.num_cells {
            return None;
        }
        Some((col, self.screen_row(row)))
    }
}

/// Packed 8-bit RGB, rows top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, col: usize, row: usize) -> [u8; 3] {
        let i = (row * self.width + col) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn set_pixel(&mut self, col: usize, row: usize, rgb: [u8; 3]) {
        let i = (row * self.width + col) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Nearest-neighbour blow-up, each pixel becoming a `factor`² block.
    pub fn scaled(&self, factor: usize) -> Self {
        let factor = factor.max(1);
        let mut out = Self::new(self.width * factor, self.height * factor);
        for row in 0..out.height {
            for col in 0..out.width {
                out.set_pixel(col, row, self.pixel(col / factor, row / factor));
            }
        }
        out
    }

    /// Binary PPM (`P6`).
    pub fn write_ppm<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "P6\n{} {}\n255\n", self.width, self.height)?;
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

fn to_byte(unit: f32) -> u8 {
    (255.0 * unit.clamp(0.0, 1.0)) as u8
}

/// One pixel per cell, flipped so the top row of the image is the top
/// row of the domain.
fn rasterize(field: &Field2, colour: impl Fn(usize, usize, f32) -> [u8; 3]) -> RgbImage {
    let (width, height) = (field.width(), field.height());
    let mut image = RgbImage::new(width, height);
    for y in 0..height {
        let row = height - 1 - y;
        for x in 0..width {
            image.set_pixel(x, row, colour(x, y, field.get(x, y)));
        }
    }
    image
}

/// Greyscale smoke; light themes draw dark smoke on white.
pub fn smoke_image(smoke: &Field2, light_theme: bool) -> RgbImage {
    rasterize(smoke, |_, _, s| {
        let s = if light_theme { 1.0 - s } else { s };
        let c = to_byte(s);
        [c, c, c]
    })
}

/// Red for outflow, blue for inflow, saturating at ±5.
pub fn divergence_image(divergence: &Field2) -> RgbImage {
    rasterize(divergence, |_, _, d| {
        let norm = d.clamp(-DIVERGENCE_CLIP, DIVERGENCE_CLIP) / DIVERGENCE_CLIP;
        [to_byte(norm.max(0.0)), 0, to_byte((-norm).max(0.0))]
    })
}

/// Jet colour ramp over `[0, 1]`.
pub fn jet(norm: f32) -> [f32; 3] {
    let r = if norm < 0.5 {
        0.0
    } else if norm < 0.75 {
        4.0 * (norm - 0.5)
    } else {
        1.0
    };
    let g = if norm < 0.25 {
        4.0 * norm
    } else if norm < 0.75 {
        1.0
    } else {
        4.0 * (1.0 - norm)
    };
    let b = if norm < 0.25 {
        1.0
    } else if norm < 0.5 {
        4.0 * (0.5 - norm)
    } else {
        0.0
    };
    [r, g, b]
}

/// Pressure through the jet ramp, clipped at ±5000 times the fluid
/// density. With `smoke`, brightness follows the smoke density.
pub fn pressure_image(pressure: &Field2, density: f32, smoke: Option<&Field2>) -> RgbImage {
    let max_p = PRESSURE_CLIP_PER_DENSITY * density;
    rasterize(pressure, |x, y, p| {
        let norm = 0.5 * (p.clamp(-max_p, max_p) / max_p) + 0.5;
        let weight = smoke.map_or(1.0, |s| (1.5 * s.get(x, y)).clamp(0.0, 1.0));
        jet(norm).map(|c| to_byte(c * weight))
    })
}

/// Paints wall cells over an image produced by one of the rasterizers.
pub fn overlay_walls(image: &mut RgbImage, walls: &WallMask, colour: [u8; 3]) {
    let n = walls.num_cells();
    for y in 0..n {
        for x in 0..n {
            if !walls.is_open(x, y) {
                image.set_pixel(x, n - 1 - y, colour);
            }
        }
    }
}
