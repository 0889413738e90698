use crate::grid::{FieldShape, Stagger};
use rayon::prelude::*;
use std::sync::OnceLock;

const PAR_THRESHOLD_DEFAULT: usize = 65_536;
const PAR_MIN_WORK_PER_THREAD: usize = 4096;

fn parallel_threshold() -> usize {
    static THRESHOLD: OnceLock<usize> = OnceLock::new();
    *THRESHOLD.get_or_init(|| {
        std::env::var("MAC_SMOKE_PAR_THRESHOLD")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(PAR_THRESHOLD_DEFAULT)
    })
}

pub(crate) fn should_parallel(len: usize) -> bool {
    if len < parallel_threshold() {
        return false;
    }
    let threads = rayon::current_num_threads().max(1);
    len / threads >= PAR_MIN_WORK_PER_THREAD
}

/// Splits a coordinate into a base index and a fraction so that
/// `base` and `base + 1` are valid samples of an axis with `len` entries.
///
/// `Center` axes are reindexed to the half-cell offset first: a fraction
/// below one half belongs to the previous sample.
pub(crate) fn split_axis(pos: f32, len: usize, stagger: Stagger) -> (usize, f32) {
    let floor = pos.floor();
    let (floor, fract) = match stagger {
        Stagger::Node => (floor, pos - floor),
        Stagger::Center => {
            let fract = pos - floor;
            if fract < 0.5 {
                (floor - 1.0, fract + 0.5)
            } else {
                (floor, fract - 0.5)
            }
        }
    };
    if len < 2 {
        return (0, 0.0);
    }
    let last = (len - 2) as f32;
    if floor < 0.0 {
        (0, 0.0)
    } else if floor > last {
        (len - 2, 1.0)
    } else {
        // NaN falls through here and keeps propagating through the fraction.
        (floor as usize, fract)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (1.0 - t) * a + t * b
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field2 {
    shape: FieldShape,
    data: Vec<f32>,
}

impl Field2 {
    pub fn new(shape: FieldShape, fill: f32) -> Self {
        let data = vec![fill; shape.size()];
        Self { shape, data }
    }

    pub fn from_data(shape: FieldShape, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), shape.size(), "field data length mismatch");
        Self { shape, data }
    }

    pub fn from_fn(shape: FieldShape, f: impl Fn(usize, usize) -> f32 + Sync) -> Self {
        let mut field = Self::new(shape, 0.0);
        field.fill_with_index(f);
        field
    }

    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    pub fn width(&self) -> usize {
        self.shape.width()
    }

    pub fn height(&self) -> usize {
        self.shape.height()
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.shape.idx(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let i = self.shape.idx(x, y);
        self.data[i] = value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn clone_from(&mut self, other: &Self) {
        assert_eq!(self.shape, other.shape, "field shape mismatch");
        self.data.clone_from(&other.data);
    }

    pub fn fill_with_index(&mut self, f: impl Fn(usize, usize) -> f32 + Sync) {
        let width = self.shape.width();
        if should_parallel(self.data.len()) {
            self.data.par_iter_mut().enumerate().for_each(|(i, value)| {
                *value = f(i % width, i / width);
            });
        } else {
            for (i, value) in self.data.iter_mut().enumerate() {
                *value = f(i % width, i / width);
            }
        }
    }

    pub fn update_with_index(&mut self, f: impl Fn(usize, usize, f32) -> f32 + Sync) {
        let width = self.shape.width();
        if should_parallel(self.data.len()) {
            self.data.par_iter_mut().enumerate().for_each(|(i, value)| {
                *value = f(i % width, i / width, *value);
            });
        } else {
            for (i, value) in self.data.iter_mut().enumerate() {
                *value = f(i % width, i / width, *value);
            }
        }
    }

    /// Bilinear sample at `pos`, given in cell units.
    pub fn sample_linear(&self, pos: (f32, f32)) -> f32 {
        let (sx, sy) = self.shape.stagger();
        let (x0, fx) = split_axis(pos.0, self.shape.width(), sx);
        let (y0, fy) = split_axis(pos.1, self.shape.height(), sy);
        let x1 = (x0 + 1).min(self.shape.width() - 1);
        let y1 = (y0 + 1).min(self.shape.height() - 1);
        let bottom = lerp(self.get(x0, y0), self.get(x1, y0), fx);
        let top = lerp(self.get(x0, y1), self.get(x1, y1), fx);
        lerp(bottom, top, fy)
    }

    pub fn clamp_in_place(&mut self, min: f32, max: f32) {
        for value in &mut self.data {
            *value = value.clamp(min, max);
        }
    }

    pub fn sum(&self) -> f32 {
        if should_parallel(self.data.len()) {
            self.data.par_iter().sum()
        } else {
            self.data.iter().sum()
        }
    }

    pub fn abs_sum(&self) -> f32 {
        if should_parallel(self.data.len()) {
            self.data.par_iter().map(|value| value.abs()).sum()
        } else {
            self.data.iter().map(|value| value.abs()).sum()
        }
    }

    /// Largest magnitude; NaN wins so that blow-ups stay visible.
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0_f32, |acc, value| {
            if value.is_nan() || acc.is_nan() {
                f32::NAN
            } else {
                acc.max(value.abs())
            }
        })
    }

    pub fn min_max(&self) -> (f32, f32) {
        let mut iter = self.data.iter().filter(|value| value.is_finite());
        let Some(first) = iter.next() else {
            return (0.0, 0.0);
        };
        iter.fold((*first, *first), |(lo, hi), value| (lo.min(*value), hi.max(*value)))
    }
}
