use crate::advect::{advect_scalar_into, advect_velocity_into};
use crate::boundary::{self, BoundaryConfig};
use crate::brush::{self, Brush};
use crate::error::ConfigError;
use crate::pressure::{self, SorParams};
use crate::{CellKind, Field2, MacGrid, MacVelocity2, SimConfig, Vec2, WallMask};

/// Standard gravity, scaled by the configured multiplier.
pub const GRAVITY: f32 = -9.81;

/// Baseline fields a project starts from. During a step they also act
/// as sustaining sources.
#[derive(Clone, Debug, PartialEq)]
pub struct InitialConditions {
    pub u: Field2,
    pub v: Field2,
    pub smoke: Field2,
    pub walls: WallMask,
}

impl InitialConditions {
    /// Still air, no smoke, walls around the edge.
    pub fn empty(grid: MacGrid) -> Self {
        Self {
            u: Field2::new(grid.u_shape(), 0.0),
            v: Field2::new(grid.v_shape(), 0.0),
            smoke: Field2::new(grid.cell_shape(), 0.0),
            walls: WallMask::closed_box(grid),
        }
    }

    fn check(&self, grid: MacGrid) -> Result<(), ConfigError> {
        let fields = [
            ("u", self.u.shape(), grid.u_shape()),
            ("v", self.v.shape(), grid.v_shape()),
            ("smoke", self.smoke.shape(), grid.cell_shape()),
        ];
        for (field, actual, expected) in fields {
            if actual != expected {
                return Err(ConfigError::ShapeMismatch {
                    field,
                    expected: expected.size(),
                    actual: actual.size(),
                });
            }
        }
        if self.walls.num_cells() != grid.num_cells() {
            return Err(ConfigError::ShapeMismatch {
                field: "walls",
                expected: grid.cell_shape().size(),
                actual: self.walls.as_bytes().len(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindTunnel {
    /// Inlet speed in m/s, blowing left to right.
    pub speed: f32,
    /// Height of the smoke band fed at the inlet, in cells.
    pub smoke_width: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepParams {
    pub dt: f32,
    pub iterations: usize,
    pub sor_weight: f32,
    pub advect: bool,
    pub project: bool,
}

impl StepParams {
    /// Rejects a timestep or relaxation weight the solver cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::Timestep { dt: self.dt });
        }
        if !(self.sor_weight > 0.0 && self.sor_weight < 2.0) {
            return Err(ConfigError::SorWeight {
                weight: self.sor_weight,
            });
        }
        Ok(())
    }
}

impl From<&SimConfig> for StepParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            dt: config.dt,
            iterations: config.pressure_iterations,
            sor_weight: config.sor_weight,
            advect: true,
            project: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    /// Sum of |div| right before the pressure solve.
    pub divergence_before: f32,
    /// Sum of |div| once the step is done.
    pub divergence_after: f32,
    pub total_smoke: f32,
    pub max_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Diagnostics {
    pub steps: u64,
    pub total_divergence: f32,
    pub total_smoke: f32,
    pub max_speed: f32,
    pub kinetic_energy: f32,
    pub pressure_range: (f32, f32),
    pub open_cells: usize,
}

/// Owns every field of one simulation and runs the per-frame pipeline.
#[derive(Clone, Debug)]
pub struct Grid {
    config: SimConfig,
    grid: MacGrid,
    walls: WallMask,
    velocity: MacVelocity2,
    smoke: Field2,
    pressure: Field2,
    divergence: Field2,
    initial: InitialConditions,
    boundaries: BoundaryConfig,
    wind_tunnel: Option<WindTunnel>,
    velocity_scratch: MacVelocity2,
    smoke_scratch: Field2,
    steps: u64,
}

impl Grid {
    pub fn new(config: SimConfig, initial: Option<InitialConditions>) -> Result<Self, ConfigError> {
        let grid = config.grid()?;
        let initial = match initial {
            Some(initial) => {
                initial.check(grid)?;
                initial
            }
            None => InitialConditions::empty(grid),
        };
        log::debug!(
            "grid {}x{} cells, cell size {:.4} m, {} open",
            grid.num_cells(),
            grid.num_cells(),
            grid.cell_size(),
            initial.walls.open_count()
        );
        let cell_shape = grid.cell_shape();
        Ok(Self {
            config,
            grid,
            walls: initial.walls.clone(),
            velocity: MacVelocity2::from_components(grid, initial.u.clone(), initial.v.clone()),
            smoke: initial.smoke.clone(),
            pressure: Field2::new(cell_shape, 0.0),
            divergence: Field2::new(cell_shape, 0.0),
            initial,
            boundaries: BoundaryConfig::closed(),
            wind_tunnel: None,
            velocity_scratch: MacVelocity2::zeros(grid),
            smoke_scratch: Field2::new(cell_shape, 0.0),
            steps: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> MacGrid {
        self.grid
    }

    pub fn velocity(&self) -> &MacVelocity2 {
        &self.velocity
    }

    pub fn u(&self) -> &Field2 {
        self.velocity.u()
    }

    pub fn v(&self) -> &Field2 {
        self.velocity.v()
    }

    pub fn smoke(&self) -> &Field2 {
        &self.smoke
    }

    pub fn pressure(&self) -> &Field2 {
        &self.pressure
    }

    pub fn divergence(&self) -> &Field2 {
        &self.divergence
    }

    pub fn walls(&self) -> &WallMask {
        &self.walls
    }

    pub fn initial_conditions(&self) -> &InitialConditions {
        &self.initial
    }

    pub fn boundaries(&self) -> BoundaryConfig {
        self.boundaries
    }

    pub fn set_boundaries(&mut self, boundaries: BoundaryConfig) {
        self.boundaries = boundaries;
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.config.gravity = gravity;
    }

    pub fn wind_tunnel(&self) -> Option<WindTunnel> {
        self.wind_tunnel
    }

    /// Face-averaged velocity at a cell centre.
    pub fn cell_velocity(&self, x: usize, y: usize) -> Vec2 {
        self.velocity.cell_average(x, y)
    }

    /// Turns the left/right border columns into an inlet and an outlet, or
    /// walls them up again for `None`.
    pub fn set_wind_tunnel(&mut self, tunnel: Option<WindTunnel>) {
        let n = self.grid.num_cells();
        let kind = if tunnel.is_some() {
            CellKind::Open
        } else {
            CellKind::Wall
        };
        for y in self.grid.interior() {
            self.walls.set(0, y, kind);
            self.walls.set(n - 1, y, kind);
        }
        self.boundaries = match tunnel {
            Some(tunnel) => BoundaryConfig::wind_tunnel(tunnel.speed),
            None => BoundaryConfig::closed(),
        };
        self.wind_tunnel = tunnel;
    }

    /// Gravity, sustaining sources and the wind-tunnel inlet.
    pub fn apply_forces(&mut self, dt: f32) {
        let n = self.grid.num_cells();
        let dv = GRAVITY * self.config.gravity * dt;
        if dv != 0.0 {
            self.velocity.v_mut().update_with_index(|x, y, value| {
                if (1..n - 1).contains(&x) && (1..n).contains(&y) {
                    value + dv
                } else {
                    value
                }
            });
        }

        let (u, v) = self.velocity.components_mut();
        sustain(u, &self.initial.u);
        sustain(v, &self.initial.v);
        sustain(&mut self.smoke, &self.initial.smoke);

        if let Some(tunnel) = self.wind_tunnel {
            for y in self.grid.interior() {
                self.velocity.u_mut().set(1, y, tunnel.speed);
            }
            let width = tunnel.smoke_width.min(n - 2);
            let start = (n - width) / 2;
            for y in start..start + width {
                self.smoke.set(1, y, 1.0);
            }
        }
    }

    pub fn enforce_boundaries(&mut self) {
        boundary::enforce_boundaries(
            &self.walls,
            self.boundaries,
            &mut self.velocity,
            &mut self.smoke,
        );
    }

    /// Transports velocity and smoke through the current velocity field,
    /// then clamps smoke to [0, 1].
    pub fn advect(&mut self, dt: f32) {
        advect_velocity_into(&mut self.velocity_scratch, &self.walls, &self.velocity, dt);
        advect_scalar_into(
            &mut self.smoke_scratch,
            &self.walls,
            &self.velocity,
            &self.smoke,
            dt,
        );
        std::mem::swap(&mut self.velocity, &mut self.velocity_scratch);
        std::mem::swap(&mut self.smoke, &mut self.smoke_scratch);
        self.smoke.clamp_in_place(0.0, 1.0);
    }

    pub fn compute_divergence(&mut self) {
        pressure::divergence_into(&mut self.divergence, &self.walls, &self.velocity);
    }

    pub fn solve_pressure(&mut self, dt: f32, sor: SorParams) {
        pressure::solve_pressure_into(
            &mut self.pressure,
            &self.divergence,
            &self.walls,
            self.grid,
            dt,
            self.config.density,
            sor,
        );
    }

    pub fn project(&mut self, dt: f32) {
        pressure::project(
            &mut self.velocity,
            &self.pressure,
            &self.walls,
            dt,
            self.config.density,
        );
    }

    /// Runs one frame. Invalid parameters are rejected before any field
    /// is touched.
    pub fn step(&mut self, params: &StepParams) -> Result<StepReport, ConfigError> {
        params.validate()?;
        let sor = SorParams {
            iterations: params.iterations,
            weight: params.sor_weight,
        };
        self.apply_forces(params.dt);
        self.enforce_boundaries();
        if params.advect {
            self.advect(params.dt);
        }
        self.compute_divergence();
        let divergence_before = self.divergence.abs_sum();
        self.solve_pressure(params.dt, sor);
        if params.project {
            self.project(params.dt);
        }
        self.enforce_boundaries();
        self.compute_divergence();
        self.steps += 1;

        let report = StepReport {
            divergence_before,
            divergence_after: self.divergence.abs_sum(),
            total_smoke: self.smoke.sum(),
            max_speed: self.velocity.max_abs(),
        };
        log::trace!(
            "step {}: |div| {:.4} -> {:.4}, smoke {:.3}, max speed {:.3}",
            self.steps,
            report.divergence_before,
            report.divergence_after,
            report.total_smoke,
            report.max_speed
        );
        Ok(report)
    }

    pub fn paint_velocity(&mut self, brush: Brush, delta: Vec2) -> usize {
        brush::paint_velocity(&mut self.velocity, brush, delta)
    }

    pub fn paint_smoke(&mut self, brush: Brush, amount: f32) -> usize {
        brush::paint_scalar(&mut self.smoke, self.grid, brush, amount)
    }

    pub fn paint_walls(&mut self, brush: Brush) -> usize {
        brush::paint_walls(&mut self.walls, self.grid, brush, CellKind::Wall)
    }

    pub fn erase_walls(&mut self, brush: Brush) -> usize {
        brush::paint_walls(&mut self.walls, self.grid, brush, CellKind::Open)
    }

    /// Takes the current fields as the new baseline.
    pub fn capture_initial_conditions(&mut self) {
        self.initial = InitialConditions {
            u: self.velocity.u().clone(),
            v: self.velocity.v().clone(),
            smoke: self.smoke.clone(),
            walls: self.walls.clone(),
        };
    }

    pub fn restore_initial_conditions(&mut self) {
        self.velocity.u_mut().clone_from(&self.initial.u);
        self.velocity.v_mut().clone_from(&self.initial.v);
        self.smoke.clone_from(&self.initial.smoke);
        self.walls = self.initial.walls.clone();
        self.pressure.fill(0.0);
        self.divergence.fill(0.0);
        // The baseline walls may close the tunnel's border columns.
        if let Some(tunnel) = self.wind_tunnel {
            self.set_wind_tunnel(Some(tunnel));
        }
    }

    /// Zeroes the live fields; walls and the baseline are kept.
    pub fn clear(&mut self) {
        self.velocity.u_mut().fill(0.0);
        self.velocity.v_mut().fill(0.0);
        self.smoke.fill(0.0);
        self.pressure.fill(0.0);
        self.divergence.fill(0.0);
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            steps: self.steps,
            total_divergence: self.divergence.abs_sum(),
            total_smoke: self.smoke.sum(),
            max_speed: self.velocity.max_abs(),
            kinetic_energy: 0.5 * self.config.density * self.velocity.energy(),
            pressure_range: self.pressure.min_max(),
            open_cells: self.walls.open_count(),
        }
    }
}

/// Replaces entries of `field` where the source is stronger.
fn sustain(field: &mut Field2, source: &Field2) {
    for (value, src) in field.as_mut_slice().iter_mut().zip(source.as_slice()) {
        if src.abs() > value.abs() {
            *value = *src;
        }
    }
}
