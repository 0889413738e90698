mod advect;
mod boundary;
mod brush;
mod config;
mod error;
mod field;
mod grid;
mod mac;
mod pressure;
mod sim;
mod store;
mod vec2;
pub mod view;

pub use advect::{advect_scalar_into, advect_velocity_into, velocity_at};
pub use boundary::{
    apply_domain_boundaries, clear_wall_scalar, enforce_boundaries, enforce_free_slip,
    BoundaryCondition, BoundaryConfig,
};
pub use brush::{falloff, Brush};
pub use config::SimConfig;
pub use error::{ConfigError, StoreError};
pub use field::Field2;
pub use grid::{FieldShape, MacGrid, Stagger};
pub use mac::{CellKind, MacVelocity2, WallMask};
pub use pressure::{divergence_into, project, solve_pressure_into, SorParams};
pub use sim::{
    Diagnostics, Grid, InitialConditions, StepParams, StepReport, WindTunnel, GRAVITY,
};
pub use store::{
    load_initial_conditions, save_initial_conditions, FieldStatus, LoadReport, ProjectOptions,
};
pub use vec2::Vec2;
