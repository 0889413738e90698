//! On-disk project layout.
//!
//! ```text
//! <project>/options.json     resolution and gravity
//! <project>/grid/u.bin       bincode { width, height, data: [f32] }
//! <project>/grid/v.bin
//! <project>/grid/s.bin
//! <project>/grid/w.bin       bincode { width, height, data: [u8] }
//! ```

use crate::error::StoreError;
use crate::{Field2, FieldShape, InitialConditions, MacGrid, SimConfig, WallMask};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const OPTIONS_FILE: &str = "options.json";
const GRID_DIR: &str = "grid";

#[derive(Serialize, Deserialize)]
struct FieldFile<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldStatus {
    Loaded,
    Missing,
    Corrupt(String),
    WrongShape {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

impl FieldStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, FieldStatus::Loaded)
    }
}

/// Result of reading a project's initial conditions. Every field is
/// usable; the statuses say which ones fell back to defaults.
#[derive(Clone, Debug)]
pub struct LoadReport {
    pub initial: InitialConditions,
    pub u: FieldStatus,
    pub v: FieldStatus,
    pub smoke: FieldStatus,
    pub walls: FieldStatus,
}

impl LoadReport {
    pub fn all_loaded(&self) -> bool {
        [&self.u, &self.v, &self.smoke, &self.walls]
            .iter()
            .all(|status| status.is_loaded())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectOptions {
    pub resolution: usize,
    pub gravity: f32,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        let config = SimConfig::default();
        Self {
            resolution: config.resolution,
            gravity: config.gravity,
        }
    }
}

impl ProjectOptions {
    pub fn load(project: &Path) -> Result<Self, StoreError> {
        let path = project.join(OPTIONS_FILE);
        let contents = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Json { path, source })
    }

    pub fn save(&self, project: &Path) -> Result<(), StoreError> {
        let path = project.join(OPTIONS_FILE);
        let contents =
            serde_json::to_string_pretty(self).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;
        write_atomic(&path, contents.as_bytes())
    }

    pub fn apply_to(&self, config: &mut SimConfig) {
        config.resolution = self.resolution;
        config.gravity = self.gravity;
    }
}

fn field_path(project: &Path, name: &str) -> PathBuf {
    project.join(GRID_DIR).join(format!("{name}.bin"))
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, data).map_err(io_err)?;
    fs::rename(&temp_path, path).map_err(io_err)
}

fn save_field<T: Serialize + Clone>(
    project: &Path,
    name: &'static str,
    width: usize,
    height: usize,
    data: &[T],
) -> Result<(), StoreError> {
    let file = FieldFile {
        width,
        height,
        data: data.to_vec(),
    };
    let bytes = bincode::serialize(&file).map_err(|source| StoreError::Encode {
        field: name,
        source,
    })?;
    write_atomic(&field_path(project, name), &bytes)
}

/// Writes `u`, `v`, smoke and walls under `<project>/grid/`.
pub fn save_initial_conditions(
    project: &Path,
    initial: &InitialConditions,
) -> Result<(), StoreError> {
    for (name, field) in [("u", &initial.u), ("v", &initial.v), ("s", &initial.smoke)] {
        save_field(project, name, field.width(), field.height(), field.as_slice())?;
    }
    let n = initial.walls.num_cells();
    save_field(project, "w", n, n, initial.walls.as_bytes())?;
    log::debug!("saved initial conditions to {}", project.display());
    Ok(())
}

fn read_field<T: DeserializeOwned>(
    project: &Path,
    name: &str,
    expected: (usize, usize),
) -> Result<Vec<T>, FieldStatus> {
    let path = field_path(project, name);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(FieldStatus::Missing)
        }
        Err(err) => return Err(FieldStatus::Corrupt(err.to_string())),
    };
    let file: FieldFile<T> = bincode::deserialize(&bytes).map_err(|err| {
        FieldStatus::Corrupt(
            StoreError::Decode {
                path: path.clone(),
                source: err,
            }
            .to_string(),
        )
    })?;
    let found = (file.width, file.height);
    if found != expected {
        return Err(FieldStatus::WrongShape { expected, found });
    }
    if file.data.len() != expected.0 * expected.1 {
        return Err(FieldStatus::Corrupt(format!(
            "{} values for a {}x{} field",
            file.data.len(),
            expected.0,
            expected.1
        )));
    }
    Ok(file.data)
}

fn load_scalar(project: &Path, name: &str, shape: FieldShape) -> (Field2, FieldStatus) {
    match read_field::<f32>(project, name, (shape.width(), shape.height())) {
        Ok(data) => (Field2::from_data(shape, data), FieldStatus::Loaded),
        Err(status) => {
            log::warn!("initial field {name} not loaded ({status:?}); using zeros");
            (Field2::new(shape, 0.0), status)
        }
    }
}

/// Reads whatever initial conditions the project has. Never fails: each
/// missing or unreadable field is replaced by zeros (walls by a closed box).
pub fn load_initial_conditions(project: &Path, grid: MacGrid) -> LoadReport {
    let (u, u_status) = load_scalar(project, "u", grid.u_shape());
    let (v, v_status) = load_scalar(project, "v", grid.v_shape());
    let (smoke, smoke_status) = load_scalar(project, "s", grid.cell_shape());

    let n = grid.num_cells();
    let walls_read = read_field::<u8>(project, "w", (n, n)).and_then(|bytes| {
        WallMask::from_bytes(grid, bytes)
            .ok_or_else(|| FieldStatus::Corrupt("wall value outside 0/1".to_string()))
    });
    let (walls, walls_status) = match walls_read {
        Ok(mask) => (mask, FieldStatus::Loaded),
        Err(status) => {
            log::warn!("initial walls not loaded ({status:?}); using closed box");
            (WallMask::closed_box(grid), status)
        }
    };

    log::debug!("loaded initial conditions from {}", project.display());
    LoadReport {
        initial: InitialConditions {
            u,
            v,
            smoke,
            walls,
        },
        u: u_status,
        v: v_status,
        smoke: smoke_status,
        walls: walls_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_project_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let grid = MacGrid::new(6, 1.0);
        let report = load_initial_conditions(dir.path(), grid);
        assert_eq!(report.u, FieldStatus::Missing);
        assert_eq!(report.walls, FieldStatus::Missing);
        assert!(!report.all_loaded());
        assert_eq!(report.initial.u.abs_sum(), 0.0);
        assert_eq!(report.initial.walls, WallMask::closed_box(grid));
    }

    #[test]
    fn wrong_resolution_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let small = MacGrid::new(5, 1.0);
        save_initial_conditions(dir.path(), &InitialConditions::empty(small)).unwrap();
        let big = MacGrid::new(7, 1.0);
        let report = load_initial_conditions(dir.path(), big);
        assert_eq!(
            report.smoke,
            FieldStatus::WrongShape {
                expected: (7, 7),
                found: (5, 5)
            }
        );
        assert_eq!(report.initial.smoke.shape(), big.cell_shape());
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let grid = MacGrid::new(5, 1.0);
        fs::create_dir_all(dir.path().join(GRID_DIR)).unwrap();
        fs::write(field_path(dir.path(), "v"), b"\x01\x02").unwrap();
        let report = load_initial_conditions(dir.path(), grid);
        assert!(matches!(report.v, FieldStatus::Corrupt(_)));
        assert_eq!(report.initial.v.shape(), grid.v_shape());
    }

    #[test]
    fn bad_wall_bytes_fall_back_to_closed_box() {
        let dir = tempfile::tempdir().unwrap();
        let grid = MacGrid::new(4, 1.0);
        save_field(dir.path(), "w", 4, 4, &[7u8; 16][..]).unwrap();
        let report = load_initial_conditions(dir.path(), grid);
        assert!(matches!(report.walls, FieldStatus::Corrupt(_)));
        assert_eq!(report.initial.walls, WallMask::closed_box(grid));
    }

    #[test]
    fn options_round_trip_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let options = ProjectOptions {
            resolution: 66,
            gravity: 0.5,
        };
        options.save(dir.path()).unwrap();
        let text = fs::read_to_string(dir.path().join(OPTIONS_FILE)).unwrap();
        assert!(text.contains("\"resolution\": 66"));
        assert_eq!(ProjectOptions::load(dir.path()).unwrap(), options);

        let mut config = SimConfig::default();
        options.apply_to(&mut config);
        assert_eq!(config.resolution, 66);
        assert_eq!(config.gravity, 0.5);
    }

    #[test]
    fn missing_options_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProjectOptions::load(dir.path()),
            Err(StoreError::Io { .. })
        ));
    }
}
