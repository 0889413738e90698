use std::path::PathBuf;

/// Rejected simulation settings, raised before any field is allocated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("resolution {resolution} leaves no interior; need at least 3 cells per side")]
    Resolution { resolution: usize },

    #[error("domain length must be finite and positive, got {length}")]
    DomainLength { length: f32 },

    #[error("timestep must be finite and positive, got {dt}")]
    Timestep { dt: f32 },

    #[error("fluid density must be finite and positive, got {density}")]
    Density { density: f32 },

    #[error("SOR weight must lie in (0, 2), got {weight}")]
    SorWeight { weight: f32 },

    #[error("gravity multiplier must be finite, got {gravity}")]
    Gravity { gravity: f32 },

    #[error("initial {field} has {actual} values, grid expects {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {field}: {source}")]
    Encode {
        field: &'static str,
        #[source]
        source: bincode::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("invalid project options in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
