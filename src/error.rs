use thiserror::Error;

/// Errors raised while setting up a collision scene. The per-frame hot path is infallible.
#[derive(Debug, Error)]
pub enum CollisionError {
    #[error("entity array is full (capacity {capacity})")]
    CapacityExhausted { capacity: usize },

    #[error("tile grid {width}x{height} expects {expected} cells, got {actual}")]
    GridSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("tile id {id} at cell {index} has no tile info")]
    UnknownTile { id: u16, index: usize },

    #[error("invalid physics config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
