use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {details}", .path.display())]
    Parse { path: PathBuf, details: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {details}", .path.display())]
    Parse { path: PathBuf, details: String },
    #[error("layer {layer:?} in {}: {source}", .path.display())]
    Layer {
        path: PathBuf,
        layer: String,
        #[source]
        source: tui_map::parse::ParseError,
    },
    #[error("layers in {} disagree: {source}", .path.display())]
    Stack {
        path: PathBuf,
        #[source]
        source: tui_map::core::CoreError,
    },
    #[error("tileset {}: {details}", .path.display())]
    Tileset { path: PathBuf, details: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MapLoadError {
    #[error("map {0:?} is not part of the scenario")]
    Unlisted(String),
    #[error("map {0:?} has no tiles")]
    Empty(String),
    #[error("map file {path} failed to load: {reason}")]
    Unavailable { path: String, reason: String },
    #[error("map file {0} was never loaded")]
    NotLoaded(String),
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("no map named {0:?}")]
    UnknownMap(String),
    #[error("map {id:?} could not be built: {source}")]
    MapUnavailable {
        id: String,
        #[source]
        source: MapLoadError,
    },
    #[error("no position to return to")]
    NoPreviousPosition,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("scenario is inconsistent: {0}")]
    Scenario(String),
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}
