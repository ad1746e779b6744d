//! Error types for the scene and its host runtime

use std::path::PathBuf;

use thiserror::Error;

use crate::host::NodeId;

pub type HostResult<T> = Result<T, HostError>;

pub type SceneResult<T> = Result<T, SceneError>;

/// Errors reported by a `SceneHost`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("could not create node {name:?}: {reason}")]
    NodeCreation { name: String, reason: String },

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("could not load {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("{0} has no loadable unit")]
    NoLoadableUnit(PathBuf),

    #[error("animation error: {0}")]
    Animation(String),
}

/// Errors from loading data and building the scene
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("unknown body {0:?}")]
    UnknownBody(String),

    #[error("body {0:?} is already built")]
    AlreadyBuilt(String),

    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
