//! Core shared types and errors (renderer-agnostic).

pub use glam::{Vec2, Vec3, vec2, vec3};

use thiserror::Error;

pub mod handles;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No handle registered for '{0}'")]
    UnknownHandle(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
