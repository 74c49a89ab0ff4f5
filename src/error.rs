use nalgebra::SVector;
use thiserror::Error;

use crate::shared::Float;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("particle {index} at {position} lies outside the root region")]
    OutOfBounds { index: usize, position: String },

    #[error("particle {index} has mass {mass}; masses must be finite and non-negative")]
    InvalidMass { index: usize, mass: String },

    #[error("root region extents {extents} must be finite and positive")]
    InvalidRegion { extents: String },

    #[error("leaf capacity must be at least 1")]
    InvalidCapacity,
}

pub(crate) fn describe<F: Float, const D: usize>(v: &SVector<F, D>) -> String {
    format!("{:?}", v.as_slice())
}
