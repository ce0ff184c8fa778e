//! Error Types
//!
//! This module defines the error types used throughout the pipeline.
//!
//! # Overview
//!
//! The main error type [`AfterglowError`] covers all failure modes including:
//! - Render-target and program creation failures reported by the device
//! - Degenerate surface resolutions
//! - Invalid blur kernel weights
//! - Zero-depth pyramid configuration
//!
//! Capability gaps (missing render-target support, missing shader compiler,
//! unsupported multisample levels) are deliberately **not** errors: the
//! pipeline degrades to a disabled state and writes the clamped or disabled
//! value back into the caller's [`PipelineConfig`](crate::PipelineConfig).
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, AfterglowError>`.

use thiserror::Error;

/// The main error type for the afterglow pipeline.
///
/// Every variant is recoverable: when initialization fails the pipeline
/// rolls back any partially-created resources and disables itself, so the
/// caller may keep rendering without the post-process effect.
#[derive(Error, Debug)]
pub enum AfterglowError {
    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The render device reported a resource or program creation failure.
    #[error("Render device error: {0}")]
    Device(String),

    // ========================================================================
    // Surface Errors
    // ========================================================================
    /// A surface was requested with a zero-sized resolution.
    #[error("Degenerate surface resolution for '{label}': {width}x{height}")]
    DegenerateSurface {
        /// Debug label of the offending surface
        label: String,
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    // ========================================================================
    // Filter Errors
    // ========================================================================
    /// Blur kernel weights do not sum to a positive value and cannot be
    /// normalized.
    #[error("Blur kernel weights sum to {sum}, expected a positive sum")]
    InvalidKernel {
        /// Sum of the supplied weights
        sum: f32,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The pipeline was configured with zero bloom pyramid levels.
    #[error("Bloom pyramid depth must be at least 1")]
    EmptyPyramid,
}

/// Alias for `Result<T, AfterglowError>`.
pub type Result<T> = std::result::Result<T, AfterglowError>;
