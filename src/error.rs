//! Error types for the accelerator path.
//!
//! The host-side primitives have no detectable failure mode: slices make
//! malformed ranges and null buffers unrepresentable, and a comparator that
//! violates strict weak ordering can mis-sort but never touch memory out of
//! bounds. Everything that can actually fail lives on the device boundary.

use thiserror::Error;

/// Errors surfaced by the GPU backend.
#[derive(Debug, Error)]
pub enum Error {
    /// No Metal device is available on this machine.
    #[error("no Metal device found; GPU primitives require Apple Silicon or another Metal-capable GPU")]
    NoDevice,

    /// The current platform has no GPU backend at all.
    #[error("GPU primitives are only available on macOS; this platform is not supported")]
    UnsupportedPlatform,

    /// The embedded shader source failed to compile.
    #[error("failed to compile device shader: {0}")]
    ShaderCompile(String),

    /// A kernel function was missing from the compiled library.
    #[error("failed to get kernel function `{0}`: {1}")]
    KernelFunction(&'static str, String),

    /// Compute pipeline creation failed.
    #[error("failed to create compute pipeline for `{0}`: {1}")]
    Pipeline(&'static str, String),
}
