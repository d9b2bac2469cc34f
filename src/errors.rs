//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`NyxError`] covers all failure modes including:
//! - GPU initialization failures  
//! - Asset loading and decoding errors
//! - Resource management errors
//! - HTTP and network errors
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, NyxError>`.
//!
//! ```rust,ignore
//! use nyx::errors::{NyxError, Result};
//!
//! fn load_asset() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Nyx engine.
///
/// This enum covers all possible error conditions that can occur
/// during engine operation. Each variant provides specific context
/// about what went wrong.
#[derive(Error, Debug)]
pub enum NyxError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Window system error.
    #[error("Window system error: {0}")]
    WindowError(#[from] raw_window_handle::HandleError),

    /// Event loop error (winit).
    #[cfg(feature = "winit")]
    #[error("Event loop error: {0}")]
    EventLoopError(#[from] winit::error::EventLoopError),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Asset index out of bounds.
    #[error("Asset index out of bounds: {context} (index: {index})")]
    AssetIndexOutOfBounds {
        /// Description of what was being accessed
        context: String,
        /// The invalid index
        index: usize,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ========================================================================
    // HTTP & Network Errors
    // ========================================================================
    /// HTTP request error.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// URL parsing error.
    #[cfg(feature = "http")]
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// HTTP response error with status code.
    #[error("HTTP response error: status {status}")]
    HttpResponseError {
        /// HTTP status code
        status: u16,
    },

    // ========================================================================
    // Image & Texture Errors
    // ========================================================================
    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    /// Cube map validation error.
    #[error("Cube map error: {0}")]
    CubeMapError(String),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// glTF parsing or loading error.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    GltfError(String),

    /// Data URI parsing error.
    #[error("Data URI error: {0}")]
    DataUriError(String),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    // ========================================================================
    // Async & Threading Errors
    // ========================================================================
    /// Task join error (when async tasks fail to complete).
    #[error("Task join error: {0}")]
    TaskJoinError(String),

    // ========================================================================
    // Platform-Specific Errors
    // ========================================================================
    /// Feature not enabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),

    /// WASM-specific error.
    #[cfg(target_arch = "wasm32")]
    #[error("WASM error: {0}")]
    WasmError(String),

    // ========================================================================
    // Resource Registry Errors
    // ========================================================================
    /// The underlying GPU allocator could not satisfy a resource request.
    #[error("Out of memory while creating resource: {0}")]
    OutOfMemory(String),

    /// A resource definition was rejected (empty usage mask, unsupported format, ...).
    #[error("Invalid resource definition: {0}")]
    InvalidDefinition(String),

    /// A requested view (subresource range or byte range) exceeds its resource.
    #[error("View out of range: {0}")]
    OutOfRange(String),

    // ========================================================================
    // Render Graph Build Errors
    // ========================================================================
    /// A node declared two contradictory accesses on the same subresource.
    #[error("Cycle detected while building render graph: {0}")]
    CycleDetected(String),

    /// A node wrote two overlapping views, which would race on the GPU.
    #[error("Aliased view race in render graph: {0}")]
    AliasedViewRace(String),

    /// A descriptor set resolved to a null/unbound slot.
    #[error("Missing binding while compiling render graph: {0}")]
    MissingBinding(String),

    // ========================================================================
    // Pipeline / GPU Submission Errors
    // ========================================================================
    /// A collaborator (materials registry) failed to compile a shader pipeline.
    #[error("Shader compile failed: {0}")]
    ShaderCompileFailed(String),

    /// The GPU device was lost during submission; the core cannot recover.
    #[error("GPU device lost: {0}")]
    DeviceLost(String),

    // ========================================================================
    // Startup / Configuration Errors
    // ========================================================================
    /// A persisted-state file the core depends on at startup is absent.
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    /// A persisted-state file exists but could not be parsed.
    #[error("Configuration malformed: {0}")]
    ConfigMalformed(String),

    // ========================================================================
    // Shadow Allocator Errors (always recovered internally; kept for logging)
    // ========================================================================
    /// A light's accumulated priority overflowed; clamped to a finite value.
    #[error("Shadow priority overflow for light {0}")]
    PriorityOverflow(u64),

    /// A quality tier has no free slots and no donor could be found.
    #[error("Shadow map tier exhausted: {0}")]
    TierExhausted(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for NyxError {
    fn from(err: image::ImageError) -> Self {
        NyxError::ImageDecodeError(err.to_string())
    }
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for NyxError {
    fn from(err: gltf::Error) -> Self {
        NyxError::GltfError(err.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<tokio::task::JoinError> for NyxError {
    fn from(err: tokio::task::JoinError) -> Self {
        NyxError::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, NyxError>`.
pub type Result<T> = std::result::Result<T, NyxError>;
