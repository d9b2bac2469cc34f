//! Format-specific asset loaders, gated behind their own Cargo features.

#[cfg(feature = "gltf")]
pub mod gltf;

#[cfg(feature = "gltf")]
pub use gltf::GltfLoader;
