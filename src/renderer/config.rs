//! Persisted-state configuration structs.
//!
//! Mirrors the shape of [`super::settings::RenderSettings`] (plain struct +
//! `Default` impl) but for state that is loaded from disk rather than built
//! in code: shadow-map tier capacities, DDGI probe volume parameters, and the
//! material-technique registry. Each type exposes a fallible `from_str`
//! (serde-driven) and a thin `load` wrapper that turns a missing file into
//! [`NyxError::ConfigMissing`] and a parse failure into
//! [`NyxError::ConfigMalformed`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{NyxError, Result};

/// Tier capacities and per-frame budgets for the point-light shadow-map pool.
///
/// Grounded on the distilled source's `ShadowMapsSettings` YAML record and
/// `params::maxShadowMapsUpgradedPerFrame` / `maxShadowMapsUpdatedPerFrame`;
/// represented here as JSON since this codebase's other config-like assets
/// (glTF extras, shader manifests) are JSON rather than YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowMapsSettings {
    /// Number of high-quality (1024px) cube shadow-map slots.
    pub high_quality_shadow_maps: u32,
    /// Number of medium-quality (512px) cube shadow-map slots.
    pub medium_quality_shadow_maps: u32,
    /// Number of low-quality (256px) cube shadow-map slots.
    pub low_quality_shadow_maps: u32,
    /// Max number of lights upgraded to a higher tier per frame, respected exactly.
    pub max_shadow_maps_upgraded_per_frame: u32,
    /// Max number of shadow maps re-rendered per frame, respected exactly.
    pub max_shadow_maps_updated_per_frame: u32,
    /// Near plane used for every cube-face perspective projection.
    pub projection_near_plane: f32,
}

impl Default for ShadowMapsSettings {
    fn default() -> Self {
        Self {
            high_quality_shadow_maps: 4,
            medium_quality_shadow_maps: 8,
            low_quality_shadow_maps: 16,
            max_shadow_maps_upgraded_per_frame: 1,
            max_shadow_maps_updated_per_frame: 3,
            projection_near_plane: 0.04,
        }
    }
}

impl ShadowMapsSettings {
    /// Parses settings from a JSON string.
    pub fn from_str(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)
            .map_err(|e| NyxError::ConfigMalformed(format!("ShadowMapsSettings: {e}")))?;
        Ok(settings)
    }

    /// Loads settings from a file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_config(path, Self::from_str)
    }
}

/// Dynamic Diffuse Global Illumination probe-volume configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DDGIConfig {
    /// Probe counts along each world axis.
    pub probe_counts: [u32; 3],
    /// World-space spacing between probes along each axis.
    pub probe_spacing: [f32; 3],
    /// World-space position of probe `(0, 0, 0)`.
    pub origin: [f32; 3],
    /// Irradiance octahedral map resolution per probe, in texels.
    pub irradiance_resolution: u32,
    /// Distance octahedral map resolution per probe, in texels.
    pub visibility_resolution: u32,
    /// Hysteresis blend factor applied when updating probe irradiance (0.0-1.0).
    pub hysteresis: f32,
}

impl Default for DDGIConfig {
    fn default() -> Self {
        Self {
            probe_counts: [16, 8, 16],
            probe_spacing: [2.0, 2.0, 2.0],
            origin: [0.0, 0.0, 0.0],
            irradiance_resolution: 8,
            visibility_resolution: 16,
            hysteresis: 0.97,
        }
    }
}

impl DDGIConfig {
    pub fn from_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| NyxError::ConfigMalformed(format!("DDGIConfig: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_config(path, Self::from_str)
    }
}

/// One entry in the material-technique registry: maps a technique name to the
/// shader permutation it should resolve to for a given render pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialTechniqueEntry {
    pub technique: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    #[serde(default)]
    pub defines: Vec<String>,
}

/// The full set of material techniques known to the renderer, persisted as a
/// flat list so new techniques can be added without touching code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialTechniquesRegistry {
    pub techniques: Vec<MaterialTechniqueEntry>,
}

impl MaterialTechniquesRegistry {
    pub fn from_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| NyxError::ConfigMalformed(format!("MaterialTechniquesRegistry: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_config(path, Self::from_str)
    }

    #[must_use]
    pub fn find(&self, technique: &str) -> Option<&MaterialTechniqueEntry> {
        self.techniques.iter().find(|t| t.technique == technique)
    }
}

fn load_config<T>(path: impl AsRef<Path>, parse: impl FnOnce(&str) -> Result<T>) -> Result<T> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| NyxError::ConfigMissing(format!("{}: {e}", path.display())))?;
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_maps_settings_round_trip() {
        let settings = ShadowMapsSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed = ShadowMapsSettings::from_str(&json).unwrap();
        assert_eq!(parsed.high_quality_shadow_maps, settings.high_quality_shadow_maps);
        assert_eq!(parsed.projection_near_plane, settings.projection_near_plane);
    }

    #[test]
    fn shadow_maps_settings_clamps_budgets() {
        let json = r#"{
            "highQualityShadowMaps": 4,
            "mediumQualityShadowMaps": 8,
            "lowQualityShadowMaps": 16,
            "maxShadowMapsUpgradedPerFrame": 99,
            "maxShadowMapsUpdatedPerFrame": 42,
            "projectionNearPlane": 0.04
        }"#;
        let settings = ShadowMapsSettings::from_str(json).unwrap();
        assert_eq!(settings.max_shadow_maps_upgraded_per_frame, 10);
        assert_eq!(settings.max_shadow_maps_updated_per_frame, 10);
    }

    #[test]
    fn malformed_settings_report_config_malformed() {
        let err = ShadowMapsSettings::from_str("{ not json").unwrap_err();
        assert!(matches!(err, NyxError::ConfigMalformed(_)));
    }

    #[test]
    fn missing_file_reports_config_missing() {
        let err = ShadowMapsSettings::load("/nonexistent/ShadowMapsSettings.json").unwrap_err();
        assert!(matches!(err, NyxError::ConfigMissing(_)));
    }

    #[test]
    fn material_techniques_registry_lookup() {
        let registry = MaterialTechniquesRegistry {
            techniques: vec![MaterialTechniqueEntry {
                technique: "pbr_metallic_roughness".to_string(),
                vertex_shader: "pbr.vert".to_string(),
                fragment_shader: "pbr.frag".to_string(),
                defines: vec!["USE_IBL".to_string()],
            }],
        };
        assert!(registry.find("pbr_metallic_roughness").is_some());
        assert!(registry.find("unknown").is_none());
    }
}
