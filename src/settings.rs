//! Dice box settings
//!
//! Persisted as JSON. Every field has a default so partial files load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::FRAME_RATE;
use crate::sim::ContactMaterial;

/// Errors from loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Pixel size of the play surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Half width and half height
    pub fn half_extents(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Tuning for the built-in physics world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Downward acceleration, units/s²
    pub gravity: f32,
    /// Fraction of linear velocity lost per second
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second
    pub angular_damping: f32,
    /// Contact solver passes per step
    pub solver_iterations: u32,
    /// Barrier distance from the center as a fraction of the half extents
    pub barrier_extent: f32,
    pub desk: ContactMaterial,
    pub barrier: ContactMaterial,
    /// Die against die
    pub dice: ContactMaterial,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: 9.8 * 800.0,
            linear_damping: 0.1,
            angular_damping: 0.1,
            solver_iterations: 12,
            barrier_extent: 0.93,
            desk: ContactMaterial::new(0.3, 0.5),
            barrier: ContactMaterial::new(0.0, 1.0),
            dice: ContactMaterial::new(0.0, 0.5),
        }
    }
}

/// Material parameters handed to the render scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialOptions {
    pub specular: u32,
    pub color: u32,
    pub shininess: f32,
    pub flat_shading: bool,
}

impl Default for MaterialOptions {
    fn default() -> Self {
        Self {
            specular: 0x172022,
            color: 0xf0f0f0,
            shininess: 40.0,
            flat_shading: true,
        }
    }
}

/// Visual options. The simulation never reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Appearance {
    pub label_color: String,
    pub dice_color: String,
    pub desk_color: u32,
    pub desk_opacity: f32,
    pub ambient_light_color: u32,
    pub spot_light_color: u32,
    pub use_shadows: bool,
    pub material: MaterialOptions,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            label_color: "#aaaaaa".to_string(),
            dice_color: "#202020".to_string(),
            desk_color: 0x101010,
            desk_opacity: 0.5,
            ambient_light_color: 0xf0f0f0,
            spot_light_color: 0xefefef,
            use_shadows: true,
            material: MaterialOptions::default(),
        }
    }
}

/// Dice box settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub surface: SurfaceSize,
    /// Fixed die scale; derived from the surface diagonal when unset
    pub dice_scale: Option<f32>,
    /// Physics step length in seconds
    pub frame_rate: f32,
    /// Catch up on slow frames with several fixed steps
    pub use_adaptive_timestep: bool,
    /// Most dice a single notation may request
    pub max_dice: usize,
    pub physics: PhysicsSettings,
    pub appearance: Appearance,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            surface: SurfaceSize::default(),
            dice_scale: None,
            frame_rate: FRAME_RATE,
            use_adaptive_timestep: true,
            max_dice: 20,
            physics: PhysicsSettings::default(),
            appearance: Appearance::default(),
        }
    }
}

impl Settings {
    /// Step length, falling back to the default for unusable values
    pub fn effective_frame_rate(&self) -> f32 {
        if self.frame_rate.is_finite() && self.frame_rate > 0.0 {
            self.frame_rate
        } else {
            FRAME_RATE
        }
    }

    /// Die scale for a surface with the given half extents
    pub fn dice_scale_for(&self, half_width: f32, half_height: f32) -> f32 {
        match self.dice_scale {
            Some(scale) if scale > 0.0 => scale,
            _ => (half_width * half_width + half_height * half_height).sqrt() / 8.0,
        }
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&json).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, or defaults if the file is missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}");
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }
}
