//! Stage configuration.
//!
//! [`StageConfig::default`] reproduces the reference page: a white, foggy
//! stage with a green floor, one sun and one hemisphere light, and a duck
//! scrolled in from an offset to the origin.

use crate::animation::BindingSpec;

/// Environment variable overriding [`HostConfig::assets_root`].
pub const ASSET_ROOT_ENV: &str = "SCROLL_STAGE_ASSET_ROOT";
/// Environment variable forcing the reduced-motion preference (`1`/`0`).
pub const REDUCED_MOTION_ENV: &str = "SCROLL_STAGE_REDUCED_MOTION";

/// An sRGB colour given as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u32);

impl Rgb {
    pub fn to_srgb(self) -> [f32; 3] {
        [
            ((self.0 >> 16) & 0xff) as f32 / 255.0,
            ((self.0 >> 8) & 0xff) as f32 / 255.0,
            (self.0 & 0xff) as f32 / 255.0,
        ]
    }

    pub fn to_linear(self) -> [f32; 3] {
        self.to_srgb().map(srgb_to_linear)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct SunConfig {
    pub color: Rgb,
    pub intensity: f32,
    /// The light shines from here toward the origin.
    pub position: [f32; 3],
    pub cast_shadow: bool,
    pub shadow_far: f32,
    pub shadow_map_size: u32,
    pub shadow_normal_bias: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HemisphereConfig {
    pub sky: Rgb,
    pub ground: Rgb,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloorConfig {
    pub size: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub background: Rgb,
    pub fog_near: f32,
    pub fog_far: f32,
    pub camera: CameraConfig,
    pub sun: SunConfig,
    pub hemisphere: HemisphereConfig,
    pub floor: FloorConfig,
    /// Reinhard tone mapping exposure.
    pub exposure: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: Rgb(0xffffff),
            fog_near: 15.0,
            fog_far: 20.0,
            camera: CameraConfig {
                fovy_degrees: 40.0,
                znear: 0.1,
                zfar: 100.0,
                position: [0.0, 1.0, 5.0],
                target: [0.0, 1.0, 0.0],
            },
            sun: SunConfig {
                color: Rgb(0xffffff),
                intensity: 2.0,
                position: [2.0, 5.0, 3.0],
                cast_shadow: true,
                shadow_far: 10.0,
                shadow_map_size: 1024,
                shadow_normal_bias: 0.05,
            },
            hemisphere: HemisphereConfig {
                sky: Rgb(0xaaaaff),
                ground: Rgb(0x88ff88),
                intensity: 0.5,
            },
            floor: FloorConfig {
                size: 100.0,
                color: Rgb(0x88ff88),
            },
            exposure: 5.0,
        }
    }
}

/// One model to fetch. `source` is a path relative to the asset root or an
/// absolute `http(s)` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSpec {
    pub source: String,
    pub name: String,
}

impl AssetSpec {
    pub fn new(source: &str, name: &str) -> Self {
        Self {
            source: source.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Id of the element the canvas is appended to (web).
    pub container_id: String,
    /// Selector of the element whose scroll range drives the bindings (web).
    pub trigger_selector: String,
    pub assets_root: String,
    /// Overrides the detected reduced-motion preference.
    pub reduced_motion: Option<bool>,
    /// Height of the virtual page scrolled with the mouse wheel (native).
    pub virtual_page_height: f32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            container_id: "canvas-container".to_string(),
            trigger_selector: "#scroll-track".to_string(),
            assets_root: default_assets_root().to_string(),
            reduced_motion: None,
            virtual_page_height: 3000.0,
        }
    }
}

/// The copy of `assets/` made at build time on native targets, the
/// `assets/` path next to the page on the web.
pub fn default_assets_root() -> &'static str {
    #[cfg(not(target_arch = "wasm32"))]
    {
        env!("SCROLL_STAGE_BUNDLED_ASSETS")
    }
    #[cfg(target_arch = "wasm32")]
    {
        "assets"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub scene: SceneConfig,
    pub assets: Vec<AssetSpec>,
    pub bindings: Vec<BindingSpec>,
    pub host: HostConfig,
}

pub const DUCK_URL: &str =
    "https://vazxmixjsiawhamofees.supabase.co/storage/v1/object/public/models/duck/model.gltf";

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            assets: vec![AssetSpec::new(DUCK_URL, "duck")],
            bindings: vec![BindingSpec::new("duck", [1.5, 0.0, -4.0])],
            host: HostConfig::default(),
        }
    }
}

impl StageConfig {
    /// Defaults with the environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup(ASSET_ROOT_ENV).filter(|r| !r.is_empty()) {
            self.host.assets_root = root;
        }
        if let Some(flag) = lookup(REDUCED_MOTION_ENV) {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "reduce" => self.host.reduced_motion = Some(true),
                "0" | "false" | "no" => self.host.reduced_motion = Some(false),
                other => log::warn!("Ignoring {}={:?}", REDUCED_MOTION_ENV, other),
            }
        }
    }
}
