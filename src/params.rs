//! Live tunable parameters.
//!
//! [`FrameParams`] is the flat set of thresholds, scales, animation rates and
//! toggles that drive the particle program. The host owns it, edits it one
//! key at a time (sliders, keyboard) or wholesale (presets, reset), and
//! publishes a copy to the renderer every frame.
//!
//! Values are never validated here. A `morph` of 1.3 extrapolates past the
//! face layout, a negative `curlSpeed` runs the turbulence backwards; the
//! program stays well defined for any finite value.
//!
//! # Example
//!
//! ```ignore
//! let mut params = FrameParams::default();
//! params.set(ParamKey::Focus, 0.42_f32.into())?;
//! params.set_by_name("useSprite", false.into())?;
//! params.save("portrait.json")?;
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;

/// Per-frame tunables. Field names serialize in camelCase.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameParams {
    /// Particles with depth below this are discarded.
    pub depth_cut: f32,
    /// Particles with luminance below this are discarded.
    pub density_cut: f32,
    /// Z extrusion applied to depth in the face layout.
    pub depth_scale: f32,
    /// Depth value of the sharp plane.
    pub focus: f32,
    /// Strength of the depth-of-field growth and fade.
    pub aperture: f32,
    /// Base footprint size before perspective division.
    pub point_scale: f32,
    /// Turbulence displacement magnitude.
    pub curl_strength: f32,
    /// Turbulence spatial frequency.
    pub curl_frequency: f32,
    /// Turbulence temporal rate.
    pub curl_speed: f32,
    /// 0 = sphere layout, 1 = face layout.
    pub morph: f32,
    /// Treat dark depth as near instead of far.
    pub depth_reverse: bool,
    /// Multiply the soft circular sprite mask into alpha.
    pub use_sprite: bool,
    /// Additive instead of straight-alpha compositing.
    pub additive: bool,
    /// Write particle depth into the depth buffer.
    pub depth_write: bool,
    /// Test particles against the depth buffer.
    pub depth_test: bool,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            depth_cut: 0.28,
            density_cut: 0.08,
            depth_scale: 2.1,
            focus: 0.5,
            aperture: 0.18,
            point_scale: 180.0,
            curl_strength: 0.15,
            curl_frequency: 1.5,
            curl_speed: 0.45,
            morph: 1.0,
            depth_reverse: false,
            use_sprite: true,
            additive: false,
            depth_write: false,
            depth_test: true,
        }
    }
}

/// Names of every recognized parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKey {
    DepthCut,
    DensityCut,
    DepthScale,
    Focus,
    Aperture,
    PointScale,
    CurlStrength,
    CurlFrequency,
    CurlSpeed,
    Morph,
    DepthReverse,
    UseSprite,
    Additive,
    DepthWrite,
    DepthTest,
}

impl ParamKey {
    /// All keys, sliders first, then toggles.
    pub const ALL: [ParamKey; 15] = [
        ParamKey::DepthCut,
        ParamKey::DensityCut,
        ParamKey::DepthScale,
        ParamKey::Focus,
        ParamKey::Aperture,
        ParamKey::PointScale,
        ParamKey::CurlStrength,
        ParamKey::CurlFrequency,
        ParamKey::CurlSpeed,
        ParamKey::Morph,
        ParamKey::DepthReverse,
        ParamKey::UseSprite,
        ParamKey::Additive,
        ParamKey::DepthWrite,
        ParamKey::DepthTest,
    ];

    /// Serialized (camelCase) name.
    pub fn name(self) -> &'static str {
        match self {
            ParamKey::DepthCut => "depthCut",
            ParamKey::DensityCut => "densityCut",
            ParamKey::DepthScale => "depthScale",
            ParamKey::Focus => "focus",
            ParamKey::Aperture => "aperture",
            ParamKey::PointScale => "pointScale",
            ParamKey::CurlStrength => "curlStrength",
            ParamKey::CurlFrequency => "curlFrequency",
            ParamKey::CurlSpeed => "curlSpeed",
            ParamKey::Morph => "morph",
            ParamKey::DepthReverse => "depthReverse",
            ParamKey::UseSprite => "useSprite",
            ParamKey::Additive => "additive",
            ParamKey::DepthWrite => "depthWrite",
            ParamKey::DepthTest => "depthTest",
        }
    }

    /// Look a key up by its serialized name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Whether this key holds a bool.
    pub fn is_toggle(self) -> bool {
        self.spec().is_none()
    }

    /// Human-readable label for controls.
    pub fn label(self) -> &'static str {
        match self {
            ParamKey::DepthReverse => "Reverse depth",
            ParamKey::UseSprite => "Soft sprite",
            ParamKey::Additive => "Additive blending",
            ParamKey::DepthWrite => "Depth write",
            ParamKey::DepthTest => "Depth test",
            key => key.spec().map_or(key.name(), |s| s.label),
        }
    }

    /// Slider metadata, `None` for toggles.
    pub fn spec(self) -> Option<&'static ParamSpec> {
        PARAM_SPECS.iter().find(|s| s.key == self)
    }
}

/// A value written to or read from a parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Bool(bool),
}

impl ParamValue {
    fn kind(self) -> &'static str {
        match self {
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "bool",
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

/// Slider metadata for a float parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    pub key: ParamKey,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub description: &'static str,
}

/// Slider ranges for every float parameter.
pub const PARAM_SPECS: &[ParamSpec] = &[
    ParamSpec {
        key: ParamKey::DepthCut,
        label: "Depth cut",
        min: 0.0,
        max: 1.0,
        step: 0.01,
        description: "Lower values allow more background depth to appear.",
    },
    ParamSpec {
        key: ParamKey::DensityCut,
        label: "Density cut",
        min: 0.0,
        max: 0.4,
        step: 0.01,
        description: "Particles darker than this threshold are discarded.",
    },
    ParamSpec {
        key: ParamKey::DepthScale,
        label: "Depth scale",
        min: 0.5,
        max: 4.0,
        step: 0.05,
        description: "Stretch depth range into Z space.",
    },
    ParamSpec {
        key: ParamKey::PointScale,
        label: "Point scale",
        min: 50.0,
        max: 300.0,
        step: 1.0,
        description: "Base particle size adjusted by camera distance.",
    },
    ParamSpec {
        key: ParamKey::Focus,
        label: "Focus",
        min: 0.0,
        max: 1.0,
        step: 0.01,
        description: "Depth plane where particles are sharpest.",
    },
    ParamSpec {
        key: ParamKey::Aperture,
        label: "Aperture",
        min: 0.0,
        max: 0.6,
        step: 0.01,
        description: "Strength of depth-of-field blur and fade.",
    },
    ParamSpec {
        key: ParamKey::CurlStrength,
        label: "Curl strength",
        min: 0.0,
        max: 0.6,
        step: 0.01,
        description: "Adds gentle swirling motion to keep the face alive.",
    },
    ParamSpec {
        key: ParamKey::CurlFrequency,
        label: "Curl frequency",
        min: 0.5,
        max: 4.0,
        step: 0.05,
        description: "",
    },
    ParamSpec {
        key: ParamKey::CurlSpeed,
        label: "Curl speed",
        min: 0.0,
        max: 2.0,
        step: 0.01,
        description: "",
    },
    ParamSpec {
        key: ParamKey::Morph,
        label: "Morph",
        min: 0.0,
        max: 1.0,
        step: 0.01,
        description: "0 = sphere cloud, 1 = full face.",
    },
];

impl FrameParams {
    /// Read one parameter.
    pub fn get(&self, key: ParamKey) -> ParamValue {
        match key {
            ParamKey::DepthCut => self.depth_cut.into(),
            ParamKey::DensityCut => self.density_cut.into(),
            ParamKey::DepthScale => self.depth_scale.into(),
            ParamKey::Focus => self.focus.into(),
            ParamKey::Aperture => self.aperture.into(),
            ParamKey::PointScale => self.point_scale.into(),
            ParamKey::CurlStrength => self.curl_strength.into(),
            ParamKey::CurlFrequency => self.curl_frequency.into(),
            ParamKey::CurlSpeed => self.curl_speed.into(),
            ParamKey::Morph => self.morph.into(),
            ParamKey::DepthReverse => self.depth_reverse.into(),
            ParamKey::UseSprite => self.use_sprite.into(),
            ParamKey::Additive => self.additive.into(),
            ParamKey::DepthWrite => self.depth_write.into(),
            ParamKey::DepthTest => self.depth_test.into(),
        }
    }

    /// Mutable reference to a float parameter.
    pub fn float_mut(&mut self, key: ParamKey) -> Option<&mut f32> {
        match key {
            ParamKey::DepthCut => Some(&mut self.depth_cut),
            ParamKey::DensityCut => Some(&mut self.density_cut),
            ParamKey::DepthScale => Some(&mut self.depth_scale),
            ParamKey::Focus => Some(&mut self.focus),
            ParamKey::Aperture => Some(&mut self.aperture),
            ParamKey::PointScale => Some(&mut self.point_scale),
            ParamKey::CurlStrength => Some(&mut self.curl_strength),
            ParamKey::CurlFrequency => Some(&mut self.curl_frequency),
            ParamKey::CurlSpeed => Some(&mut self.curl_speed),
            ParamKey::Morph => Some(&mut self.morph),
            _ => None,
        }
    }

    /// Mutable reference to a toggle.
    pub fn toggle_mut(&mut self, key: ParamKey) -> Option<&mut bool> {
        match key {
            ParamKey::DepthReverse => Some(&mut self.depth_reverse),
            ParamKey::UseSprite => Some(&mut self.use_sprite),
            ParamKey::Additive => Some(&mut self.additive),
            ParamKey::DepthWrite => Some(&mut self.depth_write),
            ParamKey::DepthTest => Some(&mut self.depth_test),
            _ => None,
        }
    }

    /// Write one parameter. The value kind must match the key.
    pub fn set(&mut self, key: ParamKey, value: ParamValue) -> Result<(), ParamsError> {
        let mismatch = ParamsError::TypeMismatch {
            key: key.name(),
            given: value.kind(),
        };
        match value {
            ParamValue::Float(v) => *self.float_mut(key).ok_or(mismatch)? = v,
            ParamValue::Bool(v) => *self.toggle_mut(key).ok_or(mismatch)? = v,
        }
        Ok(())
    }

    /// Write one parameter by its serialized name.
    pub fn set_by_name(&mut self, name: &str, value: ParamValue) -> Result<(), ParamsError> {
        let key = ParamKey::from_name(name).ok_or_else(|| ParamsError::UnknownKey(name.to_string()))?;
        self.set(key, value)
    }

    /// Flip a toggle, returning its new state. Float keys are left untouched.
    pub fn toggle(&mut self, key: ParamKey) -> Option<bool> {
        self.toggle_mut(key).map(|v| {
            *v = !*v;
            *v
        })
    }

    /// Step a float parameter by `delta`, staying within its slider range.
    pub fn nudge(&mut self, key: ParamKey, delta: f32) -> Option<f32> {
        let spec = key.spec()?;
        let v = self.float_mut(key)?;
        *v = (*v + delta).clamp(spec.min, spec.max);
        Some(*v)
    }

    /// Blend and depth-buffer policy selected by the toggles.
    pub fn render_state(&self) -> RenderState {
        RenderState {
            blend: if self.additive {
                BlendMode::Additive
            } else {
                BlendMode::Alpha
            },
            depth_write: self.depth_write,
            depth_test: self.depth_test,
        }
    }

    /// Save the parameters to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ParamsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load parameters from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Blending mode for particle compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Straight (non-premultiplied) alpha blending (default).
    #[default]
    Alpha,
    /// Additive blending weighted by alpha. Overlaps glow.
    Additive,
}

impl BlendMode {
    pub(crate) fn to_wgpu(self) -> wgpu::BlendState {
        match self {
            BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

/// Fixed-function state chosen per frame. Each distinct value maps to one
/// render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderState {
    pub blend: BlendMode,
    pub depth_write: bool,
    pub depth_test: bool,
}

impl RenderState {
    pub(crate) fn depth_compare(self) -> wgpu::CompareFunction {
        if self.depth_test {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        }
    }
}
