//! Named parameter presets.
//!
//! A preset is a partial [`FrameParams`]: only the fields it names are
//! overwritten when applied, everything else keeps its current value.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::params::FrameParams;

/// Partial parameter set. `None` fields are left untouched by [`apply`](Self::apply).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresetOverlay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_cut: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density_cut: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curl_strength: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curl_frequency: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curl_speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morph: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_reverse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_sprite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_write: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_test: Option<bool>,
}

impl PresetOverlay {
    /// Shallow-merge this overlay into `params`.
    pub fn apply(&self, params: &mut FrameParams) {
        fn merge<T: Copy>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        merge(&mut params.depth_cut, self.depth_cut);
        merge(&mut params.density_cut, self.density_cut);
        merge(&mut params.depth_scale, self.depth_scale);
        merge(&mut params.focus, self.focus);
        merge(&mut params.aperture, self.aperture);
        merge(&mut params.point_scale, self.point_scale);
        merge(&mut params.curl_strength, self.curl_strength);
        merge(&mut params.curl_frequency, self.curl_frequency);
        merge(&mut params.curl_speed, self.curl_speed);
        merge(&mut params.morph, self.morph);
        merge(&mut params.depth_reverse, self.depth_reverse);
        merge(&mut params.use_sprite, self.use_sprite);
        merge(&mut params.additive, self.additive);
        merge(&mut params.depth_write, self.depth_write);
        merge(&mut params.depth_test, self.depth_test);
    }

    /// Apply to a copy of `params`.
    pub fn applied_to(&self, mut params: FrameParams) -> FrameParams {
        self.apply(&mut params);
        params
    }
}

/// A named overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub values: PresetOverlay,
}

/// Ordered collection of presets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetLibrary {
    pub presets: Vec<Preset>,
}

impl PresetLibrary {
    /// The three presets shipped with the viewer.
    pub fn builtin() -> Self {
        Self {
            presets: vec![
                Preset {
                    name: "Crisp portrait".into(),
                    description: "Tight focus, low turbulence, solid color".into(),
                    values: PresetOverlay {
                        depth_cut: Some(0.24),
                        density_cut: Some(0.1),
                        depth_scale: Some(2.4),
                        focus: Some(0.48),
                        aperture: Some(0.12),
                        point_scale: Some(190.0),
                        curl_strength: Some(0.12),
                        curl_frequency: Some(1.6),
                        curl_speed: Some(0.32),
                        morph: Some(1.0),
                        use_sprite: Some(true),
                        additive: Some(false),
                        ..Default::default()
                    },
                },
                Preset {
                    name: "Dreamy bokeh".into(),
                    description: "Wide aperture with additive glow".into(),
                    values: PresetOverlay {
                        depth_cut: Some(0.22),
                        density_cut: Some(0.06),
                        depth_scale: Some(2.0),
                        focus: Some(0.44),
                        aperture: Some(0.34),
                        point_scale: Some(230.0),
                        curl_strength: Some(0.2),
                        curl_frequency: Some(1.2),
                        curl_speed: Some(0.5),
                        morph: Some(0.95),
                        use_sprite: Some(true),
                        additive: Some(true),
                        ..Default::default()
                    },
                },
                Preset {
                    name: "Sphere reveal".into(),
                    description: "Mostly sphere, strong swirl, hard points".into(),
                    values: PresetOverlay {
                        depth_cut: Some(0.18),
                        density_cut: Some(0.04),
                        depth_scale: Some(1.4),
                        focus: Some(0.55),
                        aperture: Some(0.08),
                        point_scale: Some(210.0),
                        curl_strength: Some(0.32),
                        curl_frequency: Some(2.2),
                        curl_speed: Some(0.7),
                        morph: Some(0.2),
                        use_sprite: Some(false),
                        additive: Some(false),
                        ..Default::default()
                    },
                },
            ],
        }
    }

    /// Load a library from JSON (`{ "presets": [ ... ] }`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save the library as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ParamsError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Append presets, replacing any with the same name (ignoring ASCII case,
    /// like [`find`](Self::find)).
    pub fn extend(&mut self, other: PresetLibrary) {
        for preset in other.presets {
            let existing = self
                .presets
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(&preset.name));
            match existing {
                Some(existing) => *existing = preset,
                None => self.presets.push(preset),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    /// Find a preset by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Apply the named preset to `params`.
    pub fn apply(&self, name: &str, params: &mut FrameParams) -> Result<(), ParamsError> {
        let preset = self
            .find(name)
            .ok_or_else(|| ParamsError::UnknownPreset(name.to_string()))?;
        preset.values.apply(params);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_overlay_is_identity() {
        let params = FrameParams {
            focus: 0.9,
            ..Default::default()
        };
        assert_eq!(PresetOverlay::default().applied_to(params), params);
    }

    #[test]
    fn test_overlay_shallow_merge() {
        let mut params = FrameParams {
            depth_reverse: true,
            depth_write: true,
            ..Default::default()
        };
        let library = PresetLibrary::builtin();
        library.apply("Dreamy bokeh", &mut params).unwrap();
        assert_eq!(params.aperture, 0.34);
        assert!(params.additive);
        // untouched by the preset
        assert!(params.depth_reverse);
        assert!(params.depth_write);
        assert!(params.depth_test);
    }

    #[test]
    fn test_builtin_names() {
        let library = PresetLibrary::builtin();
        let names: Vec<_> = library.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Crisp portrait", "Dreamy bokeh", "Sphere reveal"]);
        assert!(library.find("sphere REVEAL").is_some());
    }

    #[test]
    fn test_unknown_preset() {
        let mut params = FrameParams::default();
        let err = PresetLibrary::builtin().apply("Noir", &mut params).unwrap_err();
        assert!(matches!(err, ParamsError::UnknownPreset(name) if name == "Noir"));
        assert_eq!(params, FrameParams::default());
    }

    #[test]
    fn test_overlay_json_omits_unset() {
        let overlay = PresetOverlay {
            morph: Some(0.5),
            ..Default::default()
        };
        let json = serde_json::to_string(&overlay).unwrap();
        assert_eq!(json, r#"{"morph":0.5}"#);
        let back: PresetOverlay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, overlay);
    }

    #[test]
    fn test_extend_replaces_by_name() {
        let mut library = PresetLibrary::builtin();
        let custom = PresetLibrary {
            presets: vec![
                Preset {
                    name: "Sphere reveal".into(),
                    description: String::new(),
                    values: PresetOverlay {
                        morph: Some(0.0),
                        ..Default::default()
                    },
                },
                Preset {
                    name: "Flat".into(),
                    description: String::new(),
                    values: PresetOverlay {
                        depth_scale: Some(0.5),
                        ..Default::default()
                    },
                },
            ],
        };
        library.extend(custom);
        assert_eq!(library.len(), 4);
        assert_eq!(library.find("Sphere reveal").unwrap().values.morph, Some(0.0));
    }

    #[test]
    fn test_extend_ignores_name_case() {
        let mut library = PresetLibrary::builtin();
        let before = library.len();
        let custom = PresetLibrary {
            presets: vec![Preset {
                name: "sphere REVEAL".into(),
                description: "user copy".into(),
                values: PresetOverlay {
                    morph: Some(0.9),
                    ..Default::default()
                },
            }],
        };
        library.extend(custom);
        assert_eq!(library.len(), before);

        let found = library.find("Sphere reveal").unwrap();
        assert_eq!(found.description, "user copy");
        assert_eq!(found.values.morph, Some(0.9));

        let mut params = FrameParams::default();
        library.apply("SPHERE reveal", &mut params).unwrap();
        assert_eq!(params.morph, 0.9);
    }
}
