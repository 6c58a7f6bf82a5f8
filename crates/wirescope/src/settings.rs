//! Render settings pushed from the control surface.
//!
//! [`RenderSettings`] is the full record the renderer reads each frame.
//! [`SettingsUpdate`] is a partial record: any subset of fields may be set,
//! and [`RenderSettings::apply`] overwrites only those. Both are serde types
//! so a control surface can push JSON such as
//! `{"render_mode": 2, "exposure": 1.5}`.

use serde::{Deserialize, Serialize};

use crate::camera::RotationAxis;

/// Named wire colors (phosphor tints).
pub const WIRE_PRESETS: &[(&str, &str)] = &[
    ("P1 Green", "#00ff00"),
    ("P3 Amber", "#ffb000"),
    ("P31 Blue", "#00aaff"),
    ("P4 White", "#ffffff"),
];

/// Named background colors.
pub const BACKGROUND_PRESETS: &[(&str, &str)] = &[
    ("Black", "#000000"),
    ("Dark Gray", "#1a1a2e"),
    ("Dark Blue", "#0f0f23"),
    ("Charcoal", "#2d2d2d"),
    ("Navy", "#1a1a3e"),
    ("Light Purple", "#c8b8d8"),
];

/// A validated `#rrggbb` color with its normalized RGBA value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    hex: String,
    rgba: [f32; 4],
}

impl HexColor {
    /// Parse `#rrggbb` or `rrggbb`. Alpha is always 1.
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.trim().strip_prefix('#').unwrap_or(text.trim());
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
        Some(Self {
            hex: format!("#{}", digits.to_ascii_lowercase()),
            rgba: [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0],
        })
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    pub fn rgba(&self) -> [f32; 4] {
        self.rgba
    }

    /// RGBA as a wgpu clear color.
    pub fn to_wgpu(&self) -> wgpu::Color {
        let [r, g, b, a] = self.rgba.map(f64::from);
        wgpu::Color { r, g, b, a }
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text).ok_or_else(|| format!("invalid color '{text}', expected #rrggbb"))
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.hex
    }
}

/// What the shaded view draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryMode {
    #[default]
    Shaded,
    Wireframe,
    #[serde(rename = "Vertex Normals")]
    VertexNormals,
}

impl GeometryMode {
    pub fn next(self) -> Self {
        match self {
            Self::Shaded => Self::Wireframe,
            Self::Wireframe => Self::VertexNormals,
            Self::VertexNormals => Self::Shaded,
        }
    }
}

/// PBR output channel. Serialized as its index (0-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RenderMode {
    #[default]
    FinalRender,
    BaseColor,
    Metalness,
    Roughness,
    SpecularF0,
    Matcap,
    AmbientOcclusion,
}

impl RenderMode {
    pub const ALL: [Self; 7] = [
        Self::FinalRender,
        Self::BaseColor,
        Self::Metalness,
        Self::Roughness,
        Self::SpecularF0,
        Self::Matcap,
        Self::AmbientOcclusion,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::FinalRender => "Final Render",
            Self::BaseColor => "Base Color",
            Self::Metalness => "Metalness",
            Self::Roughness => "Roughness",
            Self::SpecularF0 => "Specular F0",
            Self::Matcap => "Matcap",
            Self::AmbientOcclusion => "Ambient Occlusion",
        }
    }

    pub fn is_channel_view(self) -> bool {
        self != Self::FinalRender
    }
}

impl TryFrom<u32> for RenderMode {
    type Error = String;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or_else(|| format!("render mode {index} out of range 0-6"))
    }
}

impl From<RenderMode> for u32 {
    fn from(mode: RenderMode) -> Self {
        mode.index()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub wire_color: HexColor,
    pub background_color: HexColor,
    pub geometry_mode: GeometryMode,
    /// Normal segment length as a fraction of the mesh radius.
    pub normal_length: f32,
    pub render_mode: RenderMode,
    pub exposure: f32,
    pub ibl_intensity: f32,
    pub direct_light_intensity: f32,
    pub auto_rotate: bool,
    /// Radians per second.
    pub rotation_speed: f32,
    pub rotation_axis: RotationAxis,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            wire_color: HexColor {
                hex: "#00ff00".into(),
                rgba: [0.0, 1.0, 0.0, 1.0],
            },
            background_color: HexColor {
                hex: "#c8b8d8".into(),
                rgba: [200.0 / 255.0, 184.0 / 255.0, 216.0 / 255.0, 1.0],
            },
            geometry_mode: GeometryMode::Shaded,
            normal_length: 0.1,
            render_mode: RenderMode::FinalRender,
            exposure: 1.0,
            ibl_intensity: 1.0,
            direct_light_intensity: 1.0,
            auto_rotate: true,
            rotation_speed: 0.5,
            rotation_axis: RotationAxis::Z,
        }
    }
}

impl RenderSettings {
    pub fn wireframe(&self) -> bool {
        self.geometry_mode == GeometryMode::Wireframe
    }

    pub fn show_normals(&self) -> bool {
        self.geometry_mode == GeometryMode::VertexNormals
    }

    /// Merge a partial update. Out-of-range numbers are clamped to the
    /// control ranges; unparseable colors are ignored with a warning.
    pub fn apply(&mut self, update: SettingsUpdate) -> SettingsDelta {
        let mut delta = SettingsDelta::default();

        for (target, text, what) in [
            (&mut self.wire_color, update.wire_color, "wire color"),
            (&mut self.background_color, update.background_color, "background color"),
        ] {
            if let Some(text) = text {
                match HexColor::parse(&text) {
                    Some(color) => *target = color,
                    None => log::warn!("ignoring invalid {what} '{text}'"),
                }
            }
        }

        if let Some(mode) = update.geometry_mode {
            self.geometry_mode = mode;
        }
        if let Some(length) = update.normal_length {
            let length = length.clamp(0.01, 0.5);
            delta.normals |= length != self.normal_length;
            self.normal_length = length;
        }
        if let Some(mode) = update.render_mode {
            self.render_mode = mode;
            // Channel views are shaded views.
            if mode.is_channel_view() && self.geometry_mode == GeometryMode::Wireframe {
                self.geometry_mode = GeometryMode::Shaded;
            }
        }
        if let Some(exposure) = update.exposure {
            self.exposure = exposure.clamp(0.1, 3.0);
        }
        if let Some(ibl) = update.ibl_intensity {
            self.ibl_intensity = ibl.clamp(0.0, 2.0);
        }
        if let Some(direct) = update.direct_light_intensity {
            self.direct_light_intensity = direct.clamp(0.0, 3.0);
        }
        if let Some(speed) = update.rotation_speed {
            self.rotation_speed = speed.clamp(0.1, 2.0);
        }
        if let Some(auto_rotate) = update.auto_rotate {
            self.auto_rotate = auto_rotate;
        }
        if let Some(axis) = update.rotation_axis {
            self.rotation_axis = axis;
            self.auto_rotate = true;
            delta.rotation_axis = true;
        }
        delta
    }
}

/// A partial settings record. `None` fields keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub wire_color: Option<String>,
    pub background_color: Option<String>,
    pub geometry_mode: Option<GeometryMode>,
    pub normal_length: Option<f32>,
    pub render_mode: Option<RenderMode>,
    pub exposure: Option<f32>,
    pub ibl_intensity: Option<f32>,
    pub direct_light_intensity: Option<f32>,
    pub auto_rotate: Option<bool>,
    pub rotation_speed: Option<f32>,
    pub rotation_axis: Option<RotationAxis>,
}

/// Side effects the caller must act on after [`RenderSettings::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsDelta {
    /// Normal segments must be regenerated.
    pub normals: bool,
    /// A rotation axis was chosen: reset the model rotation.
    pub rotation_axis: bool,
}
