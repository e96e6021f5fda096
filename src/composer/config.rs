use std::path::{Path, PathBuf};

use image::Rgba;
use serde::{Deserialize, Serialize};

use super::ComposerError;

/// Composer settings, read from a JSON file. Every field has a default, so a
/// file only needs to list what differs from the stock template layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposerConfig {
    pub server_url: String,
    pub template_path: PathBuf,
    /// TrueType/OpenType font used for all text
    pub font_path: PathBuf,
    pub output_folder: PathBuf,
    pub sport: TextStyle,
    pub faculties: FacultyStyle,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub position: Point,
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
    /// `#RGB`, `#RRGGBB` or `#RRGGBBAA`
    pub color: String,
}

/// Faculty `i` is drawn at `positions[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyStyle {
    pub positions: Vec<Point>,
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
    pub color: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
    /// JPEG quality, 1-100
    pub quality: u8,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            template_path: PathBuf::from("./templates/post_template.png"),
            font_path: PathBuf::from("./fonts/post.ttf"),
            output_folder: PathBuf::from("./generated"),
            sport: TextStyle::default(),
            faculties: FacultyStyle::default(),
            output: OutputSettings::default(),
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            position: Point { x: 250, y: 50 },
            font_size: 48.0,
            font_weight: FontWeight::Bold,
            color: "#000000".to_string(),
        }
    }
}

impl Default for FacultyStyle {
    fn default() -> Self {
        Self {
            positions: vec![
                Point { x: 150, y: 340 },
                Point { x: 150, y: 420 },
                Point { x: 150, y: 500 },
            ],
            font_size: 32.0,
            font_weight: FontWeight::Normal,
            color: "#FFFFFF".to_string(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 90,
        }
    }
}

impl ComposerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ComposerError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: ComposerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ComposerError> {
        parse_hex_color(&self.sport.color)?;
        parse_hex_color(&self.faculties.color)?;

        if self.sport.font_size <= 0.0 || self.faculties.font_size <= 0.0 {
            return Err(ComposerError::InvalidConfig(
                "font sizes must be positive".to_string(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ComposerError::InvalidConfig(format!(
                "output quality {} is outside 1-100",
                self.output.quality
            )));
        }
        Ok(())
    }
}

/// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
pub fn parse_hex_color(raw: &str) -> Result<Rgba<u8>, ComposerError> {
    let invalid = || ComposerError::InvalidColor(raw.to_string());
    let hex = raw.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                rgb[i] = v * 17;
            }
            Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 | 8 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            let a = if hex.len() == 8 {
                channel(&hex[6..8])?
            } else {
                255
            };
            Ok(Rgba([r, g, b, a]))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#000000").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_hex_color("#FF0000").unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_hex_color("0f0").unwrap(), Rgba([0, 255, 0, 255]));
        assert_eq!(parse_hex_color("#11223380").unwrap(), Rgba([0x11, 0x22, 0x33, 0x80]));
    }

    #[test]
    fn rejects_bad_colors() {
        for bad in ["", "#12", "#GGGGGG", "#1234567", "#ééé"] {
            assert!(parse_hex_color(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: ComposerConfig = serde_json::from_str(
            r##"{"serverUrl": "http://posts.internal:8080", "sport": {"position": {"x": 300, "y": 100}, "fontSize": 52, "color": "#FF0000"}}"##,
        )
        .unwrap();

        assert_eq!(config.server_url, "http://posts.internal:8080");
        assert_eq!(config.sport.position, Point { x: 300, y: 100 });
        assert_eq!(config.sport.font_weight, FontWeight::Normal);
        assert_eq!(config.faculties, FacultyStyle::default());
        assert_eq!(config.output.format, OutputFormat::Png);
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_quality() {
        let mut config = ComposerConfig::default();
        config.output.quality = 0;
        assert!(matches!(
            config.validate(),
            Err(ComposerError::InvalidConfig(_))
        ));
    }
}
