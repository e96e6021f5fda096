use std::io::Cursor;
use std::path::PathBuf;

use ab_glyph::{FontVec, PxScale};
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;

use super::config::{parse_hex_color, ComposerConfig, FontWeight, OutputFormat, Point};
use super::ComposerError;

/// Draws the sport name and faculty names onto a template image.
pub struct Composer {
    config: ComposerConfig,
    template: RgbaImage,
    font: FontVec,
}

impl Composer {
    /// Load the template image and font named in `config`.
    pub fn new(config: ComposerConfig) -> Result<Self, ComposerError> {
        let template = image::open(&config.template_path)?.into_rgba8();
        let font = FontVec::try_from_vec(std::fs::read(&config.font_path)?)?;
        Self::from_parts(config, template, font)
    }

    pub fn from_parts(
        config: ComposerConfig,
        template: RgbaImage,
        font: FontVec,
    ) -> Result<Self, ComposerError> {
        config.validate()?;
        Ok(Self {
            config,
            template,
            font,
        })
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Render a post. Faculties beyond the configured positions are skipped.
    pub fn compose(&self, sport: &str, faculties: &[String]) -> Result<RgbaImage, ComposerError> {
        let mut canvas = self.template.clone();

        let style = &self.config.sport;
        self.draw(
            &mut canvas,
            sport,
            style.position,
            style.font_size,
            style.font_weight,
            parse_hex_color(&style.color)?,
        );

        let style = &self.config.faculties;
        let color = parse_hex_color(&style.color)?;
        if faculties.len() > style.positions.len() {
            tracing::warn!(
                faculties = faculties.len(),
                positions = style.positions.len(),
                "More faculties than configured positions, extra names are not drawn"
            );
        }
        for (name, position) in faculties.iter().zip(&style.positions) {
            self.draw(
                &mut canvas,
                name,
                *position,
                style.font_size,
                style.font_weight,
                color,
            );
        }

        Ok(canvas)
    }

    fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        at: Point,
        size: f32,
        weight: FontWeight,
        color: Rgba<u8>,
    ) {
        let scale = PxScale::from(size);
        draw_text_mut(canvas, color, at.x, at.y, scale, &self.font, text);
        if weight == FontWeight::Bold {
            // No bold face is loaded; overstrike one pixel to the right
            draw_text_mut(canvas, color, at.x + 1, at.y, scale, &self.font, text);
        }
    }

    /// Encode in the configured output format.
    pub fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, ComposerError> {
        let mut buf = Vec::new();
        match self.config.output.format {
            OutputFormat::Png => {
                image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
            }
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
                JpegEncoder::new_with_quality(&mut buf, self.config.output.quality)
                    .encode_image(&rgb)?;
            }
        }
        Ok(buf)
    }

    /// Write encoded bytes into the output folder, returning the new path.
    pub fn save(&self, sport: &str, encoded: &[u8]) -> Result<PathBuf, ComposerError> {
        std::fs::create_dir_all(&self.config.output_folder)?;
        let path = self.config.output_folder.join(output_filename(
            sport,
            self.config.output.format.extension(),
        ));
        std::fs::write(&path, encoded)?;
        Ok(path)
    }
}

/// `post_<sport>_<epoch-millis>.<ext>`, with the sport reduced to
/// lowercase ASCII letters, digits and underscores.
pub fn output_filename(sport: &str, extension: &str) -> String {
    let slug: String = sport
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let slug = if slug.is_empty() { "post".to_string() } else { slug };
    format!("post_{slug}_{}.{extension}", Utc::now().timestamp_millis())
}
