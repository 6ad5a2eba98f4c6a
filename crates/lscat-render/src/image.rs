#![forbid(unsafe_code)]

//! Terminal image protocols.
//!
//! Thumbnails are decoded with the `image` crate, resized to fit the
//! configured pixel edge, and emitted either as kitty graphics, iTerm2 inline
//! images, or a grayscale ASCII approximation for terminals with neither.

use std::env;
use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, GenericImageView, ImageFormat, imageops::FilterType};

/// Image protocol selection for terminal rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageProtocol {
    Kitty,
    Iterm2,
    Ascii,
}

/// Fit strategy when resizing images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFit {
    None,
    Contain,
    Cover,
    Stretch,
}

/// Width/height specification for iTerm2 inline images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Iterm2Dimension {
    Cells(u32),
    Pixels(u32),
    Percent(u8),
    Auto,
}

impl Iterm2Dimension {
    fn encode(self) -> String {
        match self {
            Self::Cells(value) => value.to_string(),
            Self::Pixels(value) => format!("{value}px"),
            Self::Percent(value) => format!("{value}%"),
            Self::Auto => "auto".to_string(),
        }
    }
}

/// Options for iTerm2 inline image emission.
#[derive(Debug, Clone)]
pub struct Iterm2Options {
    pub width: Option<Iterm2Dimension>,
    pub height: Option<Iterm2Dimension>,
    pub preserve_aspect_ratio: bool,
    pub inline: bool,
    pub name: Option<String>,
}

impl Default for Iterm2Options {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            preserve_aspect_ratio: true,
            inline: true,
            name: None,
        }
    }
}

impl Iterm2Options {
    /// Inline image sized to a cell footprint.
    #[must_use]
    pub fn cells(width: u16, height: u16) -> Self {
        Self {
            width: Some(Iterm2Dimension::Cells(u32::from(width))),
            height: Some(Iterm2Dimension::Cells(u32::from(height))),
            ..Self::default()
        }
    }
}

/// Placement of a kitty graphics image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KittyPlacement {
    /// Columns the image is scaled to span.
    pub columns: Option<u16>,
    /// Rows the image is scaled to span.
    pub rows: Option<u16>,
    /// Leave the cursor where it was after drawing.
    pub hold_cursor: bool,
}

impl KittyPlacement {
    #[must_use]
    pub fn cells(columns: u16, rows: u16) -> Self {
        Self {
            columns: Some(columns),
            rows: Some(rows),
            hold_cursor: true,
        }
    }

    fn metadata(&self) -> String {
        let mut meta = String::from("a=T,f=100,");
        if let Some(columns) = self.columns {
            meta.push_str(&format!("c={columns},"));
        }
        if let Some(rows) = self.rows {
            meta.push_str(&format!("r={rows},"));
        }
        if self.hold_cursor {
            meta.push_str("C=1,");
        }
        meta
    }
}

/// External probe hints for protocol detection.
#[derive(Debug, Clone, Default)]
pub struct DetectionHints {
    pub term: Option<String>,
    pub term_program: Option<String>,
    pub kitty_graphics: Option<bool>,
    pub iterm2_inline: Option<bool>,
}

impl DetectionHints {
    /// Capture hints from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let term = env::var("TERM").ok();
        let term_program = env::var("TERM_PROGRAM").ok();
        let kitty_graphics = if env::var("KITTY_WINDOW_ID").is_ok() {
            Some(true)
        } else {
            None
        };
        Self {
            term,
            term_program,
            kitty_graphics,
            iterm2_inline: None,
        }
    }

    #[must_use]
    pub fn with_kitty_graphics(mut self, supported: bool) -> Self {
        self.kitty_graphics = Some(supported);
        self
    }

    #[must_use]
    pub fn with_iterm2_inline(mut self, supported: bool) -> Self {
        self.iterm2_inline = Some(supported);
        self
    }
}

/// Detect the best supported image protocol from hints.
#[must_use]
pub fn detect_protocol(hints: &DetectionHints) -> ImageProtocol {
    let term = hints.term.as_deref().unwrap_or_default();
    let term_program = hints.term_program.as_deref().unwrap_or_default();

    let kitty_from_env = term.contains("kitty") || term_program.eq_ignore_ascii_case("wezterm");
    if hints.kitty_graphics.unwrap_or(kitty_from_env) {
        return ImageProtocol::Kitty;
    }

    let iterm_from_env = term_program.contains("iTerm.app");
    if hints.iterm2_inline.unwrap_or(iterm_from_env) {
        return ImageProtocol::Iterm2;
    }

    ImageProtocol::Ascii
}

/// In-memory image wrapper for protocol encoding.
#[derive(Debug, Clone)]
pub struct Image {
    image: DynamicImage,
}

impl Image {
    /// Decode image bytes using the `image` crate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        let image = image::load_from_memory(bytes)?;
        Ok(Self { image })
    }

    #[must_use]
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Convert the image to PNG bytes, optionally resizing with a fit strategy.
    pub fn to_png_bytes(
        &self,
        max_width: Option<u32>,
        max_height: Option<u32>,
        fit: ImageFit,
    ) -> Result<Vec<u8>, ImageError> {
        let resized = resize_image(&self.image, max_width, max_height, fit);
        let mut out = Cursor::new(Vec::new());
        resized
            .write_to(&mut out, ImageFormat::Png)
            .map_err(ImageError::Encode)?;
        Ok(out.into_inner())
    }

    /// PNG bytes shrunk so neither edge exceeds `edge_px`.
    pub fn thumbnail_png(&self, edge_px: u32) -> Result<Vec<u8>, ImageError> {
        let (w, h) = self.image.dimensions();
        if w <= edge_px && h <= edge_px {
            return self.to_png_bytes(None, None, ImageFit::None);
        }
        self.to_png_bytes(Some(edge_px), Some(edge_px), ImageFit::Contain)
    }

    /// Encode a thumbnail for kitty graphics protocol.
    pub fn encode_kitty(
        &self,
        edge_px: u32,
        placement: KittyPlacement,
    ) -> Result<Vec<String>, ImageError> {
        let png = self.thumbnail_png(edge_px)?;
        Ok(encode_kitty_png(&png, placement))
    }

    /// Encode a thumbnail for iTerm2 inline images.
    pub fn encode_iterm2(&self, edge_px: u32, options: &Iterm2Options) -> Result<String, ImageError> {
        let png = self.thumbnail_png(edge_px)?;
        Ok(encode_iterm2_png(&png, options))
    }

    /// Render a grayscale ASCII fallback.
    #[must_use]
    pub fn render_ascii(&self, width: u32, height: u32, fit: ImageFit) -> Vec<String> {
        render_ascii(&self.image, width, height, fit)
    }
}

/// Encode PNG payload as kitty graphics protocol escape sequences.
///
/// Placement metadata rides on the first chunk only.
#[must_use]
pub fn encode_kitty_png(png_bytes: &[u8], placement: KittyPlacement) -> Vec<String> {
    let encoded = STANDARD.encode(png_bytes);
    let metadata = placement.metadata();
    let mut chunks = Vec::new();
    let mut offset = 0usize;
    let chunk_size = 4096usize;
    let mut first = true;

    while offset < encoded.len() {
        let end = (offset + chunk_size).min(encoded.len());
        let chunk = &encoded[offset..end];
        let more = end < encoded.len();
        let meta = if first { metadata.as_str() } else { "" };
        let m_value = if more { 1 } else { 0 };
        chunks.push(format!("\x1b_G{meta}m={m_value};{chunk}\x1b\\"));
        offset = end;
        first = false;
    }

    if chunks.is_empty() {
        chunks.push(format!("\x1b_G{metadata}m=0;\x1b\\"));
    }

    chunks
}

/// Encode PNG payload as iTerm2 inline image escape sequence.
#[must_use]
pub fn encode_iterm2_png(png_bytes: &[u8], options: &Iterm2Options) -> String {
    let mut args = Vec::new();
    if options.inline {
        args.push("inline=1".to_string());
    }
    args.push(format!("size={}", png_bytes.len()));
    if let Some(width) = options.width {
        args.push(format!("width={}", width.encode()));
    }
    if let Some(height) = options.height {
        args.push(format!("height={}", height.encode()));
    }
    if !options.preserve_aspect_ratio {
        args.push("preserveAspectRatio=0".to_string());
    }
    if let Some(name) = &options.name {
        let encoded_name = STANDARD.encode(name.as_bytes());
        args.push(format!("name={encoded_name}"));
    }

    let header = format!("\x1b]1337;File={};", args.join(";"));
    let payload = STANDARD.encode(png_bytes);
    format!("{header}{payload}\x07")
}

fn resize_image(
    image: &DynamicImage,
    max_width: Option<u32>,
    max_height: Option<u32>,
    fit: ImageFit,
) -> DynamicImage {
    if matches!(fit, ImageFit::None) || (max_width.is_none() && max_height.is_none()) {
        return image.clone();
    }

    let (orig_w, orig_h) = image.dimensions();
    let target_w = max_width.unwrap_or(orig_w).max(1);
    let target_h = max_height.unwrap_or(orig_h).max(1);

    let (new_w, new_h) = match fit {
        ImageFit::Stretch => (target_w, target_h),
        ImageFit::Contain => scale_to_fit(orig_w, orig_h, target_w, target_h, false),
        ImageFit::Cover => scale_to_fit(orig_w, orig_h, target_w, target_h, true),
        ImageFit::None => (orig_w, orig_h),
    };

    if new_w == orig_w && new_h == orig_h {
        image.clone()
    } else {
        image.resize_exact(new_w, new_h, FilterType::Triangle)
    }
}

fn scale_to_fit(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
    cover: bool,
) -> (u32, u32) {
    let width_f = width.max(1) as f32;
    let height_f = height.max(1) as f32;
    let max_w = max_width as f32;
    let max_h = max_height as f32;

    let scale_w = max_w / width_f;
    let scale_h = max_h / height_f;
    let scale = if cover {
        scale_w.max(scale_h)
    } else {
        scale_w.min(scale_h)
    };

    let new_w = (width_f * scale).round().max(1.0) as u32;
    let new_h = (height_f * scale).round().max(1.0) as u32;
    (new_w, new_h)
}

fn render_ascii(image: &DynamicImage, width: u32, height: u32, fit: ImageFit) -> Vec<String> {
    let resized = resize_image(image, Some(width), Some(height), fit);
    let grayscale = resized.to_luma8();
    let ramp = b" .:-=+*#%@";
    let mut lines = Vec::with_capacity(grayscale.height() as usize);

    for y in 0..grayscale.height() {
        let mut line = String::with_capacity(grayscale.width() as usize);
        for x in 0..grayscale.width() {
            let luma = grayscale.get_pixel(x, y)[0] as usize;
            let idx = (luma * (ramp.len() - 1)) / 255;
            line.push(ramp[idx] as char);
        }
        lines.push(line);
    }

    lines
}

/// Errors raised by image decoding/encoding.
#[derive(Debug)]
pub enum ImageError {
    Decode(image::ImageError),
    Encode(image::ImageError),
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err)
    }
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "image decode error: {err}"),
            Self::Encode(err) => write!(f, "image encode error: {err}"),
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) | Self::Encode(err) => Some(err),
        }
    }
}
