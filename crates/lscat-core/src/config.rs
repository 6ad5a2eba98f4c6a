#![forbid(unsafe_code)]

//! Static configuration snapshot.
//!
//! A [`Config`] is read once per batch and never changes while the batch is
//! displayed. Defaults can be overridden through `LSCAT_*` environment
//! variables:
//!
//! | Variable               | Field            | Example   |
//! |------------------------|------------------|-----------|
//! | `LSCAT_CANVAS`         | `canvas`         | `100x20`  |
//! | `LSCAT_ITEM_WIDTH`     | `item_width`     | `18`      |
//! | `LSCAT_ITEM_HEIGHT`    | `item_height`    | `8`       |
//! | `LSCAT_X_PADDING`      | `x_padding`      | `2`       |
//! | `LSCAT_Y_PADDING`      | `y_padding`      | `1`       |
//! | `LSCAT_CHILD_X_OFFSET` | `child_x_offset` | `1`       |
//! | `LSCAT_GROUP_SIZE`     | `group_size`     | `4`       |
//! | `LSCAT_PAGE_SPACING`   | `page_spacing`   | `20`      |
//! | `LSCAT_THUMBNAIL_PX`   | `thumbnail_px`   | `310`     |
//! | `LSCAT_LABEL_X`        | `label_x`        | `18`      |
//! | `LSCAT_MODE`           | `mode`           | `grouped` |
//! | `LSCAT_ANNOTATE`       | `annotate`       | `0`       |
//!
//! Values that fail to parse are ignored and the default is kept.

use std::fmt;
use std::str::FromStr;

use crate::warn;

/// Canvas dimensions in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanvasSize {
    pub width: u16,
    pub height: u16,
}

impl CanvasSize {
    /// Size used when the terminal cannot be queried.
    pub const FALLBACK: Self = Self::new(80, 24);

    #[inline]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl FromStr for CanvasSize {
    type Err = ConfigValueError;

    /// Parses `WIDTHxHEIGHT`, e.g. `100x20`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| ConfigValueError::new("canvas", s))?;
        let width = w.trim().parse().map_err(|_| ConfigValueError::new("canvas", s))?;
        let height = h.trim().parse().map_err(|_| ConfigValueError::new("canvas", s))?;
        Ok(Self::new(width, height))
    }
}

/// How a batch is laid out on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DisplayMode {
    /// Uniform grid, items in ascending order.
    #[default]
    Grid,
    /// One header item followed by its children, one group per row.
    Grouped,
}

impl FromStr for DisplayMode {
    type Err = ConfigValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" | "gallery" => Ok(Self::Grid),
            "grouped" | "group" | "users" => Ok(Self::Grouped),
            _ => Err(ConfigValueError::new("mode", s)),
        }
    }
}

/// Configuration snapshot for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Canvas size; `None` queries the terminal at batch start.
    pub canvas: Option<CanvasSize>,
    /// Item footprint width in cells.
    pub item_width: u16,
    /// Item footprint height in cells.
    pub item_height: u16,
    /// Horizontal padding between columns.
    pub x_padding: u16,
    /// Vertical padding between rows.
    pub y_padding: u16,
    /// Extra x offset applied to grouped-mode child columns.
    pub child_x_offset: u16,
    /// Items per group in grouped mode (one header plus children).
    pub group_size: usize,
    /// Lines scrolled when a new page starts.
    pub page_spacing: u16,
    /// Longest pixel edge of an encoded thumbnail.
    pub thumbnail_px: u32,
    /// Column at which grouped-mode header labels are printed.
    pub label_x: u16,
    pub mode: DisplayMode,
    /// Print textual annotations next to the images.
    pub annotate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas: None,
            item_width: 18,
            item_height: 8,
            x_padding: 2,
            y_padding: 1,
            child_x_offset: 1,
            group_size: 4,
            page_spacing: 20,
            thumbnail_px: 310,
            label_x: 18,
            mode: DisplayMode::Grid,
            annotate: true,
        }
    }
}

impl Config {
    /// Defaults with `LSCAT_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Keys are the `LSCAT_*` variable names listed in the module docs.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(canvas) = parse_var(&lookup, "LSCAT_CANVAS") {
            self.canvas = Some(canvas);
        }
        override_var(&lookup, "LSCAT_ITEM_WIDTH", &mut self.item_width);
        override_var(&lookup, "LSCAT_ITEM_HEIGHT", &mut self.item_height);
        override_var(&lookup, "LSCAT_X_PADDING", &mut self.x_padding);
        override_var(&lookup, "LSCAT_Y_PADDING", &mut self.y_padding);
        override_var(&lookup, "LSCAT_CHILD_X_OFFSET", &mut self.child_x_offset);
        override_var(&lookup, "LSCAT_GROUP_SIZE", &mut self.group_size);
        override_var(&lookup, "LSCAT_PAGE_SPACING", &mut self.page_spacing);
        override_var(&lookup, "LSCAT_THUMBNAIL_PX", &mut self.thumbnail_px);
        override_var(&lookup, "LSCAT_LABEL_X", &mut self.label_x);
        override_var(&lookup, "LSCAT_MODE", &mut self.mode);
        if let Some(raw) = lookup("LSCAT_ANNOTATE") {
            match parse_flag(&raw) {
                Some(flag) => self.annotate = flag,
                None => {
                    warn!(key = "LSCAT_ANNOTATE", value = %raw, "ignoring unparsable config override");
                }
            }
        }
        self
    }

    #[must_use]
    pub fn with_canvas(mut self, width: u16, height: u16) -> Self {
        self.canvas = Some(CanvasSize::new(width, height));
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable config override");
            None
        }
    }
}

fn override_var<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = parse_var(lookup, key) {
        *slot = value;
    }
}

/// A configuration value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValueError {
    field: &'static str,
    value: String,
}

impl ConfigValueError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ConfigValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} value: {:?}", self.field, self.value)
    }
}

impl std::error::Error for ConfigValueError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_stock_thumbnail_geometry() {
        let config = Config::default();
        assert_eq!(config.item_width, 18);
        assert_eq!(config.item_height, 8);
        assert_eq!(config.x_padding, 2);
        assert_eq!(config.y_padding, 1);
        assert_eq!(config.group_size, 4);
        assert_eq!(config.mode, DisplayMode::Grid);
        assert!(config.canvas.is_none());
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = Config::default().with_overrides(lookup(&[
            ("LSCAT_CANVAS", "100x20"),
            ("LSCAT_MODE", "grouped"),
            ("LSCAT_ANNOTATE", "off"),
            ("LSCAT_GROUP_SIZE", "5"),
        ]));
        assert_eq!(config.canvas, Some(CanvasSize::new(100, 20)));
        assert_eq!(config.mode, DisplayMode::Grouped);
        assert!(!config.annotate);
        assert_eq!(config.group_size, 5);
    }

    #[test]
    fn unparsable_overrides_keep_defaults() {
        let config = Config::default().with_overrides(lookup(&[
            ("LSCAT_CANVAS", "wide"),
            ("LSCAT_ITEM_WIDTH", "-3"),
            ("LSCAT_ANNOTATE", "maybe"),
            ("LSCAT_MODE", "mosaic"),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn canvas_parses_both_separators() {
        assert_eq!("80X24".parse::<CanvasSize>(), Ok(CanvasSize::new(80, 24)));
        assert_eq!(" 100 x 20".trim().parse::<CanvasSize>(), Ok(CanvasSize::new(100, 20)));
        assert!("100".parse::<CanvasSize>().is_err());
    }

    #[test]
    fn mode_aliases() {
        assert_eq!("Gallery".parse::<DisplayMode>(), Ok(DisplayMode::Grid));
        assert_eq!("users".parse::<DisplayMode>(), Ok(DisplayMode::Grouped));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_fills_missing_fields_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"mode":"grouped","item_width":20}"#).unwrap();
        assert_eq!(config.mode, DisplayMode::Grouped);
        assert_eq!(config.item_width, 20);
        assert_eq!(config.item_height, 8);
    }
}
