//! Intrinsic sizes for widget content.

use kurbo::Size;

/// Font size used to measure labels.
pub const TEXT_FONT_SIZE: f64 = 24.0;
/// Average glyph width as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.55;
/// Line height as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f64 = 1.2;
/// Horizontal and vertical padding around label text.
const TEXT_PADDING: f64 = 8.0;
/// Narrowest a label may get, so it stays tappable.
const MIN_TEXT_WIDTH: f64 = 20.0;
/// Measured in place of an empty label.
pub const TEXT_PLACEHOLDER: &str = "Text";

/// Size used for stickers the catalog does not know.
pub const DEFAULT_STICKER_SIZE: Size = Size::new(120.0, 120.0);

/// Approximate the bounding size of a label.
///
/// The widest line decides the width; every line (including a trailing
/// empty one) adds a line of height.
pub fn measure_text(text: &str) -> Size {
    let text = if text.is_empty() { TEXT_PLACEHOLDER } else { text };

    let widest = text.lines().map(|line| line.chars().count()).max().unwrap_or(0);
    let mut lines = text.lines().count().max(1);
    if text.ends_with('\n') {
        lines += 1;
    }

    let width = (widest as f64 * TEXT_FONT_SIZE * CHAR_WIDTH_FACTOR).max(MIN_TEXT_WIDTH);
    let height = lines as f64 * TEXT_FONT_SIZE * LINE_HEIGHT_FACTOR;
    Size::new(width + 2.0 * TEXT_PADDING, height + 2.0 * TEXT_PADDING)
}

/// A sticker asset offered by the picker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickerAsset {
    pub name: &'static str,
    pub size: Size,
}

impl StickerAsset {
    const fn new(name: &'static str, width: f64, height: f64) -> Self {
        Self {
            name,
            size: Size::new(width, height),
        }
    }
}

const BUILTIN_STICKERS: &[StickerAsset] = &[
    StickerAsset::new("elephant", 160.0, 128.0),
    StickerAsset::new("wow", 140.0, 96.0),
    StickerAsset::new("converse", 150.0, 110.0),
    StickerAsset::new("sharkingcart", 180.0, 140.0),
    StickerAsset::new("sinistro", 128.0, 128.0),
    StickerAsset::new("sonic", 120.0, 150.0),
    StickerAsset::new("bunny", 110.0, 140.0),
    StickerAsset::new("dragon", 170.0, 150.0),
];

/// The set of sticker images a picker can offer.
#[derive(Debug, Clone, Copy)]
pub struct StickerCatalog {
    assets: &'static [StickerAsset],
}

impl StickerCatalog {
    /// Stickers bundled with the app.
    pub fn builtin() -> Self {
        Self {
            assets: BUILTIN_STICKERS,
        }
    }

    /// Sticker names in picker order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.assets.iter().map(|a| a.name)
    }

    pub fn get(&self, name: &str) -> Option<&StickerAsset> {
        self.assets.iter().find(|a| a.name == name)
    }

    /// Intrinsic size of a sticker, or [`DEFAULT_STICKER_SIZE`].
    pub fn size_of(&self, name: &str) -> Size {
        self.get(name).map(|a| a.size).unwrap_or(DEFAULT_STICKER_SIZE)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_measures_placeholder() {
        assert_eq!(measure_text(""), measure_text(TEXT_PLACEHOLDER));
    }

    #[test]
    fn test_multiline_text_is_taller() {
        let one = measure_text("hello");
        let two = measure_text("hello\nworld");
        assert_eq!(one.width, two.width);
        assert!(two.height > one.height);
        assert!(measure_text("hello\n").height > one.height);
    }

    #[test]
    fn test_min_width() {
        assert!(measure_text("i").width >= MIN_TEXT_WIDTH);
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = StickerCatalog::builtin();
        assert_eq!(catalog.len(), 8);
        assert!(catalog.names().any(|n| n == "dragon"));
        assert_eq!(catalog.size_of("wow"), Size::new(140.0, 96.0));
        assert_eq!(catalog.size_of("no-such-sticker"), DEFAULT_STICKER_SIZE);
    }
}
