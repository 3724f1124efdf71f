//! Widget entity: one placed text label or sticker.

use super::catalog::{StickerCatalog, measure_text};
use crate::color::{self, HexColor};
use crate::document::DecodeError;
use crate::geometry;
use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Deserializer, Serialize};

/// Wire discriminator for text widgets.
pub const TEXT_KIND: &str = "text";
/// Wire discriminator for sticker widgets.
pub const STICKER_KIND: &str = "sticker";

/// The kind of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Text,
    Sticker,
}

impl WidgetKind {
    /// Discriminator string used in documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Text => TEXT_KIND,
            WidgetKind::Sticker => STICKER_KIND,
        }
    }

    /// Parse a discriminator string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            TEXT_KIND => Some(WidgetKind::Text),
            STICKER_KIND => Some(WidgetKind::Sticker),
            _ => None,
        }
    }
}

/// Content of a text label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextContent {
    pub text: String,
    /// Unset means the renderer default.
    pub text_color: Option<HexColor>,
    pub text_background_color: Option<HexColor>,
}

/// Content of a sticker image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StickerContent {
    /// Asset name of the sticker image.
    pub image_name: String,
    pub border_color: Option<HexColor>,
}

/// Kind-specific widget content.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetContent {
    Text(TextContent),
    Sticker(StickerContent),
}

/// One placed item on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    /// Center point in canvas coordinates.
    pub position: Point,
    /// Content-derived bounding size.
    pub size: Size,
    /// Accumulated rotation and scale. Translation lives in `position`.
    pub transform: Affine,
    pub content: WidgetContent,
}

impl Widget {
    /// Create a text label at the origin, sized to its content.
    pub fn new_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            position: Point::ZERO,
            size: measure_text(&text),
            transform: Affine::IDENTITY,
            content: WidgetContent::Text(TextContent {
                text,
                ..Default::default()
            }),
        }
    }

    /// Create a sticker at the origin, sized from the built-in catalog.
    pub fn new_sticker(image_name: impl Into<String>, border_color: Option<HexColor>) -> Self {
        let image_name = image_name.into();
        Self {
            position: Point::ZERO,
            size: StickerCatalog::builtin().size_of(&image_name),
            transform: Affine::IDENTITY,
            content: WidgetContent::Sticker(StickerContent {
                image_name,
                border_color,
            }),
        }
    }

    /// Builder: place the widget at `position`.
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn kind(&self) -> WidgetKind {
        match self.content {
            WidgetContent::Text(_) => WidgetKind::Text,
            WidgetContent::Sticker(_) => WidgetKind::Sticker,
        }
    }

    /// The label text, for text widgets.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            WidgetContent::Text(t) => Some(&t.text),
            WidgetContent::Sticker(_) => None,
        }
    }

    /// The sticker image name, for sticker widgets.
    pub fn image_name(&self) -> Option<&str> {
        match &self.content {
            WidgetContent::Sticker(s) => Some(&s.image_name),
            WidgetContent::Text(_) => None,
        }
    }

    /// Replace a text widget's text and re-measure it.
    /// Returns false for stickers.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        match &mut self.content {
            WidgetContent::Text(content) => {
                content.text = text.into();
                self.size = measure_text(&content.text);
                true
            }
            WidgetContent::Sticker(_) => false,
        }
    }

    /// Project the widget into its flat document fields.
    pub fn encode(&self) -> WidgetFields {
        let mut fields = WidgetFields {
            kind: Some(self.kind().as_str().to_string()),
            x: self.position.x,
            y: self.position.y,
            width: self.size.width,
            height: self.size.height,
            transform: (self.transform != Affine::IDENTITY).then(|| self.transform.into()),
            ..Default::default()
        };
        match &self.content {
            WidgetContent::Text(t) => {
                fields.text = Some(t.text.clone());
                fields.text_color = t.text_color;
                fields.text_background_color = t.text_background_color;
            }
            WidgetContent::Sticker(s) => {
                fields.image_name = Some(s.image_name.clone());
                fields.image_border_color = s.border_color;
            }
        }
        fields
    }

    /// Rebuild a widget from document fields.
    ///
    /// Only the kind discriminator is required. Fields belonging to the
    /// other kind are ignored.
    pub fn decode(fields: WidgetFields) -> Result<Self, DecodeError> {
        let kind = fields
            .kind
            .as_deref()
            .and_then(WidgetKind::from_name)
            .ok_or_else(|| DecodeError::UnknownKind(fields.kind.clone()))?;

        let transform = match fields.transform {
            None => Affine::IDENTITY,
            Some(t) => {
                let affine = Affine::from(t);
                if geometry::is_invertible(affine) {
                    affine
                } else {
                    log::warn!("Replacing degenerate widget transform {:?} with identity", affine);
                    Affine::IDENTITY
                }
            }
        };

        let content = match kind {
            WidgetKind::Text => WidgetContent::Text(TextContent {
                text: fields.text.unwrap_or_default(),
                text_color: fields.text_color,
                text_background_color: fields.text_background_color,
            }),
            WidgetKind::Sticker => WidgetContent::Sticker(StickerContent {
                image_name: fields.image_name.unwrap_or_default(),
                border_color: fields.image_border_color,
            }),
        };

        Ok(Self {
            position: Point::new(fields.x, fields.y),
            size: Size::new(fields.width, fields.height),
            transform,
            content,
        })
    }
}

/// Flat wire representation of a widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetFields {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub x: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub y: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub width: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub height: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "color::deserialize_lenient"
    )]
    pub text_color: Option<HexColor>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "color::deserialize_lenient"
    )]
    pub text_background_color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "color::deserialize_lenient"
    )]
    pub image_border_color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformFields>,
}

/// Wire form of an affine transform. Missing coefficients take the
/// identity's value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformFields {
    #[serde(default = "one", deserialize_with = "number_or_one")]
    pub a: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub b: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub c: f64,
    #[serde(default = "one", deserialize_with = "number_or_one")]
    pub d: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub tx: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub ty: f64,
}

impl From<Affine> for TransformFields {
    fn from(affine: Affine) -> Self {
        let [a, b, c, d, tx, ty] = affine.as_coeffs();
        Self { a, b, c, d, tx, ty }
    }
}

impl From<TransformFields> for Affine {
    fn from(t: TransformFields) -> Self {
        Affine::new([t.a, t.b, t.c, t.d, t.tx, t.ty])
    }
}

fn one() -> f64 {
    1.0
}

/// `null` reads as zero; a non-number is still an error.
fn number_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn number_or_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(1.0))
}
