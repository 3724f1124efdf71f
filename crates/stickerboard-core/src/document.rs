//! Canvas document: background plus z-ordered widgets, and its JSON form.

use crate::color::{self, HexColor};
use crate::widget::{Widget, WidgetFields};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a payload could not be turned into a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Not UTF-8, not JSON, or not shaped like a document.
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// A widget's `type` is missing or not one we know.
    #[error("unknown widget kind: {0:?}")]
    UnknownKind(Option<String>),
    /// The widget at `index` failed; the whole document is rejected.
    #[error("widget {index} failed to decode: {source}")]
    WidgetDecodeFailed {
        index: usize,
        source: Box<DecodeError>,
    },
}

/// Serialization failure while encoding a document.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),
}

/// The whole-canvas state exchanged with the remote store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasDocument {
    /// Unset means the renderer's default background.
    pub background_color: Option<HexColor>,
    /// Back to front.
    pub widgets: Vec<Widget>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodedDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    background_color: Option<HexColor>,
    widgets: Vec<WidgetFields>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecodedDocument {
    #[serde(default, deserialize_with = "color::deserialize_lenient")]
    background_color: Option<HexColor>,
    #[serde(default)]
    widgets: Option<Vec<serde_json::Value>>,
}

impl CanvasDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from live state.
    pub fn snapshot<'a>(
        background_color: Option<HexColor>,
        widgets: impl IntoIterator<Item = &'a Widget>,
    ) -> Self {
        Self {
            background_color,
            widgets: widgets.into_iter().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    fn encoded(&self) -> EncodedDocument {
        EncodedDocument {
            background_color: self.background_color,
            widgets: self.widgets.iter().map(Widget::encode).collect(),
        }
    }

    /// Serialize to the wire format.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(&self.encoded())?)
    }

    /// Serialize to indented JSON, for files meant to be read by people.
    pub fn to_json_pretty(&self) -> Result<String, EncodeError> {
        Ok(serde_json::to_string_pretty(&self.encoded())?)
    }

    /// Deserialize from the wire format.
    ///
    /// Fails atomically: if any widget is rejected, nothing of the
    /// document is returned.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| DecodeError::Malformed(format!("invalid UTF-8: {}", e)))?;
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(DecodeError::Malformed("document is not an object".to_string()));
        }
        let fields: DecodedDocument =
            serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let widgets = fields
            .widgets
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                decode_widget(value).map_err(|source| DecodeError::WidgetDecodeFailed {
                    index,
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            background_color: fields.background_color,
            widgets,
        })
    }
}

fn decode_widget(value: serde_json::Value) -> Result<Widget, DecodeError> {
    if !value.is_object() {
        return Err(DecodeError::Malformed("widget is not an object".to_string()));
    }
    if value.get("type").is_some_and(|kind| !kind.is_string() && !kind.is_null()) {
        return Err(DecodeError::UnknownKind(None));
    }
    let fields: WidgetFields =
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    Widget::decode(fields)
}
