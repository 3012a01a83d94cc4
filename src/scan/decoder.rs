use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Contents of a student QR code. Only `id` is trusted for matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanPayload {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "CNIC", skip_serializing_if = "Option::is_none")]
    pub cnic: Option<Value>,
}

/// Longest code text the ledger can key on (`attendance_ledger.code_data`).
pub const MAX_CODE_CHARS: usize = 512;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidPayload {
    #[error("code text is longer than {MAX_CODE_CHARS} characters")]
    TooLong,
    #[error("code text is not valid JSON")]
    NotJson,
    #[error("code payload is not a JSON object")]
    NotAnObject,
    #[error("code payload has no non-negative integer `id`")]
    MissingId,
}

impl ScanPayload {
    /// Payload printed on a generated ID card.
    pub fn for_card(id: u64, name: &str, cnic: &str) -> Self {
        Self {
            id,
            name: Some(name.to_string()),
            cnic: Some(Value::String(cnic.to_string())),
        }
    }

    /// Serialises as `{"id":..,"name":..,"CNIC":..}`, the text encoded into cards.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Parses the text read from a code. Nothing else is consulted.
pub fn decode_payload(text: &str) -> Result<ScanPayload, InvalidPayload> {
    if text.chars().count() > MAX_CODE_CHARS {
        return Err(InvalidPayload::TooLong);
    }
    let value: Value = serde_json::from_str(text).map_err(|_| InvalidPayload::NotJson)?;
    let obj = value.as_object().ok_or(InvalidPayload::NotAnObject)?;

    let id = obj
        .get("id")
        .and_then(Value::as_u64)
        .ok_or(InvalidPayload::MissingId)?;

    Ok(ScanPayload {
        id,
        name: obj.get("name").and_then(Value::as_str).map(str::to_string),
        cnic: obj.get("CNIC").cloned(),
    })
}

/// One read from the camera: a decoded code or a frame with nothing in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRead {
    Code(String),
    Empty,
}

/// Collapses consecutive reads of the same code into a single event.
///
/// A code held in front of the camera is decoded on every frame; it is
/// emitted again only after an empty frame or when a different code shows up.
#[derive(Debug, Default)]
pub struct PresentationFilter {
    last: Option<String>,
    gap: bool,
}

impl PresentationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, frame: FrameRead) -> Option<String> {
        match frame {
            FrameRead::Empty => {
                self.gap = true;
                None
            }
            FrameRead::Code(text) => {
                if !self.gap && self.last.as_deref() == Some(text.as_str()) {
                    return None;
                }
                self.gap = false;
                self.last = Some(text.clone());
                Some(text)
            }
        }
    }
}
