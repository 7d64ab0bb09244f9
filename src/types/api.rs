use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ApiError;

/// Largest accepted TTL; anything bigger overflows a millisecond timestamp.
const MAX_TTL_SECONDS: u64 = i64::MAX as u64 / 1000;

#[derive(Debug, Serialize)]
pub struct CreatedPaste {
    pub id: String,
    pub url: String,
}

/// Body of `POST /api/pastes`, before validation. Fields are kept as raw
/// JSON so each one can be rejected with its own message. A field set to
/// `null` is `Some(Value::Null)`, only a missing field is `None`.
#[derive(Debug, Default, Deserialize)]
pub struct NewPasteRequest {
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub ttl_seconds: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub max_views: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A validated paste submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaste {
    pub content: String,
    pub ttl_seconds: Option<u64>,
    pub max_views: Option<u64>,
}

impl NewPasteRequest {
    pub fn from_json(body: Value) -> crate::ApiResult<Self> {
        if !body.is_object() {
            return Err(ApiError::InvalidBody);
        }
        serde_json::from_value(body).map_err(|_| ApiError::InvalidBody)
    }

    pub fn validate(self) -> crate::ApiResult<NewPaste> {
        let content = match self.content {
            Some(Value::String(content)) if !content.trim().is_empty() => content,
            _ => return Err(ApiError::InvalidContent),
        };

        let ttl_seconds = match self.ttl_seconds {
            Some(value) => Some(
                positive_integer(&value)
                    .filter(|&ttl| ttl <= MAX_TTL_SECONDS)
                    .ok_or(ApiError::InvalidTtl)?,
            ),
            None => None,
        };

        let max_views = match self.max_views {
            Some(value) => Some(positive_integer(&value).ok_or(ApiError::InvalidMaxViews)?),
            None => None,
        };

        Ok(NewPaste {
            content,
            ttl_seconds,
            max_views,
        })
    }
}

/// Accept JSON numbers with an integral value of at least 1, so `3` and `3.0`
/// both pass while `1.5`, `0`, `-1` and `"3"` do not.
fn positive_integer(value: &Value) -> Option<u64> {
    let Value::Number(number) = value else {
        return None;
    };

    if let Some(n) = number.as_u64() {
        return (n >= 1).then_some(n);
    }

    let n = number.as_f64()?;
    if n.fract() == 0.0 && n >= 1.0 && n <= u64::MAX as f64 {
        Some(n as u64)
    } else {
        None
    }
}
