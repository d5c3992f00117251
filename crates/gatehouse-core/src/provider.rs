//! Provider payloads — the opaque blob an identity provider sends alongside
//! an assertion.
//!
//! The blob is stored verbatim. A handful of profile fields are read out of
//! it through [`GoogleProfile`], a typed view of the Google sign-in shape:
//!
//! ```json
//! { "user": { "photo": "...", "givenName": "...", "familyName": "..." } }
//! ```
//!
//! Extraction is best-effort. A missing or mistyped component yields `None`
//! for that field only.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Raw provider payload, stored and returned exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderData(pub Value);

impl ProviderData {
  pub fn new(value: Value) -> Self { Self(value) }

  pub fn as_value(&self) -> &Value { &self.0 }

  /// Profile fields carried in the payload, if any.
  pub fn google_profile(&self) -> GoogleProfile {
    serde_json::from_value::<GooglePayload>(self.0.clone())
      .ok()
      .and_then(|payload| payload.user)
      .unwrap_or_default()
  }
}

impl From<Value> for ProviderData {
  fn from(value: Value) -> Self { Self(value) }
}

// ─── Typed view ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GooglePayload {
  #[serde(default, deserialize_with = "lenient")]
  user: Option<GoogleProfile>,
}

/// The `user` sub-record of a Google sign-in payload.
///
/// Empty strings are reported as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GoogleProfile {
  #[serde(default, deserialize_with = "non_empty_string")]
  pub photo:       Option<String>,
  #[serde(default, rename = "givenName", deserialize_with = "non_empty_string")]
  pub given_name:  Option<String>,
  #[serde(default, rename = "familyName", deserialize_with = "non_empty_string")]
  pub family_name: Option<String>,
}

/// Accept any JSON value; keep it only if it deserializes as `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: serde::de::DeserializeOwned,
{
  let value = Value::deserialize(deserializer)?;
  Ok(serde_json::from_value(value).ok())
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::String(s) if !s.is_empty() => Ok(Some(s)),
    _ => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn extracts_all_fields() {
    let data = ProviderData::new(json!({
      "idToken": "opaque",
      "user": {
        "photo": "https://example.com/a.png",
        "givenName": "Ada",
        "familyName": "Lovelace",
        "email": "ada@example.com"
      }
    }));

    assert_eq!(data.google_profile(), GoogleProfile {
      photo:       Some("https://example.com/a.png".into()),
      given_name:  Some("Ada".into()),
      family_name: Some("Lovelace".into()),
    });
  }

  #[test]
  fn missing_user_yields_empty_profile() {
    let data = ProviderData::new(json!({ "idToken": "opaque" }));
    assert_eq!(data.google_profile(), GoogleProfile::default());
  }

  #[test]
  fn non_object_payloads_yield_empty_profile() {
    for value in [json!(null), json!("text"), json!(42), json!([1, 2])] {
      assert_eq!(
        ProviderData::new(value).google_profile(),
        GoogleProfile::default()
      );
    }
  }

  #[test]
  fn malformed_user_yields_empty_profile() {
    let data = ProviderData::new(json!({ "user": "not-an-object" }));
    assert_eq!(data.google_profile(), GoogleProfile::default());
  }

  #[test]
  fn mistyped_field_does_not_hide_siblings() {
    let data = ProviderData::new(json!({
      "user": { "photo": 17, "givenName": "Ada", "familyName": "" }
    }));

    assert_eq!(data.google_profile(), GoogleProfile {
      photo:       None,
      given_name:  Some("Ada".into()),
      family_name: None,
    });
  }

  #[test]
  fn serializes_verbatim() {
    let raw = json!({ "user": { "givenName": "Ada" }, "extra": [1, 2, 3] });
    let data = ProviderData::new(raw.clone());
    assert_eq!(serde_json::to_value(&data).unwrap(), raw);
  }
}
