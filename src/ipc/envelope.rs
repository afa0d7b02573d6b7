//! Wire envelopes exchanged over the local sockets.
//!
//! One flat UTF-8 JSON object per connection; the end of the stream is the
//! message boundary, so there is no length prefix. The `Type` tag selects the
//! message kind. Tags this build does not know decode to `Unknown` and are
//! dropped by the receiver instead of failing.

use std::{error::Error as StdError, fmt};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// Messages sent from the host tool to the editor.
///
/// New kinds are added as variants here; older readers see them as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum PipeMessage {
    SegmentUpdate(SegmentUpdate),
    #[serde(other)]
    Unknown,
}

/// The segment that just received focus in the host tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SegmentUpdate {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_lang: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_lang: String,
    /// ISO-8601 send time, kept verbatim.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamp: String,
}

impl SegmentUpdate {
    /// Build an update stamped with the current UTC time.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Parsed send time, if the writer supplied a valid one.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Actions sent from the editor back to the host tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum HostAction {
    Inject {
        #[serde(default, deserialize_with = "null_as_empty")]
        content: String,
    },
    #[serde(other)]
    Unknown,
}

/// Host SDKs serialise absent language codes as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug)]
pub struct DecodeError(serde_json::Error);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed message: {}", self.0)
    }
}

impl StdError for DecodeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.0)
    }
}

/// Serialise an envelope to the bytes written on the wire.
pub fn encode<T: Serialize>(message: &T) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(message)
}

/// Decode one complete payload.
///
/// Whitespace-only payloads yield `Ok(None)`: a writer that connected and
/// closed without sending anything is not an error.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes).map(Some).map_err(DecodeError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_update_keeps_all_four_strings() {
        let sent = PipeMessage::SegmentUpdate(SegmentUpdate::new("Hello", "", "en", "ko"));
        let bytes = encode(&sent).unwrap();
        let received: PipeMessage = decode(&bytes).unwrap().unwrap();

        let PipeMessage::SegmentUpdate(update) = received else {
            panic!("expected SegmentUpdate, got {received:?}");
        };
        assert_eq!(update.source, "Hello");
        assert_eq!(update.target, "");
        assert_eq!(update.source_lang, "en");
        assert_eq!(update.target_lang, "ko");
        assert!(update.sent_at().is_some());
    }

    #[test]
    fn wire_field_names_match_host_contract() {
        let bytes = encode(&PipeMessage::SegmentUpdate(SegmentUpdate::new(
            "a", "b", "en", "de",
        )))
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        for key in ["Type", "Source", "Target", "SourceLang", "TargetLang", "Timestamp"] {
            assert!(value.get(key).is_some(), "missing {key} in {value}");
        }
        assert_eq!(value["Type"], "SegmentUpdate");
    }

    #[test]
    fn decodes_message_from_host_sdk() {
        let raw = br#"{"Type":"SegmentUpdate","Source":"Good morning","Target":null,
            "SourceLang":"eng","TargetLang":null,"Timestamp":"2024-05-01T10:00:00.0000000Z",
            "Extra":{"ignored":true}}"#;
        let msg: PipeMessage = decode(raw).unwrap().unwrap();
        assert_eq!(
            msg,
            PipeMessage::SegmentUpdate(SegmentUpdate {
                source: "Good morning".into(),
                target: String::new(),
                source_lang: "eng".into(),
                target_lang: String::new(),
                timestamp: "2024-05-01T10:00:00.0000000Z".into(),
            })
        );
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let msg: PipeMessage = decode(br#"{"Type":"SegmentUpdate","Source":"x"}"#)
            .unwrap()
            .unwrap();
        let PipeMessage::SegmentUpdate(update) = msg else {
            panic!("expected SegmentUpdate");
        };
        assert_eq!(update.source, "x");
        assert!(update.target.is_empty());
        assert!(update.timestamp.is_empty());
        assert!(update.sent_at().is_none());
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let msg: PipeMessage = decode(br#"{"Type":"SegmentConfirmed","Source":"x"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(msg, PipeMessage::Unknown);
    }

    #[test]
    fn malformed_payloads_are_errors() {
        assert!(decode::<PipeMessage>(b"{\"Type\":").is_err());
        assert!(decode::<PipeMessage>(b"\"SegmentUpdate\"").is_err());
        assert!(decode::<PipeMessage>(br#"{"Source":"no tag"}"#).is_err());
        assert!(decode::<PipeMessage>(&[0xff, 0xfe, b'{']).is_err());
    }

    #[test]
    fn blank_payload_is_skipped() {
        assert!(decode::<PipeMessage>(b"").unwrap().is_none());
        assert!(decode::<PipeMessage>(b" \r\n\t").unwrap().is_none());
    }

    #[test]
    fn inject_action_uses_lowercase_fields() {
        let bytes = encode(&HostAction::Inject {
            content: "안녕하세요".into(),
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["action"], "Inject");
        assert_eq!(value["content"], "안녕하세요");

        let other: HostAction = decode(br#"{"action":"Reload"}"#).unwrap().unwrap();
        assert_eq!(other, HostAction::Unknown);
    }
}
