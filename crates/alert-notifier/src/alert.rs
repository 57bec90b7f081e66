/// Body sent for `safe` alerts which don't carry their own message.
pub const SAFE_MESSAGE: &str = "I'm safe now.";
/// Body sent for every other alert which doesn't carry its own message.
pub const SOS_MESSAGE: &str = "SOS!";

/// AlertRecord is the snapshot of a newly-created alert document.
///
/// Records are written by clients we don't control, so every field is optional
/// and may also be explicitly `null`. Scalar fields of an unexpected JSON type
/// are read as absent; only a `recipients` which isn't an array of objects fails
/// to decode:
/// ```ignore
/// { "type": "sos", "message": "Help!", "recipients": [ {"phone": "+15551234567", "name": "Mom"}, {"phone": ""} ] }
/// ```
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlertRecord {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub alert_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<Recipient>>,
}

/// Recipient is a contact to be notified of an alert.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Recipient {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    // Carried for completeness, but never used in composing a message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<serde_json::Value>,
}

// Decode a JSON string, mapping `null` and values of any other type to None.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Sos,
    Safe,
}

impl AlertRecord {
    /// Kind of this alert. Only an exact `"safe"` type is `Safe`:
    /// a missing, empty, or unrecognized type is treated as `Sos`.
    pub fn kind(&self) -> AlertKind {
        match self.alert_type.as_deref() {
            Some("safe") => AlertKind::Safe,
            _ => AlertKind::Sos,
        }
    }

    /// Message body to send to every recipient.
    ///
    /// An explicit message is used whenever it's non-empty, including when it's
    /// only whitespace. Otherwise we fall back to a fixed message of the alert kind.
    pub fn effective_message(&self) -> &str {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ => match self.kind() {
                AlertKind::Safe => SAFE_MESSAGE,
                AlertKind::Sos => SOS_MESSAGE,
            },
        }
    }

    /// Trimmed, non-empty phone numbers of all recipients, in record order.
    /// Duplicates are not removed.
    pub fn recipient_phones(&self) -> Vec<String> {
        self.recipients
            .iter()
            .flatten()
            .map(|r| r.phone.as_deref().unwrap_or_default().trim())
            .filter(|phone| !phone.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn record(v: serde_json::Value) -> AlertRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_default_messages() {
        let cases = [
            (json!({"type": "safe"}), SAFE_MESSAGE),
            (json!({"type": "safe", "message": ""}), SAFE_MESSAGE),
            (json!({"type": "safe", "message": null}), SAFE_MESSAGE),
            (json!({"type": "sos"}), SOS_MESSAGE),
            (json!({}), SOS_MESSAGE),
            (json!({"type": null}), SOS_MESSAGE),
            (json!({"type": ""}), SOS_MESSAGE),
            (json!({"type": "SAFE"}), SOS_MESSAGE),
            (json!({"type": "checkin"}), SOS_MESSAGE),
        ];

        for (fixture, expect) in cases {
            assert_eq!(
                record(fixture.clone()).effective_message(),
                expect,
                "fixture: {fixture}"
            );
        }
    }

    #[test]
    fn test_explicit_message_wins_over_type() {
        for alert_type in [json!("safe"), json!("sos"), json!("other"), json!(null)] {
            let r = record(json!({"type": alert_type, "message": "Meet me at the north gate"}));
            assert_eq!(r.effective_message(), "Meet me at the north gate");
        }
    }

    #[test]
    fn test_whitespace_message_is_kept_verbatim() {
        let r = record(json!({"type": "safe", "message": "  \t"}));
        assert_eq!(r.effective_message(), "  \t");
    }

    #[test]
    fn test_kind() {
        assert_eq!(record(json!({"type": "safe"})).kind(), AlertKind::Safe);
        assert_eq!(record(json!({"type": "sos"})).kind(), AlertKind::Sos);
        assert_eq!(record(json!({})).kind(), AlertKind::Sos);
    }

    #[test]
    fn test_recipient_phones() {
        let r = record(json!({
            "recipients": [
                {"phone": " +15551234567 ", "name": "Mom"},
                {"phone": ""},
                {"phone": "   "},
                {"name": "No phone"},
                {"phone": null},
                {},
                {"phone": "+15550000000"},
                {"phone": "+15551234567"},
            ],
        }));

        insta::assert_debug_snapshot!(r.recipient_phones(), @r###"
        [
            "+15551234567",
            "+15550000000",
            "+15551234567",
        ]
        "###);
    }

    #[test]
    fn test_missing_or_null_recipients() {
        assert!(record(json!({})).recipient_phones().is_empty());
        assert!(record(json!({"recipients": null})).recipient_phones().is_empty());
        assert!(record(json!({"recipients": []})).recipient_phones().is_empty());
    }

    #[test]
    fn test_mistyped_scalars_are_read_as_absent() {
        let r = record(json!({
            "type": 1,
            "message": {"text": "help"},
            "recipients": [
                {"phone": "+15551234567", "name": 42},
                {"phone": 15550000000u64, "name": "Dad"},
                {"phone": "+15550000001", "name": ["a", "b"]},
            ],
        }));

        assert_eq!(r.kind(), AlertKind::Sos);
        assert_eq!(r.effective_message(), SOS_MESSAGE);
        assert_eq!(
            r.recipient_phones(),
            vec!["+15551234567".to_string(), "+15550000001".to_string()]
        );

        let r = record(json!({"type": true, "message": 7}));
        assert_eq!(r.effective_message(), SOS_MESSAGE);
    }

    #[test]
    fn test_recipients_must_be_an_array_of_objects() {
        for fixture in [
            json!({"recipients": "+15551234567"}),
            json!({"recipients": {"phone": "+15551234567"}}),
            json!({"recipients": ["+15551234567"]}),
        ] {
            assert!(
                serde_json::from_value::<AlertRecord>(fixture.clone()).is_err(),
                "fixture: {fixture}"
            );
        }
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let r = record(json!({
            "type": "sos",
            "createdAt": "2026-10-16T12:00:00Z",
            "location": {"lat": 1.5, "lng": 2.5},
            "recipients": [{"phone": "+15551234567", "relationship": "sister"}],
        }));
        assert_eq!(r.recipient_phones(), vec!["+15551234567".to_string()]);
    }
}
