//! Shared identifier and mode types for the kiosk core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Card identifier derived from the raw UID bytes of a presented card.
///
/// Rendered as uppercase hex, two digits per byte, zero-padded. This string is
/// the join key between a physical card and a user or book record, so it is
/// immutable once captured. Deserialization routes through [`CardUid::new`]
/// so a hand-edited catalog document with lowercase UIDs still matches
/// captured cards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CardUid(String);

impl CardUid {
    /// Derive a UID from raw card bytes.
    pub fn from_raw(bytes: &[u8]) -> Self {
        CardUid(hex::encode_upper(bytes))
    }

    /// Build a UID from an already-rendered hex string (catalog data).
    ///
    /// Normalized to uppercase so lookups against captured UIDs match
    /// regardless of how the document was edited.
    pub fn new(s: impl Into<String>) -> Self {
        CardUid(s.into().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CardUid {
    fn from(s: String) -> Self {
        CardUid::new(s)
    }
}

impl From<CardUid> for String {
    fn from(uid: CardUid) -> Self {
        uid.0
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Interpretation of the next card capture.
///
/// Non-`Normal` modes are one-shot: the first mailbox read that observes them
/// resets the stored mode (and the controller's current mode) back to
/// `Normal`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "user")]
    RegisterUser,
    #[serde(rename = "book")]
    RegisterBook,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Normal => f.write_str("normal"),
            ScanMode::RegisterUser => f.write_str("user"),
            ScanMode::RegisterBook => f.write_str("book"),
        }
    }
}

/// Current wall-clock time in unix milliseconds.
///
/// The session and mailbox APIs take `now_ms` explicitly so that expiry and
/// timeout policy stay pure functions of `(now, recorded_at)` and tests can
/// drive them deterministically.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn uid_from_raw_is_uppercase_zero_padded() {
        let uid = CardUid::from_raw(&[0x04, 0xA3, 0xFF, 0x12]);
        assert_eq!(uid.as_str(), "04A3FF12");

        let uid = CardUid::from_raw(&[0x00, 0x01]);
        assert_eq!(uid.as_str(), "0001");
    }

    #[test]
    fn uid_new_normalizes_case() {
        assert_eq!(CardUid::new("a286ff03"), CardUid::new("A286FF03"));
    }

    #[test]
    fn uid_deserialization_normalizes_case() {
        let uid: CardUid = serde_json::from_str("\"04a3ff12\"").unwrap();
        assert_eq!(uid, CardUid::from_raw(&[0x04, 0xA3, 0xFF, 0x12]));
        assert_eq!(serde_json::to_string(&uid).unwrap(), "\"04A3FF12\"");
    }

    #[test]
    fn mode_wire_names() {
        assert_eq!(serde_json::to_string(&ScanMode::RegisterBook).unwrap(), "\"book\"");
        assert_eq!(
            serde_json::from_str::<ScanMode>("\"user\"").unwrap(),
            ScanMode::RegisterUser
        );
    }

    proptest! {
        #[test]
        fn uid_encoding_is_two_hex_digits_per_byte(bytes in proptest::collection::vec(any::<u8>(), 0..16)) {
            let uid = CardUid::from_raw(&bytes);
            prop_assert_eq!(uid.as_str().len(), bytes.len() * 2);
            prop_assert!(uid
                .as_str()
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        }
    }
}
