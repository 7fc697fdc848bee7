//! DeviceId - normalized, cheap-to-clone device identifier

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a configured capture device (`polar`, `starfit`, ...).
///
/// Ids are trimmed and lower-cased on construction, so `"Polar "` and
/// `"polar"` name the same device. They are cloned into every `RawFile` and
/// `CaptureGroup`; the `Arc<str>` keeps that a reference-count bump.
///
/// # Examples
/// ```
/// use contracts::DeviceId;
///
/// let id: DeviceId = " StarFit".into();
/// assert_eq!(id.as_str(), "starfit");
/// assert!(id.matches("STARFIT"));
/// ```
#[derive(Clone, Default)]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    pub fn new(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.bytes().any(|b| b.is_ascii_uppercase()) {
            Self(Arc::from(trimmed.to_ascii_lowercase()))
        } else {
            Self(Arc::from(trimmed))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison with a user-supplied name
    pub fn matches(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name.trim())
    }

    /// Usable as a metrics label and log field: non-empty, no whitespace or
    /// path separators
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && !self
                .0
                .chars()
                .any(|c| c.is_whitespace() || c == '/' || c == '\\')
    }
}

impl Deref for DeviceId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for DeviceId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({:?})", self.0)
    }
}

impl PartialEq for DeviceId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for DeviceId {}

impl PartialEq<str> for DeviceId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for DeviceId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl PartialOrd for DeviceId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeviceId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// must agree with str for Borrow<str> lookups
impl Hash for DeviceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for DeviceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = Self::new(&String::deserialize(deserializer)?);
        if id.is_well_formed() {
            Ok(id)
        } else {
            Err(D::Error::custom(format!("invalid device id {:?}", id.as_str())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_normalized_on_construction() {
        let id: DeviceId = "  Polar".into();
        assert_eq!(id, "polar");
        assert_eq!(id, DeviceId::new("POLAR"));
        assert!(id.matches(" polar "));
        assert!(!id.matches("starfit"));
    }

    #[test]
    fn test_map_lookup_by_str() {
        let mut map: BTreeMap<DeviceId, usize> = BTreeMap::new();
        map.insert("starfit".into(), 2);
        assert_eq!(map.get("starfit"), Some(&2));
        assert_eq!(map.get("polar"), None);
    }

    #[test]
    fn test_serde_rejects_malformed_ids() {
        let id: DeviceId = serde_json::from_str("\"Amazfit\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"amazfit\"");

        assert!(serde_json::from_str::<DeviceId>("\"  \"").is_err());
        assert!(serde_json::from_str::<DeviceId>("\"lab/2024\"").is_err());
        assert!(serde_json::from_str::<DeviceId>("\"my device\"").is_err());
    }
}
