//! Normalization of multi-valued fields (headers, trailers, cookies)
//!
//! The proxy hands over fields as an ordered list where a name may repeat
//! and each name/value may be raw bytes or text. [`normalize`] collapses
//! that into a [`FieldMap`]: one entry per distinct name, holding every
//! value in encounter order. Undecodable bytes are replaced, never rejected.

use serde::Deserialize;
use std::collections::HashMap;

/// One name or value as delivered by the host
///
/// On the wire: a JSON string is text, `{"b64": "..."}` is raw bytes,
/// anything else is kept as-is and rendered as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldEntry {
    Text(String),
    Bytes {
        #[serde(rename = "b64", deserialize_with = "crate::codec::base64_bytes")]
        bytes: Vec<u8>,
    },
    Other(serde_json::Value),
}

impl FieldEntry {
    /// Render as text, replacing invalid UTF-8 sequences with U+FFFD
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Bytes { bytes } => String::from_utf8_lossy(bytes).into_owned(),
            Self::Other(serde_json::Value::String(text)) => text.clone(),
            Self::Other(value) => value.to_string(),
        }
    }
}

impl From<&str> for FieldEntry {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for FieldEntry {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for FieldEntry {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes { bytes }
    }
}

impl From<&[u8]> for FieldEntry {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes {
            bytes: bytes.to_vec(),
        }
    }
}

/// A name followed by zero or more values: `[name, value, value, ...]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<FieldEntry>")]
pub struct Field {
    pub name: FieldEntry,
    pub values: Vec<FieldEntry>,
}

impl TryFrom<Vec<FieldEntry>> for Field {
    type Error = &'static str;

    fn try_from(entries: Vec<FieldEntry>) -> Result<Self, Self::Error> {
        let mut entries = entries.into_iter();
        let name = entries.next().ok_or("field without a name")?;
        Ok(Self {
            name,
            values: entries.collect(),
        })
    }
}

/// The host's ordered, possibly repeating field list
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct MultiValue(pub Vec<Field>);

impl MultiValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one `name: value` pair
    pub fn push(&mut self, name: impl Into<FieldEntry>, value: impl Into<FieldEntry>) {
        self.0.push(Field {
            name: name.into(),
            values: vec![value.into()],
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for MultiValue
where
    K: Into<FieldEntry>,
    V: Into<FieldEntry>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (name, value) in iter {
            fields.push(name, value);
        }
        fields
    }
}

/// Normalized fields: distinct names in first-seen order, each with its values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values recorded for `name` (exact, case-sensitive match)
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, Vec<String>);
    type IntoIter = std::vec::IntoIter<(String, Vec<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Collapse a host field list into a [`FieldMap`]
///
/// `None` and empty input both yield an empty map.
pub fn normalize(fields: Option<&MultiValue>) -> FieldMap {
    let mut map = FieldMap::default();
    let Some(fields) = fields else {
        return map;
    };

    let mut positions: HashMap<String, usize> = HashMap::new();
    for field in fields.iter() {
        let name = field.name.to_text();
        let values = field.values.iter().map(FieldEntry::to_text);

        match positions.get(&name).and_then(|&pos| map.entries.get_mut(pos)) {
            Some((_, existing)) => existing.extend(values),
            None => {
                positions.insert(name.clone(), map.entries.len());
                map.entries.push((name, values.collect()));
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_empty_yield_empty_map() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(&MultiValue::new())).is_empty());
    }

    #[test]
    fn test_repeated_names_collapse_in_encounter_order() {
        let fields: MultiValue = [
            ("Accept", "text/html"),
            ("Host", "example.com"),
            ("Accept", "application/json"),
            ("Accept", "*/*"),
        ]
        .into_iter()
        .collect();

        let map = normalize(Some(&fields));

        assert_eq!(map.len(), 2);
        let names: Vec<&str> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Accept", "Host"]);
        assert_eq!(
            map.get("Accept").unwrap(),
            ["text/html", "application/json", "*/*"]
        );
        assert_eq!(map.get("Host").unwrap(), ["example.com"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut fields = MultiValue::new();
        fields.push(b"X-Bin\xff".as_slice(), vec![0x61, 0xff, 0x62]);

        let map = normalize(Some(&fields));

        let (name, values) = map.iter().next().unwrap();
        assert_eq!(name, "X-Bin\u{fffd}");
        assert_eq!(values, ["a\u{fffd}b"]);
    }

    #[test]
    fn test_field_with_several_values() {
        let fields = MultiValue(vec![Field {
            name: "Set-Cookie".into(),
            values: vec!["a=1".into(), "b=2".into()],
        }]);

        let map = normalize(Some(&fields));
        assert_eq!(map.get("Set-Cookie").unwrap(), ["a=1", "b=2"]);
    }

    #[test]
    fn test_deserialize_mixed_encodings() {
        let fields: MultiValue = serde_json::from_str(
            r#"[["Accept", "text/html"], [{"b64": "WC1SYXc="}, {"b64": "/w=="}], ["X-Count", 3, true]]"#,
        )
        .unwrap();

        let map = normalize(Some(&fields));

        assert_eq!(map.get("Accept").unwrap(), ["text/html"]);
        assert_eq!(map.get("X-Raw").unwrap(), ["\u{fffd}"]);
        assert_eq!(map.get("X-Count").unwrap(), ["3", "true"]);
    }

    #[test]
    fn test_deserialize_rejects_nameless_field() {
        let parsed: Result<MultiValue, _> = serde_json::from_str("[[]]");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_name_matching_is_exact() {
        let fields: MultiValue = [("accept", "a"), ("Accept", "b")].into_iter().collect();

        let map = normalize(Some(&fields));
        assert_eq!(map.len(), 2);
    }
}
