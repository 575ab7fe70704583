//! Flat records returned by entity resolvers.
//!
//! A [`Record`] is a mapping from field name to [`Scalar`]. Records carry a
//! structural equality, hash and total order over all their fields, so the
//! chain driver can deduplicate and sort heterogeneous results without
//! knowing the entity they came from.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::catalog::EntityName;
use crate::resolver::ResolveError;

/// A single field value.
///
/// Floats compare by their IEEE-754 total order, which makes `Scalar`
/// usable as a set member and sort key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::Int(_) => 2,
            Scalar::Float(_) => 3,
            Scalar::Text(_) => 4,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value; text is parsed when it holds an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Floating-point view of the value; text is parsed when numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Compare a stored value against a filter value supplied by a caller.
    ///
    /// Filter values arrive as text from HTTP or as typed scalars from a
    /// previous chain hop, so numbers compare numerically and text compares
    /// ASCII case-insensitively.
    pub fn loosely_matches(&self, filter: &Scalar) -> bool {
        match (self, filter) {
            (Scalar::Null, _) | (_, Scalar::Null) => false,
            (Scalar::Int(_) | Scalar::Float(_), _) | (_, Scalar::Int(_) | Scalar::Float(_)) => {
                match (self.as_f64(), filter.as_f64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            _ => self.to_string().eq_ignore_ascii_case(&filter.to_string()),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Bool(b) => b.hash(state),
            Scalar::Int(i) => i.hash(state),
            Scalar::Float(f) => f.to_bits().hash(state),
            Scalar::Text(s) => s.hash(state),
        }
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => Ordering::Equal,
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Float(a), Scalar::Float(b)) => a.total_cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

/// A flat field → value mapping produced by a resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Scalar>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Scalar>) -> Option<Scalar> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Scalar> {
        self.0.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the identifier field declared for `entity`.
    pub fn identifier(&self, entity: EntityName) -> Result<&Scalar, ResolveError> {
        let field = entity.identifier_field();
        self.0.get(field).ok_or(ResolveError::MissingIdentifier { entity, field })
    }
}

impl FromIterator<(String, Scalar)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Filter conditions handed to a resolver, keyed by filter parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(BTreeMap<String, Scalar>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter with exactly one condition.
    pub fn single(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::new().with(key, value)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Parse a JSON object into a record, rejecting nested values.
impl TryFrom<serde_json::Value> for Record {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| match v {
                    serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                        Err(format!("field '{k}' is not a scalar"))
                    }
                    other => serde_json::from_value::<Scalar>(other)
                        .map(|s| (k, s))
                        .map_err(|e| e.to_string()),
                })
                .collect(),
            other => Err(format!("expected a JSON object, got {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_records_dedupe_on_all_fields() {
        let a = Record::new().with("effect_id", "e1").with("type", "infectivity");
        let b = Record::new().with("effect_id", "e1").with("type", "infectivity");
        let c = Record::new().with("effect_id", "e1").with("type", "severity");

        let set: HashSet<Record> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_scalar_ordering_is_total() {
        let mut values = vec![
            Scalar::Text("b".into()),
            Scalar::Int(3),
            Scalar::Null,
            Scalar::Float(1.5),
            Scalar::Int(-1),
            Scalar::Text("a".into()),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::Int(-1),
                Scalar::Int(3),
                Scalar::Float(1.5),
                Scalar::Text("a".into()),
                Scalar::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_loose_matching() {
        assert!(Scalar::Int(42).loosely_matches(&Scalar::Text("42".into())));
        assert!(Scalar::Text("B.1.1.7".into()).loosely_matches(&Scalar::Text("b.1.1.7".into())));
        assert!(Scalar::Float(0.5).loosely_matches(&Scalar::Text("0.50".into())));
        assert!(!Scalar::Text("abc".into()).loosely_matches(&Scalar::Int(1)));
        assert!(!Scalar::Null.loosely_matches(&Scalar::Null));
    }

    #[test]
    fn test_record_from_json() {
        let json = serde_json::json!({"protein_id": "S", "aa_length": 1273, "aa_sequence": null});
        let record = Record::try_from(json).unwrap();
        assert_eq!(record.get("aa_length"), Some(&Scalar::Int(1273)));
        assert_eq!(record.get("aa_sequence"), Some(&Scalar::Null));

        let nested = serde_json::json!({"aliases": ["a"]});
        assert!(Record::try_from(nested).is_err());
    }

    #[test]
    fn test_missing_identifier_is_reported() {
        let record = Record::new().with("citation", "x");
        let err = record.identifier(EntityName::Evidences).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MissingIdentifier { field: "evidence_id", .. }
        ));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let record = Record::new().with("sequence_id", 7i64).with("accession_id", "EPI_1");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"accession_id": "EPI_1", "sequence_id": 7}));
    }
}
