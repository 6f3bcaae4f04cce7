//! Core types: attribute domains, typed values, keys, tuples, and schemas.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// The domain (attribute type) of a column.
///
/// Each domain has a fixed byte width in the record codec: integers are
/// big-endian, floats are IEEE-754 bit patterns in little-endian byte order,
/// `Char` is a single byte, and `Str` is a 64-byte NUL-padded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Char,
    Str,
}

impl Domain {
    /// The number of bytes this domain occupies in a packed record.
    pub fn byte_width(self) -> usize {
        match self {
            Domain::I8 => 1,
            Domain::I16 => 2,
            Domain::I32 => 4,
            Domain::I64 => 8,
            Domain::F32 => 4,
            Domain::F64 => 8,
            Domain::Char => 1,
            Domain::Str => crate::encoding::STR_FIELD_LEN,
        }
    }

    /// Parse a literal token into a value of this domain.
    ///
    /// Returns `None` when the token does not denote a value of the domain
    /// (e.g., `"abc"` parsed as `I32`). String literals arrive with their
    /// quotes already stripped by the tokenizer.
    pub fn parse(self, token: &str) -> Option<Value> {
        match self {
            Domain::I8 => token.parse().ok().map(Value::I8),
            Domain::I16 => token.parse().ok().map(Value::I16),
            Domain::I32 => token.parse().ok().map(Value::I32),
            Domain::I64 => token.parse().ok().map(Value::I64),
            Domain::F32 => token.parse().ok().map(Value::F32),
            Domain::F64 => token.parse().ok().map(Value::F64),
            Domain::Char => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            Domain::Str => Some(Value::Str(token.to_string())),
        }
    }

    /// Resolve a domain from its lowercase name (`"i32"`, `"str"`, ...).
    /// Used by the string-specification table constructor.
    pub fn from_name(name: &str) -> Result<Domain, SchemaError> {
        match name {
            "i8" => Ok(Domain::I8),
            "i16" => Ok(Domain::I16),
            "i32" => Ok(Domain::I32),
            "i64" => Ok(Domain::I64),
            "f32" => Ok(Domain::F32),
            "f64" => Ok(Domain::F64),
            "char" => Ok(Domain::Char),
            "str" => Ok(Domain::Str),
            other => Err(SchemaError::UnknownDomain(other.to_string())),
        }
    }
}

/// A single attribute value.
///
/// Values are totally ordered within a domain. Floats use the IEEE-754 total
/// order (`total_cmp`) so that values are `Ord`, `Eq`, and `Hash` and can
/// serve as keys in both index kinds. Values of different domains order by
/// domain tag; this case is never reached through the public API, since every
/// key of a table is projected from one schema and predicate literals are
/// parsed with the compared attribute's domain.
#[derive(Debug, Clone)]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
}

impl Value {
    /// The domain this value belongs to.
    pub fn domain(&self) -> Domain {
        match self {
            Value::I8(_) => Domain::I8,
            Value::I16(_) => Domain::I16,
            Value::I32(_) => Domain::I32,
            Value::I64(_) => Domain::I64,
            Value::F32(_) => Domain::F32,
            Value::F64(_) => Domain::F64,
            Value::Char(_) => Domain::Char,
            Value::Str(_) => Domain::Str,
        }
    }

    fn domain_rank(&self) -> u8 {
        match self {
            Value::I8(_) => 0,
            Value::I16(_) => 1,
            Value::I32(_) => 2,
            Value::I64(_) => 3,
            Value::F32(_) => 4,
            Value::F64(_) => 5,
            Value::Char(_) => 6,
            Value::Str(_) => 7,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::I8(a), Value::I8(b)) => a.cmp(b),
            (Value::I16(a), Value::I16(b)) => a.cmp(b),
            (Value::I32(a), Value::I32(b)) => a.cmp(b),
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::F32(a), Value::F32(b)) => a.total_cmp(b),
            (Value::F64(a), Value::F64(b)) => a.total_cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => self.domain_rank().cmp(&other.domain_rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.domain_rank());
        match self {
            Value::I8(v) => v.hash(state),
            Value::I16(v) => v.hash(state),
            Value::I32(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            // Bit patterns, consistent with the total-order Eq above.
            Value::F32(v) => v.to_bits().hash(state),
            Value::F64(v) => v.to_bits().hash(state),
            Value::Char(v) => v.hash(state),
            Value::Str(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Value {
        Value::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Value {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::F64(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Value {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(v)
    }
}

/// A tuple: positionally aligned attribute values matching a schema.
pub type Tuple = Vec<Value>;

/// The projection of a tuple onto the primary-key columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(pub Vec<Value>);

/// An attribute definition (name + domain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub domain: Domain,
}

impl Attribute {
    pub fn new(name: impl Into<String>, domain: Domain) -> Attribute {
        Attribute {
            name: name.into(),
            domain,
        }
    }
}

/// An ordered attribute list plus the primary-key columns.
///
/// Attribute names are unique within a schema; the key is a non-empty subset
/// of the attribute names. Key column positions are resolved once at
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    attributes: Vec<Attribute>,
    key: Vec<String>,
    key_positions: Vec<usize>,
}

impl Schema {
    /// Build a schema from typed attribute definitions and key column names.
    pub fn new(attributes: Vec<Attribute>, key: Vec<String>) -> Result<Schema, SchemaError> {
        for (i, attr) in attributes.iter().enumerate() {
            if attributes[..i].iter().any(|a| a.name == attr.name) {
                return Err(SchemaError::DuplicateAttribute(attr.name.clone()));
            }
        }
        if key.is_empty() {
            return Err(SchemaError::EmptyKey);
        }
        let mut key_positions = Vec::with_capacity(key.len());
        for name in &key {
            let pos = attributes
                .iter()
                .position(|a| &a.name == name)
                .ok_or_else(|| SchemaError::UnknownAttribute(name.clone()))?;
            key_positions.push(pos);
        }
        Ok(Schema {
            attributes,
            key,
            key_positions,
        })
    }

    /// Build a schema from whitespace-separated specification strings, e.g.
    /// `Schema::parse("title year length", "str i32 i32", "title year")`.
    pub fn parse(attributes: &str, domains: &str, key: &str) -> Result<Schema, SchemaError> {
        let names: Vec<&str> = attributes.split_whitespace().collect();
        let doms: Vec<&str> = domains.split_whitespace().collect();
        if names.len() != doms.len() {
            return Err(SchemaError::ArityMismatch {
                expected: names.len(),
                actual: doms.len(),
            });
        }
        let attrs = names
            .iter()
            .zip(&doms)
            .map(|(n, d)| Ok(Attribute::new(*n, Domain::from_name(d)?)))
            .collect::<Result<Vec<_>, SchemaError>>()?;
        let key = key.split_whitespace().map(str::to_string).collect();
        Schema::new(attrs, key)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn key(&self) -> &[String] {
        &self.key
    }

    pub fn key_positions(&self) -> &[usize] {
        &self.key_positions
    }

    /// The number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The column position of the named attribute, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// The domain of the named attribute, if present.
    pub fn domain_of(&self, name: &str) -> Option<Domain> {
        self.position(name).map(|i| self.attributes[i].domain)
    }

    /// Check a tuple's arity and positional domains against this schema.
    pub fn type_check(&self, tuple: &[Value]) -> Result<(), SchemaError> {
        if tuple.len() != self.attributes.len() {
            return Err(SchemaError::ArityMismatch {
                expected: self.attributes.len(),
                actual: tuple.len(),
            });
        }
        for (i, (value, attr)) in tuple.iter().zip(&self.attributes).enumerate() {
            if value.domain() != attr.domain {
                return Err(SchemaError::DomainMismatch {
                    column: i,
                    expected: attr.domain,
                    actual: value.domain(),
                });
            }
        }
        Ok(())
    }

    /// Project a tuple onto the primary-key columns.
    ///
    /// The tuple must already have passed [`type_check`](Self::type_check).
    pub fn key_of(&self, tuple: &[Value]) -> Key {
        Key(self
            .key_positions
            .iter()
            .map(|&i| tuple[i].clone())
            .collect())
    }

    /// The number of bytes a packed record of this schema occupies.
    pub fn record_size(&self) -> usize {
        self.attributes.iter().map(|a| a.domain.byte_width()).sum()
    }

    /// Whether `other` has the same attributes (name and domain, order-
    /// independent) as `self`. Required by `union` and `minus`.
    pub fn union_compatible(&self, other: &Schema) -> bool {
        self.attributes.len() == other.attributes.len()
            && self.attributes.iter().all(|a| {
                other
                    .attributes
                    .iter()
                    .any(|b| a.name == b.name && a.domain == b.domain)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_schema() -> Schema {
        Schema::parse(
            "title year length genre rating",
            "str i32 i32 char f64",
            "title year",
        )
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // Domains
    // -----------------------------------------------------------------------

    #[test]
    fn test_domain_byte_widths() {
        assert_eq!(Domain::I8.byte_width(), 1);
        assert_eq!(Domain::I16.byte_width(), 2);
        assert_eq!(Domain::I32.byte_width(), 4);
        assert_eq!(Domain::I64.byte_width(), 8);
        assert_eq!(Domain::F32.byte_width(), 4);
        assert_eq!(Domain::F64.byte_width(), 8);
        assert_eq!(Domain::Char.byte_width(), 1);
        assert_eq!(Domain::Str.byte_width(), 64);
    }

    #[test]
    fn test_domain_parse_integers() {
        assert_eq!(Domain::I32.parse("1979"), Some(Value::I32(1979)));
        assert_eq!(Domain::I64.parse("-7"), Some(Value::I64(-7)));
        assert_eq!(Domain::I8.parse("200"), None);
        assert_eq!(Domain::I32.parse("abc"), None);
        assert_eq!(Domain::I32.parse("1.5"), None);
    }

    #[test]
    fn test_domain_parse_reals_and_text() {
        assert_eq!(Domain::F64.parse("3.25"), Some(Value::F64(3.25)));
        assert_eq!(Domain::F32.parse("-0.5"), Some(Value::F32(-0.5)));
        assert_eq!(Domain::F64.parse("year"), None);
        assert_eq!(Domain::Char.parse("T"), Some(Value::Char('T')));
        assert_eq!(Domain::Char.parse("TT"), None);
        assert_eq!(Domain::Char.parse(""), None);
        assert_eq!(
            Domain::Str.parse("Star_Wars"),
            Some(Value::Str("Star_Wars".to_string()))
        );
    }

    #[test]
    fn test_domain_from_name() {
        assert_eq!(Domain::from_name("i32").unwrap(), Domain::I32);
        assert_eq!(Domain::from_name("str").unwrap(), Domain::Str);
        assert!(matches!(
            Domain::from_name("varchar"),
            Err(SchemaError::UnknownDomain(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Values and keys
    // -----------------------------------------------------------------------

    #[test]
    fn test_value_ordering_within_domain() {
        assert!(Value::I32(3) < Value::I32(5));
        assert!(Value::Str("abc".into()) < Value::Str("abd".into()));
        assert!(Value::F64(-1.5) < Value::F64(0.25));
        // IEEE total order distinguishes the zero signs.
        assert!(Value::F64(-0.0) < Value::F64(0.0));
    }

    #[test]
    fn test_value_equality_is_natural_per_domain() {
        assert_eq!(Value::I32(42), Value::I32(42));
        assert_ne!(Value::I32(42), Value::I32(43));
        assert_eq!(Value::Char('x'), Value::Char('x'));
        assert_ne!(Value::F32(1.0), Value::F32(2.0));
    }

    #[test]
    fn test_key_ordering_is_lexicographic() {
        let a = Key(vec![Value::Str("A".into()), Value::I32(2000)]);
        let b = Key(vec![Value::Str("A".into()), Value::I32(2001)]);
        let c = Key(vec![Value::Str("B".into()), Value::I32(1900)]);
        assert!(a < b);
        assert!(b < c);
    }

    // -----------------------------------------------------------------------
    // Schemas
    // -----------------------------------------------------------------------

    #[test]
    fn test_schema_parse_and_lookup() {
        let schema = movie_schema();
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.position("year"), Some(1));
        assert_eq!(schema.domain_of("rating"), Some(Domain::F64));
        assert_eq!(schema.domain_of("missing"), None);
        assert_eq!(schema.key(), &["title", "year"]);
        assert_eq!(schema.key_positions(), &[0, 1]);
    }

    #[test]
    fn test_schema_rejects_duplicate_attribute() {
        let err = Schema::parse("a a", "i32 i32", "a").unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateAttribute(_)));
    }

    #[test]
    fn test_schema_rejects_empty_key() {
        let err = Schema::parse("a b", "i32 i32", "").unwrap_err();
        assert_eq!(err, SchemaError::EmptyKey);
    }

    #[test]
    fn test_schema_rejects_unknown_key_attribute() {
        let err = Schema::parse("a b", "i32 i32", "c").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownAttribute(_)));
    }

    #[test]
    fn test_type_check_accepts_matching_tuple() {
        let schema = movie_schema();
        let tup = vec![
            Value::from("Star_Wars"),
            Value::I32(1977),
            Value::I32(124),
            Value::Char('T'),
            Value::F64(8.5),
        ];
        assert!(schema.type_check(&tup).is_ok());
    }

    #[test]
    fn test_type_check_rejects_wrong_domain() {
        let schema = movie_schema();
        let tup = vec![
            Value::from("Star_Wars"),
            Value::I64(1977),
            Value::I32(124),
            Value::Char('T'),
            Value::F64(8.5),
        ];
        let err = schema.type_check(&tup).unwrap_err();
        assert!(matches!(err, SchemaError::DomainMismatch { column: 1, .. }));
    }

    #[test]
    fn test_type_check_rejects_wrong_arity() {
        let schema = movie_schema();
        let err = schema.type_check(&[Value::I32(1)]).unwrap_err();
        assert!(matches!(err, SchemaError::ArityMismatch { .. }));
    }

    #[test]
    fn test_key_of_projects_key_columns() {
        let schema = movie_schema();
        let tup = vec![
            Value::from("Star_Wars"),
            Value::I32(1977),
            Value::I32(124),
            Value::Char('T'),
            Value::F64(8.5),
        ];
        let key = schema.key_of(&tup);
        assert_eq!(key, Key(vec![Value::from("Star_Wars"), Value::I32(1977)]));
    }

    #[test]
    fn test_record_size_sums_widths() {
        // 64 + 4 + 4 + 1 + 8
        assert_eq!(movie_schema().record_size(), 81);
    }

    #[test]
    fn test_union_compatibility_is_order_independent() {
        let a = Schema::parse("x y", "i32 str", "x").unwrap();
        let b = Schema::parse("y x", "str i32", "y").unwrap();
        let c = Schema::parse("x y", "i64 str", "x").unwrap();
        assert!(a.union_compatible(&b));
        assert!(!a.union_compatible(&c));
    }

    #[test]
    fn test_schema_serde_roundtrip() {
        let schema = movie_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
    }
}
