//! Relational tables: a schema, a tuple sequence, and a pluggable
//! primary-key index, with the classic algebra operators on top.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::error::{Error, PredicateError, Result, SchemaError};
use crate::index::{BpTree, ExtHash, KeyIndex};
use crate::query::{eval_tuple, infix_to_postfix};
use crate::query::postfix::is_comparison;
use crate::types::{Attribute, Key, Schema, Tuple};

/// Counter for naming derived (operator result) tables.
static DERIVED_TABLES: AtomicUsize = AtomicUsize::new(0);

/// Which index structure backs a table's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Ordered B+Tree index.
    BTree,
    /// Extendible hash index with the given initial directory size
    /// (a power of two).
    ExtHash { directory_size: usize },
}

fn make_index(kind: IndexKind) -> Box<dyn KeyIndex<Key, Tuple>> {
    match kind {
        IndexKind::BTree => Box::new(BpTree::new()),
        IndexKind::ExtHash { directory_size } => Box::new(ExtHash::new(directory_size)),
    }
}

/// A relational table.
///
/// Tuples are stored in insertion order; the primary-key index maps each key
/// value to its tuple and serves the equality-based operators (`union`,
/// `minus`, `join`). Operators return new tables and never mutate their
/// inputs; derived tables inherit the receiver's index kind.
pub struct Table {
    name: String,
    schema: Schema,
    tuples: Vec<Tuple>,
    index: Box<dyn KeyIndex<Key, Tuple>>,
    kind: IndexKind,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("tuples", &self.tuples)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Table {
    /// Create an empty table over `schema`, indexed by a B+Tree.
    pub fn new(name: impl Into<String>, schema: Schema) -> Table {
        Table::with_index(name, schema, IndexKind::BTree)
    }

    /// Create an empty table with an explicit index kind.
    pub fn with_index(name: impl Into<String>, schema: Schema, kind: IndexKind) -> Table {
        let name = name.into();
        debug!(table = %name, "create table");
        Table {
            name,
            schema,
            tuples: Vec::new(),
            index: make_index(kind),
            kind,
        }
    }

    /// Create an empty table from whitespace-separated specification strings:
    /// attribute names, domain names, and key column names.
    pub fn create(
        name: impl Into<String>,
        attributes: &str,
        domains: &str,
        key: &str,
    ) -> Result<Table> {
        Ok(Table::new(name, Schema::parse(attributes, domains, key)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The stored tuples, in insertion order.
    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Look up a tuple by its primary-key value.
    pub fn get(&self, key: &Key) -> Option<&Tuple> {
        self.index.get(key)
    }

    /// Insert a tuple. The tuple must match the schema positionally; its
    /// primary-key projection is registered in the index.
    pub fn insert(&mut self, tuple: Tuple) -> Result<()> {
        self.schema.type_check(&tuple).map_err(Error::Schema)?;
        debug!(table = %self.name, "insert tuple");
        let key = self.schema.key_of(&tuple);
        self.index.put(key, tuple.clone());
        self.tuples.push(tuple);
        Ok(())
    }

    /// Select the tuples satisfying `condition` into a new table with the
    /// same schema. An empty condition keeps every tuple.
    pub fn select(&self, condition: &str) -> Result<Table> {
        debug!(table = %self.name, condition, "select");
        let postfix = infix_to_postfix(condition);
        let mut result = self.derived(self.schema.clone());
        for tuple in &self.tuples {
            if eval_tuple(postfix.as_deref(), tuple, &self.schema).map_err(Error::Predicate)? {
                result.insert(tuple.clone())?;
            }
        }
        Ok(result)
    }

    /// Project onto the named attributes. The original key survives when all
    /// of its columns are kept; otherwise the projected attributes become the
    /// key of the result.
    pub fn project(&self, attribute_list: &str) -> Result<Table> {
        debug!(table = %self.name, attributes = attribute_list, "project");
        let names: Vec<&str> = attribute_list.split_whitespace().collect();
        let mut positions = Vec::with_capacity(names.len());
        for name in &names {
            let pos = self
                .schema
                .position(name)
                .ok_or_else(|| SchemaError::UnknownAttribute(name.to_string()))?;
            positions.push(pos);
        }
        let attributes: Vec<Attribute> = positions
            .iter()
            .map(|&i| self.schema.attributes()[i].clone())
            .collect();
        let key_kept = self
            .schema
            .key()
            .iter()
            .all(|k| names.iter().any(|n| n == k));
        let key = if key_kept {
            self.schema.key().to_vec()
        } else {
            names.iter().map(|n| n.to_string()).collect()
        };
        let mut result = self.derived(Schema::new(attributes, key).map_err(Error::Schema)?);
        for tuple in &self.tuples {
            let projected = positions.iter().map(|&i| tuple[i].clone()).collect();
            result.insert(projected)?;
        }
        Ok(result)
    }

    /// Union with a compatible table. A tuple of `other` is skipped when the
    /// result already holds an equal tuple under the same key.
    pub fn union(&self, other: &Table) -> Result<Table> {
        debug!(left = %self.name, right = %other.name, "union");
        if !self.schema.union_compatible(&other.schema) {
            return Err(SchemaError::IncompatibleSchemas.into());
        }
        let mut result = self.derived(self.schema.clone());
        for tuple in &self.tuples {
            result.insert(tuple.clone())?;
        }
        for tuple in &other.tuples {
            let aligned = align(&self.schema, &other.schema, tuple);
            let key = self.schema.key_of(&aligned);
            if result.get(&key) != Some(&aligned) {
                result.insert(aligned)?;
            }
        }
        Ok(result)
    }

    /// Difference with a compatible table: the tuples of `self` for which
    /// `other` does not hold an equal tuple under the same key.
    pub fn minus(&self, other: &Table) -> Result<Table> {
        debug!(left = %self.name, right = %other.name, "minus");
        if !self.schema.union_compatible(&other.schema) {
            return Err(SchemaError::IncompatibleSchemas.into());
        }
        let mut result = self.derived(self.schema.clone());
        for tuple in &self.tuples {
            let probe = probe_key(&self.schema, &other.schema, tuple);
            let held = other
                .get(&probe)
                .map(|found| align(&self.schema, &other.schema, found) == *tuple)
                .unwrap_or(false);
            if !held {
                result.insert(tuple.clone())?;
            }
        }
        Ok(result)
    }

    /// Equi-join with `other` on a single-equality condition such as
    /// `"studio == name"`. Each left tuple pairs with the first matching
    /// right tuple; matching goes through `other`'s primary-key index when
    /// the right-hand column is its key, and scans otherwise.
    ///
    /// A right-hand attribute spelled `s.attr` keeps all of `other`'s columns
    /// and names the join column `s.attr` in the result; without the prefix
    /// the right-hand join column is dropped.
    pub fn join(&self, condition: &str, other: &Table) -> Result<Table> {
        debug!(left = %self.name, right = %other.name, condition, "join");
        let postfix = infix_to_postfix(condition).ok_or_else(|| {
            PredicateError::IllFormed("join requires a condition".to_string())
        })?;
        if postfix.len() != 3 || !is_comparison(&postfix[2]) {
            return Err(PredicateError::IllFormed(
                "join condition must be a single comparison".to_string(),
            )
            .into());
        }
        if postfix[2] != "==" {
            return Err(PredicateError::IllFormed(
                "join condition must use `==`".to_string(),
            )
            .into());
        }
        let left_name = &postfix[0];
        let right_token = &postfix[1];
        // The `s.` prefix qualifies an attribute of the right-hand relation
        // and keeps it (under the qualified name) in the result.
        let (right_name, keep_right) = match right_token.strip_prefix("s.") {
            Some(stripped) => (stripped, true),
            None => (right_token.as_str(), false),
        };
        let left_pos = self
            .schema
            .position(left_name)
            .ok_or_else(|| SchemaError::UnknownAttribute(left_name.clone()))?;
        let right_pos = other
            .schema
            .position(right_name)
            .ok_or_else(|| SchemaError::UnknownAttribute(right_name.to_string()))?;

        let mut attributes: Vec<Attribute> = self.schema.attributes().to_vec();
        for (i, attr) in other.schema.attributes().iter().enumerate() {
            if i == right_pos {
                if keep_right {
                    attributes.push(Attribute::new(right_token.clone(), attr.domain));
                }
            } else {
                attributes.push(attr.clone());
            }
        }
        let schema = Schema::new(attributes, self.schema.key().to_vec()).map_err(Error::Schema)?;
        let mut result = self.derived(schema);

        // FK -> PK joins resolve through the right table's index.
        let indexed = other.schema.key() == [right_name];
        for tuple in &self.tuples {
            let left_val = &tuple[left_pos];
            let matched = if indexed {
                other.get(&Key(vec![left_val.clone()]))
            } else {
                other.tuples.iter().find(|u| u[right_pos] == *left_val)
            };
            if let Some(found) = matched {
                let mut row = tuple.clone();
                for (i, value) in found.iter().enumerate() {
                    if i != right_pos || keep_right {
                        row.push(value.clone());
                    }
                }
                result.insert(row)?;
            }
        }
        Ok(result)
    }

    /// Pack a tuple into this table's fixed-width record form (see
    /// [`crate::encoding`]).
    pub fn pack(&self, tuple: &Tuple) -> Result<Vec<u8>> {
        self.schema.type_check(tuple).map_err(Error::Schema)?;
        Ok(crate::encoding::pack_tuple(&self.schema, tuple))
    }

    /// Reconstruct a tuple from a packed record.
    pub fn unpack(&self, record: &[u8]) -> Result<Tuple> {
        Ok(crate::encoding::unpack_tuple(&self.schema, record)?)
    }

    /// A fresh table for an operator result, named after this table.
    fn derived(&self, schema: Schema) -> Table {
        let serial = DERIVED_TABLES.fetch_add(1, Ordering::Relaxed);
        Table::with_index(format!("{}_{serial}", self.name), schema, self.kind)
    }
}

/// Reorder a tuple of `from`'s attribute order into `to`'s. The schemas must
/// be union-compatible.
fn align(to: &Schema, from: &Schema, tuple: &[crate::types::Value]) -> Tuple {
    to.attributes()
        .iter()
        .map(|attr| {
            let pos = from
                .position(&attr.name)
                .expect("union-compatible schemas share attributes");
            tuple[pos].clone()
        })
        .collect()
}

/// Build the key that `other_schema`'s index expects from a tuple laid out in
/// `schema`'s attribute order.
fn probe_key(schema: &Schema, other_schema: &Schema, tuple: &[crate::types::Value]) -> Key {
    Key(other_schema
        .key()
        .iter()
        .map(|name| {
            let pos = schema
                .position(name)
                .expect("union-compatible schemas share attributes");
            tuple[pos].clone()
        })
        .collect())
}
