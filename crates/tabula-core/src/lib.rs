//! # Tabula
//!
//! An in-memory relational table engine with pluggable ordered and hashed
//! indexes, written as a compact database core.
//!
//! Tabula provides typed relations (schemas with attribute domains and a
//! primary key), tuple storage with a byte-level record codec, the classic
//! relational algebra operators (project, select, union, minus, join,
//! insert), and two index structures behind one narrow interface: a B+Tree
//! for ordered and range access, and an extendible hash table for point
//! access.
//!
//! ## Quick Start
//!
//! ```
//! use tabula_core::table::Table;
//! use tabula_core::types::Value;
//!
//! // Create a table: attribute names, domains, primary key.
//! let mut movies = Table::create(
//!     "movie",
//!     "title year length studio",
//!     "str i32 i32 str",
//!     "title",
//! )
//! .unwrap();
//!
//! // Insert a tuple.
//! movies
//!     .insert(vec![
//!         Value::from("Star_Wars"),
//!         Value::I32(1977),
//!         Value::I32(124),
//!         Value::from("Fox"),
//!     ])
//!     .unwrap();
//!
//! // Select with an infix condition.
//! let seventies = movies.select("1969 < year & year < 1980").unwrap();
//! assert_eq!(seventies.len(), 1);
//! ```
//!
//! The index structures are also usable on their own:
//!
//! ```
//! use tabula_core::index::BpTree;
//!
//! let mut tree = BpTree::new();
//! for k in (1..30).step_by(2) {
//!     tree.put(k, k * k);
//! }
//! assert_eq!(tree.get(&17), Some(&289));
//! let view = tree.sub_map(6, 20).unwrap();
//! assert_eq!(view.first_key().unwrap(), &7);
//! assert_eq!(view.size(), 7);
//! ```

pub mod encoding;
pub mod error;
pub mod index;
pub mod query;
pub mod table;
pub mod types;
