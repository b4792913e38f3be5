//! # SemQL: Spider SQL to grammar derivations
//!
//! > **Stop training on strings. Train on derivations.**
//!
//! Converts a Spider-decomposed SQL query into the preorder derivation of
//! the SemQL grammar (a flat token sequence) and the literal values its
//! filters compare against.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use semql::prelude::*;
//!
//! let catalog = Catalog::load_from_file("tables.json")?;
//! let schema = catalog.get("concert_singer")?;
//! let ctx = QueryContext::new(schema, "How many singers do we have?", "");
//!
//! let encoding = semql::encode(&sql, ctx, &EncoderConfig::default())?;
//! // => "Root1(3) Root(5) Sel(0) N(0) A(3) C(0) T(1)"
//! println!("{}", encoding.rule_label());
//! ```
//!
//! ## Symbols
//!
//! | Symbol   | Productions | Function                     |
//! |----------|-------------|------------------------------|
//! | `Root1`  | 4           | Set operation or none        |
//! | `Root`   | 6           | Clause combination           |
//! | `Sel`    | 2           | DISTINCT flag                |
//! | `N`      | 5           | Select-list width minus one  |
//! | `A`      | 6           | Aggregator                   |
//! | `C`, `T` | unbounded   | Column and table identity    |
//! | `Sup`    | 2           | LIMIT direction              |
//! | `Filter` | 20          | Connective or condition      |
//! | `Order`  | 2           | ORDER BY direction           |
//! | `V`      | unbounded   | Index into the value list    |

pub mod ast;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod schema;
pub mod token;
pub mod values;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::EncoderConfig;
    pub use crate::encoder::{Encoder, Encoding, QueryContext};
    pub use crate::error::*;
    pub use crate::schema::{Catalog, Schema, TableSchema};
    pub use crate::token::{Symbol, Token};
    pub use crate::values::{Literal, ValueStore};
}

/// Encode one query against its schema.
///
/// # Example
///
/// ```
/// use semql::prelude::*;
///
/// let catalog = Catalog::from_json(
///     r#"[{"db_id": "pets", "table_names": ["pet"],
///          "column_names": [[-1, "*"], [0, "id"]]}]"#,
/// ).unwrap();
/// let sql: Sql = serde_json::from_str(
///     r#"{"select": [false, [[3, [0, [0, 0, false], null]]]],
///         "from": {"table_units": [["table_unit", 0]], "conds": []}}"#,
/// ).unwrap();
///
/// let ctx = QueryContext::new(catalog.get("pets").unwrap(), "", "");
/// let encoding = semql::encode(&sql, ctx, &EncoderConfig::default()).unwrap();
/// assert_eq!(encoding.rule_label(), "Root1(3) Root(5) Sel(0) N(0) A(3) C(0) T(0)");
/// ```
pub fn encode(
    sql: &ast::Sql,
    ctx: encoder::QueryContext<'_>,
    config: &config::EncoderConfig,
) -> error::SemqlResult<encoder::Encoding> {
    encoder::encode(sql, ctx, config)
}
