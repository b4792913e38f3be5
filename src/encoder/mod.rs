//! SemQL encoder.
//!
//! Turns one decomposed query into the preorder derivation of the SemQL
//! grammar, plus the literal values its filters compare against.

pub mod grammar;
pub mod predicate;
pub mod wildcard;

#[cfg(test)]
mod tests;

use crate::ast::{SetOperation, Sql};
use crate::config::EncoderConfig;
use crate::error::{SemqlError, SemqlResult};
use crate::schema::Schema;
use crate::token::{self, Token};
use crate::values::{Literal, ValueStore};

pub use grammar::{Clause, ClauseFlags, RootShape};
pub use predicate::filter_choice;
pub use wildcard::resolve_wildcard;

/// `Root1` choice for a query without set operation.
pub const ROOT1_NONE: usize = 3;

fn set_operation_choice(op: SetOperation) -> usize {
    match op {
        SetOperation::Intersect => 0,
        SetOperation::Union => 1,
        SetOperation::Except => 2,
    }
}

/// Read-only metadata shared by a query, its set-operation branches and
/// its nested sub-queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub schema: &'a Schema,
    /// Natural-language question, for diagnostics.
    pub question: &'a str,
    /// Original SQL text, for diagnostics.
    pub query: &'a str,
}

impl<'a> QueryContext<'a> {
    pub fn new(schema: &'a Schema, question: &'a str, query: &'a str) -> Self {
        Self {
            schema,
            question,
            query,
        }
    }
}

/// Output of one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub tokens: Vec<Token>,
    pub values: Vec<Literal>,
}

impl Encoding {
    /// Space-separated token labels.
    pub fn rule_label(&self) -> String {
        token::render(&self.tokens)
    }
}

/// One conversion. Owns the value store, so it is consumed by
/// [`Encoder::encode`].
pub struct Encoder<'a> {
    ctx: QueryContext<'a>,
    max_where_conditions: usize,
    values: ValueStore,
}

impl<'a> Encoder<'a> {
    pub fn new(ctx: QueryContext<'a>, config: &EncoderConfig) -> Self {
        Self {
            ctx,
            max_where_conditions: config.max_where_conditions,
            values: ValueStore::new(),
        }
    }

    /// Encode a top-level query, including one set-operation branch.
    pub fn encode(mut self, sql: &Sql) -> SemqlResult<Encoding> {
        let mut tokens = Vec::new();

        match sql.set_operations().as_slice() {
            [] => {
                push(&mut tokens, Token::Root1(ROOT1_NONE))?;
                self.derive(sql, &mut tokens)?;
            }
            [(op, branch)] => {
                push(&mut tokens, Token::Root1(set_operation_choice(*op)))?;
                self.derive(sql, &mut tokens)?;
                self.derive(branch, &mut tokens)?;
            }
            many => {
                let names: Vec<&str> = many.iter().map(|(op, _)| op.name()).collect();
                return Err(SemqlError::ConflictingSetOperations(names.join(", ")));
            }
        }

        Ok(Encoding {
            tokens,
            values: self.values.into_values(),
        })
    }
}

/// Encode `sql` with a fresh value store.
pub fn encode(sql: &Sql, ctx: QueryContext<'_>, config: &EncoderConfig) -> SemqlResult<Encoding> {
    Encoder::new(ctx, config).encode(sql)
}

/// Append a token after checking its choice range.
pub(crate) fn push(out: &mut Vec<Token>, token: Token) -> SemqlResult<()> {
    out.push(token.checked()?);
    Ok(())
}
