//! Literal values referenced by `V` tokens.

use std::collections::HashMap;

use serde::Serialize;

use crate::ast::{ColUnit, Operand};
use crate::error::{SemqlError, SemqlResult};

/// A literal compared against in a filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    /// String with its surrounding quotes removed.
    Text(String),
    Number(f64),
    /// Column on the right-hand side of a comparison, kept as-is.
    Column(ColUnit),
}

impl Literal {
    /// Convert a non-nested operand into a literal.
    pub fn from_operand(operand: &Operand) -> SemqlResult<Self> {
        match operand {
            Operand::Text(s) => Ok(Literal::Text(
                s.trim_matches(|c| c == '\'' || c == '"').to_string(),
            )),
            Operand::Number(n) => Ok(Literal::Number(*n)),
            Operand::Column(unit) => Ok(Literal::Column(*unit)),
            Operand::Query(_) => Err(SemqlError::malformed(
                "a nested query is not a literal value",
            )),
        }
    }

    fn key(&self) -> LiteralKey {
        match self {
            Literal::Text(s) => LiteralKey::Text(s.clone()),
            // -0.0 and 0.0 compare equal
            Literal::Number(n) if *n == 0.0 => LiteralKey::Number(0.0f64.to_bits()),
            Literal::Number(n) => LiteralKey::Number(n.to_bits()),
            Literal::Column(unit) => LiteralKey::Column(*unit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LiteralKey {
    Text(String),
    Number(u64),
    Column(ColUnit),
}

/// Ordered, deduplicating list of literals.
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    values: Vec<Literal>,
    positions: HashMap<LiteralKey, usize>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `literal`, appending it if it has not been seen.
    pub fn insert(&mut self, literal: Literal) -> usize {
        let key = literal.key();
        if let Some(&index) = self.positions.get(&key) {
            return index;
        }
        let index = self.values.len();
        self.values.push(literal);
        self.positions.insert(key, index);
        index
    }

    /// Finalize into the insertion-ordered literal list.
    pub fn into_values(self) -> Vec<Literal> {
        self.values
    }
}
