//! Single-condition productions.
//!
//! | Choice | Filter              | Choice | Filter               |
//! |--------|---------------------|--------|----------------------|
//! | 0      | and                 | 10     | not like             |
//! | 1      | or                  | 11     | = (sub-query)        |
//! | 2      | =                   | 12     | < (sub-query)        |
//! | 3      | !=                  | 13     | > (sub-query)        |
//! | 4      | <                   | 14     | != (sub-query)       |
//! | 5      | >                   | 15     | between (sub-query)  |
//! | 6      | <=                  | 16     | >= (sub-query)       |
//! | 7      | >=                  | 17     | <= (sub-query)       |
//! | 8      | between             | 18     | in                   |
//! | 9      | like                | 19     | not in               |

use std::ops::RangeInclusive;

use crate::ast::{Condition, Operand, Operator, Sql};
use crate::error::{SemqlError, SemqlResult};
use crate::token::Token;
use crate::values::Literal;

use super::{Encoder, push};

pub const FILTER_AND: usize = 0;
pub const FILTER_OR: usize = 1;
pub const FILTER_BETWEEN: usize = 8;

/// Filter choices followed by `V` tokens.
pub const VALUE_FILTERS: RangeInclusive<usize> = 2..=10;

/// Map a condition's operator to its `Filter` choice.
///
/// Depends only on the negation flag, the operator and whether the
/// right-hand side is a sub-query.
///
/// `like`, `not like` and `not in` take the same choice with or without a
/// sub-query. Of those, `like` and `not like` land in [`VALUE_FILTERS`] and
/// need a literal, so `Encoder::predicate` rejects them against a
/// sub-query with [`SemqlError::UnsupportedNesting`] rather than storing a
/// query as a value.
pub fn filter_choice(negated: bool, op: Operator, nested: bool) -> SemqlResult<usize> {
    if negated {
        return match op {
            Operator::Like => Ok(10),
            Operator::In => Ok(19),
            other => Err(SemqlError::UnsupportedNegation(other.name())),
        };
    }

    Ok(match (op, nested) {
        (Operator::Eq, false) => 2,
        (Operator::Ne, false) => 3,
        (Operator::Lt, false) => 4,
        (Operator::Gt, false) => 5,
        (Operator::Lte, false) => 6,
        (Operator::Gte, false) => 7,
        (Operator::Between, false) => FILTER_BETWEEN,
        (Operator::Eq, true) => 11,
        (Operator::Lt, true) => 12,
        (Operator::Gt, true) => 13,
        (Operator::Ne, true) => 14,
        (Operator::Between, true) => 15,
        (Operator::Gte, true) => 16,
        (Operator::Lte, true) => 17,
        (Operator::Like, _) => 9,
        (Operator::In, _) => 18,
        (Operator::Not | Operator::Is | Operator::Exists, _) => {
            return Err(SemqlError::UnsupportedOperator(op.name()));
        }
    })
}

impl Encoder<'_> {
    /// `Filter A C T [V [V]] [Root ...]` for one condition of `sql`.
    pub(crate) fn predicate(
        &mut self,
        sql: &Sql,
        condition: &Condition,
        out: &mut Vec<Token>,
    ) -> SemqlResult<()> {
        let nested = condition.nested();
        let choice = filter_choice(condition.negated, condition.op, nested.is_some())?;
        push(out, Token::Filter(choice))?;

        let left = &condition.left.left;
        self.column(sql, left.agg, left, out)?;

        if VALUE_FILTERS.contains(&choice) {
            if nested.is_some() {
                return Err(SemqlError::UnsupportedNesting(condition.op.name()));
            }
            self.value(condition.value.as_ref(), condition, out)?;
            if choice == FILTER_BETWEEN {
                self.value(condition.upper.as_ref(), condition, out)?;
            }
        }

        // the sub-query starts directly at `Root`, without `Root1`
        if let Some(nested) = nested {
            self.derive(nested, out)?;
        }
        Ok(())
    }

    fn value(
        &mut self,
        operand: Option<&Operand>,
        condition: &Condition,
        out: &mut Vec<Token>,
    ) -> SemqlResult<()> {
        let operand = operand.ok_or_else(|| {
            SemqlError::malformed(format!("'{}' condition without a value", condition.op.name()))
        })?;
        let index = self.values.insert(Literal::from_operand(operand)?);
        push(out, Token::V(index))
    }
}
