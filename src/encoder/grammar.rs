//! Clause-level productions: root shape, select list, superlative,
//! filter and order.

use crate::ast::{Aggregator, ColUnit, Condition, Connective, SortDirection, Sql};
use crate::error::{SemqlError, SemqlResult};
use crate::token::Token;

use super::predicate::{FILTER_AND, FILTER_OR};
use super::{Encoder, push};

/// Clause-presence flags that select the root shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClauseFlags {
    /// LIMIT present; its ORDER BY is folded into the superlative.
    pub superlative: bool,
    /// ORDER BY present without LIMIT.
    pub order: bool,
    /// WHERE or HAVING present.
    pub filter: bool,
}

impl ClauseFlags {
    pub fn of(sql: &Sql) -> Self {
        let superlative = sql.limit.is_some();
        Self {
            superlative,
            order: sql.order_by.is_some() && !superlative,
            filter: !sql.where_clause.is_empty() || !sql.having.is_empty(),
        }
    }
}

/// Clause produced after the root-shape token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Select,
    Superlative,
    Filter,
    Order,
}

/// `Root` production: its choice and the clauses it expands to, in
/// emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootShape {
    pub choice: usize,
    pub clauses: &'static [Clause],
}

impl RootShape {
    pub fn from_flags(flags: ClauseFlags) -> Self {
        use Clause::*;

        let (choice, clauses): (usize, &'static [Clause]) = match flags {
            ClauseFlags {
                filter: true,
                superlative: true,
                ..
            } => (0, &[Select, Superlative, Filter]),
            ClauseFlags {
                filter: true,
                order: true,
                ..
            } => (1, &[Select, Filter, Order]),
            ClauseFlags {
                superlative: true, ..
            } => (2, &[Select, Superlative]),
            ClauseFlags { filter: true, .. } => (3, &[Select, Filter]),
            ClauseFlags { order: true, .. } => (4, &[Select, Order]),
            _ => (5, &[Select]),
        };
        Self { choice, clauses }
    }

    pub fn of(sql: &Sql) -> Self {
        Self::from_flags(ClauseFlags::of(sql))
    }
}

/// One step of a preorder filter tree.
enum Step<'q> {
    Op(usize),
    Pred(&'q Condition),
}

fn connective_choice(connective: Connective) -> usize {
    match connective {
        Connective::And => FILTER_AND,
        Connective::Or => FILTER_OR,
    }
}

fn direction_choice(direction: SortDirection) -> usize {
    match direction {
        SortDirection::Desc => 0,
        SortDirection::Asc => 1,
    }
}

impl Encoder<'_> {
    /// Expand `Root` for one query. Set operations of `sql` are not
    /// looked at here.
    pub(crate) fn derive(&mut self, sql: &Sql, out: &mut Vec<Token>) -> SemqlResult<()> {
        let shape = RootShape::of(sql);
        push(out, Token::Root(shape.choice))?;

        for clause in shape.clauses {
            match clause {
                Clause::Select => self.select(sql, out)?,
                Clause::Superlative => self.superlative(sql, out)?,
                Clause::Filter => self.filter(sql, out)?,
                Clause::Order => self.order(sql, out)?,
            }
        }
        Ok(())
    }

    fn select(&self, sql: &Sql, out: &mut Vec<Token>) -> SemqlResult<()> {
        let items = &sql.select.items;
        if items.is_empty() {
            return Err(SemqlError::malformed("empty select list"));
        }

        // per-column DISTINCT is folded into the whole select list
        let distinct = sql.select.distinct || items.iter().any(|i| i.value.left.distinct);
        push(out, Token::Sel(usize::from(distinct)))?;
        push(out, Token::N(items.len() - 1))?;

        for item in items {
            self.column(sql, item.agg, &item.value.left, out)?;
        }
        Ok(())
    }

    fn superlative(&self, sql: &Sql, out: &mut Vec<Token>) -> SemqlResult<()> {
        let (direction, key) = sort_key(sql)?;
        push(out, Token::Sup(direction_choice(direction)))?;
        self.column(sql, key.agg, key, out)
    }

    fn order(&self, sql: &Sql, out: &mut Vec<Token>) -> SemqlResult<()> {
        let (direction, key) = sort_key(sql)?;
        push(out, Token::Order(direction_choice(direction)))?;
        self.column(sql, key.agg, key, out)
    }

    fn filter(&mut self, sql: &Sql, out: &mut Vec<Token>) -> SemqlResult<()> {
        let conditions = sql.where_clause.conditions();
        let connectives = sql.where_clause.connectives();
        if conditions.len() > self.max_where_conditions {
            return Err(SemqlError::TooManyConditions {
                count: conditions.len(),
                max: self.max_where_conditions,
            });
        }

        if !sql.where_clause.is_empty() && !sql.having.is_empty() {
            push(out, Token::Filter(FILTER_AND))?;
        }

        match (conditions, connectives) {
            ([], []) => {}
            ([p], []) => self.predicate(sql, p, out)?,
            ([p1, p2], [c]) => {
                push(out, Token::Filter(connective_choice(*c)))?;
                self.predicate(sql, p1, out)?;
                self.predicate(sql, p2, out)?;
            }
            ([p1, p2, p3], [c1, c2]) => {
                use Step::{Op, Pred};

                // AND binds tighter than OR; a mixed triple groups its AND pair
                let steps = match (c1, c2) {
                    (Connective::And, Connective::And) => {
                        [Op(FILTER_AND), Pred(p1), Op(FILTER_AND), Pred(p2), Pred(p3)]
                    }
                    (Connective::And, Connective::Or) => {
                        [Op(FILTER_OR), Op(FILTER_AND), Pred(p1), Pred(p2), Pred(p3)]
                    }
                    (Connective::Or, Connective::And) => {
                        [Op(FILTER_OR), Op(FILTER_AND), Pred(p2), Pred(p3), Pred(p1)]
                    }
                    (Connective::Or, Connective::Or) => {
                        [Op(FILTER_OR), Op(FILTER_OR), Pred(p1), Pred(p2), Pred(p3)]
                    }
                };
                for step in steps {
                    match step {
                        Op(choice) => push(out, Token::Filter(choice))?,
                        Pred(p) => self.predicate(sql, p, out)?,
                    }
                }
            }
            (conditions, connectives) => {
                return Err(SemqlError::malformed(format!(
                    "{} WHERE conditions with {} connectives",
                    conditions.len(),
                    connectives.len()
                )));
            }
        }

        self.having(sql, out)
    }

    fn having(&mut self, sql: &Sql, out: &mut Vec<Token>) -> SemqlResult<()> {
        let having = sql.having.conditions();
        if let Some(first) = having.first() {
            if having.len() > 1 {
                tracing::debug!(
                    "Encoding only the first of {} HAVING conditions: {}",
                    having.len(),
                    self.ctx.question
                );
            }
            self.predicate(sql, first, out)?;
        }
        Ok(())
    }

    /// `A C T` for one column operand.
    pub(crate) fn column(
        &self,
        sql: &Sql,
        agg: Aggregator,
        unit: &ColUnit,
        out: &mut Vec<Token>,
    ) -> SemqlResult<()> {
        let schema = self.ctx.schema;
        push(out, Token::A(agg.code()))?;
        push(out, Token::C(schema.column_identity(unit.column)?))?;
        let table = if unit.is_wildcard() {
            super::resolve_wildcard(sql, self.ctx)?
        } else {
            schema.owning_table(unit.column)?
        };
        push(out, Token::T(table))
    }
}

fn sort_key(sql: &Sql) -> SemqlResult<(SortDirection, &ColUnit)> {
    let order = sql
        .order_by
        .as_ref()
        .ok_or_else(|| SemqlError::malformed("LIMIT without ORDER BY"))?;
    let key = order
        .keys
        .first()
        .ok_or_else(|| SemqlError::malformed("ORDER BY without a sort key"))?;
    Ok((order.direction, &key.left))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(superlative: bool, order: bool, filter: bool) -> ClauseFlags {
        ClauseFlags {
            superlative,
            order,
            filter,
        }
    }

    #[test]
    fn test_root_shape_table() {
        use Clause::*;

        let cases: [(ClauseFlags, usize, &[Clause]); 6] = [
            (flags(true, false, true), 0, &[Select, Superlative, Filter]),
            (flags(false, true, true), 1, &[Select, Filter, Order]),
            (flags(true, false, false), 2, &[Select, Superlative]),
            (flags(false, false, true), 3, &[Select, Filter]),
            (flags(false, true, false), 4, &[Select, Order]),
            (flags(false, false, false), 5, &[Select]),
        ];
        for (input, choice, clauses) in cases {
            let shape = RootShape::from_flags(input);
            assert_eq!(shape.choice, choice, "{:?}", input);
            assert_eq!(shape.clauses, clauses, "{:?}", input);
        }
    }

    #[test]
    fn test_select_always_first() {
        for bits in 0..8u8 {
            let input = flags(bits & 1 != 0, bits & 2 != 0 && bits & 1 == 0, bits & 4 != 0);
            let shape = RootShape::from_flags(input);
            assert_eq!(shape.clauses.first(), Some(&Clause::Select));
        }
    }
}
