//! Owning table of the `*` column.
//!
//! `*` belongs to no table in the schema, but the grammar still needs a
//! `T` after it. The table is picked with these rules, in order:
//!
//! 1. A single FROM source is the answer (a sub-query source answers with
//!    its own first table).
//! 2. Otherwise take the FROM tables that no concrete selected column and
//!    no WHERE operand refers to. If exactly one is left, it is the answer.
//! 3. If none is left and the query groups, the first GROUP BY column's
//!    table is the answer.
//! 4. Otherwise fall back to the first FROM table and log the ambiguity.

use std::collections::BTreeSet;

use crate::ast::{Sql, TableUnit};
use crate::error::{SemqlError, SemqlResult};

use super::QueryContext;

/// Resolve the table `*` stands for in `sql`.
///
/// Every rule's answer is checked against the schema, so an out-of-range
/// table id is an `UnknownTable` error whichever rule produced it.
pub fn resolve_wildcard(sql: &Sql, ctx: QueryContext<'_>) -> SemqlResult<usize> {
    let table = candidate_table(sql, ctx)?;
    ctx.schema.table(table)
}

fn candidate_table(sql: &Sql, ctx: QueryContext<'_>) -> SemqlResult<usize> {
    let schema = ctx.schema;

    if let [unit] = sql.from.table_units.as_slice() {
        return match unit {
            TableUnit::Table(id) => Ok(*id),
            TableUnit::Query(inner) => first_table(inner),
        };
    }

    let mut candidates: BTreeSet<usize> = sql.from.tables().collect();

    let selected = sql
        .select
        .items
        .iter()
        .map(|item| &item.value.left)
        .filter(|unit| !unit.is_wildcard());
    for unit in selected {
        if let Some(table) = schema.table_of(unit.column)? {
            candidates.remove(&table);
        }
    }
    for condition in sql.where_clause.conditions() {
        if let Some(table) = schema.table_of(condition.left.left.column)? {
            candidates.remove(&table);
        }
    }

    if candidates.len() == 1 {
        if let Some(&table) = candidates.first() {
            return Ok(table);
        }
    }

    if candidates.is_empty() {
        if let Some(group) = sql.group_by.first() {
            if let Some(table) = schema.table_of(group.column)? {
                return Ok(table);
            }
        }
    }

    tracing::warn!(
        question = ctx.question,
        query = ctx.query,
        "Ambiguous table for column *, using the first FROM table"
    );
    first_table(sql)
}

fn first_table(sql: &Sql) -> SemqlResult<usize> {
    sql.from
        .first_table()
        .ok_or_else(|| SemqlError::malformed("FROM clause without a table"))
}
