//! Decomposed SQL query representation.
//!
//! This module mirrors the Spider `sql` JSON structure: positional arrays
//! for column units, value units and conditions, a map for the clauses.
//! The encoder only reads it.

use serde::{Deserialize, Deserializer, Serialize};

/// Column id of the `*` selector in every Spider schema.
pub const WILDCARD_COLUMN: usize = 0;

/// Aggregation applied to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum Aggregator {
    None,
    Max,
    Min,
    Count,
    Sum,
    Avg,
}

impl Aggregator {
    /// Spider aggregator code, which is also the `A` choice.
    pub fn code(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Aggregator {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Aggregator::None,
            1 => Aggregator::Max,
            2 => Aggregator::Min,
            3 => Aggregator::Count,
            4 => Aggregator::Sum,
            5 => Aggregator::Avg,
            other => return Err(format!("unknown aggregator code {}", other)),
        })
    }
}

/// Comparison operator of a condition (Spider `WHERE_OPS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum Operator {
    Not,
    Between,
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Ne,
    In,
    Like,
    Is,
    Exists,
}

impl Operator {
    /// All operators, in code order.
    pub const ALL: [Operator; 12] = [
        Operator::Not,
        Operator::Between,
        Operator::Eq,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::Ne,
        Operator::In,
        Operator::Like,
        Operator::Is,
        Operator::Exists,
    ];

    /// SQL spelling, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Not => "not",
            Operator::Between => "between",
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Ne => "!=",
            Operator::In => "in",
            Operator::Like => "like",
            Operator::Is => "is",
            Operator::Exists => "exists",
        }
    }
}

impl TryFrom<u8> for Operator {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Operator::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| format!("unknown operator code {}", code))
    }
}

/// `[agg_id, column_id, distinct]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "(Aggregator, usize, bool)", into = "(usize, usize, bool)")]
pub struct ColUnit {
    pub agg: Aggregator,
    pub column: usize,
    pub distinct: bool,
}

impl ColUnit {
    pub fn is_wildcard(&self) -> bool {
        self.column == WILDCARD_COLUMN
    }
}

impl From<(Aggregator, usize, bool)> for ColUnit {
    fn from((agg, column, distinct): (Aggregator, usize, bool)) -> Self {
        Self {
            agg,
            column,
            distinct,
        }
    }
}

impl From<ColUnit> for (usize, usize, bool) {
    fn from(unit: ColUnit) -> Self {
        (unit.agg.code(), unit.column, unit.distinct)
    }
}

/// `[unit_op, col_unit, col_unit | null]`
///
/// Only the left column unit takes part in the encoding; arithmetic
/// between two columns is outside the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(u8, ColUnit, Option<ColUnit>)")]
pub struct ValUnit {
    pub unit_op: u8,
    pub left: ColUnit,
    pub right: Option<ColUnit>,
}

impl From<(u8, ColUnit, Option<ColUnit>)> for ValUnit {
    fn from((unit_op, left, right): (u8, ColUnit, Option<ColUnit>)) -> Self {
        Self {
            unit_op,
            left,
            right,
        }
    }
}

/// One entry of the select list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectItem {
    pub agg: Aggregator,
    pub value: ValUnit,
}

/// `[distinct, [[agg_id, val_unit], ...]]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(bool, Vec<(Aggregator, ValUnit)>)")]
pub struct Select {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
}

impl From<(bool, Vec<(Aggregator, ValUnit)>)> for Select {
    fn from((distinct, items): (bool, Vec<(Aggregator, ValUnit)>)) -> Self {
        Self {
            distinct,
            items: items
                .into_iter()
                .map(|(agg, value)| SelectItem { agg, value })
                .collect(),
        }
    }
}

/// One source of the FROM clause: a table or a sub-query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "(String, serde_json::Value)")]
pub enum TableUnit {
    Table(usize),
    Query(Box<Sql>),
}

impl TryFrom<(String, serde_json::Value)> for TableUnit {
    type Error = String;

    fn try_from((kind, body): (String, serde_json::Value)) -> Result<Self, Self::Error> {
        match kind.as_str() {
            "table_unit" => serde_json::from_value(body)
                .map(TableUnit::Table)
                .map_err(|e| format!("invalid table unit: {}", e)),
            "sql" => serde_json::from_value(body)
                .map(|sql| TableUnit::Query(Box::new(sql)))
                .map_err(|e| format!("invalid sub-query table unit: {}", e)),
            other => Err(format!("unknown table unit kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FromClause {
    pub table_units: Vec<TableUnit>,
}

impl FromClause {
    /// Table ids listed directly in this clause, skipping sub-queries.
    pub fn tables(&self) -> impl Iterator<Item = usize> + '_ {
        self.table_units.iter().filter_map(|unit| match unit {
            TableUnit::Table(id) => Some(*id),
            TableUnit::Query(_) => None,
        })
    }

    /// First table reachable from this clause, descending into sub-query
    /// sources.
    pub fn first_table(&self) -> Option<usize> {
        match self.table_units.first()? {
            TableUnit::Table(id) => Some(*id),
            TableUnit::Query(sql) => sql.from.first_table(),
        }
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Query(Box<Sql>),
    Number(f64),
    Text(String),
    Column(ColUnit),
}

impl Operand {
    pub fn as_query(&self) -> Option<&Sql> {
        match self {
            Operand::Query(sql) => Some(sql),
            _ => None,
        }
    }
}

/// `[not_op, op_id, val_unit, val1, val2]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(bool, Operator, ValUnit, Option<Operand>, Option<Operand>)")]
pub struct Condition {
    pub negated: bool,
    pub op: Operator,
    pub left: ValUnit,
    pub value: Option<Operand>,
    /// Upper bound of a `between`.
    pub upper: Option<Operand>,
}

impl From<(bool, Operator, ValUnit, Option<Operand>, Option<Operand>)> for Condition {
    fn from(
        (negated, op, left, value, upper): (bool, Operator, ValUnit, Option<Operand>, Option<Operand>),
    ) -> Self {
        Self {
            negated,
            op,
            left,
            value,
            upper,
        }
    }
}

impl Condition {
    /// The nested query on the right-hand side, if any.
    pub fn nested(&self) -> Option<&Sql> {
        self.value.as_ref().and_then(Operand::as_query)
    }
}

/// Logical connective between two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connective {
    And,
    Or,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConditionItem {
    Connective(Connective),
    Condition(Condition),
}

/// WHERE / HAVING body: conditions interleaved with connectives.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Vec<ConditionItem>")]
pub struct Conditions {
    conditions: Vec<Condition>,
    connectives: Vec<Connective>,
}

impl Conditions {
    /// Build from parts; `connectives` must be one shorter than
    /// `conditions`.
    pub fn new(conditions: Vec<Condition>, connectives: Vec<Connective>) -> Result<Self, String> {
        if !conditions.is_empty() && connectives.len() + 1 != conditions.len() {
            return Err(format!(
                "{} conditions need {} connectives, found {}",
                conditions.len(),
                conditions.len() - 1,
                connectives.len()
            ));
        }
        if conditions.is_empty() && !connectives.is_empty() {
            return Err("connective without conditions".to_string());
        }
        Ok(Self {
            conditions,
            connectives,
        })
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn connectives(&self) -> &[Connective] {
        &self.connectives
    }
}

impl TryFrom<Vec<ConditionItem>> for Conditions {
    type Error = String;

    fn try_from(items: Vec<ConditionItem>) -> Result<Self, Self::Error> {
        let mut conditions = Vec::new();
        let mut connectives = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            match (i % 2, item) {
                (0, ConditionItem::Condition(c)) => conditions.push(c),
                (1, ConditionItem::Connective(c)) => connectives.push(c),
                (_, ConditionItem::Condition(_)) => {
                    return Err(format!("expected 'and'/'or' at position {}", i));
                }
                (_, ConditionItem::Connective(_)) => {
                    return Err(format!("expected a condition at position {}", i));
                }
            }
        }
        Conditions::new(conditions, connectives)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// `["asc" | "desc", [val_unit, ...]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub direction: SortDirection,
    pub keys: Vec<ValUnit>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOrderBy {
    Clause(SortDirection, Vec<ValUnit>),
    Empty(Vec<serde_json::Value>),
}

fn deserialize_order_by<'de, D>(deserializer: D) -> Result<Option<OrderBy>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawOrderBy>::deserialize(deserializer)? {
        Some(RawOrderBy::Clause(direction, keys)) => Ok(Some(OrderBy { direction, keys })),
        Some(RawOrderBy::Empty(rest)) if rest.is_empty() => Ok(None),
        Some(RawOrderBy::Empty(_)) => Err(serde::de::Error::custom("malformed orderBy clause")),
        None => Ok(None),
    }
}

/// One (sub-)query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sql {
    pub select: Select,
    pub from: FromClause,
    #[serde(rename = "where", default)]
    pub where_clause: Conditions,
    #[serde(default)]
    pub having: Conditions,
    #[serde(rename = "groupBy", default)]
    pub group_by: Vec<ColUnit>,
    #[serde(rename = "orderBy", default, deserialize_with = "deserialize_order_by")]
    pub order_by: Option<OrderBy>,
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default)]
    pub intersect: Option<Box<Sql>>,
    #[serde(default)]
    pub union: Option<Box<Sql>>,
    #[serde(default)]
    pub except: Option<Box<Sql>>,
}

/// Set operation joining two queries at the top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperation {
    Intersect,
    Union,
    Except,
}

impl SetOperation {
    pub fn name(self) -> &'static str {
        match self {
            SetOperation::Intersect => "intersect",
            SetOperation::Union => "union",
            SetOperation::Except => "except",
        }
    }
}

impl Sql {
    /// Present set-operation children, in intersect, union, except order.
    pub fn set_operations(&self) -> Vec<(SetOperation, &Sql)> {
        [
            (SetOperation::Intersect, &self.intersect),
            (SetOperation::Union, &self.union),
            (SetOperation::Except, &self.except),
        ]
        .into_iter()
        .filter_map(|(op, child)| child.as_deref().map(|sql| (op, sql)))
        .collect()
    }
}
