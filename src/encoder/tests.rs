use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use super::*;
use crate::schema::TableSchema;
use crate::token::Symbol;

// tables: 0 stadium, 1 singer, 2 concert
// col_set: 0 *, 1 stadium id, 2 name, 3 capacity, 4 singer id, 5 age,
//          6 country, 7 concert id, 8 year
fn schema() -> Schema {
    let table: TableSchema = serde_json::from_value(json!({
        "db_id": "concert_singer",
        "table_names": ["stadium", "singer", "concert"],
        "column_names": [
            [-1, "*"],
            [0, "stadium id"], [0, "name"], [0, "capacity"],
            [1, "singer id"], [1, "name"], [1, "age"], [1, "country"],
            [2, "concert id"], [2, "stadium id"], [2, "year"]
        ],
        "primary_keys": [1, 4, 8],
        "foreign_keys": [[9, 1]]
    }))
    .unwrap();
    Schema::new(table)
}

const STAR: usize = 0;
const STADIUM_ID: usize = 1;
const STADIUM_NAME: usize = 2;
const SINGER_NAME: usize = 5;
const AGE: usize = 6;
const COUNTRY: usize = 7;
const CONCERT_STADIUM: usize = 9;

fn val(agg: u8, column: usize) -> Value {
    json!([0, [agg, column, false], null])
}

fn cond(op: u8, column: usize, value: Value) -> Value {
    json!([false, op, val(0, column), value, null])
}

fn query(select: &[(u8, usize)], tables: &[usize]) -> Value {
    let items: Vec<Value> = select.iter().map(|(agg, c)| json!([agg, val(0, *c)])).collect();
    let units: Vec<Value> = tables.iter().map(|t| json!(["table_unit", t])).collect();
    json!({
        "select": [false, items],
        "from": {"table_units": units, "conds": []},
        "where": [],
        "groupBy": [],
        "having": [],
        "orderBy": [],
        "limit": null,
        "intersect": null,
        "union": null,
        "except": null
    })
}

fn run_with(q: Value, config: &EncoderConfig) -> SemqlResult<Encoding> {
    let schema = schema();
    let sql: Sql = serde_json::from_value(q).unwrap();
    encode(&sql, QueryContext::new(&schema, "test question", "test query"), config)
}

fn run(q: Value) -> SemqlResult<Encoding> {
    run_with(q, &EncoderConfig::default())
}

fn label(q: Value) -> String {
    run(q).unwrap().rule_label()
}

#[test]
fn test_single_column_select() {
    let encoding = run(query(&[(0, SINGER_NAME)], &[1])).unwrap();
    assert_eq!(
        encoding.tokens,
        vec![
            Token::Root1(3),
            Token::Root(5),
            Token::Sel(0),
            Token::N(0),
            Token::A(0),
            Token::C(2),
            Token::T(1),
        ]
    );
    assert!(encoding.values.is_empty());
}

#[test]
fn test_single_equality_filter() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([cond(2, COUNTRY, json!("\"France\""))]);

    let encoding = run(q).unwrap();
    assert_eq!(
        encoding.rule_label(),
        "Root1(3) Root(3) Sel(0) N(0) A(0) C(2) T(1) Filter(2) A(0) C(6) T(1) V(0)"
    );
    assert_eq!(encoding.values, vec![Literal::Text("France".into())]);
}

#[test]
fn test_intersect_concatenates_both_branches() {
    let mut left = query(&[(0, SINGER_NAME)], &[1]);
    left["where"] = json!([cond(3, AGE, json!(30.0))]);
    let mut right = query(&[(0, SINGER_NAME)], &[1]);
    right["where"] = json!([cond(4, AGE, json!(20.0))]);

    let base = run(left.clone()).unwrap();
    let branch = run(right.clone()).unwrap();

    left["intersect"] = right;
    let encoding = run(left).unwrap();

    assert_eq!(encoding.tokens[0], Token::Root1(0));
    // each standalone run carries its own Root1
    assert_eq!(
        encoding.tokens.len(),
        1 + (base.tokens.len() - 1) + (branch.tokens.len() - 1)
    );
    assert_eq!(
        encoding.rule_label(),
        "Root1(0) \
         Root(3) Sel(0) N(0) A(0) C(2) T(1) Filter(5) A(0) C(5) T(1) V(0) \
         Root(3) Sel(0) N(0) A(0) C(2) T(1) Filter(4) A(0) C(5) T(1) V(1)"
    );
    assert_eq!(
        encoding.values,
        vec![Literal::Number(30.0), Literal::Number(20.0)]
    );
}

#[test]
fn test_union_and_except_choices() {
    for (key, choice) in [("union", 1), ("except", 2)] {
        let mut q = query(&[(0, SINGER_NAME)], &[1]);
        q[key] = query(&[(0, STADIUM_NAME)], &[0]);
        let encoding = run(q).unwrap();
        assert_eq!(encoding.tokens[0], Token::Root1(choice));
        assert_eq!(encoding.tokens.len(), 13);
    }
}

#[test]
fn test_values_are_shared_across_branches() {
    let mut left = query(&[(0, SINGER_NAME)], &[1]);
    left["where"] = json!([cond(2, COUNTRY, json!("\"France\""))]);
    let mut right = query(&[(0, AGE)], &[1]);
    right["where"] = json!([cond(2, COUNTRY, json!("'France'"))]);
    left["union"] = right;

    let encoding = run(left).unwrap();
    let values: Vec<&Token> = encoding
        .tokens
        .iter()
        .filter(|t| t.symbol() == Symbol::V)
        .collect();
    assert_eq!(values, vec![&Token::V(0), &Token::V(0)]);
    assert_eq!(encoding.values.len(), 1);
}

#[test]
fn test_between_emits_two_values_in_order() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([[false, 1, val(0, AGE), 20.0, 30.0]]);

    let encoding = run(q).unwrap();
    assert_eq!(
        encoding.rule_label(),
        "Root1(3) Root(3) Sel(0) N(0) A(0) C(2) T(1) Filter(8) A(0) C(5) T(1) V(0) V(1)"
    );
    assert_eq!(
        encoding.values,
        vec![Literal::Number(20.0), Literal::Number(30.0)]
    );
}

#[test]
fn test_between_without_upper_bound_is_malformed() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([[false, 1, val(0, AGE), 20.0, null]]);
    assert!(matches!(run(q), Err(SemqlError::Malformed(_))));
}

#[test]
fn test_superlative() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["orderBy"] = json!(["desc", [val(0, AGE)]]);
    q["limit"] = json!(1);
    assert_eq!(
        label(q),
        "Root1(3) Root(2) Sel(0) N(0) A(0) C(2) T(1) Sup(0) A(0) C(5) T(1)"
    );
}

#[test]
fn test_superlative_with_filter() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([cond(2, COUNTRY, json!("\"France\""))]);
    q["orderBy"] = json!(["asc", [val(0, AGE)]]);
    q["limit"] = json!(3);
    assert_eq!(
        label(q),
        "Root1(3) Root(0) Sel(0) N(0) A(0) C(2) T(1) \
         Sup(1) A(0) C(5) T(1) \
         Filter(2) A(0) C(6) T(1) V(0)"
    );
}

#[test]
fn test_order_without_limit() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["orderBy"] = json!(["asc", [val(0, AGE)]]);
    assert_eq!(
        label(q.clone()),
        "Root1(3) Root(4) Sel(0) N(0) A(0) C(2) T(1) Order(1) A(0) C(5) T(1)"
    );

    q["where"] = json!([cond(3, AGE, json!(20.0))]);
    assert_eq!(
        label(q),
        "Root1(3) Root(1) Sel(0) N(0) A(0) C(2) T(1) \
         Filter(5) A(0) C(5) T(1) V(0) \
         Order(1) A(0) C(5) T(1)"
    );
}

#[test]
fn test_limit_without_order_is_malformed() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["limit"] = json!(1);
    assert!(matches!(run(q), Err(SemqlError::Malformed(_))));
}

#[test]
fn test_column_distinct_makes_select_distinct() {
    let mut q = query(&[(0, SINGER_NAME), (0, AGE)], &[1]);
    q["select"][1][1][1][1][2] = json!(true);
    assert_eq!(
        label(q),
        "Root1(3) Root(5) Sel(1) N(1) A(0) C(2) T(1) A(0) C(5) T(1)"
    );
}

#[test]
fn test_two_conditions() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([
        cond(3, AGE, json!(20.0)),
        "or",
        cond(2, COUNTRY, json!("\"France\""))
    ]);
    assert_eq!(
        label(q),
        "Root1(3) Root(3) Sel(0) N(0) A(0) C(2) T(1) \
         Filter(1) Filter(5) A(0) C(5) T(1) V(0) Filter(2) A(0) C(6) T(1) V(1)"
    );
}

#[test]
fn test_three_condition_trees() {
    let p1 = cond(3, AGE, json!(20.0));
    let p2 = cond(2, COUNTRY, json!("\"France\""));
    let p3 = cond(2, SINGER_NAME, json!("\"Joe\""));
    let body = |encoding: &Encoding| -> Vec<Token> {
        encoding
            .tokens
            .iter()
            .skip(7)
            .filter(|t| matches!(t.symbol(), Symbol::Filter))
            .copied()
            .collect()
    };

    let cases = [
        ("and", "and", vec![0, 5, 0, 2, 2]),
        ("and", "or", vec![1, 0, 5, 2, 2]),
        ("or", "and", vec![1, 0, 2, 2, 5]),
        ("or", "or", vec![1, 1, 5, 2, 2]),
    ];
    for (c1, c2, expected) in cases {
        let mut q = query(&[(0, SINGER_NAME)], &[1]);
        q["where"] = json!([p1.clone(), c1, p2.clone(), c2, p3.clone()]);
        let encoding = run(q).unwrap();
        let filters: Vec<Token> = expected.into_iter().map(Token::Filter).collect();
        assert_eq!(body(&encoding), filters, "{} / {}", c1, c2);
    }
}

#[test]
fn test_or_and_moves_first_condition_last() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([
        cond(3, AGE, json!(20.0)),
        "or",
        cond(2, COUNTRY, json!("\"France\"")),
        "and",
        cond(2, SINGER_NAME, json!("\"Joe\""))
    ]);
    let encoding = run(q).unwrap();
    // values are stored in emission order
    assert_eq!(
        encoding.values,
        vec![
            Literal::Text("France".into()),
            Literal::Text("Joe".into()),
            Literal::Number(20.0)
        ]
    );
}

#[test]
fn test_where_and_having() {
    let mut q = query(&[(0, COUNTRY), (3, STAR)], &[1]);
    q["where"] = json!([cond(3, AGE, json!(20.0))]);
    q["groupBy"] = json!([[0, COUNTRY, false]]);
    q["having"] = json!([[false, 3, val(3, STAR), 2.0, null]]);
    assert_eq!(
        label(q),
        "Root1(3) Root(3) Sel(0) N(1) A(0) C(6) T(1) A(3) C(0) T(1) \
         Filter(0) Filter(5) A(0) C(5) T(1) V(0) \
         Filter(5) A(3) C(0) T(1) V(1)"
    );
}

#[test]
fn test_having_only() {
    let mut q = query(&[(0, COUNTRY)], &[1]);
    q["groupBy"] = json!([[0, COUNTRY, false]]);
    q["having"] = json!([[false, 3, val(3, STAR), 2.0, null]]);
    assert_eq!(
        label(q),
        "Root1(3) Root(3) Sel(0) N(0) A(0) C(6) T(1) Filter(5) A(3) C(0) T(1) V(0)"
    );
}

#[test]
fn test_nested_comparison() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    let inner = query(&[(5, AGE)], &[1]);
    q["where"] = json!([cond(3, AGE, inner)]);
    let encoding = run(q).unwrap();
    assert_eq!(
        encoding.rule_label(),
        "Root1(3) Root(3) Sel(0) N(0) A(0) C(2) T(1) Filter(13) A(0) C(5) T(1) \
         Root(5) Sel(0) N(0) A(5) C(5) T(1)"
    );
    assert!(encoding.values.is_empty());
}

#[test]
fn test_not_in_sub_query() {
    let mut q = query(&[(0, STADIUM_NAME)], &[0]);
    let inner = query(&[(0, CONCERT_STADIUM)], &[2]);
    q["where"] = json!([[true, 8, val(0, STADIUM_ID), inner, null]]);
    assert_eq!(
        label(q),
        "Root1(3) Root(3) Sel(0) N(0) A(0) C(2) T(0) Filter(19) A(0) C(1) T(0) \
         Root(5) Sel(0) N(0) A(0) C(1) T(2)"
    );
}

#[test]
fn test_nested_values_share_the_store() {
    let mut inner = query(&[(0, AGE)], &[1]);
    inner["where"] = json!([cond(2, COUNTRY, json!("\"France\""))]);
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([
        cond(2, COUNTRY, json!("\"France\"")),
        "and",
        cond(8, AGE, inner)
    ]);
    let encoding = run(q).unwrap();
    assert_eq!(encoding.values, vec![Literal::Text("France".into())]);
    assert_eq!(
        encoding.rule_label(),
        "Root1(3) Root(3) Sel(0) N(0) A(0) C(2) T(1) \
         Filter(0) Filter(2) A(0) C(6) T(1) V(0) Filter(18) A(0) C(5) T(1) \
         Root(3) Sel(0) N(0) A(0) C(5) T(1) Filter(2) A(0) C(6) T(1) V(0)"
    );
}

#[test]
fn test_wildcard_in_join() {
    let mut q = query(&[(3, STAR)], &[0, 2]);
    q["where"] = json!([cond(2, STADIUM_NAME, json!("\"Hampden\""))]);
    assert_eq!(
        label(q),
        "Root1(3) Root(3) Sel(0) N(0) A(3) C(0) T(2) Filter(2) A(0) C(2) T(0) V(0)"
    );
}

#[test]
fn test_wildcard_sort_key_uses_group_by_table() {
    // SELECT singer.name, stadium.id ... GROUP BY singer.name ORDER BY count(*) DESC
    let grouped = || {
        let mut q = query(&[(0, SINGER_NAME), (0, STADIUM_ID)], &[0, 1]);
        q["groupBy"] = json!([[0, SINGER_NAME, false]]);
        q["orderBy"] = json!(["desc", [val(3, STAR)]]);
        q
    };

    let mut superlative = grouped();
    superlative["limit"] = json!(1);
    assert_eq!(
        label(superlative),
        "Root1(3) Root(2) Sel(0) N(1) A(0) C(2) T(1) A(0) C(1) T(0) Sup(0) A(3) C(0) T(1)"
    );

    assert_eq!(
        label(grouped()),
        "Root1(3) Root(4) Sel(0) N(1) A(0) C(2) T(1) A(0) C(1) T(0) Order(0) A(3) C(0) T(1)"
    );
}

#[test]
fn test_too_many_conditions() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    let c = cond(3, AGE, json!(20.0));
    q["where"] = json!([c.clone(), "and", c.clone(), "and", c.clone(), "and", c]);
    assert!(matches!(
        run(q),
        Err(SemqlError::TooManyConditions { count: 4, max: 3 })
    ));
}

#[test]
fn test_configured_condition_limit() {
    let config = EncoderConfig::builder().max_where_conditions(2).build().unwrap();
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    let c = cond(3, AGE, json!(20.0));
    q["where"] = json!([c.clone(), "and", c.clone(), "and", c]);
    assert!(matches!(
        run_with(q, &config),
        Err(SemqlError::TooManyConditions { count: 3, max: 2 })
    ));
}

#[test]
fn test_unsupported_operators_fail() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([[true, 2, val(0, AGE), 20.0, null]]);
    assert!(matches!(run(q), Err(SemqlError::UnsupportedNegation("="))));

    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([cond(11, AGE, query(&[(0, AGE)], &[1]))]);
    assert!(matches!(run(q), Err(SemqlError::UnsupportedOperator("exists"))));

    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([cond(9, COUNTRY, query(&[(0, COUNTRY)], &[1]))]);
    assert!(matches!(run(q), Err(SemqlError::UnsupportedNesting("like"))));

    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["where"] = json!([[true, 9, val(0, COUNTRY), query(&[(0, COUNTRY)], &[1]), null]]);
    assert!(matches!(run(q), Err(SemqlError::UnsupportedNesting("like"))));
}

#[test]
fn test_conflicting_set_operations() {
    let mut q = query(&[(0, SINGER_NAME)], &[1]);
    q["intersect"] = query(&[(0, SINGER_NAME)], &[1]);
    q["except"] = query(&[(0, SINGER_NAME)], &[1]);
    match run(q) {
        Err(SemqlError::ConflictingSetOperations(names)) => {
            assert_eq!(names, "intersect, except");
        }
        other => panic!("expected conflicting set operations, got {:?}", other),
    }
}

#[test]
fn test_six_columns_exceed_the_grammar() {
    let q = query(&[(0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6)], &[0, 1]);
    assert!(matches!(
        run(q),
        Err(SemqlError::ChoiceOutOfRange {
            symbol: Symbol::N,
            choice: 5,
            ..
        })
    ));
}

#[test]
fn test_unknown_column() {
    let q = query(&[(0, 42)], &[1]);
    assert!(matches!(run(q), Err(SemqlError::UnknownColumn(42))));
}
