//! SemQL grammar tokens.
//!
//! A token is one production choice of one grammar symbol. The encoder
//! output is a flat, preorder sequence of these.
//!
//! | Label    | Symbol       | Choices                                  |
//! |----------|--------------|------------------------------------------|
//! | `Root1`  | set operation| intersect, union, except, none           |
//! | `Root`   | clause shape | 6 shapes                                 |
//! | `Sel`    | select flag  | plain, distinct                          |
//! | `N`      | column count | 1..=5 columns                            |
//! | `A`      | aggregator   | none, max, min, count, sum, avg          |
//! | `C`      | column       | column-identity index                    |
//! | `T`      | table        | table index                              |
//! | `Sup`    | superlative  | most, least                              |
//! | `Filter` | filter       | 20 combinators and comparisons           |
//! | `Order`  | order        | desc, asc                                |
//! | `V`      | value        | value-store index                        |

use std::fmt;

use crate::error::{SemqlError, SemqlResult};

/// Grammar symbol of a token, without its choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Root1,
    Root,
    Sel,
    N,
    A,
    C,
    T,
    Sup,
    Filter,
    Order,
    V,
}

impl Symbol {
    /// Every symbol, in grammar order.
    pub const ALL: [Symbol; 11] = [
        Symbol::Root1,
        Symbol::Root,
        Symbol::Sel,
        Symbol::N,
        Symbol::A,
        Symbol::C,
        Symbol::T,
        Symbol::Sup,
        Symbol::Filter,
        Symbol::Order,
        Symbol::V,
    ];

    /// Printable label.
    pub const fn label(self) -> &'static str {
        match self {
            Symbol::Root1 => "Root1",
            Symbol::Root => "Root",
            Symbol::Sel => "Sel",
            Symbol::N => "N",
            Symbol::A => "A",
            Symbol::C => "C",
            Symbol::T => "T",
            Symbol::Sup => "Sup",
            Symbol::Filter => "Filter",
            Symbol::Order => "Order",
            Symbol::V => "V",
        }
    }

    /// Number of productions, or `None` when the choice indexes into the
    /// schema or the value store instead of a fixed enumeration.
    pub const fn productions(self) -> Option<usize> {
        match self {
            Symbol::Root1 => Some(4),
            Symbol::Root => Some(6),
            Symbol::Sel => Some(2),
            Symbol::N => Some(5),
            Symbol::A => Some(6),
            Symbol::Sup => Some(2),
            Symbol::Filter => Some(20),
            Symbol::Order => Some(2),
            Symbol::C | Symbol::T | Symbol::V => None,
        }
    }

    /// Short description used by the grammar reference.
    pub const fn description(self) -> &'static str {
        match self {
            Symbol::Root1 => "set operation: intersect | union | except | none",
            Symbol::Root => "clause shape of one query",
            Symbol::Sel => "select list: plain | distinct",
            Symbol::N => "number of selected columns minus one",
            Symbol::A => "aggregator: none | max | min | count | sum | avg",
            Symbol::C => "column-identity index",
            Symbol::T => "table index",
            Symbol::Sup => "superlative: most | least",
            Symbol::Filter => "filter combinator or comparison",
            Symbol::Order => "order: desc | asc",
            Symbol::V => "value-store index",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One grammar production choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Root1(usize),
    Root(usize),
    Sel(usize),
    N(usize),
    A(usize),
    C(usize),
    T(usize),
    Sup(usize),
    Filter(usize),
    Order(usize),
    V(usize),
}

impl Token {
    pub fn symbol(&self) -> Symbol {
        match self {
            Token::Root1(_) => Symbol::Root1,
            Token::Root(_) => Symbol::Root,
            Token::Sel(_) => Symbol::Sel,
            Token::N(_) => Symbol::N,
            Token::A(_) => Symbol::A,
            Token::C(_) => Symbol::C,
            Token::T(_) => Symbol::T,
            Token::Sup(_) => Symbol::Sup,
            Token::Filter(_) => Symbol::Filter,
            Token::Order(_) => Symbol::Order,
            Token::V(_) => Symbol::V,
        }
    }

    pub fn choice(&self) -> usize {
        match *self {
            Token::Root1(c)
            | Token::Root(c)
            | Token::Sel(c)
            | Token::N(c)
            | Token::A(c)
            | Token::C(c)
            | Token::T(c)
            | Token::Sup(c)
            | Token::Filter(c)
            | Token::Order(c)
            | Token::V(c) => c,
        }
    }

    /// Reject a choice outside its symbol's fixed enumeration.
    pub fn checked(self) -> SemqlResult<Self> {
        match self.symbol().productions() {
            Some(limit) if self.choice() >= limit => Err(SemqlError::ChoiceOutOfRange {
                symbol: self.symbol(),
                choice: self.choice(),
                limit,
            }),
            _ => Ok(self),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.symbol(), self.choice())
    }
}

/// Render a token sequence as space-separated labels.
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
