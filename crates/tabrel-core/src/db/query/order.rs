use crate::db::query::QueryParseError;
use std::fmt;

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

///
/// OrderTerm
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct OrderTerm {
    pub column: String,
    pub direction: OrderDirection,
}

impl OrderTerm {
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parse `"col [ASC|DESC], ..."`.
    pub fn parse_list(expr: &str) -> Result<Vec<Self>, QueryParseError> {
        expr.split(',').map(Self::parse).collect()
    }

    fn parse(term: &str) -> Result<Self, QueryParseError> {
        let mut tokens = term.split_whitespace();
        let Some(column) = tokens.next() else {
            return Err(QueryParseError::Empty);
        };

        let direction = match tokens.next() {
            None => OrderDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => OrderDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => OrderDirection::Desc,
            Some(dir) => {
                return Err(QueryParseError::InvalidDirection {
                    term: term.trim().to_string(),
                    direction: dir.to_string(),
                });
            }
        };

        if tokens.next().is_some() {
            return Err(QueryParseError::Malformed(term.trim().to_string()));
        }

        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }
}

impl fmt::Display for OrderTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            OrderDirection::Asc => write!(f, "{}", self.column),
            OrderDirection::Desc => write!(f, "{} DESC", self.column),
        }
    }
}
