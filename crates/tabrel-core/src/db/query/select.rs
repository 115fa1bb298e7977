use crate::db::query::QueryParseError;
use std::fmt;

///
/// AggregateFunction
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFunction {
    fn from_name(name: &str) -> Result<Self, QueryParseError> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Ok(Self::Count),
            "SUM" => Ok(Self::Sum),
            "MIN" => Ok(Self::Min),
            "MAX" => Ok(Self::Max),
            "AVG" => Ok(Self::Avg),
            _ => Err(QueryParseError::UnknownFunction(name.to_string())),
        }
    }

    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Avg => "AVG",
        }
    }
}

///
/// AggregateExpr
///
/// One aggregate call; `column == None` is the `COUNT(*)` form.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct AggregateExpr {
    pub function: AggregateFunction,
    pub column: Option<String>,
}

impl AggregateExpr {
    #[must_use]
    pub const fn count_all() -> Self {
        Self {
            function: AggregateFunction::Count,
            column: None,
        }
    }

    #[must_use]
    pub fn of(function: AggregateFunction, column: impl Into<String>) -> Self {
        Self {
            function,
            column: Some(column.into()),
        }
    }

    /// Parse `FUNC(column)` or `COUNT(*)`, case-insensitive on the function.
    pub fn parse(expr: &str) -> Result<Self, QueryParseError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(QueryParseError::Empty);
        }

        let Some(open) = expr.find('(') else {
            return Err(QueryParseError::NotAggregate(expr.to_string()));
        };
        if !expr.ends_with(')') {
            return Err(QueryParseError::Malformed(expr.to_string()));
        }

        let function = AggregateFunction::from_name(expr[..open].trim())?;
        let argument = expr[open + 1..expr.len() - 1].trim();

        let column = match argument {
            "*" if function == AggregateFunction::Count => None,
            "" | "*" => return Err(QueryParseError::Malformed(expr.to_string())),
            arg if !is_identifier(arg) => {
                return Err(QueryParseError::Malformed(expr.to_string()));
            }
            arg => Some(arg.to_string()),
        };

        Ok(Self { function, column })
    }
}

impl fmt::Display for AggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "{}({column})", self.function.as_sql()),
            None => write!(f, "{}(*)", self.function.as_sql()),
        }
    }
}

///
/// SelectItem
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SelectItem {
    Column(String),
    Aggregate(AggregateExpr),
}

impl SelectItem {
    pub fn parse(expr: &str) -> Result<Self, QueryParseError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(QueryParseError::Empty);
        }

        if expr.contains('(') {
            return AggregateExpr::parse(expr).map(Self::Aggregate);
        }
        if !is_identifier(expr) {
            return Err(QueryParseError::Malformed(expr.to_string()));
        }

        Ok(Self::Column(expr.to_string()))
    }

    /// Parse a comma-separated select list.
    pub fn parse_list(columns: &str) -> Result<Vec<Self>, QueryParseError> {
        split_top_level(columns)
            .into_iter()
            .map(Self::parse)
            .collect()
    }

    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate(_))
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(column) => write!(f, "{column}"),
            Self::Aggregate(expr) => write!(f, "{expr}"),
        }
    }
}

// Identifiers may be qualified (`table.column`); anything else is rejected
// rather than passed through to the executor.
fn is_identifier(expr: &str) -> bool {
    !expr.is_empty()
        && expr.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);

    parts
}
