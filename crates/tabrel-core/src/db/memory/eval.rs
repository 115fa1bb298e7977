use crate::{
    db::{
        Row,
        query::{
            AggregateExpr, AggregateFunction, CompareOp, Condition, OrderDirection, OrderTerm,
            SelectItem, SelectQuery, unqualified,
        },
    },
    error::InternalError,
    value::Value,
};
use std::{cmp::Ordering, collections::HashMap};

// Missing columns read as NULL.
fn column_value<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

/// Evaluate one condition against a row; comparisons involving NULL or
/// incomparable values are false.
pub(super) fn matches(row: &Row, condition: &Condition) -> bool {
    match condition {
        Condition::Compare { column, op, value } => {
            let Some(ordering) = column_value(row, column).compare_loose(value) else {
                return false;
            };

            match op {
                CompareOp::Eq => ordering == Ordering::Equal,
                CompareOp::Ne => ordering != Ordering::Equal,
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Lte => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Gte => ordering != Ordering::Less,
            }
        }
        Condition::In { column, values } => {
            let lhs = column_value(row, column);
            values
                .iter()
                .any(|value| lhs.compare_loose(value) == Some(Ordering::Equal))
        }
        Condition::IsNull { column } => column_value(row, column).is_null(),
        Condition::IsNotNull { column } => !column_value(row, column).is_null(),
    }
}

pub(super) fn matches_all(row: &Row, conditions: &[Condition]) -> bool {
    conditions.iter().all(|condition| matches(row, condition))
}

/// Run a select over a table's rows: filter, group/aggregate, order, window,
/// project.
pub(super) fn select(rows: &[Row], query: &SelectQuery) -> Result<Vec<Row>, InternalError> {
    let filtered: Vec<&Row> = rows
        .iter()
        .filter(|row| matches_all(row, query.conditions()))
        .collect();

    let aggregated = !query.group_by().is_empty()
        || query.select_items().iter().any(SelectItem::is_aggregate);

    let mut out = if aggregated {
        aggregate(&filtered, query)?
    } else {
        filtered.into_iter().cloned().collect()
    };

    sort(&mut out, query.order_terms());

    let offset = query.offset().map_or(0, |offset| offset as usize);
    let limit = query.limit().map_or(usize::MAX, |limit| limit as usize);
    let windowed = out.into_iter().skip(offset).take(limit);

    if aggregated || query.select_items().is_empty() {
        return Ok(windowed.collect());
    }

    Ok(windowed
        .map(|row| project(&row, query.select_items()))
        .collect())
}

fn project(row: &Row, items: &[SelectItem]) -> Row {
    items
        .iter()
        .filter_map(|item| match item {
            SelectItem::Column(column) => Some((
                unqualified(column).to_string(),
                column_value(row, column).clone(),
            )),
            SelectItem::Aggregate(_) => None,
        })
        .collect()
}

fn sort(rows: &mut [Row], terms: &[OrderTerm]) {
    if terms.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        terms
            .iter()
            .map(|term| {
                let ordering = column_value(a, &term.column).cmp(column_value(b, &term.column));
                match term.direction {
                    OrderDirection::Asc => ordering,
                    OrderDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

// Groups in first-seen order; one group over everything when there is no
// GROUP BY.
fn aggregate(rows: &[&Row], query: &SelectQuery) -> Result<Vec<Row>, InternalError> {
    let mut groups: Vec<Vec<&Row>> = Vec::new();

    if query.group_by().is_empty() {
        groups.push(rows.to_vec());
    } else {
        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        for &row in rows {
            let key = query
                .group_by()
                .iter()
                .map(|column| column_value(row, column).clone())
                .collect::<Vec<_>>();

            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }
    }

    groups
        .iter()
        .map(|group| aggregate_row(group, query))
        .collect()
}

fn aggregate_row(group: &[&Row], query: &SelectQuery) -> Result<Row, InternalError> {
    let mut out = Row::new();

    if query.select_items().is_empty() {
        for column in query.group_by() {
            out.insert(unqualified(column), first_value(group, column));
        }
        return Ok(out);
    }

    for item in query.select_items() {
        match item {
            SelectItem::Column(column) => {
                out.insert(unqualified(column), first_value(group, column));
            }
            SelectItem::Aggregate(expr) => {
                out.insert(expr.to_string(), reduce(group, expr)?);
            }
        }
    }

    Ok(out)
}

fn first_value(group: &[&Row], column: &str) -> Value {
    group
        .first()
        .map_or(Value::Null, |row| column_value(row, column).clone())
}

fn reduce(group: &[&Row], expr: &AggregateExpr) -> Result<Value, InternalError> {
    let Some(column) = expr.column.as_deref() else {
        return Ok(Value::Int(count(group.len())));
    };

    let values: Vec<&Value> = group
        .iter()
        .map(|row| column_value(row, column))
        .filter(|value| !value.is_null())
        .collect();

    match expr.function {
        AggregateFunction::Count => Ok(Value::Int(count(values.len()))),
        AggregateFunction::Min => Ok(values.into_iter().min().cloned().unwrap_or(Value::Null)),
        AggregateFunction::Max => Ok(values.into_iter().max().cloned().unwrap_or(Value::Null)),
        AggregateFunction::Sum => sum(&values, expr),
        AggregateFunction::Avg => {
            if values.is_empty() {
                return Ok(Value::Null);
            }
            let total = float_total(&values, expr)?;
            #[allow(clippy::cast_precision_loss)]
            let avg = total / values.len() as f64;

            Ok(Value::Float(avg))
        }
    }
}

fn count(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

fn sum(values: &[&Value], expr: &AggregateExpr) -> Result<Value, InternalError> {
    if values.is_empty() {
        return Ok(Value::Null);
    }

    if values.iter().all(|value| value.as_i64().is_some()) {
        let total = values
            .iter()
            .filter_map(|value| value.as_i64())
            .try_fold(0i64, i64::checked_add)
            .ok_or_else(|| {
                InternalError::executor_unsupported(format!("integer overflow in {expr}"))
            })?;

        return Ok(Value::Int(total));
    }

    float_total(values, expr).map(Value::Float)
}

fn float_total(values: &[&Value], expr: &AggregateExpr) -> Result<f64, InternalError> {
    values.iter().try_fold(0.0, |total, value| {
        value.as_f64().map(|v| total + v).ok_or_else(|| {
            InternalError::executor_unsupported(format!("non-numeric value {value} in {expr}"))
        })
    })
}
