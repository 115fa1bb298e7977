use crate::{
    db::query::{Condition, SelectQuery},
    value::Value,
};
use std::fmt::Write as _;

pub(super) fn select_sql(query: &SelectQuery) -> String {
    let mut sql = String::from("SELECT ");

    if query.select_items().is_empty() {
        sql.push('*');
    } else {
        let items = query
            .select_items()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        sql.push_str(&items.join(", "));
    }

    let _ = write!(sql, " FROM {}", query.table());

    if let Some(clause) = where_sql(query.conditions()) {
        let _ = write!(sql, " WHERE {clause}");
    }
    if !query.group_by().is_empty() {
        let _ = write!(sql, " GROUP BY {}", query.group_by().join(", "));
    }
    if !query.order_terms().is_empty() {
        let terms = query
            .order_terms()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        let _ = write!(sql, " ORDER BY {}", terms.join(", "));
    }
    if let Some(limit) = query.limit() {
        let _ = write!(sql, " LIMIT {limit}");
    }
    if let Some(offset) = query.offset() {
        let _ = write!(sql, " OFFSET {offset}");
    }

    sql
}

pub(super) fn where_sql(conditions: &[Condition]) -> Option<String> {
    if conditions.is_empty() {
        return None;
    }

    let clauses = conditions.iter().map(condition_sql).collect::<Vec<_>>();

    Some(clauses.join(" AND "))
}

fn condition_sql(condition: &Condition) -> String {
    match condition {
        Condition::Compare { column, op, .. } => format!("{column} {} ?", op.as_sql()),
        // an empty list must still render valid SQL that matches nothing
        Condition::In { column, values } if values.is_empty() => format!("{column} IN (NULL)"),
        Condition::In { column, values } => {
            let placeholders = vec!["?"; values.len()].join(", ");
            format!("{column} IN ({placeholders})")
        }
        Condition::IsNull { column } => format!("{column} IS NULL"),
        Condition::IsNotNull { column } => format!("{column} IS NOT NULL"),
    }
}

pub(super) fn parameters(conditions: &[Condition]) -> Vec<Value> {
    let mut params = Vec::new();

    for condition in conditions {
        match condition {
            Condition::Compare { value, .. } => params.push(value.clone()),
            Condition::In { values, .. } => params.extend(values.iter().cloned()),
            Condition::IsNull { .. } | Condition::IsNotNull { .. } => {}
        }
    }

    params
}
