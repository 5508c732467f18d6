//! Emulation of cursor operators (first, last, single, take, skip).
//!
//! PostgreSQL has no "nth row" cursor semantics that follow an arbitrary
//! ORDER BY, so each operator wraps the previous statement as
//! `SELECT * FROM (<prior>) AS P<n>` and then filters, reverses or limits on
//! the `row_id<n>` rank the compiler put into the base select.
//!
//! `Single` / `SingleOrDefault` only wrap: asserting at most one row is left
//! to the caller.

use crate::error::{PlanError, PlanResult};
use crate::expr::{Expression, PartitionKind};
use crate::transpiler::ToSql;

/// Apply `partitions` in order to a compiled select.
pub fn apply(sql: &str, partitions: &[Expression], query_index: u32) -> PlanResult<String> {
    let mut sql = sql.to_string();
    for operator in partitions {
        sql = apply_one(&sql, operator, query_index)?;
    }
    Ok(sql)
}

fn apply_one(prior: &str, operator: &Expression, query_index: u32) -> PlanResult<String> {
    let Expression::Method { kind, argument, .. } = operator else {
        return Err(PlanError::UnimplementedOperator(format!(
            "{} node in partition list",
            operator.kind_name()
        )));
    };

    let wrapped = format!("SELECT * FROM ({}) AS P{}", prior, query_index);
    let count = || -> PlanResult<String> {
        argument
            .as_deref()
            .ok_or(PlanError::MissingArgument(*kind))?
            .to_sql()
    };

    let sql = match kind {
        PartitionKind::First | PartitionKind::FirstOrDefault => {
            format!("{} ORDER BY \"Id\" LIMIT 1", wrapped)
        }
        PartitionKind::Last | PartitionKind::LastOrDefault => {
            format!("{} ORDER BY row_id{} DESC LIMIT 1", wrapped, query_index)
        }
        PartitionKind::Single | PartitionKind::SingleOrDefault => wrapped,
        PartitionKind::Take => format!("{} LIMIT {}", wrapped, count()?),
        PartitionKind::Skip => format!("{} WHERE row_id{} > {}", wrapped, query_index, count()?),
    };

    Ok(sql)
}
