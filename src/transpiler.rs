//! SQL compiler for query plans.
//!
//! Converts a [`QueryPlan`] into a single PostgreSQL `SELECT`. Every
//! compiled statement carries a `row_number()` rank column named
//! `row_id<query_index>` so the pagination emulator can filter or reverse on
//! it later.

use crate::error::{PlanError, PlanResult};
use crate::expr::Expression;
use crate::format;
use crate::pagination;
use crate::plan::QueryPlan;

/// Surrogate key ordering used when a plan has no explicit sort.
pub const DEFAULT_ORDER: &str = "ORDER BY \"Id\"";

/// Whether `name` is a `row_id<n>` rank column added by the compiler.
pub fn is_rank_column(name: &str) -> bool {
    name.strip_prefix("row_id")
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Trait for converting plan nodes to SQL.
pub trait ToSql {
    /// Convert this node to a SQL string.
    fn to_sql(&self) -> PlanResult<String>;
}

impl ToSql for QueryPlan {
    fn to_sql(&self) -> PlanResult<String> {
        let select = self.to_select_sql()?;
        pagination::apply(&select, self.partitions(), self.query_index())
    }
}

impl QueryPlan {
    /// Generate the base SELECT, before partition operators.
    fn to_select_sql(&self) -> PlanResult<String> {
        let index = self.query_index();

        // FROM
        let from = match self.sub_plan() {
            Some(sub) => format!("FROM ({}) AS F{}", sub.to_sql()?, index),
            None => {
                let tables: Vec<String> = self.types().iter().map(|t| t.table_name()).collect();
                format!("FROM {}", tables.join(", "))
            }
        };

        // WHERE - each filter parenthesized, joined with AND
        let where_clause = if self.filters().is_empty() {
            None
        } else {
            let filters = self
                .filters()
                .iter()
                .map(|f| f.to_sql().map(|sql| format!("({})", sql)))
                .collect::<PlanResult<Vec<_>>>()?;
            Some(format!("WHERE {}", filters.join(" AND ")))
        };

        // ORDER BY
        let order_by = if self.sorts().is_empty() {
            None
        } else {
            let sorts = render_list(self.sorts())?;
            Some(format!("ORDER BY {}", sorts))
        };

        // Columns
        let columns = if self.projections().is_empty() {
            "*".to_string()
        } else {
            render_list(self.projections())?
        };

        let window = order_by.as_deref().unwrap_or(DEFAULT_ORDER);
        let mut sql = format!(
            "SELECT row_number() OVER ({}) AS row_id{}, {} {}",
            window, index, columns, from
        );

        if let Some(clause) = where_clause {
            sql.push(' ');
            sql.push_str(&clause);
        }

        if let Some(clause) = order_by {
            sql.push(' ');
            sql.push_str(&clause);
        }

        Ok(sql)
    }
}

fn render_list(expressions: &[Expression]) -> PlanResult<String> {
    let parts = expressions
        .iter()
        .map(ToSql::to_sql)
        .collect::<PlanResult<Vec<_>>>()?;
    Ok(parts.join(", "))
}

impl ToSql for Expression {
    fn to_sql(&self) -> PlanResult<String> {
        match self {
            Expression::Binary {
                operator,
                left,
                right,
            } => Ok(format!(
                "({} {} {})",
                left.to_sql()?,
                operator.sql_symbol(),
                right.to_sql()?
            )),
            Expression::Constant { value, value_type } => Ok(format::literal(value, *value_type)),
            Expression::BoundParameter { name } => Ok(format!("@{}", name)),
            Expression::Member(member) => Ok(format::member_name(member)),
            Expression::Order { member, direction } => Ok(format!(
                "{} {}",
                format::member_name(member),
                direction.keyword()
            )),
            // Partition operators belong to the partition list only.
            Expression::Method { kind, .. } => Err(PlanError::UnsupportedExpression(format!(
                "{:?} operator inside a filter, sort or projection",
                kind
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::*;
    use crate::plan::TypeRef;
    use crate::value::ValueType;
    use pretty_assertions::assert_eq;

    fn employee() -> TypeRef {
        TypeRef::new("Acme.Hr", "Employee")
    }

    #[test]
    fn test_bare_table() {
        let plan = QueryPlan::from_type(employee());
        assert_eq!(
            plan.to_sql().unwrap(),
            "SELECT row_number() OVER (ORDER BY \"Id\") AS row_id0, * FROM \"Acme.Hr.Employee\""
        );
    }

    #[test]
    fn test_several_sources() {
        let plan = QueryPlan::with_index(vec![employee(), TypeRef::new("Acme.Hr", "Department")], 2);
        assert_eq!(
            plan.to_sql().unwrap(),
            "SELECT row_number() OVER (ORDER BY \"Id\") AS row_id2, * FROM \"Acme.Hr.Employee\", \"Acme.Hr.Department\""
        );
    }

    #[test]
    fn test_filters_are_parenthesized_in_order() {
        let e = employee();
        let plan = QueryPlan::from_type(e.clone())
            .filter(eq(e.member("FirstName"), constant("Ali")))
            .filter(gt(e.member("Id"), constant(10)))
            .filter(param("active"));
        assert_eq!(
            plan.to_sql().unwrap(),
            "SELECT row_number() OVER (ORDER BY \"Id\") AS row_id0, * FROM \"Acme.Hr.Employee\" \
             WHERE ((\"Acme.Hr.Employee\".\"FirstName\" = 'Ali')) \
             AND ((\"Acme.Hr.Employee\".\"Id\" > 10)) \
             AND (@active)"
        );
    }

    #[test]
    fn test_nested_operators_keep_explicit_precedence() {
        let e = employee();
        let predicate = or(
            and(eq(e.member("FirstName"), param("first")), eq(e.member("LastName"), param("last"))),
            lt(binary(e.member("Age"), BinaryOperator::Modulo, constant(2)), constant(1)),
        );
        assert_eq!(
            predicate.to_sql().unwrap(),
            "(((\"Acme.Hr.Employee\".\"FirstName\" = @first) AND (\"Acme.Hr.Employee\".\"LastName\" = @last)) \
             OR ((\"Acme.Hr.Employee\".\"Age\" % 2) < 1))"
        );
    }

    #[test]
    fn test_sorts_feed_window_and_order_clause() {
        let e = employee();
        let plan = QueryPlan::from_type(e.clone())
            .order_by(e.member("LastName"), SortDirection::Ascending)
            .order_by(e.member("DateCreated"), SortDirection::Descending);
        let order = "ORDER BY \"Acme.Hr.Employee\".\"LastName\" ASC, \"Acme.Hr.Employee\".\"DateCreated\" DESC";
        assert_eq!(
            plan.to_sql().unwrap(),
            format!(
                "SELECT row_number() OVER ({order}) AS row_id0, * FROM \"Acme.Hr.Employee\" {order}"
            )
        );
    }

    #[test]
    fn test_projections_replace_star() {
        let e = employee();
        let plan = QueryPlan::from_type(e.clone())
            .project(e.member("Id"))
            .project(e.member("FirstName"));
        assert_eq!(
            plan.to_sql().unwrap(),
            "SELECT row_number() OVER (ORDER BY \"Id\") AS row_id0, \"Acme.Hr.Employee\".\"Id\", \
             \"Acme.Hr.Employee\".\"FirstName\" FROM \"Acme.Hr.Employee\""
        );
    }

    #[test]
    fn test_sub_plan_source() {
        let e = employee();
        let inner = QueryPlan::from_type(e.clone()).filter(eq(e.member("LastName"), constant("Desidero")));
        let outer = QueryPlan::over(inner);
        assert_eq!(
            outer.to_sql().unwrap(),
            "SELECT row_number() OVER (ORDER BY \"Id\") AS row_id1, * FROM (\
             SELECT row_number() OVER (ORDER BY \"Id\") AS row_id0, * FROM \"Acme.Hr.Employee\" \
             WHERE ((\"Acme.Hr.Employee\".\"LastName\" = 'Desidero'))) AS F1"
        );
    }

    #[test]
    fn test_constants_render_by_type() {
        assert_eq!(constant(12i64).to_sql().unwrap(), "12");
        assert_eq!(constant(0.5f32).to_sql().unwrap(), "0.5");
        assert_eq!(constant("x").to_sql().unwrap(), "'x'");
        assert_eq!(typed_constant("7", ValueType::Int).to_sql().unwrap(), "7");
        assert_eq!(constant(f64::INFINITY).to_sql().unwrap(), "'Infinity'");
    }

    #[test]
    fn test_rank_column_names() {
        assert!(is_rank_column("row_id0"));
        assert!(is_rank_column("row_id12"));
        assert!(!is_rank_column("row_id"));
        assert!(!is_rank_column("row_identity"));
        assert!(!is_rank_column("Id"));
    }

    #[test]
    fn test_method_outside_partitions_fails_loudly() {
        let e = employee();
        let plan = QueryPlan::from_type(e).filter(partition(PartitionKind::First));
        let err = plan.to_sql().unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedExpression(_)));
    }
}
