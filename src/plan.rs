//! Query plans: the logical pieces of one `SELECT`.

use crate::expr::{Expression, MemberRef, SortDirection};
use crate::format;
use serde::{Deserialize, Serialize};

/// A logical source (table). Its SQL name is `"<namespace>.<name>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub namespace: String,
    pub name: String,
}

impl TypeRef {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// The quoted table identifier.
    pub fn table_name(&self) -> String {
        format::table_name(&self.namespace, &self.name)
    }

    /// Reference a column of this source.
    pub fn member(&self, member_name: &str) -> MemberRef {
        MemberRef {
            namespace: self.namespace.clone(),
            object_name: self.name.clone(),
            member_name: member_name.to_string(),
        }
    }
}

/// Everything needed to compile one `SELECT`.
///
/// Filters are AND-combined in order, partitions are applied in order, each
/// wrapping the previous result. The query index disambiguates the
/// `row_id<n>`, `F<n>` and `P<n>` aliases of nested plans and is fixed at
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    types: Vec<TypeRef>,
    #[serde(default)]
    filters: Vec<Expression>,
    #[serde(default)]
    sorts: Vec<Expression>,
    #[serde(default)]
    projections: Vec<Expression>,
    #[serde(default)]
    sub_plan: Option<Box<QueryPlan>>,
    #[serde(default)]
    partitions: Vec<Expression>,
    #[serde(default)]
    query_index: u32,
}

impl QueryPlan {
    /// A plan reading from `source`, with query index 0.
    pub fn from_type(source: TypeRef) -> Self {
        Self::with_index(vec![source], 0)
    }

    /// A plan reading from several sources with an explicit query index.
    pub fn with_index(types: Vec<TypeRef>, query_index: u32) -> Self {
        Self {
            types,
            filters: Vec::new(),
            sorts: Vec::new(),
            projections: Vec::new(),
            sub_plan: None,
            partitions: Vec::new(),
            query_index,
        }
    }

    /// A plan built atop the result of `inner`. The new plan takes the
    /// next query index so its aliases do not collide with the inner ones.
    pub fn over(inner: QueryPlan) -> Self {
        let mut plan = Self::with_index(inner.types.clone(), inner.query_index + 1);
        plan.sub_plan = Some(Box::new(inner));
        plan
    }

    /// Add a filter (AND-combined with the others).
    pub fn filter(mut self, predicate: Expression) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Add a sort key.
    pub fn order_by(mut self, member: MemberRef, direction: SortDirection) -> Self {
        self.sorts.push(Expression::Order { member, direction });
        self
    }

    /// Add a projected expression. No projections means all columns.
    pub fn project(mut self, expression: impl Into<Expression>) -> Self {
        self.projections.push(expression.into());
        self
    }

    /// Append a partition operator (see [`crate::expr::partition`]).
    pub fn partition(mut self, operator: Expression) -> Self {
        self.partitions.push(operator);
        self
    }

    pub fn types(&self) -> &[TypeRef] {
        &self.types
    }

    pub fn filters(&self) -> &[Expression] {
        &self.filters
    }

    pub fn sorts(&self) -> &[Expression] {
        &self.sorts
    }

    pub fn projections(&self) -> &[Expression] {
        &self.projections
    }

    pub fn sub_plan(&self) -> Option<&QueryPlan> {
        self.sub_plan.as_deref()
    }

    pub fn partitions(&self) -> &[Expression] {
        &self.partitions
    }

    pub fn query_index(&self) -> u32 {
        self.query_index
    }
}
