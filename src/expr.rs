//! The expression model consumed by the compiler.
//!
//! Trees are built once per logical query, never mutated, and discarded
//! after compilation. The helper constructors at the bottom of this module
//! keep call sites short:
//!
//! ```
//! use pgplan::expr::*;
//!
//! let employee = |m: &str| member("Acme.Hr", "Employee", m);
//! let filter = eq(employee("FirstName"), constant("Ali"));
//! let older_than = gt(employee("Age"), param("age"));
//! let both = and(filter, older_than);
//! ```

use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// Infix operators of a binary node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Modulo,
    BitwiseAnd,
    BitwiseOr,
    ExclusiveOr,
    LogicalAnd,
    LogicalOr,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl BinaryOperator {
    /// The SQL infix symbol placed between the two operands.
    pub fn sql_symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Modulo => "%",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::ExclusiveOr => "#",
            BinaryOperator::LogicalAnd => "AND",
            BinaryOperator::LogicalOr => "OR",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessOrEqual => "<=",
        }
    }
}

/// Sort direction of an order node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Cardinality-limiting operators applied after the base query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionKind {
    First,
    FirstOrDefault,
    Last,
    LastOrDefault,
    Single,
    SingleOrDefault,
    Take,
    Skip,
}

impl PartitionKind {
    /// `Take` and `Skip` carry a row count.
    pub fn takes_count(self) -> bool {
        matches!(self, PartitionKind::Take | PartitionKind::Skip)
    }
}

/// A column of a logical source: `"<namespace>.<object_name>"."<member_name>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    pub namespace: String,
    pub object_name: String,
    pub member_name: String,
}

/// A node of the query expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Constant {
        value: Value,
        value_type: ValueType,
    },
    /// Reference to a caller-supplied named parameter.
    BoundParameter { name: String },
    Member(MemberRef),
    /// A member used as a sort key.
    Order {
        member: MemberRef,
        direction: SortDirection,
    },
    /// A partition operator. Only the pagination emulator consumes these.
    Method {
        kind: PartitionKind,
        operand: Option<Box<Expression>>,
        argument: Option<Box<Expression>>,
    },
}

impl Expression {
    /// Short name of the node kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Binary { .. } => "Binary",
            Expression::Constant { .. } => "Constant",
            Expression::BoundParameter { .. } => "BoundParameter",
            Expression::Member(_) => "Member",
            Expression::Order { .. } => "Order",
            Expression::Method { .. } => "Method",
        }
    }
}

impl From<MemberRef> for Expression {
    fn from(member: MemberRef) -> Self {
        Expression::Member(member)
    }
}

// Constructors //

/// Reference a column of `<namespace>.<object_name>`.
pub fn member(namespace: &str, object_name: &str, member_name: &str) -> MemberRef {
    MemberRef {
        namespace: namespace.to_string(),
        object_name: object_name.to_string(),
        member_name: member_name.to_string(),
    }
}

/// A constant whose declared type is taken from the value.
pub fn constant(value: impl Into<Value>) -> Expression {
    let value = value.into();
    Expression::Constant {
        value_type: value.value_type(),
        value,
    }
}

/// A constant with an explicit declared type.
pub fn typed_constant(value: impl Into<Value>, value_type: ValueType) -> Expression {
    Expression::Constant {
        value: value.into(),
        value_type,
    }
}

/// A named parameter reference, rendered as `@name`.
pub fn param(name: &str) -> Expression {
    Expression::BoundParameter {
        name: name.to_string(),
    }
}

pub fn binary(left: impl Into<Expression>, operator: BinaryOperator, right: impl Into<Expression>) -> Expression {
    Expression::Binary {
        operator,
        left: Box::new(left.into()),
        right: Box::new(right.into()),
    }
}

pub fn eq(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    binary(left, BinaryOperator::Equal, right)
}

pub fn ne(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    binary(left, BinaryOperator::NotEqual, right)
}

pub fn gt(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    binary(left, BinaryOperator::GreaterThan, right)
}

pub fn lt(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    binary(left, BinaryOperator::LessThan, right)
}

pub fn and(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    binary(left, BinaryOperator::LogicalAnd, right)
}

pub fn or(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    binary(left, BinaryOperator::LogicalOr, right)
}

/// A sort key on `member`.
pub fn order(member: MemberRef, direction: SortDirection) -> Expression {
    Expression::Order { member, direction }
}

/// A partition operator without a count (`First`, `Last`, `Single`, ...).
pub fn partition(kind: PartitionKind) -> Expression {
    Expression::Method {
        kind,
        operand: None,
        argument: None,
    }
}

/// `Take(count)`.
pub fn take(count: impl Into<Expression>) -> Expression {
    Expression::Method {
        kind: PartitionKind::Take,
        operand: None,
        argument: Some(Box::new(count.into())),
    }
}

/// `Skip(count)`.
pub fn skip(count: impl Into<Expression>) -> Expression {
    Expression::Method {
        kind: PartitionKind::Skip,
        operand: None,
        argument: Some(Box::new(count.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_takes_type_from_value() {
        match constant(7i64) {
            Expression::Constant { value_type, .. } => assert_eq!(value_type, ValueType::BigInt),
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn test_take_carries_count() {
        match take(constant(5)) {
            Expression::Method { kind, argument, .. } => {
                assert_eq!(kind, PartitionKind::Take);
                assert!(kind.takes_count());
                assert_eq!(argument.as_deref(), Some(&constant(5)));
            }
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn test_tree_round_trips_through_json() {
        let tree = and(
            eq(member("Acme.Hr", "Employee", "FirstName"), constant("Ali")),
            gt(member("Acme.Hr", "Employee", "Id"), param("id")),
        );
        let json = serde_json::to_string(&tree).unwrap();
        let back: Expression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
