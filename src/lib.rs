//! # pgplan
//!
//! Compile expression-tree query plans into parameterized PostgreSQL, run
//! them, and read the rows back as schema-less records.
//!
//! ## Quick Example
//!
//! ```
//! use pgplan::prelude::*;
//!
//! let employee = TypeRef::new("Acme.Hr", "Employee");
//! let plan = QueryPlan::from_type(employee.clone())
//!     .filter(eq(employee.member("FirstName"), param("name")))
//!     .order_by(employee.member("Id"), SortDirection::Descending)
//!     .partition(take(constant(10)));
//!
//! let sql = plan.to_sql().unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM (SELECT row_number() OVER (ORDER BY \"Acme.Hr.Employee\".\"Id\" DESC) AS row_id0, * \
//!      FROM \"Acme.Hr.Employee\" WHERE ((\"Acme.Hr.Employee\".\"FirstName\" = @name)) \
//!      ORDER BY \"Acme.Hr.Employee\".\"Id\" DESC) AS P0 LIMIT 10"
//! );
//! ```
//!
//! ## Layers
//!
//! | Module          | Role                                              |
//! |-----------------|---------------------------------------------------|
//! | [`expr`]        | Expression tree                                   |
//! | [`plan`]        | Query plan, nestable                              |
//! | [`transpiler`]  | Plan to `SELECT` text                             |
//! | [`pagination`]  | First / Last / Single / Take / Skip wrapping      |
//! | [`mutation`]    | `INSERT` / `UPDATE` / `DELETE` by correlation key |
//! | [`materialize`] | Row cursor to [`record::GenericRecord`]           |
//! | [`engine`]      | Executor boundary and [`engine::Database`]        |
//! | [`pg`]          | sqlx-backed PostgreSQL executor                   |

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod expr;
pub mod format;
pub mod materialize;
pub mod mutation;
pub mod pagination;
pub mod pg;
pub mod plan;
pub mod record;
pub mod transpiler;
pub mod value;

pub mod prelude {
    pub use crate::command::{Command, NamedParameter};
    pub use crate::engine::{compile, CommandExecutor, Database};
    pub use crate::error::*;
    pub use crate::expr::*;
    pub use crate::materialize::{Records, RowCursor};
    pub use crate::mutation::MutationRequest;
    pub use crate::pg::PgExecutor;
    pub use crate::plan::{QueryPlan, TypeRef};
    pub use crate::record::{Field, FromValue, GenericRecord};
    pub use crate::transpiler::ToSql;
    pub use crate::value::{Interval, Value, ValueType};
}

pub use engine::compile;
