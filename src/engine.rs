//! Execution of compiled plans, text commands and mutations.
//!
//! The [`Database`] facade is backend-agnostic: it compiles, hands command
//! text plus named parameters to a [`CommandExecutor`], and materializes the
//! rows that come back. Execution is blocking, one request/response exchange
//! per call. An executor serves one caller at a time; use one executor per
//! concurrent caller.

use crate::command::{Command, NamedParameter};
use crate::error::PlanResult;
use crate::materialize::{Records, RowCursor};
use crate::mutation::MutationRequest;
use crate::plan::{QueryPlan, TypeRef};
use crate::record::{convert, FromValue, GenericRecord};
use crate::transpiler::ToSql;
use crate::value::Value;

/// Runs command text against a backend.
///
/// For a single execution, iterating rows, reading the affected-row count
/// and reading a scalar are alternatives: each is its own method and its own
/// round trip.
pub trait CommandExecutor {
    /// Execute `command` and return a cursor over its rows. The cursor
    /// borrows the executor until dropped.
    fn query<'a>(&'a mut self, command: &Command) -> PlanResult<Box<dyn RowCursor + 'a>>;

    /// Execute `command` and return the number of affected rows.
    fn non_query(&mut self, command: &Command) -> PlanResult<u64>;

    /// Execute `command` and return the first column of the first row, or
    /// [`Value::Null`] when there is no row.
    fn scalar(&mut self, command: &Command) -> PlanResult<Value>;
}

/// Compile a plan into a command carrying the caller's parameters.
pub fn compile(plan: &QueryPlan, parameters: &[NamedParameter]) -> PlanResult<Command> {
    let text = plan.to_sql()?;
    tracing::debug!(sql = %text, query_index = plan.query_index(), "compiled plan");
    Ok(Command::with_parameters(text, parameters.to_vec()))
}

/// Reads, writes and raw commands over one executor.
///
/// # Example
///
/// ```rust,ignore
/// let mut db = Database::new(PgExecutor::connect("postgres://localhost/hr")?);
/// let employee = TypeRef::new("Acme.Hr", "Employee");
///
/// let created = db
///     .create(&MutationRequest::new(employee.clone()).set("FirstName", "Ali"))?
///     .expect("inserted row");
///
/// let plan = QueryPlan::from_type(employee.clone())
///     .filter(eq(employee.member("Id"), param("id")))
///     .partition(partition(PartitionKind::First));
/// let found = db.read(&plan, &[NamedParameter::new("id", created.get::<i32>("Id")?)])?.first()?;
/// ```
pub struct Database<E> {
    executor: E,
}

impl<E: CommandExecutor> Database<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Compile and run a plan, returning a lazy record sequence.
    pub fn read(&mut self, plan: &QueryPlan, parameters: &[NamedParameter]) -> PlanResult<Records<'_>> {
        let command = compile(plan, parameters)?;
        self.read_text(&command)
    }

    /// Compile and run a plan, collecting every record.
    pub fn retrieve(&mut self, plan: &QueryPlan, parameters: &[NamedParameter]) -> PlanResult<Vec<GenericRecord>> {
        self.read(plan, parameters)?.into_list()
    }

    /// Run caller-authored SQL, returning a lazy record sequence.
    pub fn read_text(&mut self, command: &Command) -> PlanResult<Records<'_>> {
        tracing::debug!(sql = %command.text, parameters = command.parameters.len(), "executing query");
        let cursor = self.executor.query(command)?;
        Ok(Records::new(cursor))
    }

    /// Run caller-authored SQL, collecting every record.
    pub fn retrieve_text(&mut self, command: &Command) -> PlanResult<Vec<GenericRecord>> {
        self.read_text(command)?.into_list()
    }

    /// Run a statement and return the affected-row count.
    pub fn non_query(&mut self, command: &Command) -> PlanResult<u64> {
        tracing::debug!(sql = %command.text, parameters = command.parameters.len(), "executing non-query");
        self.executor.non_query(command)
    }

    /// Run a statement and read the first column of its first row as `T`.
    pub fn scalar<T: FromValue>(&mut self, command: &Command) -> PlanResult<T> {
        tracing::debug!(sql = %command.text, parameters = command.parameters.len(), "executing scalar");
        let value = self.executor.scalar(command)?;
        convert("<scalar>", value.value_type(), &value)
    }

    /// Insert a row; returns it as stored (with its generated `Id`).
    pub fn create(&mut self, request: &MutationRequest) -> PlanResult<Option<GenericRecord>> {
        self.returning(&request.to_insert())
    }

    /// Update the row with the request's `UId`; returns it as stored.
    pub fn update(&mut self, request: &MutationRequest) -> PlanResult<Option<GenericRecord>> {
        self.returning(&request.to_update()?)
    }

    /// Delete the row with the request's `UId`; returns the deleted row.
    pub fn delete(&mut self, request: &MutationRequest) -> PlanResult<Option<GenericRecord>> {
        self.returning(&request.to_delete()?)
    }

    /// [`Database::create`] for a record.
    pub fn create_record(&mut self, table: &TypeRef, record: &GenericRecord) -> PlanResult<Option<GenericRecord>> {
        self.create(&MutationRequest::from_record(table.clone(), record))
    }

    /// [`Database::update`] for a record.
    pub fn update_record(&mut self, table: &TypeRef, record: &GenericRecord) -> PlanResult<Option<GenericRecord>> {
        self.update(&MutationRequest::from_record(table.clone(), record))
    }

    /// [`Database::delete`] for a record.
    pub fn delete_record(&mut self, table: &TypeRef, record: &GenericRecord) -> PlanResult<Option<GenericRecord>> {
        self.delete(&MutationRequest::from_record(table.clone(), record))
    }

    fn returning(&mut self, command: &Command) -> PlanResult<Option<GenericRecord>> {
        self.read_text(command)?.first()
    }
}

impl<E> std::fmt::Debug for Database<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{eq, param, partition, PartitionKind};
    use crate::materialize::VecCursor;
    use crate::value::ValueType;

    /// Records every command and answers each with the same canned rows.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<Command>,
        columns: Vec<(String, ValueType)>,
        rows: Vec<Vec<Value>>,
    }

    impl CommandExecutor for Recorder {
        fn query<'a>(&'a mut self, command: &Command) -> PlanResult<Box<dyn RowCursor + 'a>> {
            self.seen.push(command.clone());
            Ok(Box::new(VecCursor::new(self.columns.clone(), self.rows.clone())))
        }

        fn non_query(&mut self, command: &Command) -> PlanResult<u64> {
            self.seen.push(command.clone());
            Ok(self.rows.len() as u64)
        }

        fn scalar(&mut self, command: &Command) -> PlanResult<Value> {
            self.seen.push(command.clone());
            Ok(self
                .rows
                .first()
                .and_then(|row| row.first())
                .cloned()
                .unwrap_or(Value::Null))
        }
    }

    #[test]
    fn test_read_passes_compiled_text_and_parameters() {
        let employee = TypeRef::new("Acme.Hr", "Employee");
        let plan = QueryPlan::from_type(employee.clone())
            .filter(eq(employee.member("Id"), param("id")))
            .partition(partition(PartitionKind::First));
        let mut db = Database::new(Recorder {
            columns: vec![("Id".to_string(), ValueType::Int)],
            rows: vec![vec![Value::Int(9)]],
            ..Default::default()
        });

        let records = db.retrieve(&plan, &[NamedParameter::new("id", 9)]).unwrap();
        assert_eq!(records.len(), 1);

        let seen = &db.executor().seen[0];
        assert_eq!(seen.text, plan.to_sql().unwrap());
        assert_eq!(seen.parameters, vec![NamedParameter::new("id", 9)]);
    }

    #[test]
    fn test_scalar_conversion() {
        let mut db = Database::new(Recorder {
            rows: vec![vec![Value::BigInt(3)]],
            ..Default::default()
        });
        let count: i64 = db.scalar(&Command::new("SELECT count(*) FROM t")).unwrap();
        assert_eq!(count, 3);

        let mut empty = Database::new(Recorder::default());
        let none: Option<i32> = empty.scalar(&Command::new("SELECT 1 WHERE false")).unwrap();
        assert_eq!(none, None);
        assert!(empty.scalar::<i32>(&Command::new("SELECT 1 WHERE false")).is_err());
    }

    #[test]
    fn test_mutation_returns_none_without_rows() {
        let mut db = Database::new(Recorder::default());
        let request = MutationRequest::new(TypeRef::new("Acme.Hr", "Employee")).set("UId", uuid::Uuid::nil());
        assert!(db.delete(&request).unwrap().is_none());
        assert!(db.executor().seen[0].text.starts_with("DELETE FROM"));
    }
}
