//! INSERT / UPDATE / DELETE generation.
//!
//! Mutations work on a flat column -> value set rather than an expression
//! tree. Column values are always bound as positional parameters `P0, P1,
//! ...` in column order; rows are targeted by the correlation key `UId`.
//! Every statement ends in `RETURNING *` so the affected row can be read
//! back.

use crate::command::{Command, NamedParameter};
use crate::error::{PlanError, PlanResult};
use crate::format::quote_identifier;
use crate::plan::TypeRef;
use crate::record::GenericRecord;
use crate::transpiler::is_rank_column;
use crate::value::Value;

/// Surrogate key, assigned by the database.
pub const IDENTITY_COLUMN: &str = "Id";

/// Stable external identity used to target updates and deletes.
pub const CORRELATION_COLUMN: &str = "UId";

/// A table plus the column values to write.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub table: TypeRef,
    pub values: Vec<(String, Value)>,
}

impl MutationRequest {
    pub fn new(table: TypeRef) -> Self {
        Self {
            table,
            values: Vec::new(),
        }
    }

    /// Take the columns of a record, leaving out `row_id<n>` rank columns
    /// that a compiled read adds.
    pub fn from_record(table: TypeRef, record: &GenericRecord) -> Self {
        let values = record
            .fields()
            .iter()
            .filter(|f| !is_rank_column(&f.name))
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();
        Self { table, values }
    }

    /// Set a column value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    fn columns_except<'a>(&'a self, excluded: &'a [&str]) -> impl Iterator<Item = &'a (String, Value)> {
        self.values
            .iter()
            .filter(move |(column, _)| !excluded.iter().any(|e| e.eq_ignore_ascii_case(column)))
    }

    /// The key column as spelled in this request, with its `@UId` parameter.
    fn correlation_key(&self) -> PlanResult<(&str, NamedParameter)> {
        self.values
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(CORRELATION_COLUMN))
            .map(|(column, value)| (column.as_str(), NamedParameter::new(CORRELATION_COLUMN, value.clone())))
            .ok_or_else(|| PlanError::FieldNotFound(CORRELATION_COLUMN.to_string()))
    }

    /// `INSERT INTO <table> (<cols>) VALUES(@P0,...) RETURNING *`, without `Id`.
    pub fn to_insert(&self) -> Command {
        let (columns, parameters) = positional(self.columns_except(&[IDENTITY_COLUMN]));
        let table = self.table.table_name();

        if columns.is_empty() {
            return Command::new(format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table));
        }

        let placeholders: Vec<String> = parameters.iter().map(|p| format!("@{}", p.name)).collect();
        let text = format!(
            "INSERT INTO {} ({}) VALUES({}) RETURNING *",
            table,
            columns.join(","),
            placeholders.join(",")
        );
        Command::with_parameters(text, parameters)
    }

    /// `UPDATE <table> SET <col>=@P0,... WHERE "UId" = @UId RETURNING *`,
    /// without `Id` and `UId` in the SET list.
    pub fn to_update(&self) -> PlanResult<Command> {
        let (key_column, key) = self.correlation_key()?;
        let (columns, mut parameters) =
            positional(self.columns_except(&[IDENTITY_COLUMN, CORRELATION_COLUMN]));

        if columns.is_empty() {
            return Err(PlanError::EmptyUpdate(self.table.table_name()));
        }

        let assignments: Vec<String> = columns
            .iter()
            .zip(&parameters)
            .map(|(column, p)| format!("{}=@{}", column, p.name))
            .collect();
        let text = format!(
            "UPDATE {} SET {} WHERE {} = @{} RETURNING *",
            self.table.table_name(),
            assignments.join(","),
            quote_identifier(key_column),
            CORRELATION_COLUMN
        );
        parameters.push(key);
        Ok(Command::with_parameters(text, parameters))
    }

    /// `DELETE FROM <table> WHERE "UId"=@UId RETURNING *`.
    pub fn to_delete(&self) -> PlanResult<Command> {
        let (key_column, key) = self.correlation_key()?;
        let text = format!(
            "DELETE FROM {} WHERE {}=@{} RETURNING *",
            self.table.table_name(),
            quote_identifier(key_column),
            CORRELATION_COLUMN
        );
        Ok(Command::with_parameters(text, vec![key]))
    }
}

/// Quoted column names and their `P<i>` parameters, index-aligned.
fn positional<'a>(values: impl Iterator<Item = &'a (String, Value)>) -> (Vec<String>, Vec<NamedParameter>) {
    values
        .enumerate()
        .map(|(i, (column, value))| {
            (
                quote_identifier(column),
                NamedParameter::new(format!("P{}", i), value.clone()),
            )
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;
    use crate::value::ValueType;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn employee() -> TypeRef {
        TypeRef::new("Acme.Hr", "Employee")
    }

    #[test]
    fn test_insert() {
        let request = MutationRequest::new(employee())
            .set("FirstName", "Ali")
            .set("LastName", "Desidero");
        let cmd = request.to_insert();
        assert_eq!(
            cmd.text,
            "INSERT INTO \"Acme.Hr.Employee\" (\"FirstName\",\"LastName\") VALUES(@P0,@P1) RETURNING *"
        );
        assert_eq!(
            cmd.parameters,
            vec![NamedParameter::new("P0", "Ali"), NamedParameter::new("P1", "Desidero")]
        );
    }

    #[test]
    fn test_insert_skips_identity() {
        let request = MutationRequest::new(employee())
            .set("Id", 0)
            .set("UId", Uuid::nil())
            .set("FirstName", "Ali");
        let cmd = request.to_insert();
        assert_eq!(
            cmd.text,
            "INSERT INTO \"Acme.Hr.Employee\" (\"UId\",\"FirstName\") VALUES(@P0,@P1) RETURNING *"
        );
        assert_eq!(cmd.parameters[0], NamedParameter::new("P0", Uuid::nil()));
    }

    #[test]
    fn test_insert_without_columns() {
        let cmd = MutationRequest::new(employee()).set("Id", 0).to_insert();
        assert_eq!(cmd.text, "INSERT INTO \"Acme.Hr.Employee\" DEFAULT VALUES RETURNING *");
        assert!(cmd.parameters.is_empty());
    }

    #[test]
    fn test_update() {
        let uid = Uuid::new_v4();
        let request = MutationRequest::new(employee())
            .set("Id", 12)
            .set("UId", uid)
            .set("FirstName", "Updated New")
            .set("DateUpdated", Value::Null);
        let cmd = request.to_update().unwrap();
        assert_eq!(
            cmd.text,
            "UPDATE \"Acme.Hr.Employee\" SET \"FirstName\"=@P0,\"DateUpdated\"=@P1 WHERE \"UId\" = @UId RETURNING *"
        );
        assert_eq!(
            cmd.parameters,
            vec![
                NamedParameter::new("P0", "Updated New"),
                NamedParameter::new("P1", Value::Null),
                NamedParameter::new("UId", uid),
            ]
        );
    }

    #[test]
    fn test_update_needs_correlation_key() {
        let err = MutationRequest::new(employee())
            .set("FirstName", "Ali")
            .to_update()
            .unwrap_err();
        assert!(matches!(err, PlanError::FieldNotFound(name) if name == "UId"));
    }

    #[test]
    fn test_update_with_nothing_to_set() {
        let err = MutationRequest::new(employee())
            .set("UId", Uuid::nil())
            .to_update()
            .unwrap_err();
        assert!(matches!(err, PlanError::EmptyUpdate(_)));
    }

    #[test]
    fn test_delete() {
        let uid = Uuid::new_v4();
        let cmd = MutationRequest::new(employee()).set("UId", uid).to_delete().unwrap();
        assert_eq!(cmd.text, "DELETE FROM \"Acme.Hr.Employee\" WHERE \"UId\"=@UId RETURNING *");
        assert_eq!(cmd.parameters, vec![NamedParameter::new("UId", uid)]);
    }

    #[test]
    fn test_from_record_drops_rank_columns() {
        let record = GenericRecord::new(vec![
            Field::new("row_id0", ValueType::BigInt, Value::BigInt(1)),
            Field::new("Id", ValueType::Int, Value::Int(3)),
            Field::new("FirstName", ValueType::Text, Value::from("Ali")),
        ]);
        let request = MutationRequest::from_record(employee(), &record);
        let columns: Vec<&str> = request.values.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, vec!["Id", "FirstName"]);
    }

    #[test]
    fn test_key_columns_match_ignoring_case() {
        let uid = Uuid::new_v4();
        let request = MutationRequest::new(employee())
            .set("id", 12)
            .set("uid", uid)
            .set("FirstName", "Ali");

        let insert = request.to_insert();
        assert_eq!(
            insert.text,
            "INSERT INTO \"Acme.Hr.Employee\" (\"uid\",\"FirstName\") VALUES(@P0,@P1) RETURNING *"
        );

        let update = request.to_update().unwrap();
        assert_eq!(
            update.text,
            "UPDATE \"Acme.Hr.Employee\" SET \"FirstName\"=@P0 WHERE \"uid\" = @UId RETURNING *"
        );
        assert_eq!(update.parameters[1], NamedParameter::new("UId", uid));

        let delete = request.to_delete().unwrap();
        assert_eq!(delete.text, "DELETE FROM \"Acme.Hr.Employee\" WHERE \"uid\"=@UId RETURNING *");
    }
}
