//! Uniform result envelope returned by every insert/select/update/delete.

use crate::error::ExecutionError;
use crate::mapper::Row;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryOperation {
    Insert,
    Select,
    Update,
    Delete,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InsertResult {
    /// The stored row, when the insert asked for it back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted: Option<Row>,
    pub rows_inserted: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UpdateResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<Vec<Row>>,
    pub rows_updated: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeleteResult {
    pub rows_deleted: u64,
}

/// Outcome of one statement. Built once per call and never changed; a database
/// failure is carried in `failure` with a default payload.
#[derive(Debug)]
pub struct OperationResult<P> {
    executed_statement: String,
    operation: QueryOperation,
    failure: Option<ExecutionError>,
    successful: bool,
    payload: P,
}

impl<P: Default> OperationResult<P> {
    pub(crate) fn succeeded(executed_statement: String, operation: QueryOperation, payload: P) -> Self {
        OperationResult {
            executed_statement,
            operation,
            failure: None,
            successful: true,
            payload,
        }
    }

    pub(crate) fn failed(executed_statement: String, operation: QueryOperation, failure: ExecutionError) -> Self {
        OperationResult {
            executed_statement,
            operation,
            failure: Some(failure),
            successful: false,
            payload: P::default(),
        }
    }
}

impl<P> OperationResult<P> {
    /// SQL text with placeholders, exactly as sent.
    pub fn executed_statement(&self) -> &str {
        &self.executed_statement
    }

    pub fn operation(&self) -> QueryOperation {
        self.operation
    }

    pub fn failure(&self) -> Option<&ExecutionError> {
        self.failure.as_ref()
    }

    pub fn successful(&self) -> bool {
        self.successful
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    /// The payload, or the captured failure.
    pub fn into_result(self) -> Result<P, ExecutionError> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(self.payload),
        }
    }
}
