//! Data service fake for page tests.

use async_trait::async_trait;
use roofclaim_platform_access::{DataError, DataService, Filter, Row};
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves fixed rows matching the filter, or fails every call with one error.
#[derive(Default)]
pub(crate) struct StaticData {
    rows: Vec<Row>,
    failure: Option<DataError>,
    rpc_result: Value,
    reads: AtomicUsize,
    inserted: Mutex<Vec<(String, Row)>>,
    written: Mutex<Vec<(String, Filter, Row)>>,
}

impl StaticData {
    pub(crate) fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub(crate) fn failing(err: DataError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    pub(crate) fn with_rpc_result(value: Value) -> Self {
        Self {
            rpc_result: value,
            ..Self::default()
        }
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn inserted(&self) -> Vec<(String, Row)> {
        self.inserted.lock().unwrap().clone()
    }

    pub(crate) fn written(&self) -> Vec<(String, Filter, Row)> {
        self.written.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), DataError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataService for StaticData {
    async fn read(&self, _table: &str, filter: &Filter) -> Result<Vec<Row>, DataError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }

    async fn write(
        &self,
        table: &str,
        filter: &Filter,
        patch: Row,
    ) -> Result<Vec<Row>, DataError> {
        self.check()?;
        self.written
            .lock()
            .unwrap()
            .push((table.to_string(), filter.clone(), patch.clone()));
        Ok(vec![patch])
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, DataError> {
        self.check()?;
        let mut inserted = self.inserted.lock().unwrap();
        for row in &rows {
            inserted.push((table.to_string(), row.clone()));
        }
        Ok(rows)
    }

    async fn rpc(&self, _function: &str, _args: Row) -> Result<Value, DataError> {
        self.check()?;
        Ok(self.rpc_result.clone())
    }
}
