use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::inference::prediction::Prediction;

#[derive(Deserialize, Serialize, Debug)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: Value,
}

/// A model that can be served by the predict endpoint.
///
/// The request body is handed over untouched, so the expected input layout is defined by each
/// model. Implementations are shared across request handlers and must not rely on `&mut self`.
pub trait PredictHandler: Send + Sync {
    fn name(&self) -> &str;

    fn run_predict(&self, input: &Value) -> Result<Prediction>;
}

/// Bodies carrying no data: null, false, zero, or an empty string, list or object.
pub fn is_empty_input(input: &Value) -> bool {
    match input {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(str) => str.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
