use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::inference::models::model::ModelBase;
use crate::inference::prediction::Prediction;
use crate::inference::task::predict::PredictHandler;

/// Placeholder model returning the `input` field of the request unchanged.
#[derive(Clone, Debug)]
pub struct IdentityModel {
    pub base: ModelBase,
}

impl IdentityModel {
    pub fn new(base: &ModelBase) -> Self {
        Self { base: base.clone() }
    }
}

impl PredictHandler for IdentityModel {
    fn name(&self) -> &str {
        &self.base.name
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    fn run_predict(&self, input: &Value) -> Result<Prediction> {
        let output = input
            .get("input")
            .cloned()
            .ok_or_else(|| anyhow!("Missing field 'input'"))?;
        Ok(Prediction::Value(output))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ModelKind;

    fn model() -> IdentityModel {
        IdentityModel::new(&ModelBase {
            name: "identity".into(),
            kind: ModelKind::Identity,
        })
    }

    #[test]
    fn echoes_the_input_field() {
        let out = model()
            .run_predict(&json!({"input": {"text": "hello", "n": [1, 2]}}))
            .unwrap()
            .into_json()
            .unwrap();
        assert_eq!(out, json!({"text": "hello", "n": [1, 2]}));
    }

    #[test]
    fn missing_input_field_fails() {
        let err = model().run_predict(&json!({"data": 1})).unwrap_err();
        assert_eq!(err.to_string(), "Missing field 'input'");
    }
}
