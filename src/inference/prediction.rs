use anyhow::Result;
use candle_core::{DType, Tensor};
use serde_json::Value;

/// Output of a model before it is written to the response body.
#[derive(Debug)]
pub enum Prediction {
    /// Already JSON, sent as is
    Value(Value),
    /// Numeric array, sent as a nested list following the tensor shape
    Tensor(Tensor),
}

impl Prediction {
    pub fn into_json(self) -> Result<Value> {
        match self {
            Prediction::Value(value) => Ok(value),
            Prediction::Tensor(tensor) => tensor_to_json(&tensor),
        }
    }
}

impl From<Value> for Prediction {
    fn from(value: Value) -> Self {
        Prediction::Value(value)
    }
}

impl From<Tensor> for Prediction {
    fn from(tensor: Tensor) -> Self {
        Prediction::Tensor(tensor)
    }
}

fn tensor_to_json(tensor: &Tensor) -> Result<Value> {
    let flat = tensor.flatten_all()?;
    let leaves: Vec<Value> = match tensor.dtype() {
        DType::U8 | DType::U32 | DType::I64 => flat
            .to_dtype(DType::I64)?
            .to_vec1::<i64>()?
            .into_iter()
            .map(Value::from)
            .collect(),
        // Non-finite floats map to null
        _ => flat
            .to_dtype(DType::F64)?
            .to_vec1::<f64>()?
            .into_iter()
            .map(Value::from)
            .collect(),
    };

    Ok(nest(tensor.dims(), &mut leaves.into_iter()))
}

fn nest(dims: &[usize], leaves: &mut impl Iterator<Item = Value>) -> Value {
    match dims.split_first() {
        None => leaves.next().unwrap_or(Value::Null),
        Some((&len, rest)) => Value::Array((0..len).map(|_| nest(rest, leaves)).collect()),
    }
}
