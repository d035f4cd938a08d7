use serde::{Deserialize, Serialize};

use crate::config::ModelKind;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModelBase {
    /// The name of the model, reported in logs
    pub name: String,

    /// The kind of model behind the predict endpoint
    pub kind: ModelKind,
}
