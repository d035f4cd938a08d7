use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{Config, ModelKind};
use crate::inference::models::identity::IdentityModel;
use crate::inference::models::linear::LinearModel;
use crate::inference::models::model::ModelBase;
use crate::inference::task::predict::PredictHandler;

pub mod models;
pub mod prediction;
pub mod task;

/// Builds the model selected in the configuration.
#[tracing::instrument(level = "info", skip(config))]
pub fn load_model(config: &Config) -> Result<Arc<dyn PredictHandler>> {
    let model: Arc<dyn PredictHandler> = match config.model {
        ModelKind::Identity => Arc::new(IdentityModel::new(&ModelBase {
            name: "Identity".into(),
            kind: ModelKind::Identity,
        })),
        ModelKind::Linear => Arc::new(LinearModel::from_file(
            &ModelBase {
                name: format!("Linear ({})", config.weights_file),
                kind: ModelKind::Linear,
            },
            &config.weights_file,
        )?),
    };
    info!("Loaded model {}", model.name());
    Ok(model)
}
