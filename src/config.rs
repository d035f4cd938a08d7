use std::io::ErrorKind;

use anyhow::{Context, Result};
use clap::ValueEnum;
use clap_serde_derive::ClapSerde;
use serde::{Deserialize, Serialize};

#[derive(ClapSerde, Debug)]
pub struct Config {
    /// The address the listener binds to
    #[default("0.0.0.0".to_string())]
    #[arg(short, long, env)]
    pub(crate) address: String,

    /// The port the listener binds to
    #[default(5000)]
    #[arg(short, long, env)]
    pub(crate) port: u16,

    /// OTLP collector endpoint, telemetry export is disabled when empty
    #[default(String::new())]
    #[arg(long, env)]
    pub(crate) otel_endpoint: String,

    /// Keep logging to the console while exporting telemetry
    #[default(false)]
    #[arg(long, env)]
    pub(crate) console: bool,

    /// The model served by the predict endpoint
    #[default(ModelKind::Identity)]
    #[arg(short, long, env, value_enum)]
    pub(crate) model: ModelKind,

    /// Weights of the linear model
    #[default("weights.json".to_string())]
    #[arg(short, long, env)]
    pub(crate) weights_file: String,

    /// Maximum accepted request body size in bytes
    #[default(2_000_000)]
    #[arg(long, env)]
    pub(crate) body_limit: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Echoes the `input` field of the request
    Identity,
    /// Dense layer loaded from `weights_file`
    Linear,
}

impl Config {
    /// Reads the configuration file at `path`.
    ///
    /// Only a missing default file is tolerated and yields `None`. Unreadable or invalid files
    /// are errors even when they are the default one.
    pub fn load(path: &str, is_default: bool) -> Result<Option<Self>> {
        match Self::from_toml(path) {
            Ok(config) => Ok(Some(config)),
            Err(err) if is_default && is_not_found(&err) => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read configuration file {}", path))
            }
        }
    }

    pub fn from_toml(path: &str) -> Result<Self> {
        let str = std::fs::read_to_string(path)?;
        Self::parse_toml(&str)
    }

    fn parse_toml(str: &str) -> Result<Self> {
        let opt: <Config as ClapSerde>::Opt = toml::from_str(str)?;
        Ok(Config::from(opt))
    }

    pub fn otel_endpoint(&self) -> Option<&str> {
        Some(self.otel_endpoint.as_str()).filter(|endpoint| !endpoint.is_empty())
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|err| err.kind() == ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!(
            "model_endpoint_{}_{}.toml",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let config = Config::load("/nonexistent/ModelEndpoint.toml", true).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::load("/nonexistent/custom.toml", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to read configuration file /nonexistent/custom.toml"
        );
    }

    #[test]
    fn malformed_default_file_is_an_error() {
        let path = temp_config("malformed", r#"model = "transformer""#);
        let result = Config::load(&path, true);
        std::fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }

    #[test]
    fn existing_default_file_is_loaded() {
        let path = temp_config("valid", "port = 9000");
        let config = Config::load(&path, true).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.unwrap().port, 9000);
    }

    #[test]
    fn defaults_bind_every_interface_on_port_5000() {
        let config = Config::default();
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.model, ModelKind::Identity);
        assert_eq!(config.otel_endpoint(), None);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let config = Config::parse_toml(
            r#"
            port = 8080
            model = "linear"
            weights_file = "/models/churn.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.model, ModelKind::Linear);
        assert_eq!(config.weights_file, "/models/churn.json");
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.body_limit, 2_000_000);
    }

    #[test]
    fn configured_otel_endpoint_is_exposed() {
        let config = Config::parse_toml(r#"otel_endpoint = "http://collector:4317""#).unwrap();
        assert_eq!(config.otel_endpoint(), Some("http://collector:4317"));
    }

    #[test]
    fn unknown_model_kind_is_rejected() {
        assert!(Config::parse_toml(r#"model = "transformer""#).is_err());
    }
}
