use std::env;
use std::error;

use reqwest::Url;
use serde::Deserialize;

#[derive(Deserialize)]
struct HealthStatus {
    status: String,
}

fn is_healthy(body: &str) -> bool {
    serde_json::from_str::<HealthStatus>(body).is_ok_and(|health| health.status == "healthy")
}

fn main() -> Result<(), Box<dyn error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        panic!("Missing URL argument")
    }

    let url = Url::parse(&args[1])?;

    let res = reqwest::blocking::get(url)?;
    if !res.status().is_success() {
        panic!("Request failed with status {}", res.status())
    }
    if !is_healthy(&res.text()?) {
        panic!("Service reported unhealthy status")
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_body_passes() {
        assert!(is_healthy(r#"{"status": "healthy"}"#));
    }

    #[test]
    fn other_bodies_fail() {
        assert!(!is_healthy(r#"{"status": "starting"}"#));
        assert!(!is_healthy("ok"));
        assert!(!is_healthy(""));
    }
}
