//! Tracing subscriber setup. JSON lines in production, human-readable elsewhere.

use crate::config::Environment;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "mango_api=info,tower_http=info";

pub fn init_tracing(environment: Option<Environment>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match environment {
        Some(Environment::Production) => builder.json().try_init(),
        _ => builder.try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}
