//! Runtime configuration from environment.

use glide_core::RoutePlannerConfig;
use std::env;

#[derive(Debug, Clone)]
pub struct CliConfig {
    /// `tracing` filter directives
    pub log_filter: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Overrides the scenario's link budget when set
    pub max_links: Option<usize>,
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self {
            log_filter: env::var("GLIDE_LOG")
                .unwrap_or_else(|_| "glide_core=info,glide_cli=info".to_string()),
            log_json: env::var("GLIDE_LOG_JSON")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            max_links: env::var("GLIDE_MAX_LINKS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0),
        }
    }

    pub fn apply(&self, config: &mut RoutePlannerConfig) {
        if let Some(max_links) = self.max_links {
            config.tuning.max_links = max_links;
        }
    }
}
