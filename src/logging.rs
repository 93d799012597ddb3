//! `env_logger` setup for the viewer

use std::sync::Once;

use env_logger::{Builder, WriteStyle};

use crate::config::RenderConfig;

/// Filter used when neither the config nor `RUST_LOG` names one
pub const DEFAULT_FILTER: &str = "info";

static INIT: Once = Once::new();

/// The config's `log_filter`, else `RUST_LOG`, else `info`
pub fn log_filter(config: &RenderConfig, env: Option<String>) -> String {
    config
        .log_filter
        .clone()
        .or(env)
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global logger once. A logger installed elsewhere first (a
/// test harness, say) is left alone.
pub fn init_logging(config: &RenderConfig) {
    INIT.call_once(|| {
        let filter = log_filter(config, std::env::var("RUST_LOG").ok());
        let installed = Builder::new()
            .parse_filters(&filter)
            .write_style(WriteStyle::Auto)
            .format_timestamp_millis()
            .try_init();
        match installed {
            Ok(()) => log::debug!("logging to stderr with filter {:?}", filter),
            Err(e) => log::debug!("keeping existing logger: {}", e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        let mut config = RenderConfig::default();
        assert_eq!(log_filter(&config, None), DEFAULT_FILTER);
        assert_eq!(log_filter(&config, Some("warn".to_string())), "warn");

        config.log_filter = Some("mini3d=trace".to_string());
        assert_eq!(log_filter(&config, Some("warn".to_string())), "mini3d=trace");
    }

    #[test]
    fn test_init_is_repeatable() {
        let config = RenderConfig::default();
        init_logging(&config);
        init_logging(&config);
        log::info!("still logging");
    }
}
