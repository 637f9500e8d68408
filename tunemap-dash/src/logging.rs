//! Tracing setup
//!
//! The subscriber is installed before configuration is resolved, so config
//! fallback warnings are visible. The filter starts from `RUST_LOG` (or
//! `info`) and is swapped for the configured level once the config is known,
//! unless `RUST_LOG` was set.

use tracing::{debug, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Level used until the configured one is applied
pub const DEFAULT_LEVEL: &str = "info";

/// Handle for changing the log filter after startup
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    pinned_by_env: bool,
}

impl LogControl {
    /// Switch to the configured level; a `RUST_LOG` filter always wins
    pub fn apply_config_level(&self, level: &str) -> Result<(), reload::Error> {
        if self.pinned_by_env {
            debug!("RUST_LOG set, ignoring configured level '{}'", level);
            return Ok(());
        }
        self.handle.reload(EnvFilter::new(level))?;
        debug!("Log level set to '{}' from config", level);
        Ok(())
    }
}

/// Build the subscriber writing to `writer`, with `env` as the pinned filter if given
pub fn subscriber<W>(writer: W, env: Option<EnvFilter>) -> (impl Subscriber + Send + Sync + 'static, LogControl)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let pinned_by_env = env.is_some();
    let (filter, handle) = reload::Layer::new(env.unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL)));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));
    (subscriber, LogControl { handle, pinned_by_env })
}

/// Install the global stderr subscriber
pub fn init() -> LogControl {
    let (subscriber, control) = subscriber(std::io::stderr, EnvFilter::try_from_default_env().ok());
    subscriber.init();
    control
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tracing::{info, warn};
    use tunemap_common::config::{ConfigResolver, CONFIG_ENV_VAR};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    #[serial]
    fn test_missing_config_warning_reaches_subscriber() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        std::env::set_var(CONFIG_ENV_VAR, &missing);

        let buffer = Buffer::default();
        let writer = buffer.clone();
        let (subscriber, _control) = subscriber(move || writer.clone(), None);
        let config = tracing::subscriber::with_default(subscriber, || ConfigResolver::new(None).load());
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.unwrap().logging.level, DEFAULT_LEVEL);
        let text = buffer.text();
        assert!(text.contains("WARN"), "got: {}", text);
        assert!(text.contains("not found, using compiled defaults"), "got: {}", text);
    }

    #[test]
    fn test_config_level_applied_after_startup() {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let (subscriber, control) = subscriber(move || writer.clone(), None);

        tracing::subscriber::with_default(subscriber, || {
            info!("before reload");
            control.apply_config_level("warn").unwrap();
            info!("after reload");
            warn!("still shown");
        });

        let text = buffer.text();
        assert!(text.contains("before reload"));
        assert!(!text.contains("after reload"));
        assert!(text.contains("still shown"));
    }

    #[test]
    fn test_rust_log_filter_is_not_replaced() {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let (subscriber, control) = subscriber(move || writer.clone(), Some(EnvFilter::new("debug")));

        tracing::subscriber::with_default(subscriber, || {
            control.apply_config_level("error").unwrap();
            info!("kept at debug");
        });

        assert!(buffer.text().contains("kept at debug"));
    }
}
