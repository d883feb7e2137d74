use once_cell::sync::OnceCell;
use tracing::{span, Level, Span};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

static INIT: OnceCell<()> = OnceCell::new();

/// Output options for the process-wide subscriber.
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_level: String,
    pub json: bool,
    pub ansi: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            json: false,
            ansi: true,
        }
    }
}

/// Install the global subscriber once; later calls are no-ops.
pub fn init_tracing(options: &TracingOptions) {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(options.default_level.as_str()));
        let fmt_layer = if options.json {
            fmt::layer()
                .json()
                .with_target(false)
                .with_current_span(true)
                .boxed()
        } else {
            fmt::layer()
                .with_ansi(options.ansi)
                .with_target(false)
                .boxed()
        };
        let subscriber = Registry::default().with(filter).with(fmt_layer);
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

pub fn run_span(recipe: &str) -> Span {
    span!(Level::INFO, "run", recipe = %recipe)
}

pub fn stage_span(stage: &str) -> Span {
    span!(Level::INFO, "stage", stage = %stage)
}
