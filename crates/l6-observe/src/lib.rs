pub mod errors;
pub mod observer;
pub mod screenshots;
pub mod tracing;

pub use errors::ObserveError;
pub use observer::{NullObserver, TransitionObserver};
pub use screenshots::{sanitize_label, ScreenshotSink};
pub use self::tracing::{init_tracing, run_span, stage_span, TracingOptions};
