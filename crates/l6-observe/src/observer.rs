use async_trait::async_trait;
use cdp_adapter::BrowserPage;

/// Called at every significant transition of a run. Owns no control flow.
#[async_trait]
pub trait TransitionObserver: Send + Sync {
    async fn on_transition(&self, page: &dyn BrowserPage, label: &str);
}

/// Observer that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

#[async_trait]
impl TransitionObserver for NullObserver {
    async fn on_transition(&self, _page: &dyn BrowserPage, _label: &str) {}
}
