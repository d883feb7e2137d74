//! Browser session lifetime.
//!
//! [`with_session`] owns the page for the length of one run and closes it on
//! every exit path: success, failure and interruption.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use cdp_adapter::{AdapterError, BrowserPage, CdpConfig, ChromiumSession};
use tracing::{info, warn};

use crate::errors::RunError;

/// Produces the page a run drives.
#[async_trait]
pub trait Launcher: Send + Sync {
    type Page: BrowserPage + 'static;

    async fn launch(&self) -> Result<Arc<Self::Page>, AdapterError>;
}

/// Launches a local Chromium over the DevTools Protocol.
pub struct ChromiumLauncher {
    config: CdpConfig,
}

impl ChromiumLauncher {
    pub fn new(config: CdpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    type Page = ChromiumSession;

    async fn launch(&self) -> Result<Arc<ChromiumSession>, AdapterError> {
        ChromiumSession::launch(&self.config).await.map(Arc::new)
    }
}

/// Launch a page, run `body` on it and close it afterwards.
///
/// If `shutdown` resolves first the body future is dropped mid-flight and the
/// run ends with [`RunError::Interrupted`]; the page is closed either way.
pub async fn with_session<L, T, F, Fut, S>(
    launcher: &L,
    shutdown: S,
    body: F,
) -> Result<T, RunError>
where
    L: Launcher,
    F: FnOnce(Arc<L::Page>) -> Fut,
    Fut: Future<Output = Result<T, RunError>>,
    S: Future<Output = ()>,
{
    let page = launcher.launch().await.map_err(RunError::Launch)?;
    info!("browser session started");

    let outcome = tokio::select! {
        outcome = body(Arc::clone(&page)) => outcome,
        _ = shutdown => {
            warn!("interrupted, closing browser");
            Err(RunError::Interrupted)
        }
    };

    match page.close().await {
        Ok(()) => info!("browser session closed"),
        Err(err) => warn!(error = %err, "closing browser failed"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::fake::FakePage;
    use cdp_adapter::AdapterErrorKind;
    use std::future::pending;
    use std::time::Duration;

    struct FakeLauncher {
        page: Arc<FakePage>,
        fail: bool,
    }

    #[async_trait]
    impl Launcher for FakeLauncher {
        type Page = FakePage;

        async fn launch(&self) -> Result<Arc<FakePage>, AdapterError> {
            if self.fail {
                return Err(AdapterError::new(AdapterErrorKind::Launch).with_hint("no chrome"));
            }
            Ok(Arc::clone(&self.page))
        }
    }

    fn launcher() -> FakeLauncher {
        FakeLauncher {
            page: Arc::new(FakePage::new()),
            fail: false,
        }
    }

    #[tokio::test]
    async fn closes_after_success() {
        let launcher = launcher();
        let value = with_session(&launcher, pending(), |page| async move {
            page.navigate("https://crm.test").await?;
            Ok::<_, RunError>(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(launcher.page.close_count(), 1);
    }

    #[tokio::test]
    async fn closes_after_failure() {
        let launcher = launcher();
        let err = with_session(&launcher, pending(), |_page| async move {
            Err::<(), _>(RunError::Flow(action_flow::FlowError::ConfirmationNotFound {
                tried: vec!["export-confirm".into()],
            }))
        })
        .await
        .unwrap_err();
        assert_eq!(err.stage(), "export");
        assert_eq!(launcher.page.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn interruption_drops_the_body_and_closes() {
        let launcher = launcher();
        let err = with_session(
            &launcher,
            tokio::time::sleep(Duration::from_secs(1)),
            |_page| async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RunError::Interrupted));
        assert_eq!(err.exit_code(), 130);
        assert_eq!(launcher.page.close_count(), 1);
    }

    #[tokio::test]
    async fn launch_failure_skips_the_body() {
        let launcher = FakeLauncher {
            page: Arc::new(FakePage::new()),
            fail: true,
        };
        let err = with_session(&launcher, pending(), |page| async move {
            page.navigate("https://crm.test").await?;
            Ok::<_, RunError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RunError::Launch(_)));
        assert!(launcher.page.actions().is_empty());
        assert_eq!(launcher.page.close_count(), 0);
    }
}
