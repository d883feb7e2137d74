//! Chromium-backed [`BrowserPage`] built on chromiumoxide.
//!
//! Element handles are resolved in-page through [`Selector::to_js`]. Reads and
//! synthetic events stay in JavaScript; clicks and keystrokes go through the
//! DevTools input domain so the page sees trusted events.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::page::{BrowserPage, DomEvent, ElementRef};
use crate::selector::{js_string, Selector};

const REF_ATTR: &str = "data-crm-export-ref";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A launched Chromium process with a single page.
pub struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    deadline: Duration,
}

impl ChromiumSession {
    pub async fn launch(config: &CdpConfig) -> Result<Self, AdapterError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(config.deadline())
            .launch_timeout(Duration::from_secs(20))
            .window_size(config.window_width, config.window_height)
            .args(config.launch_args());

        if !config.headless {
            builder = builder.with_head();
        }
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder.build().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch)
                .with_hint(format!("browser config error: {err}"))
        })?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch)
                .with_hint(format!("failed to launch chromium: {err}"))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "cdp handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler.abort();
                return Err(AdapterError::cdp(err));
            }
        };

        info!(
            headless = config.headless,
            width = config.window_width,
            height = config.window_height,
            "chromium session launched"
        );

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
            deadline: config.deadline(),
        })
    }

    /// Evaluate `body` with `el` bound to the referenced element (or undefined).
    async fn eval_on(&self, element: &ElementRef, body: &str) -> Result<Value, AdapterError> {
        let script = format!(
            "(() => {{ const el = ({})[{}]; {} }})()",
            element.selector.to_js(),
            element.index,
            body
        );
        self.evaluate(&script).await
    }

    /// Tag the referenced element and fetch it as a native handle.
    async fn native(&self, element: &ElementRef) -> Result<Element, AdapterError> {
        let tag = Uuid::new_v4().simple().to_string();
        let found = self
            .eval_on(
                element,
                &format!(
                    "if (!el) return false; el.setAttribute({}, {}); return true;",
                    js_string(REF_ATTR),
                    js_string(&tag)
                ),
            )
            .await?;
        if found != Value::Bool(true) {
            return Err(AdapterError::not_found(element.to_string()));
        }
        self.page
            .find_element(format!("[{}=\"{}\"]", REF_ATTR, tag))
            .await
            .map_err(AdapterError::cdp)
    }

    async fn with_deadline<T, F>(&self, what: &str, limit: Duration, fut: F) -> Result<T, AdapterError>
    where
        F: std::future::Future<Output = Result<T, AdapterError>>,
    {
        match timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::timeout(format!(
                "{} exceeded {}ms",
                what,
                limit.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl BrowserPage for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        debug!(url, "navigating");
        match timeout(self.deadline, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(AdapterError::cdp(err)),
            Err(_) => Err(AdapterError::new(AdapterErrorKind::NavTimeout)
                .with_hint(format!("navigation to {url} exceeded {}ms", self.deadline.as_millis()))),
        }
    }

    async fn wait_for_network_idle(&self, limit: Duration) -> Result<(), AdapterError> {
        self.with_deadline("wait for load", limit, async {
            self.page
                .wait_for_navigation()
                .await
                .map_err(AdapterError::cdp)?;
            loop {
                let state = self.evaluate("document.readyState").await?;
                if state.as_str() == Some("complete") {
                    return Ok(());
                }
                sleep(POLL_INTERVAL).await;
            }
        })
        .await
    }

    async fn query_all(&self, selector: &Selector) -> Result<Vec<ElementRef>, AdapterError> {
        let count = self
            .evaluate(&format!("({}).length", selector.to_js()))
            .await?
            .as_u64()
            .unwrap_or(0) as usize;
        Ok((0..count)
            .map(|index| ElementRef::new(selector.clone(), index))
            .collect())
    }

    async fn is_visible(&self, element: &ElementRef, limit: Duration) -> Result<bool, AdapterError> {
        let started = Instant::now();
        loop {
            let visible = self
                .eval_on(
                    element,
                    "if (!el) return false; \
                     const style = window.getComputedStyle(el); \
                     const rect = el.getBoundingClientRect(); \
                     return style.visibility !== 'hidden' && style.display !== 'none' \
                        && rect.width > 0 && rect.height > 0;",
                )
                .await?;
            if visible == Value::Bool(true) {
                return Ok(true);
            }
            if started.elapsed() >= limit {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, AdapterError> {
        let enabled = self
            .eval_on(
                element,
                "if (!el) return false; return !el.disabled && el.getAttribute('aria-disabled') !== 'true';",
            )
            .await?;
        Ok(enabled == Value::Bool(true))
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, AdapterError> {
        let value = self
            .eval_on(
                element,
                &format!("return el ? el.getAttribute({}) : null;", js_string(name)),
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn click(&self, element: &ElementRef, limit: Duration) -> Result<(), AdapterError> {
        self.with_deadline("click", limit, async {
            let native = self.native(element).await?;
            native.scroll_into_view().await.map_err(AdapterError::cdp)?;
            native.click().await.map_err(AdapterError::cdp)?;
            Ok(())
        })
        .await
    }

    async fn fill(&self, element: &ElementRef, value: &str) -> Result<(), AdapterError> {
        let native = self.native(element).await?;
        native.focus().await.map_err(AdapterError::cdp)?;
        self.eval_on(
            element,
            "if (el) { el.value = ''; el.dispatchEvent(new Event('input', { bubbles: true })); } return null;",
        )
        .await?;
        if !value.is_empty() {
            native.type_str(value).await.map_err(AdapterError::cdp)?;
        }
        Ok(())
    }

    async fn press(&self, element: &ElementRef, key: &str) -> Result<(), AdapterError> {
        let native = self.native(element).await?;
        native.press_key(key).await.map_err(AdapterError::cdp)?;
        Ok(())
    }

    async fn input_value(&self, element: &ElementRef) -> Result<Option<String>, AdapterError> {
        let value = self
            .eval_on(element, "return el && 'value' in el ? el.value : null;")
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn dispatch_event(&self, element: &ElementRef, event: DomEvent) -> Result<(), AdapterError> {
        let dispatched = self
            .eval_on(
                element,
                &format!(
                    "if (!el) return false; el.dispatchEvent(new Event({}, {{ bubbles: true }})); return true;",
                    js_string(event.name())
                ),
            )
            .await?;
        if dispatched != Value::Bool(true) {
            return Err(AdapterError::not_found(element.to_string()));
        }
        Ok(())
    }

    async fn click_body(&self) -> Result<(), AdapterError> {
        // A synthetic click avoids landing on whatever control sits at the body's centre.
        self.evaluate(
            "(() => { const active = document.activeElement; \
             if (active && active !== document.body && active.blur) active.blur(); \
             for (const type of ['mousedown', 'mouseup', 'click']) \
               document.body.dispatchEvent(new MouseEvent(type, { bubbles: true })); \
             return null; })()",
        )
        .await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError> {
        let result = self.page.evaluate(script).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Script).with_hint(err.to_string())
        })?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        self.page
            .screenshot(ScreenshotParams::builder().build())
            .await
            .map_err(AdapterError::cdp)
    }

    async fn close(&self) -> Result<(), AdapterError> {
        let browser = self.browser.lock().await.take();
        let result = match browser {
            Some(mut browser) => {
                let closed = browser.close().await.map(|_| ()).map_err(AdapterError::cdp);
                if let Err(err) = browser.wait().await {
                    warn!(error = %err, "waiting for chromium exit failed");
                }
                closed
            }
            None => Err(AdapterError::new(AdapterErrorKind::Closed)),
        };
        self.handler.abort();
        info!("chromium session closed");
        result
    }
}
