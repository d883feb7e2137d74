//! CRM login form.

use std::time::Duration;

use action_flow::{execute, ExhaustedRetries, RetryPolicy};
use cdp_adapter::{first_css, AdapterError, BrowserPage};
use l6_observe::TransitionObserver;
use tracing::{debug, info};

use crate::config::Credentials;

pub const USERNAME_INPUT: &str = r#"input[name="formularioLogin:username"]"#;
pub const PASSWORD_INPUT: &str = r#"input[name="formularioLogin:password"]"#;
pub const SUBMIT_BUTTON: &str = r#"button[type="submit"]"#;

/// Wait after loading the login page before touching the form
pub const LOGIN_PAGE_SETTLE: Duration = Duration::from_secs(2);

pub struct Login<'a> {
    url: &'a str,
    credentials: &'a Credentials,
    observer: &'a dyn TransitionObserver,
    timeout: Duration,
}

impl<'a> Login<'a> {
    pub fn new(
        url: &'a str,
        credentials: &'a Credentials,
        observer: &'a dyn TransitionObserver,
        timeout: Duration,
    ) -> Self {
        Self {
            url,
            credentials,
            observer,
            timeout,
        }
    }

    /// One login attempt from a fresh navigation.
    pub async fn attempt(&self, page: &dyn BrowserPage) -> Result<(), AdapterError> {
        page.navigate(self.url).await?;
        tokio::time::sleep(LOGIN_PAGE_SETTLE).await;
        self.observer.on_transition(page, "login_page").await;

        let username = first_css(page, USERNAME_INPUT).await?;
        page.fill(&username, &self.credentials.username).await?;
        let password = first_css(page, PASSWORD_INPUT).await?;
        page.fill(&password, &self.credentials.password).await?;
        debug!(username = %self.credentials.username, "credentials filled");
        self.observer.on_transition(page, "credentials_filled").await;

        let submit = first_css(page, SUBMIT_BUTTON).await?;
        page.click(&submit, self.timeout).await?;
        page.wait_for_network_idle(self.timeout).await?;
        self.observer.on_transition(page, "after_login").await;
        Ok(())
    }

    /// Log in, retrying the whole form under `policy`.
    pub async fn run(
        &self,
        page: &dyn BrowserPage,
        policy: &RetryPolicy,
    ) -> Result<(), ExhaustedRetries<AdapterError>> {
        execute("login", policy, |attempt| {
            debug!(attempt, url = %self.url, "login attempt");
            self.attempt(page)
        })
        .await?;
        info!(url = %self.url, "logged in");
        Ok(())
    }
}
