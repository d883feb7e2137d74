//! Launch configuration for the Chromium session.

use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};
use which::which;

/// Desktop user agent presented to the CRM; its login page rejects some headless defaults.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Configuration for launching and tuning the adapter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CdpConfig {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub no_sandbox: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
    pub ignore_https_errors: bool,
    pub default_deadline_ms: u64,
    pub extra_args: Vec<String>,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: detect_chrome_executable(),
            headless: true,
            no_sandbox: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ignore_https_errors: true,
            default_deadline_ms: 60_000,
            extra_args: Vec::new(),
        }
    }
}

impl CdpConfig {
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        if executable.is_some() {
            self.executable = executable;
        }
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline_ms = deadline.as_millis() as u64;
        self
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.default_deadline_ms)
    }

    /// Command-line switches passed to Chromium on launch.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            format!("--user-agent={}", self.user_agent),
        ];
        if self.ignore_https_errors {
            args.push("--ignore-certificate-errors".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Locate a Chrome/Chromium binary: `CHROME_PATH` first, then `PATH`, then well-known paths.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("CHROME_PATH") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "freebsd")))]
    {
        Vec::new()
    }
}
