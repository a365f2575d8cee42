//! Browser-backed page snapshots over the Chrome `DevTools` Protocol.
//!
//! The CDP surface used is deliberately small: launch, navigate,
//! evaluate, close. Every DOM read happens inside one injected
//! JavaScript routine, so a page visit costs a single evaluation
//! round-trip regardless of element count.
//!
//! The real implementation (chromiumoxide) compiles behind the
//! `browser` feature; the configuration type is always available so
//! callers can build configs without it.

use crate::result::AuditError;

/// Browser launch configuration.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Navigation/readiness timeout in milliseconds
    pub nav_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            window_width: 1366,
            window_height: 768,
            nav_timeout_ms: 30_000,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set chromium binary path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set window dimensions
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set the navigation timeout
    #[must_use]
    pub const fn with_nav_timeout_ms(mut self, ms: u64) -> Self {
        self.nav_timeout_ms = ms;
        self
    }

    /// Validate that an explicitly-configured binary exists.
    pub(crate) fn check_binary(&self) -> Result<(), AuditError> {
        if let Some(path) = &self.chromium_path {
            if !std::path::Path::new(path).exists() {
                return Err(AuditError::BrowserNotFound);
            }
        }
        Ok(())
    }
}

/// Per-element read routine plus the snapshot collector. Runs as one
/// expression in page context and returns the serde shape of
/// [`PageSnapshot`](crate::audit::PageSnapshot). A failing per-element
/// read yields an `error` record for that element only; the scan
/// itself never throws.
const SNAPSHOT_BODY: &str = r"
function readOne(el) {
    try {
        const style = window.getComputedStyle(el);
        const visible = style.display !== 'none' && style.visibility !== 'hidden';
        const attr = (name) => el.getAttribute(name);
        const byId = (id) => (id ? document.getElementById(id) : null);
        const labelledbyTarget = byId(attr('aria-labelledby'));
        const forTarget = byId(attr('for'));
        const img = el.querySelector('img[alt]');
        return {
            tag: el.tagName.toLowerCase(),
            id: el.id || null,
            visibleText: visible ? (el.innerText || '') : '',
            innerText: el.innerText || '',
            textContent: el.textContent || '',
            alt: attr('alt'),
            ariaLabel: attr('aria-label'),
            ariaLabelledby: attr('aria-labelledby'),
            labelledbyText: labelledbyTarget ? labelledbyTarget.textContent : null,
            forAttr: attr('for'),
            forPlaceholder: forTarget ? forTarget.getAttribute('placeholder') : null,
            imgAlt: img ? img.getAttribute('alt') : null,
            locator: buildLocator(el),
        };
    } catch (e) {
        return {
            tag: el && el.tagName ? el.tagName.toLowerCase() : '',
            error: String(e),
        };
    }
}
const tags = ['h1', 'h2', 'h3', 'h4', 'h5', 'h6', 'label'];
const elements = [];
for (const tag of tags) {
    for (const el of document.querySelectorAll(tag)) {
        elements.push(readOne(el));
    }
}
return {
    html: document.documentElement.outerHTML,
    elements: elements,
};
";

/// The full snapshot expression: locator builder plus collector,
/// wrapped as an immediately-invoked expression.
#[must_use]
pub fn snapshot_script() -> String {
    [
        "(() => {",
        crate::locator::BUILD_LOCATOR_JS,
        SNAPSHOT_BODY,
        "})()",
    ]
    .concat()
}

#[cfg(feature = "browser")]
pub use self::cdp::BrowserSession;

#[cfg(feature = "browser")]
mod cdp {
    use std::time::Duration;

    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use tempfile::TempDir;
    use tracing::{debug, info, warn};

    use super::{snapshot_script, BrowserConfig};
    use crate::audit::{DomSource, PageSnapshot};
    use crate::result::{AuditError, AuditResult};

    /// Flags matching the original tool's launch hardening; keeps the
    /// browser quiet and self-contained in CI containers.
    const LAUNCH_ARGS: &[&str] = &[
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-software-rasterizer",
        "--no-first-run",
        "--no-default-browser-check",
        "--disable-background-networking",
        "--disable-sync",
    ];

    const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

    /// A live browser session backed by chromiumoxide.
    ///
    /// Holds a dedicated temp profile directory for the lifetime of
    /// the session; it is removed when the session drops.
    #[derive(Debug)]
    pub struct BrowserSession {
        config: BrowserConfig,
        browser: CdpBrowser,
        #[allow(dead_code)]
        handle: tokio::task::JoinHandle<()>,
        _profile: TempDir,
        closed: bool,
    }

    impl BrowserSession {
        /// Launch a browser with the given configuration.
        pub async fn launch(config: BrowserConfig) -> AuditResult<Self> {
            config.check_binary()?;
            let profile = TempDir::new()?;

            let mut builder = CdpConfig::builder()
                .window_size(config.window_width, config.window_height)
                .user_data_dir(profile.path())
                .args(LAUNCH_ARGS.to_vec());

            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(path) = &config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(|e| AuditError::BrowserLaunch {
                message: e.to_string(),
            })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| AuditError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            info!(headless = config.headless, "browser session launched");
            Ok(Self {
                config,
                browser,
                handle,
                _profile: profile,
                closed: false,
            })
        }

        /// Poll until the document is loaded and a body exists, or the
        /// configured timeout elapses.
        async fn wait_for_document(&self, page: &CdpPage) -> AuditResult<()> {
            let deadline =
                tokio::time::Instant::now() + Duration::from_millis(self.config.nav_timeout_ms);
            loop {
                let ready = page
                    .evaluate("document.readyState === 'complete' && document.body !== null")
                    .await
                    .ok()
                    .and_then(|v| v.into_value::<bool>().ok())
                    .unwrap_or(false);
                if ready {
                    return Ok(());
                }
                if tokio::time::Instant::now() >= deadline {
                    return Err(AuditError::Timeout {
                        ms: self.config.nav_timeout_ms,
                    });
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        }
    }

    #[async_trait]
    impl DomSource for BrowserSession {
        async fn snapshot(&mut self, url: &str) -> AuditResult<PageSnapshot> {
            if self.closed {
                return Err(AuditError::InvalidState {
                    message: "session already closed".to_string(),
                });
            }

            let page = self.browser.new_page("about:blank").await.map_err(|e| {
                AuditError::BrowserLaunch {
                    message: e.to_string(),
                }
            })?;

            info!(url, "navigating");
            page.goto(url).await.map_err(|e| AuditError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
            self.wait_for_document(&page).await?;

            let snapshot: PageSnapshot = page
                .evaluate(snapshot_script())
                .await
                .map_err(|e| AuditError::Evaluation {
                    message: e.to_string(),
                })?
                .into_value()
                .map_err(|e| AuditError::Evaluation {
                    message: e.to_string(),
                })?;
            debug!(elements = snapshot.elements.len(), "snapshot evaluated");

            if let Err(e) = page.close().await {
                warn!(error = %e, "page close failed");
            }
            Ok(snapshot)
        }

        async fn close(&mut self) -> AuditResult<()> {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            self.browser
                .close()
                .await
                .map_err(|e| AuditError::InvalidState {
                    message: e.to_string(),
                })?;
            Ok(())
        }
    }
}
