//! Headless browser rendering for the fallback fetch path
//!
//! One browser session is launched per crawl run and shared by every fallback
//! fetch. Navigations are serialised through an async mutex because a single
//! Chrome instance is driven over one CDP connection. The session must be
//! released with [`PageRenderer::close`]; dropping it without closing still
//! stops the CDP handler task and lets chromiumoxide kill the child process.

use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::Browser;
use futures::StreamExt;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Errors raised by the browser fallback path
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Failed to read rendered document for {url}: {message}")]
    Content { url: String, message: String },

    #[error("Browser session is closed")]
    Closed,

    #[error("Failed to shut down browser: {0}")]
    Shutdown(String),
}

/// Loads a URL with client-side scripts executed and returns the rendered HTML
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Navigates to `url`, waits for rendering to settle, and returns the DOM
    async fn render(&self, url: &str) -> Result<String, RenderError>;

    /// Releases the underlying session; later renders fail with `Closed`
    async fn close(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// A headless Chrome session driven over CDP
pub struct ChromeSession {
    browser: Mutex<Option<Browser>>,
    handler: StdMutex<Option<JoinHandle<()>>>,
    settle_time: Duration,
    navigation_timeout: Duration,
}

impl ChromeSession {
    /// Launches a headless Chrome instance
    ///
    /// # Arguments
    ///
    /// * `config` - Browser settings (executable, settle time, timeouts)
    ///
    /// # Returns
    ///
    /// * `Ok(ChromeSession)` - A running session
    /// * `Err(RenderError::Launch)` - Chrome could not be found or started
    pub async fn launch(config: &BrowserConfig) -> Result<Self, RenderError> {
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .request_timeout(config.navigation_timeout());

        if let Some(executable) = &config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        let browser_config = builder.build().map_err(RenderError::Launch)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler event error: {}", e);
                }
            }
        });

        tracing::info!("Headless browser launched");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: StdMutex::new(Some(handler_task)),
            settle_time: config.settle_time(),
            navigation_timeout: config.navigation_timeout(),
        })
    }

    fn stop_handler(&self) {
        let handle = match self.handler.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

#[async_trait]
impl PageRenderer for ChromeSession {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        // Held for the whole navigation: one page at a time per session
        let guard = self.browser.lock().await;
        let browser = guard.as_ref().ok_or(RenderError::Closed)?;

        let page = tokio::time::timeout(self.navigation_timeout, browser.new_page(url))
            .await
            .map_err(|_| RenderError::Timeout {
                url: url.to_string(),
                timeout: self.navigation_timeout,
            })?
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        tokio::time::sleep(self.settle_time).await;

        let content = page.content().await.map_err(|e| RenderError::Content {
            url: url.to_string(),
            message: e.to_string(),
        });

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close browser tab for {}: {}", url, e);
        }

        content
    }

    async fn close(&self) -> Result<(), RenderError> {
        let browser = self.browser.lock().await.take();

        let result = match browser {
            Some(mut browser) => {
                let closed = browser
                    .close()
                    .await
                    .map(|_| ())
                    .map_err(|e| RenderError::Shutdown(e.to_string()));
                if let Err(e) = browser.wait().await {
                    tracing::debug!("Failed to reap browser process: {}", e);
                }
                closed
            }
            None => Ok(()),
        };

        self.stop_handler();
        tracing::info!("Headless browser released");
        result
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.stop_handler();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl PageRenderer for Fixed {
        async fn render(&self, url: &str) -> Result<String, RenderError> {
            Ok(format!("<html><body>{}</body></html>", url))
        }
    }

    #[tokio::test]
    async fn test_default_close_is_noop() {
        let renderer = Fixed;
        assert!(renderer.close().await.is_ok());
        assert!(renderer.render("https://example.com/").await.is_ok());
    }

    #[test]
    fn test_error_messages() {
        let err = RenderError::Timeout {
            url: "https://example.com/".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(
            err.to_string(),
            "Navigation to https://example.com/ timed out after 30s"
        );
        assert_eq!(RenderError::Closed.to_string(), "Browser session is closed");
    }
}
