//! Rendered strategy: drive an external headless-browser CLI.
//!
//! The driver is invoked once per step with `--session <name>` so every
//! step of one render shares a browser session. Setup steps are best
//! effort; navigation and extraction steps must succeed. The session is
//! always closed afterwards, including when a step fails or times out.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::error::{Result, SearchError};

/// Text and metadata read out of a rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    /// URL the browser ended on, when the driver reported one.
    pub final_url: Option<String>,
    pub title: Option<String>,
    pub text: String,
}

/// Something that can load a page in a real browser and read its text.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `url` and return the visible text.
    ///
    /// # Errors
    ///
    /// [`SearchError::RenderTimeout`] when a step exceeds its budget,
    /// [`SearchError::Render`] for any other driver failure.
    async fn render(&self, url: &Url) -> Result<RenderedPage>;
}

/// Heavy assets blocked before navigation.
const ABORT_PATTERNS: &[&str] = &[
    "**/*.png",
    "**/*.jpg",
    "**/*.jpeg",
    "**/*.gif",
    "**/*.webp",
    "**/*.avif",
    "**/*.svg",
    "**/*.woff",
    "**/*.woff2",
    "**/*.ttf",
    "**/*.otf",
    "**/*.mp4",
    "**/*.webm",
    "**/*.mp3",
];

const TEXT_SCRIPT: &str =
    "document.documentElement ? document.documentElement.innerText : document.body.innerText";

/// [`Renderer`] backed by the `agent-browser` command-line driver.
#[derive(Debug, Clone)]
pub struct AgentBrowserRenderer {
    bin: String,
    timeout: Duration,
    setup_timeout: Duration,
}

impl AgentBrowserRenderer {
    pub fn new(config: &FetchConfig) -> Self {
        let timeout = Duration::from_millis(config.render_timeout_ms);
        Self {
            bin: config.browser_bin.clone(),
            timeout,
            setup_timeout: Duration::from_millis(config.render_setup_timeout_ms).min(timeout),
        }
    }

    async fn run_steps(&self, session: &BrowserSession, url: &Url) -> Result<RenderedPage> {
        if let Err(e) = session
            .run(url, &["set", "viewport", "1280", "720"], self.setup_timeout)
            .await
        {
            debug!(error = %e, "viewport setup failed, continuing");
        }
        for pattern in ABORT_PATTERNS {
            if let Err(e) = session
                .run(url, &["network", "route", pattern, "--abort"], self.setup_timeout)
                .await
            {
                debug!(pattern, error = %e, "asset blocking unsupported, continuing");
            }
        }

        session.run(url, &["open", url.as_str()], self.timeout).await?;
        session
            .run(url, &["wait", "--load", "networkidle"], self.timeout)
            .await?;

        let data = session.run_json(url, &["get", "url"], self.timeout).await?;
        let final_url = pick_string(&data, &["url", "value"]);

        let data = session.run_json(url, &["get", "title"], self.timeout).await?;
        let title = pick_string(&data, &["title", "value"]);

        let data = session
            .run_json(url, &["eval", TEXT_SCRIPT], self.timeout)
            .await?;
        let text = pick_text(&data, &["result", "value"]);

        Ok(RenderedPage {
            final_url,
            title,
            text,
        })
    }
}

#[async_trait]
impl Renderer for AgentBrowserRenderer {
    async fn render(&self, url: &Url) -> Result<RenderedPage> {
        let mut session = BrowserSession::open(&self.bin, self.setup_timeout);
        debug!(session = %session.name, url = %url, "starting rendered fetch");

        let outcome = self.run_steps(&session, url).await;
        session.close().await;

        if let Err(ref e) = outcome {
            warn!(url = %url, error = %e, "rendered fetch failed");
        }
        outcome
    }
}

/// One named driver session; closed on drop if [`close`](Self::close) was
/// never awaited.
struct BrowserSession {
    bin: String,
    name: String,
    close_timeout: Duration,
    closed: bool,
}

impl BrowserSession {
    fn open(bin: &str, close_timeout: Duration) -> Self {
        Self {
            bin: bin.to_owned(),
            name: format!("sift-{}", uuid::Uuid::new_v4()),
            close_timeout,
            closed: false,
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--session")
            .arg(&self.name)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run one step, returning stdout. A step that outlives `budget` is
    /// killed.
    async fn run(&self, url: &Url, args: &[&str], budget: Duration) -> Result<Vec<u8>> {
        let step = args.first().copied().unwrap_or_default();
        let render_err = |reason: String| SearchError::Render {
            url: url.to_string(),
            reason,
        };

        let child = self
            .command(args)
            .spawn()
            .map_err(|e| render_err(format!("failed to start {}: {e}", self.bin)))?;

        let output = tokio::time::timeout(budget, child.wait_with_output())
            .await
            .map_err(|_| SearchError::RenderTimeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|e| render_err(format!("`{step}` failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(render_err(format!(
                "`{step}` exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }

    /// Run a step with `--json` and return the envelope's `data` member.
    async fn run_json(&self, url: &Url, args: &[&str], budget: Duration) -> Result<Value> {
        let mut args = args.to_vec();
        args.push("--json");
        let stdout = self.run(url, &args, budget).await?;
        let envelope: Value = serde_json::from_slice(&stdout).map_err(|e| SearchError::Render {
            url: url.to_string(),
            reason: format!("driver returned invalid JSON: {e}"),
        })?;
        Ok(envelope.get("data").cloned().unwrap_or(Value::Null))
    }

    async fn close(&mut self) {
        self.closed = true;
        let result = tokio::time::timeout(self.close_timeout, self.command(&["close"]).output()).await;
        match result {
            Ok(Ok(output)) if output.status.success() => {
                debug!(session = %self.name, "browser session closed");
            }
            Ok(Ok(output)) => {
                debug!(session = %self.name, status = %output.status, "session close failed");
            }
            Ok(Err(e)) => debug!(session = %self.name, error = %e, "session close failed"),
            Err(_) => debug!(session = %self.name, "session close timed out"),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Render future was cancelled mid-flight; close in the background.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let mut cmd = self.command(&["close"]);
            cmd.kill_on_drop(false);
            let budget = self.close_timeout;
            handle.spawn(async move {
                let _ = tokio::time::timeout(budget, cmd.output()).await;
            });
        }
    }
}

/// First non-blank string among `data[key]` for `keys`, then `data` itself.
fn pick_string(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| data.get(k))
        .chain(std::iter::once(data))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Like [`pick_string`] but any present value counts and non-strings are
/// stringified.
fn pick_text(data: &Value, keys: &[&str]) -> String {
    let value = keys
        .iter()
        .filter_map(|k| data.get(k))
        .chain(std::iter::once(data))
        .find(|v| !v.is_null());
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
