//! The session façade.
//!
//! A [`Session`] owns one driver instance and the current document
//! snapshot, and exposes navigation, querying, and interaction on top of
//! the wait engine. Sessions are cheap to clone (handles share the same
//! underlying state) but operations are sequential: the driver sits behind
//! an async mutex, so no two navigations or interactions overlap.

use crate::config::SessionConfig;
use crate::document::DocumentSnapshot;
use crate::driver::{Driver, DriverRegistry};
use crate::error::{Error, Result};
use crate::node::NodeHandle;
use crate::wait::Wait;
use marmot_protocol::{Action, Capabilities, FindOptions, NodeData, NodePath, Selector};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// A driver-agnostic browsing session.
///
/// # Example
///
/// ```ignore
/// use marmot::{Session, SessionConfig};
///
/// let session = Session::new("rack", SessionConfig::default())?;
/// session.visit("/form").await?;
/// session.fill_in("address1_city", "Paris").await?;
/// session.select("France", "address1_country").await?;
/// session.click_button("awesome").await?;
/// assert!(session.has_text("Thanks!").await?);
/// session.reset_session().await?;
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    driver: tokio::sync::Mutex<Box<dyn Driver>>,
    driver_name: String,
    capabilities: Capabilities,
    config: SessionConfig,
    state: parking_lot::Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    document: Option<Arc<DocumentSnapshot>>,
    current_url: Option<String>,
    generation: u64,
    scopes: Vec<NodePath>,
}

/// Pops one scope level when a `within` block ends, however it ends.
struct ScopeGuard {
    inner: Arc<SessionInner>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.inner.state.lock().scopes.pop();
    }
}

impl Session {
    /// Creates a session using the process-wide driver registry.
    ///
    /// Driver resolution happens here, not at first use: an unregistered
    /// name fails immediately with [`Error::DriverNotFound`].
    pub fn new(driver_name: &str, config: SessionConfig) -> Result<Self> {
        Self::with_registry(DriverRegistry::global(), driver_name, config)
    }

    /// Creates a session against an explicit registry.
    pub fn with_registry(
        registry: &DriverRegistry,
        driver_name: &str,
        config: SessionConfig,
    ) -> Result<Self> {
        let driver = registry.build(driver_name, &config)?;
        let capabilities = driver.capabilities();
        tracing::debug!(driver = driver_name, ?capabilities, "session created");
        Ok(Self {
            inner: Arc::new(SessionInner {
                driver: tokio::sync::Mutex::new(driver),
                driver_name: driver_name.to_string(),
                capabilities,
                config,
                state: parking_lot::Mutex::new(SessionState::default()),
            }),
        })
    }

    /// The name the driver was registered under.
    pub fn driver_name(&self) -> &str {
        &self.inner.driver_name
    }

    /// The driver's capabilities.
    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// The current document snapshot, if any navigation has happened.
    pub fn snapshot(&self) -> Option<Arc<DocumentSnapshot>> {
        self.inner.state.lock().document.clone()
    }

    /// The absolute URL of the current page.
    pub fn current_url(&self) -> Option<String> {
        self.inner.state.lock().current_url.clone()
    }

    /// Scheme and host (and explicit port) of the current URL.
    pub fn current_host(&self) -> Option<String> {
        host_of(&self.current_url()?)
    }

    /// Path component of the current URL. `None` iff no navigation has
    /// happened since creation or the last reset.
    pub fn current_path(&self) -> Option<String> {
        path_component_of(&self.current_url()?)
    }

    // --- navigation and document access -------------------------------

    /// Navigates the driver to `path` and replaces the current snapshot.
    ///
    /// An application error reported by the backend propagates to the
    /// caller; it is never swallowed.
    pub async fn visit(&self, path: &str) -> Result<()> {
        tracing::debug!(%path, "visit");
        let mut driver = self.inner.driver.lock().await;
        driver.navigate(path).await?;
        let markup = driver.document().await?;
        let url = driver.current_url();
        drop(driver);

        let mut state = self.inner.state.lock();
        state.generation += 1;
        let generation = state.generation;
        state.document = Some(Arc::new(DocumentSnapshot::parse(markup, generation)));
        state.current_url = url;
        Ok(())
    }

    /// The literal markup of the current page, byte for byte. Empty before
    /// the first navigation and after a reset.
    pub async fn body(&self) -> Result<String> {
        if self.inner.capabilities.live && self.snapshot().is_some() {
            self.refresh_snapshot().await?;
        }
        let state = self.inner.state.lock();
        Ok(state
            .document
            .as_ref()
            .map(|doc| doc.raw().to_string())
            .unwrap_or_default())
    }

    /// Alias of [`body`](Self::body).
    pub async fn html(&self) -> Result<String> {
        self.body().await
    }

    /// Alias of [`body`](Self::body).
    pub async fn source(&self) -> Result<String> {
        self.body().await
    }

    /// Visible text of the current page body.
    pub async fn text(&self) -> Result<String> {
        if self.inner.capabilities.live && self.snapshot().is_some() {
            self.refresh_snapshot().await?;
        }
        let state = self.inner.state.lock();
        Ok(state
            .document
            .as_ref()
            .map(|doc| doc.text())
            .unwrap_or_default())
    }

    // --- querying ------------------------------------------------------

    /// Finds exactly one element, retrying within the wait budget.
    ///
    /// Fails with [`Error::NotFound`] when nothing matches after the
    /// timeout and [`Error::AmbiguousMatch`] as soon as more than one
    /// element matches.
    pub async fn find(&self, selector: impl Into<Selector>) -> Result<NodeHandle> {
        self.find_with(selector, FindOptions::new()).await
    }

    /// [`find`](Self::find) with per-query options.
    pub async fn find_with(
        &self,
        selector: impl Into<Selector>,
        options: FindOptions,
    ) -> Result<NodeHandle> {
        let selector = apply_exactness(selector.into(), &options);
        let timeout = options
            .timeout
            .unwrap_or(self.inner.config.default_wait_timeout);
        let wait = Wait::new(timeout, self.inner.config.poll_interval);
        let generation = self.generation();

        wait.until(async || {
            if self.generation() != generation {
                return Err(Error::Cancelled);
            }
            let mut nodes = self.query_nodes(&selector, &options).await?;
            match nodes.len() {
                0 => Err(Error::NotFound(selector.to_string())),
                1 => Ok(NodeHandle::new(
                    self.clone(),
                    selector.clone(),
                    nodes.remove(0),
                    generation,
                )),
                count => Err(Error::AmbiguousMatch {
                    selector: selector.to_string(),
                    count,
                }),
            }
        })
        .await
    }

    /// All current matches, in document order. Evaluated fresh on every
    /// call — results are never cached across calls.
    pub async fn all(&self, selector: impl Into<Selector>) -> Result<Vec<NodeHandle>> {
        let selector = selector.into();
        let generation = self.generation();
        let nodes = self.query_nodes(&selector, &FindOptions::new()).await?;
        Ok(nodes
            .into_iter()
            .map(|data| NodeHandle::new(self.clone(), selector.clone(), data, generation))
            .collect())
    }

    /// The first current match, without waiting.
    pub async fn first(&self, selector: impl Into<Selector>) -> Result<NodeHandle> {
        let selector = selector.into();
        let generation = self.generation();
        let mut nodes = self.query_nodes(&selector, &FindOptions::new()).await?;
        if nodes.is_empty() {
            return Err(Error::NotFound(selector.to_string()));
        }
        Ok(NodeHandle::new(
            self.clone(),
            selector.clone(),
            nodes.remove(0),
            generation,
        ))
    }

    /// Finds any element by exact id.
    pub async fn find_by_id(&self, id: &str) -> Result<NodeHandle> {
        self.find(Selector::id(id)).await
    }

    /// Finds a form field by id, name, label text, or placeholder.
    pub async fn find_field(&self, locator: &str) -> Result<NodeHandle> {
        self.find(Selector::field(locator)).await
    }

    /// Finds a link by id, text, title, or contained image alt text.
    pub async fn find_link(&self, locator: &str) -> Result<NodeHandle> {
        self.find(Selector::link(locator)).await
    }

    /// Finds a button by id, text, or value.
    pub async fn find_button(&self, locator: &str) -> Result<NodeHandle> {
        self.find(Selector::button(locator)).await
    }

    // --- predicates ----------------------------------------------------

    /// True when at least one element matches within the predicate wait
    /// budget.
    pub async fn has_selector(&self, selector: impl Into<Selector>) -> Result<bool> {
        let selector = selector.into();
        self.predicate(async || {
            let nodes = self.query_nodes(&selector, &FindOptions::new()).await?;
            if nodes.is_empty() {
                Err(Error::NotFound(selector.to_string()))
            } else {
                Ok(())
            }
        })
        .await
    }

    /// True when no element matches; waits for matches to disappear within
    /// the predicate budget and reports `false` — it does not raise — when
    /// they are still present at the end of it.
    pub async fn has_no_selector(&self, selector: impl Into<Selector>) -> Result<bool> {
        let selector = selector.into();
        self.predicate(async || {
            let nodes = self.query_nodes(&selector, &FindOptions::new()).await?;
            if nodes.is_empty() {
                Ok(())
            } else {
                Err(Error::NotFound(format!("absence of {selector}")))
            }
        })
        .await
    }

    /// True when the page text contains `text` within the predicate
    /// budget.
    pub async fn has_text(&self, text: &str) -> Result<bool> {
        self.predicate(async || {
            let page = self.text().await?;
            if page.contains(text) {
                Ok(())
            } else {
                Err(Error::NotFound(format!("text '{text}'")))
            }
        })
        .await
    }

    /// True when the CSS selector matches.
    pub async fn has_css(&self, css: &str) -> Result<bool> {
        self.has_selector(Selector::css(css)).await
    }

    /// True when the XPath expression matches.
    pub async fn has_xpath(&self, expr: &str) -> Result<bool> {
        self.has_selector(Selector::xpath(expr)).await
    }

    /// True when a form field matches the locator.
    pub async fn has_field(&self, locator: &str) -> Result<bool> {
        self.has_selector(Selector::field(locator)).await
    }

    /// True when a link matches the locator.
    pub async fn has_link(&self, locator: &str) -> Result<bool> {
        self.has_selector(Selector::link(locator)).await
    }

    /// True when a button matches the locator.
    pub async fn has_button(&self, locator: &str) -> Result<bool> {
        self.has_selector(Selector::button(locator)).await
    }

    // --- interactions --------------------------------------------------

    /// Fills a text-like field located by id, name, label, or placeholder.
    /// Bracketed field names (`addresses[][city]`) are passed through
    /// verbatim.
    pub async fn fill_in(&self, locator: &str, value: &str) -> Result<()> {
        self.interact(
            Selector::fillable_field(locator),
            Action::Fill(value.to_string()),
        )
        .await
    }

    /// Selects an option (by visible text or value) from a select box.
    pub async fn select(&self, option: &str, from: &str) -> Result<()> {
        self.interact(
            Selector::select_box(from),
            Action::SelectOption {
                option: option.to_string(),
            },
        )
        .await
    }

    /// Deselects an option from a multiple select box.
    pub async fn unselect(&self, option: &str, from: &str) -> Result<()> {
        self.interact(
            Selector::select_box(from),
            Action::UnselectOption {
                option: option.to_string(),
            },
        )
        .await
    }

    /// Chooses a radio button.
    pub async fn choose(&self, locator: &str) -> Result<()> {
        self.interact(Selector::radio_button(locator), Action::SetChecked(true))
            .await
    }

    /// Checks a checkbox.
    pub async fn check(&self, locator: &str) -> Result<()> {
        self.interact(Selector::checkbox(locator), Action::SetChecked(true))
            .await
    }

    /// Unchecks a checkbox.
    pub async fn uncheck(&self, locator: &str) -> Result<()> {
        self.interact(Selector::checkbox(locator), Action::SetChecked(false))
            .await
    }

    /// Clicks a link.
    pub async fn click_link(&self, locator: &str) -> Result<()> {
        self.interact(Selector::link(locator), Action::Click).await
    }

    /// Clicks a button.
    pub async fn click_button(&self, locator: &str) -> Result<()> {
        self.interact(Selector::button(locator), Action::Click).await
    }

    /// Clicks whichever link or button matches first.
    pub async fn click_link_or_button(&self, locator: &str) -> Result<()> {
        self.interact(Selector::link_or_button(locator), Action::Click)
            .await
    }

    /// Attaches a file to a file input.
    pub async fn attach_file(&self, locator: &str, file: impl AsRef<Path>) -> Result<()> {
        self.interact(
            Selector::file_field(locator),
            Action::AttachFile(file.as_ref().to_path_buf()),
        )
        .await
    }

    // --- scoping -------------------------------------------------------

    /// Runs `f` with queries scoped to the subtree matched by `selector`.
    /// The scope is popped when the block ends, even when it errors.
    pub async fn within<F, Fut, T>(&self, selector: impl Into<Selector>, f: F) -> Result<T>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let handle = self.find(selector).await?;
        self.inner.state.lock().scopes.push(handle.path().clone());
        let _guard = ScopeGuard {
            inner: Arc::clone(&self.inner),
        };
        f(self.clone()).await
    }

    // --- lifecycle -----------------------------------------------------

    /// Clears the current document, URL, host, and path, and instructs the
    /// driver to discard cookies and stored state. In-flight waits abort.
    ///
    /// A deferred application error held by the driver propagates from
    /// this call — after local state has been cleared, so the session
    /// stays usable for the next navigation.
    pub async fn reset_session(&self) -> Result<()> {
        tracing::debug!("reset session");
        {
            let mut state = self.inner.state.lock();
            state.document = None;
            state.current_url = None;
            state.scopes.clear();
            state.generation += 1;
        }
        let mut driver = self.inner.driver.lock().await;
        driver.reset().await
    }

    // --- internals -----------------------------------------------------

    pub(crate) fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    pub(crate) async fn perform_action(&self, path: &NodePath, action: Action) -> Result<()> {
        {
            let mut driver = self.inner.driver.lock().await;
            driver.perform(path, action).await?;
        }
        self.sync_after_interaction().await
    }

    pub(crate) async fn read_node_state(&self, path: &NodePath) -> Result<NodeData> {
        let mut driver = self.inner.driver.lock().await;
        driver.node_state(path).await
    }

    async fn query_nodes(
        &self,
        selector: &Selector,
        options: &FindOptions,
    ) -> Result<Vec<NodeData>> {
        let scope = self.inner.state.lock().scopes.last().cloned();
        let mut driver = self.inner.driver.lock().await;
        let mut nodes = driver.find_nodes(selector, scope.as_ref()).await?;
        drop(driver);

        if let Some(text) = &options.text {
            nodes.retain(|node| collapse(&node.text).contains(text.as_str()));
        }
        Ok(nodes)
    }

    async fn interact(&self, selector: Selector, action: Action) -> Result<()> {
        let handle = self.find(selector.clone()).await?;
        match handle.perform(action.clone()).await {
            Err(Error::Stale(path)) => {
                tracing::debug!(%selector, %path, "stale element, re-resolving once");
                let handle = self.find(selector).await?;
                handle.perform(action).await
            }
            other => other,
        }
    }

    /// Re-reads the current document from the driver without bumping the
    /// generation (live backends mutate without navigation).
    async fn refresh_snapshot(&self) -> Result<()> {
        let mut driver = self.inner.driver.lock().await;
        let markup = driver.document().await?;
        let url = driver.current_url();
        drop(driver);

        let mut state = self.inner.state.lock();
        let generation = state.generation;
        state.document = Some(Arc::new(DocumentSnapshot::parse(markup, generation)));
        state.current_url = url;
        Ok(())
    }

    /// Replaces the snapshot after an interaction when the document
    /// actually changed (a click may have navigated or re-rendered).
    async fn sync_after_interaction(&self) -> Result<()> {
        let mut driver = self.inner.driver.lock().await;
        let markup = driver.document().await?;
        let url = driver.current_url();
        drop(driver);

        let mut state = self.inner.state.lock();
        let changed = state
            .document
            .as_ref()
            .map(|doc| doc.raw() != markup)
            .unwrap_or(true);
        if changed {
            state.generation += 1;
            let generation = state.generation;
            tracing::debug!(generation, "document replaced after interaction");
            state.document = Some(Arc::new(DocumentSnapshot::parse(markup, generation)));
        }
        state.current_url = url;
        Ok(())
    }

    async fn predicate<F>(&self, attempt: F) -> Result<bool>
    where
        F: AsyncFnMut() -> Result<()>,
    {
        let wait = Wait::new(
            self.inner.config.predicate_wait_timeout,
            self.inner.config.poll_interval,
        );
        match wait.until(attempt).await {
            Ok(()) => Ok(true),
            Err(error) if error.is_retryable() => Ok(false),
            Err(error) => Err(error),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Session")
            .field("driver", &self.inner.driver_name)
            .field("current_url", &state.current_url)
            .field("generation", &state.generation)
            .finish()
    }
}

fn apply_exactness(selector: Selector, options: &FindOptions) -> Selector {
    match options.exact {
        Some(exact) => selector.with_exact(exact),
        None => selector,
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
        None => format!("{}://{host}", parsed.scheme()),
    })
}

fn path_component_of(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|parsed| parsed.path().to_string())
}
