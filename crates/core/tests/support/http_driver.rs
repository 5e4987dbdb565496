// Headless HTTP driver used by the end-to-end tests.
//
// Fetches pages over a real socket with a cookie store, keeps form state
// in an overlay, and submits forms by serializing their controls — the
// kind of backend the session engine treats as a non-live snapshot source.

use super::form_state::FormState;
use async_trait::async_trait;
use marmot::query;
use marmot::{
    Action, Capabilities, Driver, DriverRegistry, Error, NodeData, NodePath, Result, SessionConfig,
    Selector,
};
use url::Url;

pub struct HttpDriver {
    base: Url,
    client: reqwest::Client,
    current: Option<Url>,
    markup: Option<String>,
    form: FormState,
}

impl HttpDriver {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| Error::InvalidArgument(format!("bad app host '{base}': {e}")))?;
        Ok(Self {
            base,
            client: cookie_client(),
            current: None,
            markup: None,
            form: FormState::default(),
        })
    }

    /// Registers a factory that reads the app host from the session
    /// config.
    pub fn register(registry: &DriverRegistry, name: &str) {
        registry.register(name, |config: &SessionConfig| {
            let host = config.app_host.clone().ok_or_else(|| {
                Error::InvalidArgument("http driver requires an app host".to_string())
            })?;
            Ok(Box::new(HttpDriver::new(&host)?) as Box<dyn Driver>)
        });
    }

    fn resolve_url(&self, path: &str) -> Result<Url> {
        let context = self.current.as_ref().unwrap_or(&self.base);
        context
            .join(path)
            .map_err(|e| Error::InvalidArgument(format!("bad path '{path}': {e}")))
    }

    async fn load(&mut self, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        let final_url = response.url().clone();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Driver(e.to_string()))?;
        if status.is_server_error() {
            // The application under test blew up; forward its message.
            return Err(Error::Application(text.trim().to_string()));
        }
        self.current = Some(final_url);
        self.markup = Some(text);
        self.form.clear();
        Ok(())
    }

    // Empty markup before the first navigation and after a reset: queries
    // simply match nothing.
    fn current_markup(&self) -> String {
        self.markup.clone().unwrap_or_default()
    }

    async fn click(&mut self, path: &NodePath) -> Result<()> {
        let markup = self.current_markup();
        let node =
            query::node_at(&markup, path).ok_or_else(|| Error::Stale(path.to_string()))?;
        match node.tag.as_str() {
            "a" => {
                let href = node
                    .attribute("href")
                    .map(str::to_string)
                    .ok_or_else(|| Error::InvalidArgument("link has no href".to_string()))?;
                self.navigate(&href).await
            }
            "button" | "input" => self.submit(&markup, &node).await,
            other => Err(Error::InvalidArgument(format!("cannot click <{other}>"))),
        }
    }

    async fn submit(&mut self, markup: &str, submitter: &NodeData) -> Result<()> {
        let form = enclosing_form(markup, &submitter.path)
            .ok_or_else(|| Error::InvalidArgument("button is not inside a form".to_string()))?;
        let pairs = self.form.form_pairs(markup, &form.path, Some(submitter))?;

        let action = form
            .attribute("action")
            .map(str::to_string)
            .or_else(|| self.current.as_ref().map(|u| u.path().to_string()))
            .unwrap_or_else(|| "/".to_string());
        let url = self.resolve_url(&action)?;
        let method = form
            .attribute("method")
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "get".to_string());

        tracing::debug!(%url, %method, fields = pairs.len(), "submitting form");
        let request = match method.as_str() {
            "post" => self.client.post(url).form(&pairs),
            _ => self.client.get(url).query(&pairs),
        };
        let response = request
            .send()
            .await
            .map_err(|e| Error::Driver(e.to_string()))?;
        self.load(response).await
    }
}

#[async_trait]
impl Driver for HttpDriver {
    fn name(&self) -> &str {
        "http"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::snapshot()
    }

    async fn navigate(&mut self, path: &str) -> Result<()> {
        let url = self.resolve_url(path)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Driver(e.to_string()))?;
        self.load(response).await
    }

    fn current_url(&self) -> Option<String> {
        self.current.as_ref().map(Url::to_string)
    }

    async fn document(&mut self) -> Result<String> {
        Ok(self.current_markup())
    }

    async fn find_nodes(
        &mut self,
        selector: &Selector,
        scope: Option<&NodePath>,
    ) -> Result<Vec<NodeData>> {
        let markup = self.current_markup();
        let mut nodes = query::resolve_nodes(&markup, selector, scope)?;
        for node in &mut nodes {
            self.form.overlay(node);
        }
        Ok(nodes)
    }

    async fn node_state(&mut self, path: &NodePath) -> Result<NodeData> {
        let markup = self.current_markup();
        let mut node =
            query::node_at(&markup, path).ok_or_else(|| Error::Stale(path.to_string()))?;
        self.form.overlay(&mut node);
        Ok(node)
    }

    async fn perform(&mut self, path: &NodePath, action: Action) -> Result<()> {
        match action {
            Action::Click => self.click(path).await,
            other => {
                let markup = self.current_markup();
                self.form.apply(&markup, path, &other)
            }
        }
    }

    async fn reset(&mut self) -> Result<()> {
        // A fresh client drops the cookie jar.
        self.client = cookie_client();
        self.current = None;
        self.markup = None;
        self.form.clear();
        Ok(())
    }
}

fn cookie_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("reqwest client")
}

fn enclosing_form(markup: &str, path: &NodePath) -> Option<NodeData> {
    let mut current = path.parent();
    while let Some(candidate) = current {
        if let Some(node) = query::node_at(markup, &candidate) {
            if node.tag == "form" {
                return Some(node);
            }
        }
        current = candidate.parent();
    }
    None
}
