//! In-memory page session for unit tests

use super::{ElementRef, PageSession, Query};
use crate::ScraperError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One element of a fake page
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeElement {
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub image: Vec<u8>,
}

impl FakeElement {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

/// Elements of the page and which ids each query value matches
///
/// Scopes are ignored: a query matches the same elements wherever it starts.
#[derive(Debug, Default)]
pub(crate) struct FakeDom {
    pub elements: HashMap<String, FakeElement>,
    pub matches: HashMap<String, Vec<String>>,
}

impl FakeDom {
    pub fn add(&mut self, query: &str, id: &str, element: FakeElement) {
        self.elements.insert(id.to_string(), element);
        self.matches
            .entry(query.to_string())
            .or_default()
            .push(id.to_string());
    }
}

type ScriptHandler = Box<dyn FnMut(&mut FakeDom, &str, &[ElementRef]) -> Value + Send>;

/// Scripted [`PageSession`]
///
/// Scripts are recorded and handed to an optional handler, which may change
/// the page the way the real script would.
#[derive(Default)]
pub(crate) struct FakePage {
    pub dom: FakeDom,
    pub visited: Vec<String>,
    pub scripts: Vec<String>,
    pub keys: Vec<(String, String)>,
    pub closed: bool,
    /// Upcoming script calls that fail as if the page were re-rendering
    pub failing_scripts: u32,
    /// Upcoming captures that fail the same way
    pub failing_captures: u32,
    /// Shared record of commands, readable after the page is boxed away
    pub journal: Arc<Mutex<Vec<String>>>,
    handler: Option<ScriptHandler>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_script<F>(&mut self, handler: F)
    where
        F: FnMut(&mut FakeDom, &str, &[ElementRef]) -> Value + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    pub fn journal(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.journal)
    }

    fn record(&self, entry: String) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(entry);
        }
    }

    fn element(&self, element: &ElementRef) -> Result<&FakeElement, ScraperError> {
        self.dom.elements.get(element.id()).ok_or_else(|| {
            ScraperError::TransientRemote(format!("stale element {}", element.id()))
        })
    }
}

#[async_trait]
impl PageSession for FakePage {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        self.visited.push(url.to_string());
        self.record(format!("navigate {}", url));
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, ScraperError> {
        Ok(self.visited.last().cloned().unwrap_or_default())
    }

    async fn find(
        &mut self,
        _scope: Option<&ElementRef>,
        query: &Query,
    ) -> Result<Option<ElementRef>, ScraperError> {
        Ok(self
            .dom
            .matches
            .get(&query.value)
            .and_then(|ids| ids.first())
            .map(|id| ElementRef(id.clone())))
    }

    async fn find_all(
        &mut self,
        _scope: Option<&ElementRef>,
        query: &Query,
    ) -> Result<Vec<ElementRef>, ScraperError> {
        Ok(self
            .dom
            .matches
            .get(&query.value)
            .map(|ids| ids.iter().map(|id| ElementRef(id.clone())).collect())
            .unwrap_or_default())
    }

    async fn text(&mut self, element: &ElementRef) -> Result<String, ScraperError> {
        Ok(self.element(element)?.text.clone())
    }

    async fn attribute(
        &mut self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        Ok(self.element(element)?.attributes.get(name).cloned())
    }

    async fn execute(&mut self, script: &str, args: &[ElementRef]) -> Result<Value, ScraperError> {
        self.scripts.push(script.to_string());
        self.record(format!("script {}", script));
        if self.failing_scripts > 0 {
            self.failing_scripts -= 1;
            return Err(ScraperError::TransientRemote("element is not attached".to_string()));
        }
        Ok(match self.handler.as_mut() {
            Some(handler) => handler(&mut self.dom, script, args),
            None => Value::Null,
        })
    }

    async fn capture(&mut self, element: &ElementRef) -> Result<Vec<u8>, ScraperError> {
        self.record(format!("capture {}", element.id()));
        if self.failing_captures > 0 {
            self.failing_captures -= 1;
            return Err(ScraperError::TransientRemote("screenshot timed out".to_string()));
        }
        Ok(self.element(element)?.image.clone())
    }

    async fn send_keys(&mut self, element: &ElementRef, keys: &str) -> Result<(), ScraperError> {
        self.keys.push((element.id().to_string(), keys.to_string()));
        self.record(format!("keys {}", element.id()));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.closed = true;
        self.record("close".to_string());
        Ok(())
    }
}
