//! Page session capability
//!
//! Everything the engine needs from a browser sits behind [`PageSession`]:
//! navigate, locate elements, read text and attributes, run a script against an
//! element, and capture an element as image bytes. Markup-specific lookups are
//! plain [`Query`] values taken from configuration, so pagination, retry and
//! resolution never depend on a particular page layout.

mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

pub use webdriver::WebDriverSession;

use crate::ScraperError;
use async_trait::async_trait;
use scraper::Html;
use serde::{Deserialize, Serialize};

/// How a query string locates elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Locator {
    Xpath,
    Css,
    TagName,
}

impl Locator {
    /// Strategy name in the WebDriver protocol
    pub fn webdriver_name(&self) -> &'static str {
        match self {
            Self::Xpath => "xpath",
            Self::Css => "css selector",
            Self::TagName => "tag name",
        }
    }
}

/// An element lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub using: Locator,
    pub value: String,
}

impl Query {
    pub fn xpath(value: impl Into<String>) -> Self {
        Self {
            using: Locator::Xpath,
            value: value.into(),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self {
            using: Locator::Css,
            value: value.into(),
        }
    }

    pub fn tag_name(value: impl Into<String>) -> Self {
        Self {
            using: Locator::TagName,
            value: value.into(),
        }
    }
}

/// Opaque handle to an element of the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Browser-like page session
///
/// Lookups take an optional scope element; `None` searches the whole document.
/// A session is driven by exactly one owner, hence `&mut self` throughout.
#[async_trait]
pub trait PageSession: Send {
    /// Loads `url` and waits for the page to load
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError>;

    /// URL of the current page
    async fn current_url(&mut self) -> Result<String, ScraperError>;

    /// First element matching `query`, or `None` when nothing matches
    async fn find(
        &mut self,
        scope: Option<&ElementRef>,
        query: &Query,
    ) -> Result<Option<ElementRef>, ScraperError>;

    /// Every element matching `query`, in document order
    async fn find_all(
        &mut self,
        scope: Option<&ElementRef>,
        query: &Query,
    ) -> Result<Vec<ElementRef>, ScraperError>;

    /// Rendered text of an element
    async fn text(&mut self, element: &ElementRef) -> Result<String, ScraperError>;

    /// Attribute or property value; `None` when the element does not carry it
    async fn attribute(
        &mut self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, ScraperError>;

    /// Runs `script` with `args` bound to `arguments[0..]`
    async fn execute(
        &mut self,
        script: &str,
        args: &[ElementRef],
    ) -> Result<serde_json::Value, ScraperError>;

    /// PNG screenshot of an element
    async fn capture(&mut self, element: &ElementRef) -> Result<Vec<u8>, ScraperError>;

    /// Sends key strokes to an element
    async fn send_keys(&mut self, element: &ElementRef, keys: &str) -> Result<(), ScraperError>;

    /// Releases the session; it cannot be used afterwards
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// Like [`PageSession::find`], but a missing element is an error
    ///
    /// The page may simply not have rendered yet, so the error is transient.
    async fn require(
        &mut self,
        scope: Option<&ElementRef>,
        query: &Query,
    ) -> Result<ElementRef, ScraperError> {
        self.find(scope, query).await?.ok_or_else(|| {
            ScraperError::TransientRemote(format!("no element matches {}", query.value))
        })
    }

    /// Clicks an element through script, which also works for controls that
    /// are covered by other elements
    async fn click(&mut self, element: &ElementRef) -> Result<(), ScraperError> {
        self.execute("arguments[0].click();", std::slice::from_ref(element))
            .await
            .map(|_| ())
    }
}

/// Key code of the Escape key in the WebDriver protocol
pub const KEY_ESCAPE: &str = "\u{E00C}";

/// Plain text of an HTML fragment
pub fn html_text(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    html.root_element().text().collect::<String>()
}
