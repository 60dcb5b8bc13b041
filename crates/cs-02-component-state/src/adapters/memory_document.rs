//! In-memory document bridge.
//!
//! Stands in for the browser page on the interactive pass. Can be filled
//! by hand or scraped from the markup the prerender pass produced.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StateError;
use crate::ports::DocumentBridge;

#[derive(Debug, Default)]
pub struct InMemoryDocument {
    elements: RwLock<HashMap<String, String>>,
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(self, element_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(element_id, text);
        self
    }

    pub fn insert(&self, element_id: impl Into<String>, text: impl Into<String>) {
        self.elements.write().insert(element_id.into(), text.into());
    }

    /// Index every element carrying an `id` attribute by its text content.
    ///
    /// Only flat text up to the next tag is captured, which covers the
    /// state element. The first element with a given id wins.
    pub fn from_markup(markup: &str) -> Self {
        const ID_ATTR: &str = " id=\"";

        let mut elements = HashMap::new();
        let mut rest = markup;
        while let Some(start) = rest.find(ID_ATTR) {
            rest = &rest[start + ID_ATTR.len()..];
            let Some(id_end) = rest.find('"') else {
                break;
            };
            let id = &rest[..id_end];
            rest = &rest[id_end..];

            let Some(open_end) = rest.find('>') else {
                break;
            };
            rest = &rest[open_end + 1..];
            let text_end = rest.find('<').unwrap_or(rest.len());
            elements
                .entry(id.to_string())
                .or_insert_with(|| rest[..text_end].to_string());
        }

        Self {
            elements: RwLock::new(elements),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.read().is_empty()
    }
}

#[async_trait]
impl DocumentBridge for InMemoryDocument {
    async fn element_text(&self, element_id: &str) -> Result<Option<String>, StateError> {
        Ok(self.elements.read().get(element_id).cloned())
    }
}
