//! XML output.
//!
//! - [`XmlBuilder`]: thin element writer over `quick_xml`
//! - [`datacite`]: DataCite kernel-4 document synthesis for repository records

pub mod datacite;

pub use datacite::synthesize_datacite;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{HarvesterError, Result};

/// Streaming element writer producing an in-memory document.
///
/// Text and attribute values are escaped by the writer.
pub struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl Default for XmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| HarvesterError::XmlWrite(e.to_string()))
    }

    /// Open an element.
    pub fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.write(Event::Start(element))
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Write `<name attrs>text</name>`.
    pub fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attributes)?;
        if !text.is_empty() {
            self.write(Event::Text(BytesText::new(text)))?;
        }
        self.end(name)
    }

    /// Write a wrapper element around one child per item, skipping the
    /// wrapper entirely when there are no items.
    pub fn optional_list<T>(
        &mut self,
        name: &str,
        items: &[T],
        mut child: impl FnMut(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.start(name, &[])?;
        for item in items {
            child(self, item)?;
        }
        self.end(name)
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
