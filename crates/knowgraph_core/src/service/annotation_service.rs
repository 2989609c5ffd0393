//! Annotation use-case service.
//!
//! # Responsibility
//! - Reject blank text before the tagger is called.
//! - Run extraction and highlighting over tagger output.
//! - Parse short node labels into qualifier and title.

use crate::nlp::{
    annotate_tagged, parse_node_label, AnnotateError, Annotation, ParsedLabel, Tagger,
};
use log::info;
use std::time::Instant;

/// Annotation facade over a [`Tagger`].
pub struct AnnotationService<T: Tagger> {
    tagger: T,
}

impl<T: Tagger> AnnotationService<T> {
    pub fn new(tagger: T) -> Self {
        Self { tagger }
    }

    /// Extracts candidates from `text` and renders it highlighted.
    ///
    /// # Errors
    /// - [`AnnotateError::EmptyInput`] when `text` is blank.
    /// - [`AnnotateError::Tagger`] when tagging fails or returns malformed output.
    pub fn annotate(&self, text: &str) -> Result<Annotation, AnnotateError> {
        if text.trim().is_empty() {
            return Err(AnnotateError::EmptyInput);
        }
        let started_at = Instant::now();
        let tagged = self.tagger.tag(text)?;
        let annotation = annotate_tagged(&tagged)?;
        info!(
            "event=annotate module=annotation status=ok sentences={} relations={} attributes={} duration_ms={}",
            tagged.sentences.len(),
            annotation.extraction.relations.len(),
            annotation.extraction.attributes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(annotation)
    }

    /// Splits a node label such as "all mammals" into qualifier and title.
    pub fn parse_node_label(&self, label: &str) -> Result<ParsedLabel, AnnotateError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(AnnotateError::EmptyInput);
        }
        let tagged = self.tagger.tag(label)?;
        tagged.validate()?;
        Ok(parse_node_label(label, &tagged))
    }
}
