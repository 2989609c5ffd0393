//! Text annotation: tagged-token model, extraction and highlighting.
//!
//! # Responsibility
//! - Turn tagger output into relation/attribute candidates.
//! - Render the source text with semantic highlighting.
//!
//! The tagger itself is an external capability ([`Tagger`]).

pub mod extract;
pub mod highlight;
pub mod label;
pub mod token;

pub use extract::{extract, AttributeCandidate, Extraction, RelationCandidate, TokenTrace};
pub use highlight::render_highlighted;
pub use label::{parse_node_label, ParsedLabel};
pub use token::{
    DependencyLabel, NounChunk, PartOfSpeech, TagError, TaggedSentence, TaggedText, Tagger, Token,
};

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Extraction output plus the highlighted rendering of the same text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(flatten)]
    pub extraction: Extraction,
    pub highlighted_html: String,
}

/// Errors for annotation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotateError {
    /// Source text is empty after trimming.
    EmptyInput,
    Tagger(TagError),
}

impl Display for AnnotateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "text to annotate is empty"),
            Self::Tagger(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AnnotateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tagger(err) => Some(err),
            Self::EmptyInput => None,
        }
    }
}

impl From<TagError> for AnnotateError {
    fn from(value: TagError) -> Self {
        Self::Tagger(value)
    }
}

/// Extracts and highlights an already tagged text.
///
/// # Errors
/// - [`AnnotateError::EmptyInput`] when the tokens spell only whitespace.
/// - [`AnnotateError::Tagger`] when head links or chunk spans are malformed.
pub fn annotate_tagged(tagged: &TaggedText) -> Result<Annotation, AnnotateError> {
    if tagged.text().trim().is_empty() {
        return Err(AnnotateError::EmptyInput);
    }
    tagged.validate()?;

    let extraction = extract(tagged);
    let highlighted_html = render_highlighted(tagged, &extraction);
    Ok(Annotation {
        extraction,
        highlighted_html,
    })
}
