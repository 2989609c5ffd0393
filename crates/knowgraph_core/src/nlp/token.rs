//! Tagged-token model consumed by the annotation pipeline.
//!
//! # Responsibility
//! - Describe external tagger output: part of speech, lemma, dependency
//!   label, head link and trailing whitespace per token.
//! - Provide tree navigation (children, left/right dependents, subtree
//!   edges) and noun-chunk spans.
//!
//! # Invariants
//! - `Token::head` is an index into the same sentence; a root token points
//!   at itself.
//! - Concatenating `text + whitespace` over all tokens reproduces the
//!   tagged source text exactly.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Universal part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PartOfSpeech {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    Space,
    X,
}

impl PartOfSpeech {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Adj => "ADJ",
            Self::Adp => "ADP",
            Self::Adv => "ADV",
            Self::Aux => "AUX",
            Self::Cconj => "CCONJ",
            Self::Det => "DET",
            Self::Intj => "INTJ",
            Self::Noun => "NOUN",
            Self::Num => "NUM",
            Self::Part => "PART",
            Self::Pron => "PRON",
            Self::Propn => "PROPN",
            Self::Punct => "PUNCT",
            Self::Sconj => "SCONJ",
            Self::Sym => "SYM",
            Self::Verb => "VERB",
            Self::Space => "SPACE",
            Self::X => "X",
        }
    }

    /// Parses a tag label case-insensitively. Unknown labels map to `X`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADJ" => Self::Adj,
            "ADP" => Self::Adp,
            "ADV" => Self::Adv,
            "AUX" => Self::Aux,
            "CCONJ" | "CONJ" => Self::Cconj,
            "DET" => Self::Det,
            "INTJ" => Self::Intj,
            "NOUN" => Self::Noun,
            "NUM" => Self::Num,
            "PART" => Self::Part,
            "PRON" => Self::Pron,
            "PROPN" => Self::Propn,
            "PUNCT" => Self::Punct,
            "SCONJ" => Self::Sconj,
            "SYM" => Self::Sym,
            "VERB" => Self::Verb,
            "SPACE" => Self::Space,
            _ => Self::X,
        }
    }

    pub fn is_nominal(self) -> bool {
        matches!(self, Self::Noun | Self::Propn | Self::Pron)
    }
}

impl From<String> for PartOfSpeech {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<PartOfSpeech> for String {
    fn from(value: PartOfSpeech) -> Self {
        value.as_str().to_string()
    }
}

impl Display for PartOfSpeech {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syntactic dependency label (ClearNLP-style English labels).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DependencyLabel {
    Root,
    Nsubj,
    Nsubjpass,
    Dobj,
    Dative,
    Attr,
    Prep,
    Pobj,
    Xcomp,
    Acomp,
    Relcl,
    Amod,
    Compound,
    Nummod,
    Det,
    Poss,
    Appos,
    Advmod,
    Aux,
    Auxpass,
    Cc,
    Conj,
    Punct,
    Other(String),
}

impl DependencyLabel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => "ROOT",
            Self::Nsubj => "nsubj",
            Self::Nsubjpass => "nsubjpass",
            Self::Dobj => "dobj",
            Self::Dative => "dative",
            Self::Attr => "attr",
            Self::Prep => "prep",
            Self::Pobj => "pobj",
            Self::Xcomp => "xcomp",
            Self::Acomp => "acomp",
            Self::Relcl => "relcl",
            Self::Amod => "amod",
            Self::Compound => "compound",
            Self::Nummod => "nummod",
            Self::Det => "det",
            Self::Poss => "poss",
            Self::Appos => "appos",
            Self::Advmod => "advmod",
            Self::Aux => "aux",
            Self::Auxpass => "auxpass",
            Self::Cc => "cc",
            Self::Conj => "conj",
            Self::Punct => "punct",
            Self::Other(label) => label,
        }
    }

    /// Parses a dependency label. Known labels match case-insensitively;
    /// anything else is kept verbatim as `Other`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "root" => Self::Root,
            "nsubj" => Self::Nsubj,
            "nsubjpass" => Self::Nsubjpass,
            "dobj" => Self::Dobj,
            "dative" => Self::Dative,
            "attr" => Self::Attr,
            "prep" => Self::Prep,
            "pobj" => Self::Pobj,
            "xcomp" => Self::Xcomp,
            "acomp" => Self::Acomp,
            "relcl" => Self::Relcl,
            "amod" => Self::Amod,
            "compound" => Self::Compound,
            "nummod" => Self::Nummod,
            "det" => Self::Det,
            "poss" => Self::Poss,
            "appos" => Self::Appos,
            "advmod" => Self::Advmod,
            "aux" => Self::Aux,
            "auxpass" => Self::Auxpass,
            "cc" => Self::Cc,
            "conj" => Self::Conj,
            "punct" => Self::Punct,
            _ => Self::Other(value.trim().to_string()),
        }
    }

    fn heads_noun_chunk(&self) -> bool {
        matches!(
            self,
            Self::Nsubj
                | Self::Nsubjpass
                | Self::Dobj
                | Self::Dative
                | Self::Attr
                | Self::Root
                | Self::Pobj
                | Self::Appos
                | Self::Conj
        )
    }
}

impl From<String> for DependencyLabel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<DependencyLabel> for String {
    fn from(value: DependencyLabel) -> Self {
        value.as_str().to_string()
    }
}

impl Display for DependencyLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tagged token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    /// Fine-grained tagger label, e.g. `NNP`. Empty when unavailable.
    #[serde(default)]
    pub tag: String,
    pub dep: DependencyLabel,
    /// Sentence-relative index of the syntactic head.
    pub head: usize,
    #[serde(default)]
    pub whitespace: String,
    #[serde(default)]
    pub ent_type: Option<String>,
}

impl Token {
    pub fn new(
        text: impl Into<String>,
        lemma: impl Into<String>,
        pos: PartOfSpeech,
        dep: DependencyLabel,
        head: usize,
    ) -> Self {
        Self {
            text: text.into(),
            lemma: lemma.into(),
            pos,
            tag: String::new(),
            dep,
            head,
            whitespace: String::new(),
            ent_type: None,
        }
    }

    pub fn with_whitespace(mut self, whitespace: impl Into<String>) -> Self {
        self.whitespace = whitespace.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_entity(mut self, ent_type: impl Into<String>) -> Self {
        self.ent_type = Some(ent_type.into());
        self
    }

    /// Returns true when the tagger assigned a named-entity type.
    pub fn is_entity(&self) -> bool {
        self.ent_type.as_deref().is_some_and(|label| !label.is_empty())
    }
}

/// Half-open token range `[start, end)` forming a noun phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NounChunk {
    pub start: usize,
    pub end: usize,
}

/// One sentence of tagged tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSentence {
    pub tokens: Vec<Token>,
    /// Chunk spans supplied by the tagger. Derived from the parse when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noun_chunks: Option<Vec<NounChunk>>,
}

impl TaggedSentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            noun_chunks: None,
        }
    }

    pub fn with_noun_chunks(mut self, chunks: Vec<NounChunk>) -> Self {
        self.noun_chunks = Some(chunks);
        self
    }

    /// Index of the sentence root, if any token carries the `ROOT` label.
    pub fn root(&self) -> Option<usize> {
        self.tokens
            .iter()
            .position(|token| token.dep == DependencyLabel::Root)
    }

    /// Direct dependents of `index`, in sentence order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .filter(move |(child, token)| *child != index && token.head == index)
            .map(|(child, _)| child)
    }

    /// Dependents of `index` that precede it.
    pub fn lefts(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.children(index).filter(move |child| *child < index)
    }

    /// Dependents of `index` that follow it.
    pub fn rights(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.children(index).filter(move |child| *child > index)
    }

    /// Smallest token index inside the subtree rooted at `index`.
    pub fn left_edge(&self, index: usize) -> usize {
        (0..index)
            .find(|candidate| self.is_ancestor(index, *candidate))
            .unwrap_or(index)
    }

    /// Noun-chunk spans, either as tagged or derived from the dependency tree.
    pub fn noun_chunks(&self) -> Vec<NounChunk> {
        match &self.noun_chunks {
            Some(chunks) => chunks.clone(),
            None => self.derive_noun_chunks(),
        }
    }

    /// Source text of this sentence including trailing whitespace.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .flat_map(|token| [token.text.as_str(), token.whitespace.as_str()])
            .collect()
    }

    fn derive_noun_chunks(&self) -> Vec<NounChunk> {
        let mut chunks = Vec::new();
        let mut next_free = 0;
        for (index, token) in self.tokens.iter().enumerate() {
            if !token.pos.is_nominal() || !token.dep.heads_noun_chunk() {
                continue;
            }
            let start = self.left_edge(index);
            if start < next_free {
                continue;
            }
            chunks.push(NounChunk {
                start,
                end: index + 1,
            });
            next_free = index + 1;
        }
        chunks
    }

    /// Walks the head chain from `node` and reports whether it passes
    /// through `ancestor`. Bounded by sentence length so malformed cycles end.
    fn is_ancestor(&self, ancestor: usize, node: usize) -> bool {
        let mut current = node;
        for _ in 0..=self.tokens.len() {
            if current == ancestor {
                return true;
            }
            let Some(token) = self.tokens.get(current) else {
                return false;
            };
            if token.head == current {
                return false;
            }
            current = token.head;
        }
        false
    }
}

/// Full tagger output for one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedText {
    pub sentences: Vec<TaggedSentence>,
}

impl TaggedText {
    pub fn new(sentences: Vec<TaggedSentence>) -> Self {
        Self { sentences }
    }

    /// Reconstructed source text.
    pub fn text(&self) -> String {
        self.sentences.iter().map(TaggedSentence::text).collect()
    }

    /// Checks head links and chunk spans stay inside their sentence.
    pub fn validate(&self) -> Result<(), TagError> {
        for (sentence_index, sentence) in self.sentences.iter().enumerate() {
            let len = sentence.tokens.len();
            for (token_index, token) in sentence.tokens.iter().enumerate() {
                if token.head >= len {
                    return Err(TagError::HeadOutOfRange {
                        sentence: sentence_index,
                        token: token_index,
                        head: token.head,
                    });
                }
            }
            for chunk in sentence.noun_chunks.iter().flatten() {
                if chunk.start >= chunk.end || chunk.end > len {
                    return Err(TagError::ChunkOutOfRange {
                        sentence: sentence_index,
                        start: chunk.start,
                        end: chunk.end,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Tagger failure or malformed tagger output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The tagging backend itself failed.
    Failed(String),
    HeadOutOfRange {
        sentence: usize,
        token: usize,
        head: usize,
    },
    ChunkOutOfRange {
        sentence: usize,
        start: usize,
        end: usize,
    },
}

impl TagError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl Display for TagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(message) => write!(f, "tagger failed: {message}"),
            Self::HeadOutOfRange {
                sentence,
                token,
                head,
            } => write!(
                f,
                "token {token} in sentence {sentence} points at missing head {head}"
            ),
            Self::ChunkOutOfRange {
                sentence,
                start,
                end,
            } => write!(
                f,
                "noun chunk {start}..{end} is outside sentence {sentence}"
            ),
        }
    }
}

impl std::error::Error for TagError {}

/// Syntactic tagging capability.
///
/// Any backend producing the token model above can drive the pipeline.
pub trait Tagger {
    fn tag(&self, text: &str) -> Result<TaggedText, TagError>;
}

impl<F> Tagger for F
where
    F: Fn(&str) -> Result<TaggedText, TagError>,
{
    fn tag(&self, text: &str) -> Result<TaggedText, TagError> {
        self(text)
    }
}
