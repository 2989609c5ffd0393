//! Splits short node labels such as "all mammals" into qualifier and title.

use crate::nlp::token::{DependencyLabel, PartOfSpeech, TaggedSentence, TaggedText};
use serde::{Deserialize, Serialize};

const QUANTIFYING_DETERMINERS: &[&str] = &[
    "all", "any", "both", "each", "every", "few", "many", "most", "no", "several", "some",
];

/// Result of label parsing. `parsed` is true only when a qualifier was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLabel {
    pub title: String,
    pub qualifier: Option<String>,
    pub parsed: bool,
}

impl ParsedLabel {
    fn unparsed(label: &str) -> Self {
        Self {
            title: label.trim().to_string(),
            qualifier: None,
            parsed: false,
        }
    }
}

/// Parses `label` using its tagged form.
///
/// Qualifiers are quantifying determiners, numeric modifiers and adjectival
/// modifiers attached to the head noun. The title keeps the remaining
/// non-determiner words with their original spacing.
pub fn parse_node_label(label: &str, tagged: &TaggedText) -> ParsedLabel {
    let Some((sentence, head)) = tagged
        .sentences
        .iter()
        .find_map(|sentence| head_noun(sentence).map(|head| (sentence, head)))
    else {
        return ParsedLabel::unparsed(label);
    };

    let qualifiers: Vec<usize> = sentence
        .children(head)
        .filter(|child| is_qualifier(sentence, *child))
        .collect();
    if qualifiers.is_empty() {
        return ParsedLabel::unparsed(label);
    }

    let qualifier = qualifiers
        .iter()
        .map(|index| sentence.tokens[*index].text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let title: String = sentence
        .tokens
        .iter()
        .enumerate()
        .filter(|(index, token)| {
            !qualifiers.contains(index)
                && !matches!(token.pos, PartOfSpeech::Det | PartOfSpeech::Punct)
        })
        .flat_map(|(_, token)| [token.text.as_str(), token.whitespace.as_str()])
        .collect();

    let title = title.trim();
    if title.is_empty() {
        return ParsedLabel::unparsed(label);
    }
    ParsedLabel {
        title: title.to_string(),
        qualifier: Some(qualifier),
        parsed: true,
    }
}

fn head_noun(sentence: &TaggedSentence) -> Option<usize> {
    let is_noun = |index: usize| {
        matches!(
            sentence.tokens[index].pos,
            PartOfSpeech::Noun | PartOfSpeech::Propn
        )
    };
    sentence
        .root()
        .filter(|root| is_noun(*root))
        .or_else(|| (0..sentence.tokens.len()).rev().find(|index| is_noun(*index)))
}

fn is_qualifier(sentence: &TaggedSentence, index: usize) -> bool {
    let token = &sentence.tokens[index];
    match token.dep {
        DependencyLabel::Nummod | DependencyLabel::Amod => true,
        DependencyLabel::Det => {
            QUANTIFYING_DETERMINERS.contains(&token.lemma.to_lowercase().as_str())
        }
        _ => token.pos == PartOfSpeech::Num,
    }
}
