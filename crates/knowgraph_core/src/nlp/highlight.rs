//! HTML highlighting of tagged text.
//!
//! # Invariants
//! - Every token contributes its escaped text followed by its raw trailing
//!   whitespace; stripping markup and unescaping yields the source text.
//! - Noun chunks are rendered as one unit and take precedence over
//!   per-token styles. Empty or reversed spans are ignored and spans running
//!   past the sentence are clipped.

use crate::nlp::extract::Extraction;
use crate::nlp::token::{PartOfSpeech, TaggedSentence, TaggedText, Token};
use std::collections::HashSet;

const PROPER_NOUN_STYLE: &str = "font-weight:bold;color:blue";
const PREDICATE_STYLE: &str = "font-style:italic";
const ATTRIBUTE_STYLE: &str = "color:gray";
const PREPOSITION_STYLE: &str = "color:blue";

/// Renders `tagged` as HTML using the candidates in `extraction`.
pub fn render_highlighted(tagged: &TaggedText, extraction: &Extraction) -> String {
    let predicates = extraction.predicate_lemmas();
    let attribute_words = extraction.attribute_words();
    let mut out = String::new();
    for sentence in &tagged.sentences {
        render_sentence(sentence, &predicates, &attribute_words, &mut out);
    }
    out
}

fn render_sentence(
    sentence: &TaggedSentence,
    predicates: &HashSet<&str>,
    attribute_words: &HashSet<String>,
    out: &mut String,
) {
    let chunks = sentence.noun_chunks();
    let mut index = 0;
    while index < sentence.tokens.len() {
        if let Some(chunk) = chunks
            .iter()
            .find(|chunk| chunk.start == index && chunk.end > chunk.start)
        {
            let end = chunk.end.min(sentence.tokens.len());
            for token in &sentence.tokens[index..end] {
                if token.pos == PartOfSpeech::Det {
                    out.push_str(&html_escape::encode_safe(&token.text));
                } else {
                    out.push_str("<strong>");
                    out.push_str(&html_escape::encode_safe(&token.text));
                    out.push_str("</strong>");
                }
                out.push_str(&token.whitespace);
            }
            index = end;
            continue;
        }

        let token = &sentence.tokens[index];
        render_token(token, predicates, attribute_words, out);
        index += 1;
    }
}

fn render_token(
    token: &Token,
    predicates: &HashSet<&str>,
    attribute_words: &HashSet<String>,
    out: &mut String,
) {
    let mut styles = Vec::new();
    if token.pos == PartOfSpeech::Propn {
        styles.push(PROPER_NOUN_STYLE);
    }
    if token.pos == PartOfSpeech::Verb && predicates.contains(token.lemma.as_str()) {
        styles.push(PREDICATE_STYLE);
    }
    if attribute_words.contains(&token.text.to_lowercase()) {
        styles.push(ATTRIBUTE_STYLE);
    }
    if token.pos == PartOfSpeech::Adp {
        styles.push(PREPOSITION_STYLE);
    }

    let text = html_escape::encode_safe(&token.text);
    if styles.is_empty() {
        out.push_str(&text);
    } else {
        out.push_str("<span style=\"");
        out.push_str(&styles.join(";"));
        out.push_str("\">");
        out.push_str(&text);
        out.push_str("</span>");
    }
    out.push_str(&token.whitespace);
}

#[cfg(test)]
mod tests {
    use super::render_highlighted;
    use crate::nlp::extract::{extract, AttributeCandidate, Extraction, RelationCandidate};
    use crate::nlp::token::{
        DependencyLabel as D, NounChunk, PartOfSpeech as P, TaggedSentence, TaggedText, Token,
    };

    #[test]
    fn chunk_determiners_stay_plain() {
        let sentence = TaggedSentence::new(vec![
            Token::new("The", "the", P::Det, D::Det, 1).with_whitespace(" "),
            Token::new("cat", "cat", P::Noun, D::Nsubj, 2).with_whitespace(" "),
            Token::new("sleeps", "sleep", P::Verb, D::Root, 2),
        ]);
        let tagged = TaggedText::new(vec![sentence]);
        let html = render_highlighted(&tagged, &Extraction::default());
        assert_eq!(html, "The <strong>cat</strong> sleeps");
    }

    #[test]
    fn styles_combine_into_one_declaration() {
        let sentence = TaggedSentence::new(vec![
            Token::new("Rome", "Rome", P::Propn, D::Nsubj, 1).with_whitespace(" "),
            Token::new("lies", "lie", P::Verb, D::Root, 1).with_whitespace(" "),
            Token::new("in", "in", P::Adp, D::Prep, 1).with_whitespace(" "),
            Token::new("old", "old", P::Adj, D::Amod, 4).with_whitespace(" "),
            Token::new("Latium", "Latium", P::Propn, D::Pobj, 2),
        ])
        .with_noun_chunks(Vec::new());
        let tagged = TaggedText::new(vec![sentence]);
        let extraction = Extraction {
            relations: vec![RelationCandidate {
                subject: "Rome".to_string(),
                predicate: "lie".to_string(),
                object: "in".to_string(),
            }],
            attributes: vec![AttributeCandidate {
                entity: "region".to_string(),
                attribute: "In".to_string(),
            }],
            ..Extraction::default()
        };

        let html = render_highlighted(&tagged, &extraction);
        assert_eq!(
            html,
            concat!(
                r#"<span style="font-weight:bold;color:blue">Rome</span> "#,
                r#"<span style="font-style:italic">lies</span> "#,
                r#"<span style="color:gray;color:blue">in</span> "#,
                r#"old <span style="font-weight:bold;color:blue">Latium</span>"#,
            )
        );
    }

    #[test]
    fn malformed_chunk_spans_do_not_break_rendering() {
        let sentence = TaggedSentence::new(vec![
            Token::new("big", "big", P::Adj, D::Amod, 1).with_whitespace(" "),
            Token::new("dogs", "dog", P::Noun, D::Root, 1),
        ])
        .with_noun_chunks(vec![
            NounChunk { start: 0, end: 0 },
            NounChunk { start: 1, end: 0 },
            NounChunk { start: 1, end: 40 },
        ]);
        let tagged = TaggedText::new(vec![sentence]);
        let html = render_highlighted(&tagged, &Extraction::default());
        assert_eq!(html, "big <strong>dogs</strong>");
    }

    #[test]
    fn text_is_escaped_and_whitespace_is_kept() {
        let sentence = TaggedSentence::new(vec![
            Token::new("AT&T", "AT&T", P::Propn, D::Nsubj, 1).with_whitespace("  "),
            Token::new("grew", "grow", P::Verb, D::Root, 1).with_whitespace("\n"),
            Token::new("<fast>", "<fast>", P::Adv, D::Advmod, 1),
        ])
        .with_noun_chunks(vec![NounChunk { start: 0, end: 1 }]);
        let tagged = TaggedText::new(vec![sentence]);
        let html = render_highlighted(&tagged, &extract(&tagged));
        assert_eq!(
            html,
            "<strong>AT&amp;T</strong>  grew\n&lt;fast&gt;"
        );
    }
}
