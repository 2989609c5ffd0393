//! Dependency-pattern extraction of relation and attribute candidates.
//!
//! # Responsibility
//! - Apply the verbal, copular, relative-clause and modifier rules to every
//!   sentence of a tagged text.
//! - Collect lexical category sets and a per-token trace.
//!
//! # Invariants
//! - Rules run independently; candidates are neither merged nor deduplicated.
//! - Candidate fields carry raw token text, except predicates which carry the
//!   predicate token's lemma.
//! - Never panics on unvalidated input: tokens with a dangling head index are
//!   skipped by the head-based rules.

use crate::nlp::token::{DependencyLabel, PartOfSpeech, TaggedSentence, TaggedText};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Subject-predicate-object triple read off the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCandidate {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// Modifier attached to a noun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCandidate {
    pub entity: String,
    pub attribute: String,
}

/// Inspection row for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTrace {
    pub text: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub tag: String,
    pub dep: DependencyLabel,
    pub head_text: String,
}

/// Everything extracted from one tagged text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub relations: Vec<RelationCandidate>,
    pub attributes: Vec<AttributeCandidate>,
    /// Distinct common nouns without an entity type, first-seen order.
    pub common_nouns: Vec<String>,
    /// Distinct proper nouns, first-seen order.
    pub proper_nouns: Vec<String>,
    pub prepositions: Vec<String>,
    pub connectives: Vec<String>,
    pub trace: Vec<TokenTrace>,
}

impl Extraction {
    /// Lemmas used as relation predicates.
    pub fn predicate_lemmas(&self) -> HashSet<&str> {
        self.relations
            .iter()
            .map(|candidate| candidate.predicate.as_str())
            .collect()
    }

    /// Lower-cased attribute words.
    pub fn attribute_words(&self) -> HashSet<String> {
        self.attributes
            .iter()
            .map(|candidate| candidate.attribute.to_lowercase())
            .collect()
    }
}

/// Runs all extraction rules over `tagged`.
pub fn extract(tagged: &TaggedText) -> Extraction {
    let mut extraction = Extraction::default();
    let mut seen_common = HashSet::new();
    let mut seen_proper = HashSet::new();

    for sentence in &tagged.sentences {
        verbal_relations(sentence, &mut extraction.relations);
        copular_relations(sentence, &mut extraction.relations);
        relative_clause_relations(sentence, &mut extraction.relations);
        modifier_attributes(sentence, &mut extraction.attributes);

        for token in &sentence.tokens {
            match token.pos {
                PartOfSpeech::Noun if !token.is_entity() => {
                    if seen_common.insert(token.text.clone()) {
                        extraction.common_nouns.push(token.text.clone());
                    }
                }
                PartOfSpeech::Propn => {
                    if seen_proper.insert(token.text.clone()) {
                        extraction.proper_nouns.push(token.text.clone());
                    }
                }
                PartOfSpeech::Adp => extraction.prepositions.push(token.text.clone()),
                PartOfSpeech::Cconj => extraction.connectives.push(token.text.clone()),
                _ => {}
            }

            let head_text = sentence
                .tokens
                .get(token.head)
                .map(|head| head.text.clone())
                .unwrap_or_default();
            extraction.trace.push(TokenTrace {
                text: token.text.clone(),
                lemma: token.lemma.clone(),
                pos: token.pos,
                tag: token.tag.clone(),
                dep: token.dep.clone(),
                head_text,
            });
        }
    }

    extraction
}

fn verbal_relations(sentence: &TaggedSentence, out: &mut Vec<RelationCandidate>) {
    let Some(root_index) = sentence.root() else {
        return;
    };
    let root = &sentence.tokens[root_index];
    if root.pos != PartOfSpeech::Verb {
        return;
    }

    let subjects: Vec<usize> = sentence
        .lefts(root_index)
        .filter(|index| {
            matches!(
                sentence.tokens[*index].dep,
                DependencyLabel::Nsubj | DependencyLabel::Nsubjpass
            )
        })
        .collect();
    let objects: Vec<usize> = sentence
        .rights(root_index)
        .filter(|index| {
            matches!(
                sentence.tokens[*index].dep,
                DependencyLabel::Dobj
                    | DependencyLabel::Attr
                    | DependencyLabel::Prep
                    | DependencyLabel::Pobj
                    | DependencyLabel::Xcomp
                    | DependencyLabel::Acomp
            )
        })
        .collect();

    for subject in &subjects {
        for object in &objects {
            out.push(RelationCandidate {
                subject: sentence.tokens[*subject].text.clone(),
                predicate: root.lemma.clone(),
                object: sentence.tokens[*object].text.clone(),
            });
        }
    }
}

fn copular_relations(sentence: &TaggedSentence, out: &mut Vec<RelationCandidate>) {
    for complement in &sentence.tokens {
        if complement.dep != DependencyLabel::Attr {
            continue;
        }
        let Some(head) = sentence.tokens.get(complement.head) else {
            continue;
        };
        if head.pos != PartOfSpeech::Aux {
            continue;
        }
        for subject in sentence.lefts(complement.head) {
            let subject = &sentence.tokens[subject];
            if subject.dep == DependencyLabel::Nsubj {
                out.push(RelationCandidate {
                    subject: subject.text.clone(),
                    predicate: head.lemma.clone(),
                    object: complement.text.clone(),
                });
            }
        }
    }
}

fn relative_clause_relations(sentence: &TaggedSentence, out: &mut Vec<RelationCandidate>) {
    for (index, clause) in sentence.tokens.iter().enumerate() {
        if clause.dep != DependencyLabel::Relcl {
            continue;
        }
        let Some(head) = sentence.tokens.get(clause.head) else {
            continue;
        };
        if !matches!(head.pos, PartOfSpeech::Noun | PartOfSpeech::Propn) {
            continue;
        }
        for object in sentence.rights(index) {
            let object = &sentence.tokens[object];
            if matches!(
                object.dep,
                DependencyLabel::Dobj | DependencyLabel::Pobj | DependencyLabel::Xcomp
            ) {
                out.push(RelationCandidate {
                    subject: head.text.clone(),
                    predicate: clause.lemma.clone(),
                    object: object.text.clone(),
                });
            }
        }
    }
}

fn modifier_attributes(sentence: &TaggedSentence, out: &mut Vec<AttributeCandidate>) {
    for (index, noun) in sentence.tokens.iter().enumerate() {
        if noun.pos != PartOfSpeech::Noun {
            continue;
        }
        for child in sentence.children(index) {
            let child = &sentence.tokens[child];
            if matches!(child.dep, DependencyLabel::Amod | DependencyLabel::Compound) {
                out.push(AttributeCandidate {
                    entity: noun.text.clone(),
                    attribute: child.text.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{extract, AttributeCandidate, RelationCandidate};
    use crate::nlp::token::{
        DependencyLabel as D, PartOfSpeech as P, TaggedSentence, TaggedText, Token,
    };

    fn candidate(subject: &str, predicate: &str, object: &str) -> RelationCandidate {
        RelationCandidate {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: object.to_string(),
        }
    }

    #[test]
    fn relative_clause_yields_head_noun_as_subject() {
        // "Scientists who study stars ..."
        let sentence = TaggedSentence::new(vec![
            Token::new("Scientists", "scientist", P::Noun, D::Nsubj, 4).with_whitespace(" "),
            Token::new("who", "who", P::Pron, D::Nsubj, 2).with_whitespace(" "),
            Token::new("study", "study", P::Verb, D::Relcl, 0).with_whitespace(" "),
            Token::new("stars", "star", P::Noun, D::Dobj, 2).with_whitespace(" "),
            Token::new("publish", "publish", P::Verb, D::Root, 4),
        ]);
        let extraction = extract(&TaggedText::new(vec![sentence]));
        assert_eq!(
            extraction.relations,
            vec![candidate("Scientists", "study", "stars")]
        );
    }

    #[test]
    fn relative_clause_on_verb_head_is_ignored() {
        let sentence = TaggedSentence::new(vec![
            Token::new("ran", "run", P::Verb, D::Root, 0).with_whitespace(" "),
            Token::new("saw", "see", P::Verb, D::Relcl, 0).with_whitespace(" "),
            Token::new("it", "it", P::Pron, D::Dobj, 1),
        ]);
        assert!(extract(&TaggedText::new(vec![sentence])).relations.is_empty());
    }

    #[test]
    fn noun_modifiers_become_attribute_candidates() {
        // "red brick houses"
        let sentence = TaggedSentence::new(vec![
            Token::new("red", "red", P::Adj, D::Amod, 2).with_whitespace(" "),
            Token::new("brick", "brick", P::Noun, D::Compound, 2).with_whitespace(" "),
            Token::new("houses", "house", P::Noun, D::Root, 2),
        ]);
        let extraction = extract(&TaggedText::new(vec![sentence]));
        assert_eq!(
            extraction.attributes,
            vec![
                AttributeCandidate {
                    entity: "houses".to_string(),
                    attribute: "red".to_string(),
                },
                AttributeCandidate {
                    entity: "houses".to_string(),
                    attribute: "brick".to_string(),
                },
            ]
        );
        assert_eq!(extraction.common_nouns, vec!["brick", "houses"]);
    }

    #[test]
    fn lexical_sets_keep_order_and_distinctness() {
        // "Paris and Paris lie in France and in Europe"
        let sentence = TaggedSentence::new(vec![
            Token::new("Paris", "Paris", P::Propn, D::Nsubj, 3).with_whitespace(" "),
            Token::new("and", "and", P::Cconj, D::Cc, 0).with_whitespace(" "),
            Token::new("Paris", "Paris", P::Propn, D::Conj, 0).with_whitespace(" "),
            Token::new("lie", "lie", P::Verb, D::Root, 3).with_whitespace(" "),
            Token::new("in", "in", P::Adp, D::Prep, 3).with_whitespace(" "),
            Token::new("France", "France", P::Propn, D::Pobj, 4).with_whitespace(" "),
            Token::new("and", "and", P::Cconj, D::Cc, 4).with_whitespace(" "),
            Token::new("in", "in", P::Adp, D::Conj, 4).with_whitespace(" "),
            Token::new("Europe", "Europe", P::Propn, D::Pobj, 7),
        ]);
        let extraction = extract(&TaggedText::new(vec![sentence]));
        assert_eq!(extraction.proper_nouns, vec!["Paris", "France", "Europe"]);
        assert_eq!(extraction.prepositions, vec!["in", "in"]);
        assert_eq!(extraction.connectives, vec!["and", "and"]);
        assert_eq!(
            extraction.relations,
            vec![candidate("Paris", "lie", "in")]
        );
        assert_eq!(extraction.trace.len(), 9);
        assert_eq!(extraction.trace[5].head_text, "in");
    }

    #[test]
    fn dangling_head_indexes_are_skipped() {
        let sentence = TaggedSentence::new(vec![
            Token::new("mammal", "mammal", P::Noun, D::Attr, 7),
            Token::new("that", "that", P::Pron, D::Nsubj, 2),
            Token::new("runs", "run", P::Verb, D::Relcl, 9),
        ]);
        let extraction = extract(&TaggedText::new(vec![sentence]));
        assert!(extraction.relations.is_empty());
        assert_eq!(extraction.trace[0].head_text, "");
        assert_eq!(extraction.common_nouns, vec!["mammal"]);
    }

    #[test]
    fn named_entities_are_not_common_nouns() {
        let sentence = TaggedSentence::new(vec![
            Token::new("Apple", "apple", P::Noun, D::Root, 0).with_entity("ORG"),
        ]);
        let extraction = extract(&TaggedText::new(vec![sentence]));
        assert!(extraction.common_nouns.is_empty());
    }
}
