use knowgraph_core::nlp::{annotate_tagged, RelationCandidate};
use knowgraph_core::{AnnotateError, AnnotationService, TagError, TaggedText};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::Cell;

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

const EINSTEIN: &str = include_str!("fixtures/einstein.json");
const DOG_MAMMAL: &str = include_str!("fixtures/dog_mammal.json");
const TWO_SENTENCES: &str = include_str!("fixtures/two_sentences.json");

fn fixture(json: &str) -> TaggedText {
    serde_json::from_str(json).unwrap()
}

/// Tagger that serves pre-tagged fixtures keyed by their source text.
fn fixture_tagger(text: &str) -> Result<TaggedText, TagError> {
    [EINSTEIN, DOG_MAMMAL, TWO_SENTENCES]
        .into_iter()
        .map(fixture)
        .find(|tagged| tagged.text() == text)
        .ok_or_else(|| TagError::failed("no fixture for text"))
}

fn strip_markup(html: &str) -> String {
    let plain = MARKUP.replace_all(html, "");
    html_escape::decode_html_entities(&plain).into_owned()
}

#[test]
fn verbal_sentence_yields_subject_lemma_and_right_dependent() {
    let service = AnnotationService::new(fixture_tagger);

    let annotation = service
        .annotate("Einstein developed the theory of relativity.")
        .unwrap();
    let extraction = &annotation.extraction;
    assert_eq!(
        extraction.relations,
        vec![RelationCandidate {
            subject: "Einstein".to_string(),
            predicate: "develop".to_string(),
            object: "theory".to_string(),
        }]
    );
    assert_eq!(extraction.proper_nouns, vec!["Einstein"]);
    assert_eq!(extraction.common_nouns, vec!["theory", "relativity"]);
    assert_eq!(extraction.prepositions, vec!["of"]);
    assert!(extraction.connectives.is_empty());
    assert_eq!(extraction.trace.len(), 7);
    assert_eq!(extraction.trace[0].head_text, "developed");
    assert_eq!(extraction.trace[0].tag, "NNP");
}

#[test]
fn copular_sentence_yields_be_candidate() {
    let service = AnnotationService::new(fixture_tagger);

    let annotation = service.annotate("A dog is a mammal.").unwrap();
    assert_eq!(
        annotation.extraction.relations,
        vec![RelationCandidate {
            subject: "dog".to_string(),
            predicate: "be".to_string(),
            object: "mammal".to_string(),
        }]
    );
    assert_eq!(
        annotation.highlighted_html,
        "A <strong>dog</strong> is a <strong>mammal</strong>."
    );
}

#[test]
fn highlight_marks_chunks_predicates_and_prepositions() {
    let annotation = annotate_tagged(&fixture(EINSTEIN)).unwrap();
    assert_eq!(
        annotation.highlighted_html,
        concat!(
            "<strong>Einstein</strong> ",
            r#"<span style="font-style:italic">developed</span> "#,
            "the <strong>theory</strong> ",
            r#"<span style="color:blue">of</span> "#,
            "<strong>relativity</strong>."
        )
    );
}

#[test]
fn stripped_highlight_reproduces_source_text_exactly() {
    for json in [EINSTEIN, DOG_MAMMAL, TWO_SENTENCES] {
        let tagged = fixture(json);
        let annotation = annotate_tagged(&tagged).unwrap();
        assert_eq!(strip_markup(&annotation.highlighted_html), tagged.text());
    }
}

#[test]
fn multi_sentence_text_is_escaped_and_styled_per_token() {
    let tagged = fixture(TWO_SENTENCES);
    assert_eq!(
        tagged.text(),
        "Small cats  chase mice & rats.\nTom lives in \"Rome\"!"
    );

    let annotation = annotate_tagged(&tagged).unwrap();
    let html = &annotation.highlighted_html;
    assert!(html.contains("&amp;"));
    assert!(html.contains("<strong>&quot;Rome&quot;</strong>"));
    assert!(html.contains(r#"<span style="color:blue">in</span>"#));
    assert!(html.contains(r#"<span style="font-style:italic">lives</span>"#));
    assert!(html.contains(".\n<strong>Tom</strong>"));

    let extraction = &annotation.extraction;
    assert_eq!(extraction.relations.len(), 2);
    assert_eq!(extraction.relations[1].predicate, "live");
    assert_eq!(extraction.attributes.len(), 1);
    assert_eq!(extraction.attributes[0].entity, "cats");
    assert_eq!(extraction.attributes[0].attribute, "Small");
    assert_eq!(extraction.connectives, vec!["&"]);
    assert_eq!(extraction.proper_nouns, vec!["Tom", "\"Rome\""]);
}

#[test]
fn blank_text_fails_without_calling_the_tagger() {
    let calls = Cell::new(0);
    let tagger = |text: &str| -> Result<TaggedText, TagError> {
        calls.set(calls.get() + 1);
        fixture_tagger(text)
    };
    let service = AnnotationService::new(tagger);

    assert_eq!(service.annotate("").unwrap_err(), AnnotateError::EmptyInput);
    assert_eq!(
        service.annotate(" \n\t ").unwrap_err(),
        AnnotateError::EmptyInput
    );
    assert_eq!(calls.get(), 0);
}

#[test]
fn tagger_failures_and_malformed_output_are_surfaced() {
    let service = AnnotationService::new(fixture_tagger);
    assert!(matches!(
        service.annotate("Unknown text.").unwrap_err(),
        AnnotateError::Tagger(TagError::Failed(_))
    ));

    let broken = |text: &str| -> Result<TaggedText, TagError> {
        let mut tagged = fixture_tagger(text)?;
        tagged.sentences[0].tokens[0].head = 99;
        Ok(tagged)
    };
    let service = AnnotationService::new(broken);
    assert!(matches!(
        service.annotate("A dog is a mammal.").unwrap_err(),
        AnnotateError::Tagger(TagError::HeadOutOfRange { head: 99, .. })
    ));
}

#[test]
fn annotation_serializes_flat_for_transport() {
    let annotation = annotate_tagged(&fixture(DOG_MAMMAL)).unwrap();
    let json = serde_json::to_value(&annotation).unwrap();

    assert_eq!(json["relations"][0]["predicate"], "be");
    assert_eq!(json["trace"][2]["pos"], "AUX");
    assert_eq!(json["trace"][2]["dep"], "ROOT");
    assert!(json["highlighted_html"].as_str().unwrap().contains("mammal"));
}

#[test]
fn node_labels_are_parsed_through_the_tagger() {
    let label_tagger = |text: &str| -> Result<TaggedText, TagError> {
        assert_eq!(text, "all mammals");
        serde_json::from_str(
            r#"{"sentences":[{"tokens":[
                {"text":"all","lemma":"all","pos":"DET","dep":"det","head":1,"whitespace":" "},
                {"text":"mammals","lemma":"mammal","pos":"NOUN","dep":"ROOT","head":1}
            ]}]}"#,
        )
        .map_err(|err| TagError::failed(err.to_string()))
    };
    let service = AnnotationService::new(label_tagger);

    let parsed = service.parse_node_label("  all mammals ").unwrap();
    assert!(parsed.parsed);
    assert_eq!(parsed.title, "mammals");
    assert_eq!(parsed.qualifier.as_deref(), Some("all"));

    assert_eq!(
        service.parse_node_label(" ").unwrap_err(),
        AnnotateError::EmptyInput
    );
}
