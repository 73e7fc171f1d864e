#![cfg(feature = "provider-api")]
//! Integration tests for `TeprolinClient` against a mocked service.

use httpmock::{Method::POST, MockServer};
use lexical_ambiguity::{
    Dependency, HttpTransport, RetryPolicy, TeprolinClient, TeprolinError, TextProcessor,
};
use rstest::{fixture, rstest};
use serde_json::json;
use std::time::Duration;

#[fixture]
fn server() -> MockServer {
    MockServer::start()
}

fn client(server: &MockServer) -> TeprolinClient {
    let transport = HttpTransport::new(Duration::from_secs(2), RetryPolicy::none())
        .unwrap_or_else(|e| panic!("client: {e}"));
    TeprolinClient::with_transport(server.base_url(), transport)
}

fn sentences(tokens: &[&[serde_json::Value]]) -> serde_json::Value {
    json!({ "teprolin-result": { "tokenized": tokens } })
}

#[rstest]
fn tokenizes_across_sentences(server: MockServer) {
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/process")
            .x_www_form_urlencoded_tuple("text", "Ion merge. Maria stă.")
            .x_www_form_urlencoded_tuple("exec", "tokenization");
        then.status(200).json_body(sentences(&[
            &[
                json!({ "_wordform": "Ion" }),
                json!({ "_wordform": "merge" }),
                json!({ "_wordform": "." }),
            ],
            &[
                json!({ "_wordform": "Maria" }),
                json!({ "_wordform": "" }),
                json!({ "_wordform": "stă" }),
            ],
        ]));
    });
    let tokens = client(&server)
        .process("Ion merge. Maria stă.")
        .unwrap_or_else(|e| panic!("tokenize: {e}"));
    assert_eq!(tokens, vec!["Ion", "merge", ".", "Maria", "stă"]);
    mock.assert();
}

#[rstest]
fn blank_text_is_not_sent(server: MockServer) {
    let mock = server.mock(|when, then| {
        when.method(POST).path("/process");
        then.status(200).json_body(sentences(&[]));
    });
    let tokens = client(&server)
        .tokenize("  ")
        .unwrap_or_else(|e| panic!("tokenize: {e}"));
    assert!(tokens.is_empty());
    mock.assert_hits(0);
}

#[rstest]
fn pos_tags_join_tokens(server: MockServer) {
    server.mock(|when, then| {
        when.method(POST)
            .path("/process")
            .x_www_form_urlencoded_tuple("text", "Ion merge")
            .x_www_form_urlencoded_tuple("exec", "pos-tagging");
        then.status(200).json_body(sentences(&[&[
            json!({ "_wordform": "Ion", "_ctg": "NP" }),
            json!({ "_wordform": "merge", "_ctg": "V3" }),
        ]]));
    });
    let tags = client(&server)
        .pos_tags(&["Ion".to_owned(), "merge".to_owned()])
        .unwrap_or_else(|e| panic!("pos tags: {e}"));
    assert_eq!(
        tags,
        vec![
            ("Ion".to_owned(), "NP".to_owned()),
            ("merge".to_owned(), "V3".to_owned())
        ]
    );
}

#[rstest]
fn named_entities_are_labelled(server: MockServer) {
    server.mock(|when, then| {
        when.method(POST)
            .path("/process")
            .x_www_form_urlencoded_tuple("exec", "named-entity-recognition");
        then.status(200).json_body(sentences(&[&[
            json!({ "_wordform": "Călărași", "_ner": "LOC" }),
        ]]));
    });
    let entities = client(&server)
        .named_entities(&["Călărași".to_owned()])
        .unwrap_or_else(|e| panic!("entities: {e}"));
    assert_eq!(entities, vec![("Călărași".to_owned(), "LOC".to_owned())]);
}

#[rstest]
fn dependency_parsing_selects_model(server: MockServer) {
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/process")
            .x_www_form_urlencoded_tuple("exec", "dependency-parsing")
            .x_www_form_urlencoded_tuple("model", "udpipe-ufal");
        then.status(200).json_body(sentences(&[&[
            json!({ "_wordform": "Ion", "_deprel": "nsubj", "_head": 2 }),
            json!({ "_wordform": "merge", "_deprel": "root", "_head": 0 }),
        ]]));
    });
    let deps = client(&server)
        .dependencies("Ion merge")
        .unwrap_or_else(|e| panic!("dependencies: {e}"));
    assert_eq!(
        deps,
        vec![
            Dependency {
                word: "Ion".into(),
                relation: "nsubj".into(),
                head: "2".into(),
            },
            Dependency {
                word: "merge".into(),
                relation: "root".into(),
                head: "0".into(),
            },
        ]
    );
    mock.assert();
}

#[rstest]
fn error_status_is_a_request_error(server: MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/process");
        then.status(500);
    });
    assert!(matches!(
        client(&server).tokenize("bancă"),
        Err(TeprolinError::Request(_))
    ));
}

#[rstest]
fn malformed_body_is_an_invalid_response(server: MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/process");
        then.status(200).body("<html>");
    });
    assert!(matches!(
        client(&server).tokenize("bancă"),
        Err(TeprolinError::InvalidResponse(_))
    ));
}
