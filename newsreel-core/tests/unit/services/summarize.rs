use mockito::Matcher;
use serde_json::json;

use super::*;

fn settings_for(server: &mockito::Server) -> SummarizerSettings {
    SummarizerSettings {
        endpoint: format!("{}/models/bart", server.url()),
        ..SummarizerSettings::default()
    }
}

#[test]
fn truncation_respects_word_boundaries() {
    assert_eq!(truncate_on_word("  short text ", 50), "short text");
    assert_eq!(truncate_on_word("alpha beta gamma", 12), "alpha beta");
    assert_eq!(truncate_on_word("alpha beta gamma", 10), "alpha beta");
    assert_eq!(truncate_on_word("alpha beta gamma", 9), "alpha");
    assert_eq!(truncate_on_word("abcdefghij", 4), "abcd");
    assert_eq!(truncate_on_word("", 4), "");
}

#[test]
fn posts_inputs_with_generation_parameters() {
    let mut server = mockito::Server::new();
    let m = server
        .mock("POST", "/models/bart")
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::Json(json!({
            "inputs": "The river rose overnight.",
            "parameters": {"max_length": 150, "min_length": 50, "do_sample": false}
        })))
        .with_status(200)
        .with_body(r#"[{"summary_text": "  River rose.  "}]"#)
        .create();

    let s = HttpSummarizer::new(
        SummarizerSettings {
            api_token: Some("secret".into()),
            ..settings_for(&server)
        },
        &HttpSettings::default(),
    )
    .unwrap();
    assert_eq!(s.summarize("The river rose overnight.").unwrap(), "River rose.");
    m.assert();
}

#[test]
fn empty_text_is_rejected_without_a_request() {
    let mut server = mockito::Server::new();
    let m = server.mock("POST", Matcher::Any).expect(0).create();
    let s = HttpSummarizer::new(settings_for(&server), &HttpSettings::default()).unwrap();
    let err = s.summarize("   ").unwrap_err();
    assert!(matches!(err, NewsreelError::EmptyInput(_)), "{err}");
    m.assert();
}

#[test]
fn backend_failures_are_service_errors() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("POST", "/models/bart")
        .with_status(503)
        .with_body("model loading")
        .create();
    let s = HttpSummarizer::new(settings_for(&server), &HttpSettings::default()).unwrap();
    let err = s.summarize("some article text").unwrap_err();
    assert!(matches!(err, NewsreelError::Service(_)), "{err}");
    assert!(err.to_string().contains("model loading"));
}

#[test]
fn malformed_or_empty_responses_are_service_errors() {
    let mut server = mockito::Server::new();
    let _a = server
        .mock("POST", "/models/bart")
        .with_status(200)
        .with_body(r#"{"error": "nope"}"#)
        .create();
    let s = HttpSummarizer::new(settings_for(&server), &HttpSettings::default()).unwrap();
    assert!(matches!(s.summarize("text").unwrap_err(), NewsreelError::Service(_)));

    let mut server = mockito::Server::new();
    let _b = server
        .mock("POST", "/models/bart")
        .with_status(200)
        .with_body("[]")
        .create();
    let s = HttpSummarizer::new(settings_for(&server), &HttpSettings::default()).unwrap();
    assert!(matches!(s.summarize("text").unwrap_err(), NewsreelError::Service(_)));
}

#[test]
fn invalid_settings_are_rejected() {
    let bad = SummarizerSettings {
        min_length: 200,
        ..SummarizerSettings::default()
    };
    assert!(HttpSummarizer::new(bad, &HttpSettings::default()).is_err());
}
