use mockito::Matcher;
use serde_json::json;

use super::*;

fn translator_for(server: &mockito::Server) -> HttpTranslator {
    HttpTranslator::new(
        TranslatorSettings {
            endpoint: format!("{}/translate_a/single", server.url()),
            ..TranslatorSettings::default()
        },
        &HttpSettings::default(),
    )
    .unwrap()
}

#[test]
fn segments_are_concatenated_in_order() {
    let payload = json!([[["नमस्ते। ", "Hello. ", null], ["दुनिया", "World", null]], null, "en"]);
    assert_eq!(join_segments(&payload).as_deref(), Some("नमस्ते। दुनिया"));
    assert_eq!(join_segments(&json!([[]])), None);
    assert_eq!(join_segments(&json!({"x": 1})), None);
}

#[test]
fn sends_expected_query() {
    let mut server = mockito::Server::new();
    let m = server
        .mock("GET", "/translate_a/single")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client".into(), "gtx".into()),
            Matcher::UrlEncoded("sl".into(), "auto".into()),
            Matcher::UrlEncoded("tl".into(), "mr".into()),
            Matcher::UrlEncoded("dt".into(), "t".into()),
            Matcher::UrlEncoded("q".into(), "Rivers rise".into()),
        ]))
        .with_status(200)
        .with_body(r#"[[["नद्या वाढल्या","Rivers rise",null]],null,"en"]"#)
        .create();

    let out = translator_for(&server).translate(" Rivers rise ", "mr").unwrap();
    assert_eq!(out, "नद्या वाढल्या");
    m.assert();
}

#[test]
fn http_failure_is_a_service_error() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/translate_a/single")
        .match_query(Matcher::Any)
        .with_status(429)
        .create();
    let err = translator_for(&server).translate("hello", "hi").unwrap_err();
    assert!(matches!(err, NewsreelError::Service(_)), "{err}");
    assert!(err.to_string().contains("hi"));
}

#[test]
fn unparseable_body_is_a_service_error() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/translate_a/single")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>captcha</html>")
        .create();
    let err = translator_for(&server).translate("hello", "hi").unwrap_err();
    assert!(matches!(err, NewsreelError::Service(_)), "{err}");
}

#[test]
fn empty_input_makes_no_request() {
    let mut server = mockito::Server::new();
    let m = server.mock("GET", Matcher::Any).expect(0).create();
    let t = translator_for(&server);
    assert!(matches!(t.translate("", "hi").unwrap_err(), NewsreelError::EmptyInput(_)));
    assert!(matches!(t.translate("x", " ").unwrap_err(), NewsreelError::Validation(_)));
    m.assert();
}
