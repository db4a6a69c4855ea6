use std::io::Cursor;

use mockito::Matcher;

use super::*;

fn wav_bytes(sample_rate: u32, samples: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..samples {
            w.write_sample(0i16).unwrap();
        }
        w.finalize().unwrap();
    }
    cursor.into_inner()
}

fn synth(server: &mockito::Server) -> HttpSpeechSynthesizer {
    HttpSpeechSynthesizer::new(
        TtsSettings {
            endpoint: format!("{}/tts", server.url()),
            lang: "en".into(),
        },
        &HttpSettings::default(),
        "ffprobe",
    )
    .unwrap()
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
fn chunks_respect_limit_and_word_boundaries() {
    let text = "alpha beta gamma delta epsilon";
    let chunks = chunk_text(text, 11);
    assert_eq!(chunks, vec!["alpha beta", "gamma delta", "epsilon"]);
    assert!(chunks.iter().all(|c| c.chars().count() <= 11));

    let long = "word ".repeat(60);
    let chunks = chunk_text(&long, TTS_CHUNK_CHARS);
    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.chars().count() <= TTS_CHUNK_CHARS));
    assert_eq!(chunks.join(" "), long.trim());
}

#[test]
fn synthesizes_wav_and_measures_duration() {
    let mut server = mockito::Server::new();
    let m = server
        .mock("GET", "/tts")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("tl".into(), "en".into()),
            Matcher::UrlEncoded("client".into(), "tw-ob".into()),
            Matcher::UrlEncoded("q".into(), "hello world".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "audio/wav")
        .with_body(wav_bytes(16_000, 40_000))
        .create();

    let dir = tempfile::tempdir().unwrap();
    let track = synth(&server).synthesize("hello world", dir.path()).unwrap();
    m.assert();

    assert_eq!(track.duration_secs(), 2.5);
    assert!(track.path().exists());
    assert!(track.path().starts_with(dir.path()));
    let name = track.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("narration_") && name.ends_with(".wav"), "{name}");

    drop(track);
    assert_eq!(files_in(dir.path()), 0);
}

#[test]
fn names_are_unique_per_call() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/tts")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(wav_bytes(8000, 800))
        .expect(2)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let s = synth(&server);
    let a = s.synthesize("one", dir.path()).unwrap();
    let b = s.synthesize("two", dir.path()).unwrap();
    assert_ne!(a.path(), b.path());
}

#[test]
fn empty_text_is_rejected_without_a_request() {
    let mut server = mockito::Server::new();
    let m = server.mock("GET", "/tts").match_query(Matcher::Any).expect(0).create();

    let dir = tempfile::tempdir().unwrap();
    let err = synth(&server).synthesize("  \n ", dir.path()).unwrap_err();
    m.assert();
    assert!(matches!(err, NewsreelError::EmptyInput(_)), "{err}");
}

#[test]
fn server_error_is_a_synthesis_error_and_leaves_nothing_behind() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/tts")
        .match_query(Matcher::Any)
        .with_status(503)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let err = synth(&server).synthesize("hello", dir.path()).unwrap_err();
    assert!(matches!(err, NewsreelError::Synthesis(_)), "{err}");
    assert_eq!(files_in(dir.path()), 0);
}

#[test]
fn failed_measurement_removes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = NarrationTrack::write_in(dir.path(), b"ID3 fake mp3", |_| {
        Err(NewsreelError::synthesis("no duration"))
    })
    .unwrap_err();
    assert!(err.to_string().contains("no duration"));
    assert_eq!(files_in(dir.path()), 0);
}
