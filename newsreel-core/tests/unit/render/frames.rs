use super::*;
use crate::foundation::core::{CanvasSize, Fps, Rgba8};
use crate::render::schedule::schedule;

fn setup(text: &str, secs: f64, fps: u32) -> (Canvas, Vec<String>, RevealSchedule, CaptionStyle) {
    let base = Canvas::filled(CanvasSize::new(96, 54).unwrap(), Rgba8::rgb(20, 40, 60));
    let words = text.split_whitespace().map(str::to_string).collect();
    let sched = schedule(text, secs, Fps::integer(fps).unwrap());
    let style = CaptionStyle {
        font_size_px: 8.0,
        max_line_chars: 12,
        panel_padding_px: 2,
        ..CaptionStyle::video()
    };
    (base, words, sched, style)
}

#[test]
fn writes_one_contiguous_file_per_entry() {
    let (base, words, sched, style) = setup("word1 word2 word3 word4", 4.0, 2);
    let work = tempfile::tempdir().unwrap();
    let set = FrameRenderer::default()
        .render(&base, &words, &sched, &style, work.path())
        .unwrap();

    assert_eq!(set.len(), 8);
    for (i, p) in set.paths().iter().enumerate() {
        assert_eq!(p.file_name().unwrap().to_string_lossy(), format!("frame_{i:06}.png"));
        assert!(p.is_file());
    }
    assert_eq!(set.pattern(), set.dir().join("frame_%06d.png"));
    assert_eq!(
        set.stats(),
        RenderStats {
            frames_total: 8,
            frames_rendered: 4,
            frames_elided: 4,
        }
    );

    let read = |i: usize| std::fs::read(&set.paths()[i]).unwrap();
    assert_eq!(read(0), read(1));
    assert_ne!(read(1), read(2));
    assert_eq!(read(6), read(7));
}

#[test]
fn frames_decode_to_base_size() {
    let (base, words, sched, style) = setup("a b", 1.0, 2);
    let work = tempfile::tempdir().unwrap();
    let set = FrameRenderer::default()
        .render(&base, &words, &sched, &style, work.path())
        .unwrap();
    let img = image::open(&set.paths()[1]).unwrap();
    assert_eq!((img.width(), img.height()), (96, 54));
}

#[test]
fn dropping_the_set_removes_every_frame() {
    let (base, words, sched, style) = setup("one two three", 1.5, 4);
    let work = tempfile::tempdir().unwrap();
    let set = FrameRenderer::default()
        .render(&base, &words, &sched, &style, work.path())
        .unwrap();
    let dir = set.dir().to_path_buf();
    assert!(dir.is_dir());
    drop(set);
    assert!(!dir.exists());
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[test]
fn parallel_matches_sequential() {
    let (base, words, sched, style) = setup("the quick brown fox jumps over", 3.0, 4);
    let work = tempfile::tempdir().unwrap();
    let seq = FrameRenderer::default()
        .render(&base, &words, &sched, &style, work.path())
        .unwrap();
    let par = FrameRenderer::new(
        None,
        FrameRenderOpts {
            parallel: true,
            threads: Some(2),
            static_frame_elision: false,
        },
    )
    .render(&base, &words, &sched, &style, work.path())
    .unwrap();

    assert_eq!(par.stats().frames_elided, 0);
    assert_eq!(seq.len(), par.len());
    for (a, b) in seq.paths().iter().zip(par.paths()) {
        assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
    }
}

#[test]
fn streaming_visits_every_frame_in_order() {
    let (base, words, sched, style) = setup("word1 word2 word3 word4", 4.0, 2);
    let mut seen = Vec::new();
    let stats = FrameRenderer::default()
        .for_each_frame(&base, &words, &sched, &style, |idx, canvas| {
            assert_eq!(canvas.size(), base.size());
            seen.push(idx.0);
            Ok(())
        })
        .unwrap();
    assert_eq!(seen, (0..8).collect::<Vec<_>>());
    assert_eq!(stats.frames_rendered, 4);
}

#[test]
fn missing_work_dir_is_a_render_error() {
    let (base, words, sched, style) = setup("a", 1.0, 1);
    let work = tempfile::tempdir().unwrap();
    let err = FrameRenderer::default()
        .render(&base, &words, &sched, &style, &work.path().join("nope"))
        .unwrap_err();
    assert!(matches!(err, NewsreelError::Render(_)), "{err}");
}

#[test]
fn zero_threads_is_rejected() {
    assert!(build_thread_pool(Some(0)).is_err());
    assert!(build_thread_pool(Some(1)).is_ok());
}
