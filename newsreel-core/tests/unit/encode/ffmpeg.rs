use std::io::Cursor;

use super::*;
use crate::audio::probe::wav_duration_secs;
use crate::foundation::core::Rgba8;
use crate::render::caption::CaptionStyle;
use crate::render::frames::FrameRenderer;
use crate::render::schedule::schedule;

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

fn wav_bytes(secs: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..(8000.0 * secs) as u32 {
            w.write_sample(0i16).unwrap();
        }
        w.finalize().unwrap();
    }
    cursor.into_inner()
}

fn inputs(work: &Path, size: CanvasSize, fps: Fps, secs: f64) -> (FrameSet, NarrationTrack) {
    let narration = NarrationTrack::write_in(work, &wav_bytes(secs), wav_duration_secs).unwrap();
    let base = Canvas::filled(size, Rgba8::rgb(10, 60, 90));
    let text = "one two three";
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    let sched = schedule(text, narration.duration_secs(), fps);
    let style = CaptionStyle {
        font_size_px: 8.0,
        ..CaptionStyle::video()
    };
    let frames = FrameRenderer::default()
        .render(&base, &words, &sched, &style, work)
        .unwrap();
    (frames, narration)
}

#[test]
fn mux_args_describe_the_encode() {
    let muxer = Muxer::new(&EncoderSettings {
        ffmpeg: Some("ffmpeg".into()),
        ..EncoderSettings::default()
    });
    let args = strings(&muxer.build_args(
        Path::new("/t/frame_%06d.png"),
        Fps::integer(24).unwrap(),
        Path::new("/t/narration.mp3"),
        CanvasSize::VIDEO,
        Path::new("/out/video.mp4"),
    ));
    let expected = [
        "-y",
        "-loglevel",
        "error",
        "-framerate",
        "24",
        "-i",
        "/t/frame_%06d.png",
        "-i",
        "/t/narration.mp3",
        "-vf",
        "scale=1280:720,format=yuv420p",
        "-c:v",
        "libx264",
        "-preset",
        "fast",
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        "aac",
        "-shortest",
        "-movflags",
        "+faststart",
        "/out/video.mp4",
    ];
    assert_eq!(args, expected);
}

#[test]
fn pipe_args_read_raw_rgba_from_stdin() {
    let args = strings(&PipeEncoder::build_args(
        "veryfast",
        CanvasSize::VIDEO,
        Fps::new(30000, 1001).unwrap(),
        Path::new("a.mp3"),
        Path::new("o.mp4"),
    ));
    let joined = args.join(" ");
    assert!(joined.starts_with("-y -loglevel error -f rawvideo -pix_fmt rgba -s 1280x720 -r 30000/1001 -i pipe:0 -i a.mp3"));
    assert!(joined.contains("-preset veryfast"));
    assert!(joined.ends_with("-shortest -movflags +faststart o.mp4"));
}

#[test]
fn missing_encoder_fails_and_still_cleans_up() {
    let work = tempfile::tempdir().unwrap();
    let size = CanvasSize::new(64, 36).unwrap();
    let fps = Fps::integer(4).unwrap();
    let (frames, narration) = inputs(work.path(), size, fps, 1.0);
    let out = work.path().join("out").join("video.mp4");

    let muxer = Muxer::new(&EncoderSettings {
        ffmpeg: Some(work.path().join("no-such-ffmpeg")),
        ..EncoderSettings::default()
    });
    let err = muxer.mux(frames, fps, narration, size, &out).unwrap_err();
    assert!(matches!(err, NewsreelError::Encode(_)), "{err}");

    let left: Vec<_> = std::fs::read_dir(work.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(left, vec![std::ffi::OsString::from("out")]);
    assert!(!out.exists());
}

#[test]
fn odd_dimensions_are_rejected() {
    assert!(validate_even(CanvasSize::new(63, 36).unwrap()).is_err());
    assert!(validate_even(CanvasSize::new(64, 36).unwrap()).is_ok());
}

#[test]
fn mux_produces_video_and_removes_inputs() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let work = tempfile::tempdir().unwrap();
    let size = CanvasSize::new(64, 36).unwrap();
    let fps = Fps::integer(4).unwrap();
    let (frames, narration) = inputs(work.path(), size, fps, 1.0);
    let out = work.path().join("video.mp4");

    let muxer = Muxer::new(&EncoderSettings::default());
    let path = muxer.mux(frames, fps, narration, size, &out).unwrap();
    assert_eq!(path, out);
    assert!(std::fs::metadata(&out).unwrap().len() > 0);

    let left: Vec<_> = std::fs::read_dir(work.path()).unwrap().collect();
    assert_eq!(left.len(), 1);
}

#[test]
fn encoder_failure_carries_stderr() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let work = tempfile::tempdir().unwrap();
    let size = CanvasSize::new(64, 36).unwrap();
    let fps = Fps::integer(4).unwrap();
    let (frames, _) = inputs(work.path(), size, fps, 1.0);
    let bogus = NarrationTrack::write_in(work.path(), b"not audio at all", |_| Ok(1.0)).unwrap();
    let out = work.path().join("video.mp4");

    let err = Muxer::new(&EncoderSettings::default())
        .mux(frames, fps, bogus, size, &out)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("encode error: ffmpeg exited"), "{msg}");
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[test]
fn pipe_encoder_streams_frames() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let work = tempfile::tempdir().unwrap();
    let size = CanvasSize::new(64, 36).unwrap();
    let fps = Fps::integer(4).unwrap();
    let narration =
        NarrationTrack::write_in(work.path(), &wav_bytes(1.0), wav_duration_secs).unwrap();
    let out = work.path().join("piped.mp4");

    let mut enc =
        PipeEncoder::begin(&EncoderSettings::default(), size, fps, narration.path(), &out)
            .unwrap();
    let frame = Canvas::filled(size, Rgba8::WHITE);
    for _ in 0..4 {
        enc.push_frame(&frame).unwrap();
    }
    assert!(enc.push_frame(&Canvas::filled(CanvasSize::new(2, 2).unwrap(), Rgba8::BLACK)).is_err());
    enc.finish().unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

#[cfg(unix)]
#[test]
fn stalled_pipe_fails_instead_of_blocking() {
    use std::os::unix::fs::PermissionsExt as _;

    let work = tempfile::tempdir().unwrap();
    let stuck = work.path().join("stuck-ffmpeg");
    std::fs::write(&stuck, "#!/bin/sh\nexec sleep 30\n").unwrap();
    std::fs::set_permissions(&stuck, std::fs::Permissions::from_mode(0o755)).unwrap();

    let size = CanvasSize::new(64, 36).unwrap();
    let narration =
        NarrationTrack::write_in(work.path(), &wav_bytes(1.0), wav_duration_secs).unwrap();
    let out = work.path().join("piped.mp4");
    let settings = EncoderSettings {
        ffmpeg: Some(stuck),
        timeout_secs: 1,
        ..EncoderSettings::default()
    };

    let started = Instant::now();
    let mut enc =
        PipeEncoder::begin(&settings, size, Fps::integer(4).unwrap(), narration.path(), &out)
            .unwrap();
    let frame = Canvas::filled(size, Rgba8::WHITE);
    let err = (0..1000)
        .find_map(|_| enc.push_frame(&frame).err())
        .expect("a stalled encoder must stop accepting frames");
    assert!(matches!(err, NewsreelError::Encode(_)), "{err}");
    assert!(err.to_string().contains("accepted no frame data"), "{err}");
    drop(enc);
    assert!(started.elapsed() < Duration::from_secs(20));
    assert!(!out.exists());
}
