//! Word-reveal frame sequences.
//!
//! Every schedule entry becomes one numbered PNG in a request-unique temp directory. Runs of
//! frames with the same visible word count are composited once and linked under the
//! remaining sequence names.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tempfile::TempDir;

use crate::assets::font::FontSource;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::render::canvas::Canvas;
use crate::render::caption::{CaptionStyle, Compositor};
use crate::render::glyphs::glyph_renderer_for;
use crate::render::schedule::RevealSchedule;

/// printf-style name of the numbered frame files, as understood by ffmpeg's image2 demuxer.
pub const FRAME_FILE_PATTERN: &str = "frame_%06d.png";

pub fn frame_file_name(idx: FrameIndex) -> String {
    format!("frame_{:06}.png", idx.0)
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FrameRenderOpts {
    /// Composite each distinct word count once and link the repeats.
    pub static_frame_elision: bool,
    /// Composite distinct frames on a rayon pool.
    pub parallel: bool,
    /// Worker count for `parallel`; rayon's default when unset.
    pub threads: Option<usize>,
}

impl Default for FrameRenderOpts {
    fn default() -> Self {
        Self {
            static_frame_elision: true,
            parallel: false,
            threads: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_total: u64,
    pub frames_rendered: u64,
    pub frames_elided: u64,
}

/// Rendered frame files. Dropping the set deletes the directory and every frame in it.
#[derive(Debug)]
pub struct FrameSet {
    dir: TempDir,
    paths: Vec<PathBuf>,
    stats: RenderStats,
}

impl FrameSet {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Input pattern addressing the whole sequence.
    pub fn pattern(&self) -> PathBuf {
        self.dir.path().join(FRAME_FILE_PATTERN)
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

/// First frame of every run of equal word counts, or every frame without elision.
fn unique_frames(schedule: &RevealSchedule, elide: bool) -> Vec<usize> {
    let mut out = Vec::with_capacity(schedule.len());
    let mut last = None;
    for (i, e) in schedule.iter().enumerate() {
        if !elide || last != Some(e.visible_words) {
            out.push(i);
            last = Some(e.visible_words);
        }
    }
    out
}

fn visible_text(words: &[String], count: usize) -> String {
    words[..count.min(words.len())].join(" ")
}

fn link_or_copy(src: &Path, dst: &Path) -> std::io::Result<()> {
    match std::fs::hard_link(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => std::fs::copy(src, dst).map(|_| ()),
    }
}

fn as_render_error(frame: FrameIndex, err: NewsreelError) -> NewsreelError {
    match err {
        NewsreelError::Render(_) => err,
        other => NewsreelError::render(format!("frame {}: {other}", frame.0)),
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameRenderer {
    font: Option<FontSource>,
    opts: FrameRenderOpts,
}

impl FrameRenderer {
    pub fn new(font: Option<FontSource>, opts: FrameRenderOpts) -> Self {
        Self { font, opts }
    }

    pub fn compositor(&self) -> Compositor {
        Compositor::new(glyph_renderer_for(self.font.as_ref()))
    }

    /// Render one file per schedule entry into a new temp directory under `work_dir`.
    #[tracing::instrument(level = "debug", skip_all, fields(frames = schedule.len()))]
    pub fn render(
        &self,
        base: &Canvas,
        words: &[String],
        schedule: &RevealSchedule,
        style: &CaptionStyle,
        work_dir: &Path,
    ) -> NewsreelResult<FrameSet> {
        style.validate()?;
        let dir = tempfile::Builder::new()
            .prefix("frames_")
            .tempdir_in(work_dir)
            .map_err(|e| {
                NewsreelError::render(format!(
                    "create frame directory in '{}': {e}",
                    work_dir.display()
                ))
            })?;
        let paths: Vec<PathBuf> = schedule
            .iter()
            .map(|e| dir.path().join(frame_file_name(e.frame)))
            .collect();

        let unique = unique_frames(schedule, self.opts.static_frame_elision);
        let render_one = |compositor: &mut Compositor, i: usize| -> NewsreelResult<()> {
            let entry = &schedule.entries[i];
            let text = visible_text(words, entry.visible_words);
            let frame = compositor
                .compose(base, &text, style)
                .map_err(|e| as_render_error(entry.frame, e))?;
            frame
                .save_png(&paths[i])
                .map_err(|e| as_render_error(entry.frame, e))
        };

        if self.opts.parallel && unique.len() > 1 {
            let pool = build_thread_pool(self.opts.threads)?;
            let results: Vec<NewsreelResult<()>> = pool.install(|| {
                unique
                    .par_iter()
                    .map_init(|| self.compositor(), |c, &i| render_one(c, i))
                    .collect()
            });
            for r in results {
                r?;
            }
        } else {
            let mut compositor = self.compositor();
            for &i in &unique {
                render_one(&mut compositor, i)?;
            }
        }

        // Fill the gaps between rendered frames in sequence order.
        let mut source = None;
        let mut next_unique = unique.iter().peekable();
        for (i, path) in paths.iter().enumerate() {
            if next_unique.peek() == Some(&&i) {
                next_unique.next();
                source = Some(i);
                continue;
            }
            let src = source
                .map(|s| &paths[s])
                .ok_or_else(|| NewsreelError::render("frame sequence has no leading frame"))?;
            link_or_copy(src, path).map_err(|e| {
                NewsreelError::render(format!("link frame '{}': {e}", path.display()))
            })?;
        }

        let total = paths.len() as u64;
        let rendered = unique.len() as u64;
        tracing::debug!(total, rendered, dir = %dir.path().display(), "frames written");
        Ok(FrameSet {
            dir,
            paths,
            stats: RenderStats {
                frames_total: total,
                frames_rendered: rendered,
                frames_elided: total - rendered,
            },
        })
    }

    /// Visit every frame in order without touching the disk. Repeated word counts reuse the
    /// previous canvas.
    pub fn for_each_frame(
        &self,
        base: &Canvas,
        words: &[String],
        schedule: &RevealSchedule,
        style: &CaptionStyle,
        mut visit: impl FnMut(FrameIndex, &Canvas) -> NewsreelResult<()>,
    ) -> NewsreelResult<RenderStats> {
        style.validate()?;
        let mut compositor = self.compositor();
        let mut current: Option<(usize, Canvas)> = None;
        let mut stats = RenderStats::default();
        for entry in schedule.iter() {
            let reuse = matches!(&current, Some((n, _)) if *n == entry.visible_words);
            if !reuse {
                let text = visible_text(words, entry.visible_words);
                let frame = compositor
                    .compose(base, &text, style)
                    .map_err(|e| as_render_error(entry.frame, e))?;
                current = Some((entry.visible_words, frame));
                stats.frames_rendered += 1;
            }
            stats.frames_total += 1;
            if let Some((_, frame)) = &current {
                visit(entry.frame, frame)?;
            }
        }
        stats.frames_elided = stats.frames_total - stats.frames_rendered;
        Ok(stats)
    }
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> NewsreelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(NewsreelError::validation(
            "frame render 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| NewsreelError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/frames.rs"]
mod tests;
