// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Builds a producer from the render configuration and pulls frames from it
//! concurrently, writing each image (and optionally its waveform) to disk.

use anyhow::{anyhow, Context};
use framekit_core::{
    frame_defaults, pull_frame, Image, ImageFormat, ImageRequest, Producer, ServiceRegistry,
    Waveform,
};
use framekit_nodes::core::{Chain, CutProducer, MixProducer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::config::{RenderConfig, TrackConfig};

/// Builds one track: producer, optional cut, then its filters.
///
/// # Errors
///
/// Returns an error if a service kind is unknown, has the wrong role, or
/// rejects its parameters.
pub fn build_track(registry: &ServiceRegistry, track: &TrackConfig) -> anyhow::Result<Arc<dyn Producer>> {
    let mut producer =
        registry.create_producer(&track.producer.kind, track.producer.params.as_ref())?;

    if track.in_point.is_some() || track.out_point.is_some() {
        let cut = CutProducer::new(
            producer,
            track.in_point.unwrap_or(0),
            track.out_point.unwrap_or(i64::MAX),
        )
        .map_err(|e| anyhow!("{e}"))?;
        producer = Arc::new(cut);
    }

    let mut chain = Chain::new(producer);
    for spec in &track.filters {
        chain.attach(
            registry
                .create_filter(&spec.kind, spec.params.as_ref())
                .with_context(|| format!("filter '{}'", spec.kind))?,
        );
    }
    Ok(Arc::new(chain))
}

/// Builds all tracks and folds them left to right with the configured transition.
///
/// # Errors
///
/// Returns an error if there are no tracks or any service fails to build.
pub fn build_producer(registry: &ServiceRegistry, render: &RenderConfig) -> anyhow::Result<Arc<dyn Producer>> {
    let mut tracks = render.tracks.iter().enumerate().map(|(i, track)| {
        build_track(registry, track).with_context(|| format!("track {i} ('{}')", track.producer.kind))
    });
    let first = tracks.next().ok_or_else(|| anyhow!("at least one track is required"))??;

    tracks.try_fold(first, |a, b| -> anyhow::Result<Arc<dyn Producer>> {
        let transition = registry
            .create_transition(&render.transition.kind, render.transition.params.as_ref())
            .with_context(|| format!("transition '{}'", render.transition.kind))?;
        Ok(Arc::new(MixProducer::new(a, b?, transition)) as Arc<dyn Producer>)
    })
}

/// What happened to one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub position: i64,
    pub image_path: PathBuf,
    pub waveform_path: Option<PathBuf>,
    pub test_card: bool,
    pub test_audio: bool,
}

/// Totals over a render.
#[derive(Debug, Default, Clone)]
pub struct RenderSummary {
    pub frames: usize,
    pub test_cards: usize,
    pub silent: usize,
}

impl RenderSummary {
    fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.test_cards += usize::from(report.test_card);
        self.silent += usize::from(report.test_audio);
        tracing::debug!(
            position = report.position,
            image = %report.image_path.display(),
            test_card = report.test_card,
            test_audio = report.test_audio,
            "Rendered frame"
        );
    }
}

#[derive(Debug, Clone)]
struct FrameJob {
    out_dir: PathBuf,
    format: ImageFormat,
    waveform_height: Option<usize>,
}

/// Pulls and writes one frame. Runs on the blocking pool.
fn render_frame(producer: &Arc<dyn Producer>, position: i64, job: &FrameJob) -> anyhow::Result<FrameReport> {
    let mut frame = pull_frame(producer, position)?;
    let defaults = frame_defaults();

    let image = frame
        .get_image(&ImageRequest::new(job.format, defaults.width, defaults.height))
        .with_context(|| format!("image of frame {position}"))?;
    let image_path = job.out_dir.join(image_file_name(position, job.format));
    write_image(&image_path, &image)?;

    let waveform_path = match job.waveform_height {
        Some(height) => {
            let waveform = frame
                .get_waveform(image.width, height)
                .with_context(|| format!("waveform of frame {position}"))?;
            let path = job.out_dir.join(format!("wave_{position:05}.pgm"));
            write_waveform(&path, &waveform)?;
            Some(path)
        },
        None => None,
    };

    Ok(FrameReport {
        position,
        image_path,
        waveform_path,
        test_card: frame.is_test_card(),
        test_audio: frame.is_test_audio(),
    })
}

fn image_file_name(position: i64, format: ImageFormat) -> String {
    match format {
        ImageFormat::Rgb24 => format!("frame_{position:05}.ppm"),
        other => format!("frame_{position:05}.{}", other.name()),
    }
}

/// `rgb24` is written as binary PPM; every other format as raw bytes.
fn write_image(path: &Path, image: &Image) -> anyhow::Result<()> {
    let mut bytes = Vec::with_capacity(image.data().len() + 32);
    if image.format == ImageFormat::Rgb24 {
        bytes.extend_from_slice(format!("P6\n{} {}\n255\n", image.width, image.height).as_bytes());
    }
    bytes.extend_from_slice(image.data());
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn write_waveform(path: &Path, waveform: &Waveform) -> anyhow::Result<()> {
    let mut bytes = format!("P5\n{} {}\n255\n", waveform.width, waveform.height).into_bytes();
    bytes.extend_from_slice(&waveform.data);
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

/// Renders positions `0..frames`, at most `threads` frames in flight.
///
/// # Errors
///
/// Returns the first frame error, or an error if the output directory
/// cannot be created.
pub async fn render(producer: Arc<dyn Producer>, config: &RenderConfig) -> anyhow::Result<RenderSummary> {
    let out_dir = PathBuf::from(&config.out_dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let job = FrameJob {
        out_dir,
        format: config.image_format,
        waveform_height: config.waveform.then_some(config.waveform_height).filter(|h| *h > 0),
    };
    let limit = config.threads.max(1);
    let mut tasks = JoinSet::new();
    let mut summary = RenderSummary::default();

    tracing::info!(producer = producer.id(), frames = config.frames, threads = limit, "Starting render");

    for position in 0..config.frames.max(0) {
        if tasks.len() >= limit {
            if let Some(result) = tasks.join_next().await {
                summary.record(&result??);
            }
        }
        let producer = Arc::clone(&producer);
        let job = job.clone();
        tasks.spawn_blocking(move || render_frame(&producer, position, &job));
    }
    while let Some(result) = tasks.join_next().await {
        summary.record(&result??);
    }

    tracing::info!(
        frames = summary.frames,
        test_cards = summary.test_cards,
        silent = summary.silent,
        "Render finished"
    );
    Ok(summary)
}
