// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

#![allow(clippy::unwrap_used, clippy::expect_used)]

use framekit_core::{
    keys, rgb_to_yuv, sample_calculator, sample_calculator_to_now, yuv_to_rgb, Audio, AudioFormat,
    AudioRequest, Frame, FrameError, FrameHooks, Image, ImageFormat, ImageRequest, ImageState,
    StandardHooks,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Pushes a callback that records `name` when entered and when it finishes,
/// pulling upstream in between and appending `name` to the pixel data trail.
fn push_tracing_op(frame: &mut Frame, name: u8, log: Arc<Mutex<Vec<String>>>) {
    frame.push_get_image(move |frame, request| {
        log.lock().unwrap().push(format!("enter {}", name as char));
        let upstream = frame.get_image(request)?;
        // Effect: write this op's name into the first byte not yet tagged.
        let mut image = upstream;
        let data = image.make_data_mut();
        if let Some(slot) = data.iter_mut().find(|b| **b == 0) {
            *slot = name;
        }
        log.lock().unwrap().push(format!("apply {}", name as char));
        Ok(image)
    });
}

#[test]
fn callbacks_run_last_pushed_first() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut frame = Frame::new(0);

    // Base image with room for three tags.
    frame.push_get_image(|_, _| Image::from_vec(ImageFormat::Rgb24, 1, 1, vec![0, 0, 0]));
    for name in [b'A', b'B', b'C'] {
        push_tracing_op(&mut frame, name, Arc::clone(&log));
    }
    assert_eq!(frame.image_state(), ImageState::HasPendingOps);

    let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24, 1, 1)).unwrap();

    // C is entered first and delegates inward; A, pushed first, is nearest
    // the source, so effects unwind A then B then C.
    assert_eq!(
        *log.lock().unwrap(),
        ["enter C", "enter B", "enter A", "apply A", "apply B", "apply C"]
    );
    assert_eq!(image.data(), b"ABC");
    assert_eq!(frame.image_state(), ImageState::Resolved);
    assert!(!frame.is_test_card());
}

#[test]
fn chain_without_source_ends_in_test_card() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut frame = Frame::new(0);
    push_tracing_op(&mut frame, b'A', Arc::clone(&log));

    let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24, 2, 1)).unwrap();
    assert!(frame.is_test_card());
    // A white test card has no zero byte to tag.
    assert_eq!(image.data(), &[255; 6]);
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[test]
fn stale_operations_are_dropped_after_the_outer_pull() {
    let mut frame = Frame::new(0);
    let ran = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&ran);
    frame.push_get_image(move |_, _| {
        r.fetch_add(1, Ordering::SeqCst);
        Image::from_vec(ImageFormat::Rgb24, 1, 1, vec![1, 1, 1])
    });
    // This op produces its own image and never pulls upstream.
    frame.push_get_image(|_, _| Image::from_vec(ImageFormat::Rgb24, 1, 1, vec![2, 2, 2]));

    let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24, 1, 1)).unwrap();
    assert_eq!(image.data(), &[2, 2, 2]);
    assert!(frame.image_stack().is_empty());

    let again = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24, 1, 1)).unwrap();
    assert_eq!(again.data(), &[2, 2, 2]);
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn convert_image_to_same_format_is_a_no_op() {
    let mut frame = Frame::new(0);
    let mut image = Image::from_vec(ImageFormat::Yuv422, 2, 1, vec![81, 90, 145, 240]).unwrap();
    let before = image.clone();

    // Even without hooks, identity conversion succeeds.
    frame.convert_image(&mut image, ImageFormat::Yuv422).unwrap();
    assert_eq!(image.format, ImageFormat::Yuv422);
    assert!(image.shares_data_with(&before));

    frame.set_hooks(StandardHooks::shared());
    frame.convert_image(&mut image, ImageFormat::Yuv422).unwrap();
    assert_eq!(image.data(), before.data());
}

#[test]
fn negotiation_converts_through_hooks() {
    let mut frame = Frame::new(0);
    frame.set_hooks(StandardHooks::shared());
    frame.push_get_image(|_, _| Image::from_vec(ImageFormat::Rgb24, 2, 1, vec![255; 6]));

    let image = frame.get_image(&ImageRequest::new(ImageFormat::Yuv420p, 2, 1)).unwrap();
    assert_eq!(image.format, ImageFormat::Yuv420p);
    assert_eq!(image.data(), &[234, 234, 128, 128]);
    assert_eq!(frame.get_string(keys::FORMAT).as_deref(), Some("yuv420p"));
}

#[test]
fn scaled_round_trip_stays_close() {
    // Broadcast-legal greys and primaries.
    for (r, g, b) in [(16, 16, 16), (128, 128, 128), (235, 235, 235), (180, 16, 16), (16, 180, 16)] {
        let (y, u, v) = rgb_to_yuv(r, g, b);
        let (r2, g2, b2) = yuv_to_rgb(y, u, v);
        assert!(r.abs_diff(r2) <= 4 && g.abs_diff(g2) <= 4 && b.abs_diff(b2) <= 4);
    }
}

#[test]
fn sample_counts_never_drift() {
    for fps in [25.0, 30000.0 / 1001.0, 24.0] {
        for frequency in [44100, 48000] {
            let mut sum = 0i64;
            for k in 1..=250 {
                sum += i64::from(sample_calculator(fps, frequency, k - 1));
                assert_eq!(sum, sample_calculator_to_now(fps, frequency, k - 1));
            }
        }
    }
    assert_eq!(sample_calculator_to_now(25.0, 48000, 24), 48000);
}

#[test]
fn alpha_mask_without_alpha_is_opaque_and_sized() {
    let mut frame = Frame::new(0);
    frame.set_int(keys::WIDTH, 16);
    frame.set_int(keys::HEIGHT, 9);
    let mask = frame.get_alpha_mask();
    assert_eq!((mask.width, mask.height), (16, 9));
    assert_eq!(mask.data().len(), 144);
    assert!(mask.is_opaque());
}

/// Hooks that only know S16 -> F32LE.
struct NarrowHooks;

impl FrameHooks for NarrowHooks {
    fn convert_audio(&self, frame: &mut Frame, audio: &mut Audio, output: AudioFormat) -> framekit_core::Result<()> {
        if audio.format == AudioFormat::S16 && output == AudioFormat::F32le {
            return StandardHooks.convert_audio(frame, audio, output);
        }
        Err(FrameError::unsupported_audio(audio.format, output))
    }
}

#[test]
fn unsupported_audio_conversion_leaves_buffer_untouched() {
    let mut frame = Frame::new(0);
    frame.set_hooks(Arc::new(NarrowHooks));
    let mut audio = Audio::from_s16(48000, 2, &[1, 2, 3, 4]).unwrap();
    let before = audio.data().to_vec();

    let err = frame.convert_audio(&mut audio, AudioFormat::U8).unwrap_err();
    assert!(matches!(err, FrameError::UnsupportedConversion(_)));
    assert_eq!(audio.format, AudioFormat::S16);
    assert_eq!(audio.data(), before.as_slice());

    // Without hooks at all.
    frame.clear_hooks();
    assert!(frame.convert_audio(&mut audio, AudioFormat::F32le).is_err());
    assert_eq!(audio.format, AudioFormat::S16);
}

#[test]
fn audio_filters_unwind_like_image_filters() {
    let mut frame = Frame::new(0);
    frame.set_hooks(StandardHooks::shared());
    frame.push_audio(|_, request| {
        let pcm = vec![1000i16; request.samples * request.channels];
        Audio::from_s16(request.frequency, request.channels, &pcm)
    });
    frame.push_audio(|frame, request| {
        let mut audio = frame.get_audio(&request.with_format(AudioFormat::S16))?;
        let doubled: Vec<i16> = audio.s16_samples().unwrap_or_default().iter().map(|s| s * 2).collect();
        audio = Audio::from_s16(audio.frequency, audio.channels, &doubled)?;
        Ok(audio)
    });

    let audio = frame.get_audio(&AudioRequest::new(AudioFormat::F32le, 48000, 1, 4)).unwrap();
    assert_eq!(audio.format, AudioFormat::F32le);
    let expected = 2000.0 / 32768.0;
    assert!(audio.f32_samples().unwrap().iter().all(|&s| (s - expected).abs() < 1e-6));
    assert!(!frame.is_test_audio());
}

#[test]
fn owned_buffers_are_released_once_at_teardown() {
    let released = Arc::new(AtomicUsize::new(0));
    let mut frame = Frame::new(0);
    let r = Arc::clone(&released);
    frame
        .set_audio(
            vec![0; 8],
            AudioFormat::S16,
            48000,
            2,
            2,
            Some(Box::new(move |bytes| {
                assert_eq!(bytes.len(), 8);
                r.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();

    // A consumer's handle keeps the buffer alive past the frame.
    let pulled = frame.get_audio(&AudioRequest::new(AudioFormat::S16, 48000, 2, 2)).unwrap();
    drop(frame);
    assert_eq!(released.load(Ordering::SeqCst), 0);
    drop(pulled);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn writable_consumers_do_not_disturb_the_frame() {
    let mut frame = Frame::new(0);
    let request = ImageRequest::new(ImageFormat::Rgb24, 1, 1).writable(true);
    let mut image = frame.get_image(&request).unwrap();
    image.make_data_mut().fill(0);

    let shared = frame.get_image(&request.writable(false)).unwrap();
    assert_eq!(shared.data(), &[255, 255, 255]);
}

#[test]
fn transition_style_service_stack_usage() {
    let mut a = Frame::new(0);
    let b = {
        let mut b = Frame::new(0);
        b.replace_image(Image::from_vec(ImageFormat::Rgb24, 1, 1, vec![10, 20, 30]).unwrap());
        b.into_handle()
    };
    a.push_frame(Arc::clone(&b));
    a.push_service_int(1);
    a.push_get_image(|frame, request| {
        let track = frame.pop_service_int()?;
        let other = frame.pop_frame()?;
        let mut image = frame.get_image(request)?;
        let theirs = other.lock().unwrap().get_image(request)?;
        if track == 1 {
            image.make_data_mut().copy_from_slice(theirs.data());
        }
        Ok(image)
    });

    let image = a.get_image(&ImageRequest::new(ImageFormat::Rgb24, 1, 1)).unwrap();
    assert_eq!(image.data(), &[10, 20, 30]);
    assert!(a.service_stack().is_empty());
}

#[test]
fn frames_move_between_threads() {
    let handles: Vec<_> = (0..4)
        .map(|position| {
            let mut frame = Frame::new(position);
            frame.push_get_image(|frame, request| {
                let mut image = frame.get_image(request)?;
                image.make_data_mut()[0] = 7;
                Ok(image)
            });
            std::thread::spawn(move || {
                let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24, 2, 2)).unwrap();
                (frame.position(), image.data()[0])
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), (i64::try_from(i).unwrap(), 7));
    }
}
