// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Audio sample and timestamp arithmetic for constant frame rates.
//!
//! Per-frame sample counts are derived from rounded cumulative totals, so a
//! run of frames starting at position 0 never drifts from wall-clock time.

/// Samples elapsed at the *start* of `position`, rounded half away from zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn samples_at(fps: f64, frequency: u32, position: i64) -> i64 {
    let exact = position as f64 * f64::from(frequency) / fps;
    (exact + if exact < 0.0 { -0.5 } else { 0.5 }) as i64
}

/// Number of audio samples that belong to video frame `position`.
///
/// Returns 0 for a non-positive frame rate or a zero frequency.
#[allow(clippy::cast_possible_truncation)]
pub fn sample_calculator(fps: f64, frequency: u32, position: i64) -> i32 {
    if !(fps > 0.0) || frequency == 0 {
        return 0;
    }
    let count = samples_at(fps, frequency, position + 1) - samples_at(fps, frequency, position);
    count as i32
}

/// Samples elapsed through the end of `position`.
///
/// Equals the sum of [`sample_calculator`] over `0..=position`, which is what
/// a producer needs to resynchronise after a seek.
pub fn sample_calculator_to_now(fps: f64, frequency: u32, position: i64) -> i64 {
    if !(fps > 0.0) || frequency == 0 {
        return 0;
    }
    samples_at(fps, frequency, position + 1)
}

/// Duration of `samples` at `frequency`, in microseconds.
///
/// Returns `None` if `frequency` is 0.
#[allow(clippy::cast_possible_truncation)]
pub fn samples_to_duration_us(samples: u64, frequency: u32) -> Option<u64> {
    if frequency == 0 {
        return None;
    }
    Some((u128::from(samples) * 1_000_000 / u128::from(frequency)) as u64)
}

/// Presentation time of frame `position`, in microseconds.
///
/// Returns `None` for a non-positive frame rate.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn position_to_timestamp_us(position: i64, fps: f64) -> Option<i64> {
    (fps > 0.0).then(|| (position as f64 * 1_000_000.0 / fps).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: [f64; 6] = [25.0, 24.0, 30000.0 / 1001.0, 24000.0 / 1001.0, 60.0, 15.0];
    const FREQUENCIES: [u32; 5] = [8000, 22050, 44100, 48000, 96000];

    #[test]
    fn per_frame_counts_sum_to_cumulative() {
        for fps in RATES {
            for frequency in FREQUENCIES {
                let mut total = 0i64;
                for k in 1..=600i64 {
                    total += i64::from(sample_calculator(fps, frequency, k - 1));
                    assert_eq!(
                        total,
                        sample_calculator_to_now(fps, frequency, k - 1),
                        "fps={fps} frequency={frequency} k={k}"
                    );
                }
            }
        }
    }

    #[test]
    fn one_second_at_pal_rate() {
        assert_eq!(sample_calculator(25.0, 48000, 0), 1920);
        assert_eq!(sample_calculator_to_now(25.0, 48000, 24), 48000);
    }

    #[test]
    fn ntsc_counts_alternate() {
        let fps = 30000.0 / 1001.0;
        let counts: Vec<_> = (0..5).map(|p| sample_calculator(fps, 48000, p)).collect();
        assert!(counts.iter().all(|&c| c == 1601 || c == 1602), "{counts:?}");
        assert!(counts.contains(&1601) && counts.contains(&1602));
        // 30 frames of NTSC are 1.001 seconds.
        assert_eq!(sample_calculator_to_now(fps, 48000, 29), 48048);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(sample_calculator(0.0, 48000, 3), 0);
        assert_eq!(sample_calculator(f64::NAN, 48000, 3), 0);
        assert_eq!(sample_calculator(25.0, 0, 3), 0);
        assert_eq!(sample_calculator_to_now(-1.0, 48000, 3), 0);
    }

    #[test]
    fn negative_positions_round_symmetrically() {
        assert_eq!(sample_calculator(30000.0 / 1001.0, 48000, -1), 1602);
        assert_eq!(sample_calculator_to_now(25.0, 48000, -1), 0);
    }

    #[test]
    fn durations() {
        assert_eq!(samples_to_duration_us(1920, 48000), Some(40_000));
        assert_eq!(samples_to_duration_us(1, 0), None);
        assert_eq!(position_to_timestamp_us(25, 25.0), Some(1_000_000));
        assert_eq!(position_to_timestamp_us(1, 30000.0 / 1001.0), Some(33_367));
        assert_eq!(position_to_timestamp_us(1, 0.0), None);
    }
}
