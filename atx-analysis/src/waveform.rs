//! Waveform overview generation
//!
//! Downsamples a decoded recording into a fixed number of buckets for
//! display. Each bucket carries the mean absolute amplitude of its span
//! and the dominant frequency band, so the overview can be tinted by
//! spectral content.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, FftPlanner};
use tracing::debug;

/// Default bucket count for a full-recording overview
pub const OVERVIEW_POINTS: usize = 1000;

/// Band boundaries for dominant-band classification
const BASS_CUTOFF_HZ: f32 = 250.0;
const HIGH_CUTOFF_HZ: f32 = 4000.0;

/// Dominant frequency band for an overview bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyBand {
    /// Below 250 Hz - room rumble, handling noise, voice fundament
    Bass,
    /// 250 Hz - 4 kHz - where speech lives
    #[default]
    Mid,
    /// Above 4 kHz - sibilance, air
    High,
}

/// One bucket of the overview
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveformPoint {
    /// Mean absolute amplitude over the bucket's span (0.0-1.0)
    pub amplitude: f32,
    /// Dominant frequency band over the bucket's span
    pub band: FrequencyBand,
}

/// Downsampled waveform for one recording
#[derive(Debug, Clone, Default)]
pub struct WaveformOverview {
    pub points: Vec<WaveformPoint>,
    pub duration_secs: f64,
}

impl WaveformOverview {
    pub fn new(points: Vec<WaveformPoint>, duration_secs: f64) -> Self {
        Self {
            points,
            duration_secs,
        }
    }

    /// Empty overview with a fixed bucket count
    pub fn empty(num_points: usize) -> Self {
        Self {
            points: vec![WaveformPoint::default(); num_points],
            duration_secs: 0.0,
        }
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Amplitude at a normalized position (0.0-1.0)
    pub fn amplitude_at(&self, position: f64) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        let idx = ((position * self.points.len() as f64) as usize).min(self.points.len() - 1);
        self.points[idx].amplitude
    }

    /// Dominant band at a normalized position (0.0-1.0)
    pub fn band_at(&self, position: f64) -> FrequencyBand {
        if self.points.is_empty() {
            return FrequencyBand::Mid;
        }
        let idx = ((position * self.points.len() as f64) as usize).min(self.points.len() - 1);
        self.points[idx].band
    }
}

/// Generates overviews from interleaved stereo samples
pub struct WaveformAnalyzer {
    sample_rate: u32,
    fft_size: usize,
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
}

impl WaveformAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        // Small FFT: band classification needs coarse energy ratios,
        // not fine frequency resolution.
        let fft_size = 512;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window: Vec<f32> = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Self {
            sample_rate,
            fft_size,
            fft,
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    /// Build an overview with `target_points` buckets.
    ///
    /// Amplitude per bucket is the mean of the absolute mono samples in
    /// its span, clamped to 1.0.
    pub fn analyze(
        &mut self,
        samples: &[f32],
        target_points: usize,
        duration_secs: f64,
    ) -> WaveformOverview {
        if samples.is_empty() || target_points == 0 {
            return WaveformOverview::empty(target_points);
        }

        let channels = 2; // interleaved stereo throughout the app
        let total_frames = samples.len() / channels;
        let frames_per_point = (total_frames / target_points).max(1);

        debug!(
            target_points,
            total_frames, "generating waveform overview"
        );

        let mut points = Vec::with_capacity(target_points);
        let mut mono = Vec::with_capacity(frames_per_point);

        for point_idx in 0..target_points {
            let start = point_idx * frames_per_point;
            let end = ((point_idx + 1) * frames_per_point).min(total_frames);

            if start >= total_frames {
                points.push(WaveformPoint::default());
                continue;
            }

            mono.clear();
            let mut abs_sum = 0.0f32;
            for frame in start..end {
                let idx = frame * channels;
                if idx + 1 < samples.len() {
                    let sample = (samples[idx] + samples[idx + 1]) * 0.5;
                    abs_sum += sample.abs();
                    mono.push(sample);
                }
            }

            let amplitude = if mono.is_empty() {
                0.0
            } else {
                (abs_sum / mono.len() as f32).min(1.0)
            };

            let band = if mono.len() >= self.fft_size / 4 {
                self.dominant_band(&mono)
            } else {
                FrequencyBand::Mid
            };

            points.push(WaveformPoint { amplitude, band });
        }

        WaveformOverview::new(points, duration_secs)
    }

    /// Classify a chunk by comparing per-band average spectral energy
    fn dominant_band(&mut self, samples: &[f32]) -> FrequencyBand {
        let count = samples.len().min(self.fft_size);
        for i in 0..count {
            self.fft_buffer[i] = Complex::new(samples[i] * self.window[i], 0.0);
        }
        for i in count..self.fft_size {
            self.fft_buffer[i] = Complex::new(0.0, 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        let bin_width = self.sample_rate as f32 / self.fft_size as f32;
        let nyquist_bin = self.fft_size / 2;
        let bass_end = ((BASS_CUTOFF_HZ / bin_width) as usize).min(nyquist_bin);
        let mid_end = ((HIGH_CUTOFF_HZ / bin_width) as usize).min(nyquist_bin);

        let energy = |range: std::ops::Range<usize>| -> f32 {
            let width = range.len();
            if width == 0 {
                return 0.0;
            }
            let sum: f32 = self.fft_buffer[range].iter().map(|c| c.norm_sqr()).sum();
            sum / width as f32
        };

        // Skip DC in bin 0
        let bass = energy(1..bass_end);
        let mid = energy(bass_end..mid_end);
        let high = energy(mid_end..nyquist_bin);

        if bass >= mid && bass >= high {
            FrequencyBand::Bass
        } else if high >= mid {
            FrequencyBand::High
        } else {
            FrequencyBand::Mid
        }
    }
}
