//! Recording file loading and decoding
//!
//! Decodes a recording into interleaved stereo f32 at the playback
//! sample rate and generates its waveform overview in the same pass.

use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, info};

use atx_analysis::{WaveformAnalyzer, WaveformOverview, OVERVIEW_POINTS};

/// Errors that can occur while loading a recording
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Resample error: {0}")]
    Resample(String),
}

/// A decoded recording ready for the player
pub struct LoadedRecording {
    /// Interleaved stereo samples, normalized to -1.0..1.0
    pub samples: Vec<f32>,
    /// Sample rate after resampling
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_secs: f64,
    /// Title from tags, falling back to the file stem
    pub title: String,
    /// Overview for waveform display
    pub overview: WaveformOverview,
}

/// Decodes recordings with Symphonia and resamples with Rubato
pub struct RecordingLoader {
    target_sample_rate: u32,
}

impl Default for RecordingLoader {
    fn default() -> Self {
        Self::new(48000)
    }
}

impl RecordingLoader {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Load and decode a recording file
    pub fn load(&self, path: &Path) -> Result<LoadedRecording, LoadError> {
        let (samples, source_rate, channels, title) = self.decode(path)?;

        let total_frames = samples.len() / channels as usize;
        let duration_secs = total_frames as f64 / source_rate as f64;

        let (samples, sample_rate) = if source_rate != self.target_sample_rate {
            debug!(source_rate, target = self.target_sample_rate, "resampling");
            (
                self.resample(&samples, source_rate, channels)?,
                self.target_sample_rate,
            )
        } else {
            (samples, source_rate)
        };

        let mut analyzer = WaveformAnalyzer::new(sample_rate);
        let overview = analyzer.analyze(&samples, OVERVIEW_POINTS, duration_secs);

        info!(path = %path.display(), duration_secs, "recording loaded");

        Ok(LoadedRecording {
            samples,
            sample_rate,
            channels,
            duration_secs,
            title,
            overview,
        })
    }

    /// Decode every packet of the first audio track into interleaved f32
    fn decode(&self, path: &Path) -> Result<(Vec<f32>, u32, u16, String), LoadError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let source_rate = codec_params.sample_rate.unwrap_or(44100);
        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(2);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let title = self.title_from(&mut format, path);

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(_) => break,
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(_) => continue,
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity() as u64;
            let mut sample_buf = SampleBuffer::<f32>::new(capacity, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        Ok((samples, source_rate, channels, title))
    }

    /// Resample interleaved audio to the target rate
    fn resample(
        &self,
        samples: &[f32],
        source_rate: u32,
        channels: u16,
    ) -> Result<Vec<f32>, LoadError> {
        use rubato::{FftFixedInOut, Resampler};

        let channels = channels as usize;
        let frames = samples.len() / channels;

        let mut resampler = FftFixedInOut::<f32>::new(
            source_rate as usize,
            self.target_sample_rate as usize,
            1024,
            channels,
        )
        .map_err(|e| LoadError::Resample(e.to_string()))?;

        // Deinterleave into per-channel buffers
        let deinterleaved: Vec<Vec<f32>> = (0..channels)
            .map(|ch| (0..frames).map(|f| samples[f * channels + ch]).collect())
            .collect();

        let chunk_size = resampler.input_frames_next();
        let mut output: Vec<Vec<f32>> = vec![Vec::new(); channels];

        let mut pos = 0;
        while pos + chunk_size <= frames {
            let input: Vec<&[f32]> = deinterleaved
                .iter()
                .map(|ch| &ch[pos..pos + chunk_size])
                .collect();

            let resampled = resampler
                .process(&input, None)
                .map_err(|e| LoadError::Resample(e.to_string()))?;

            for (ch, data) in resampled.into_iter().enumerate() {
                output[ch].extend(data);
            }

            pos += chunk_size;
        }

        // Zero-pad the tail chunk and keep only the frames it actually
        // represents.
        if pos < frames {
            let remaining = frames - pos;
            let padded: Vec<Vec<f32>> = deinterleaved
                .iter()
                .map(|ch| {
                    let mut tail = ch[pos..].to_vec();
                    tail.resize(chunk_size, 0.0);
                    tail
                })
                .collect();
            let input: Vec<&[f32]> = padded.iter().map(|v| v.as_slice()).collect();

            if let Ok(resampled) = resampler.process(&input, None) {
                let wanted =
                    (remaining * self.target_sample_rate as usize) / source_rate as usize;
                for (ch, data) in resampled.into_iter().enumerate() {
                    output[ch].extend(&data[..wanted.min(data.len())]);
                }
            }
        }

        // Reinterleave
        let out_frames = output[0].len();
        let mut interleaved = Vec::with_capacity(out_frames * channels);
        for frame in 0..out_frames {
            for channel in &output {
                interleaved.push(channel[frame]);
            }
        }

        Ok(interleaved)
    }

    /// Title from the container tags, falling back to the file stem
    fn title_from(
        &self,
        format: &mut Box<dyn symphonia::core::formats::FormatReader>,
        path: &Path,
    ) -> String {
        if let Some(meta) = format.metadata().current() {
            for tag in meta.tags() {
                if tag.std_key == Some(symphonia::core::meta::StandardTagKey::TrackTitle) {
                    return tag.value.to_string();
                }
            }
        }

        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Recording")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let loader = RecordingLoader::default();
        let err = loader.load(Path::new("/nonexistent/recording.m4a"));
        assert!(matches!(err, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_resample_preserves_duration() {
        let loader = RecordingLoader::new(48000);
        // One second of stereo silence at 44.1kHz.
        let samples = vec![0.0f32; 44100 * 2];
        let resampled = loader.resample(&samples, 44100, 2).unwrap();

        // Chunked FFT resampling may shave a partial chunk off the
        // tail, but the result must stay close to one 48kHz second.
        let frames = resampled.len() / 2;
        assert!(frames > 45000 && frames <= 48000, "frames = {frames}");
    }
}
