//! Bounded-range audio playback.
//!
//! Plays exactly one segment at a time: the samples for the requested window
//! are decoded up front, clipped on frame boundaries, and appended to a
//! fresh sink. The event loop polls [`Playback::is_finished`] to observe
//! completion, so the stop at the segment end is cooperative rather than
//! timer-driven. Stopping an already stopped playback is a no-op.

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use segmark::error::DecodeError;

pub struct Playback {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Sink,
}

impl Playback {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let (stream, stream_handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&stream_handle)?;
        Ok(Self {
            _stream: stream,
            stream_handle,
            sink,
        })
    }

    /// Start playing `[start_ms, end_ms)` of `path`, replacing any current
    /// playback.
    pub fn play_range(&mut self, path: &Path, start_ms: u64, end_ms: u64) -> Result<(), Box<dyn Error>> {
        self.sink.stop();
        self.sink = Sink::try_new(&self.stream_handle)?;

        let source = SegmentSource::load(path, start_ms, end_ms)?;
        log::info!(
            "Playing {} from {start_ms} ms to {end_ms} ms ({} samples)",
            path.display(),
            source.len()
        );

        self.sink.append(source);
        self.sink.play();
        Ok(())
    }

    /// Stop playback. Idempotent.
    pub fn stop(&self) {
        self.sink.stop();
    }

    /// True once the queued segment has drained.
    pub fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}

/// In-memory samples for one time window of a file, playable through rodio.
#[derive(Debug)]
pub struct SegmentSource {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
    position: usize,
}

impl SegmentSource {
    pub fn load(path: &Path, start_ms: u64, end_ms: u64) -> Result<Self, DecodeError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let (samples, channels, sample_rate) = match extension.as_str() {
            "wav" => load_wav_samples(path)?,
            "flac" => load_flac_samples(path)?,
            other => {
                return Err(DecodeError::Unsupported {
                    extension: other.to_string(),
                });
            }
        };

        // Clip to the requested window on frame boundaries so multi-channel
        // interleaving stays aligned.
        let start = frame_offset(start_ms, sample_rate) * channels as usize;
        let end = (frame_offset(end_ms, sample_rate) * channels as usize).min(samples.len());
        let samples = if start >= samples.len() {
            Vec::new()
        } else {
            samples[start..end].to_vec()
        };

        Ok(Self {
            samples,
            channels,
            sample_rate,
            position: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn frame_offset(ms: u64, sample_rate: u32) -> usize {
    (ms * sample_rate as u64 / 1000) as usize
}

fn load_wav_samples(path: &Path) -> Result<(Vec<i16>, u16, u32), DecodeError> {
    let file = BufReader::new(File::open(path)?);
    let mut reader = hound::WavReader::new(file)
        .map_err(|e| DecodeError::invalid(path, e.to_string()))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int {
        return Err(DecodeError::invalid(path, "unsupported sample format"));
    }

    let samples: Result<Vec<i16>, hound::Error> = match spec.bits_per_sample {
        16 => reader.samples::<i16>().collect(),
        24 => reader
            .samples::<i32>()
            .map(|s| s.map(|s| (s >> 8) as i16))
            .collect(),
        32 => reader
            .samples::<i32>()
            .map(|s| s.map(|s| (s >> 16) as i16))
            .collect(),
        8 => reader
            .samples::<i8>()
            .map(|s| s.map(|s| (s as i16) << 8))
            .collect(),
        other => {
            return Err(DecodeError::invalid(
                path,
                format!("unsupported bit depth: {other}"),
            ));
        }
    };
    let samples = samples.map_err(|e| DecodeError::invalid(path, e.to_string()))?;

    Ok((samples, spec.channels, spec.sample_rate))
}

fn load_flac_samples(path: &Path) -> Result<(Vec<i16>, u16, u32), DecodeError> {
    let mut reader =
        claxon::FlacReader::open(path).map_err(|e| DecodeError::invalid(path, e.to_string()))?;
    let info = reader.streaminfo();

    let mut samples = Vec::new();
    for sample in reader.samples() {
        let sample = sample.map_err(|e| DecodeError::invalid(path, e.to_string()))?;
        let sample = match info.bits_per_sample {
            16 => sample as i16,
            24 => (sample >> 8) as i16,
            _ => (sample >> 16) as i16,
        };
        samples.push(sample);
    }

    Ok((samples, info.channels as u16, info.sample_rate))
}

impl Iterator for SegmentSource {
    type Item = i16;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.samples.len() {
            return None;
        }
        let sample = self.samples[self.position];
        self.position += 1;
        Some(sample)
    }
}

impl Source for SegmentSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        let total_samples = self.samples.len() as u64;
        let duration_secs =
            total_samples as f64 / (self.sample_rate as f64 * self.channels as f64);
        Some(Duration::from_secs_f64(duration_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames * channels as usize {
            writer.write_sample((i % 256) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_segment_source_clips_to_range() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        // 1000 ms of stereo at 8 kHz = 16000 interleaved samples
        write_wav(&path, 8000, 2, 8000);

        let source = SegmentSource::load(&path, 250, 750).unwrap();
        assert_eq!(source.channels, 2);
        assert_eq!(source.sample_rate, 8000);
        // 500 ms of stereo at 8 kHz
        assert_eq!(source.len(), 8000);
    }

    #[test]
    fn test_segment_source_clamps_end_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.wav");
        // 250 ms mono at 8 kHz
        write_wav(&path, 8000, 1, 2000);

        let source = SegmentSource::load(&path, 0, 5000).unwrap();
        assert_eq!(source.len(), 2000);

        let past_end = SegmentSource::load(&path, 5000, 10_000).unwrap();
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_segment_source_iterates_samples_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 8000, 1, 100);

        let source = SegmentSource::load(&path, 0, 1000).unwrap();
        let samples: Vec<i16> = source.collect();
        assert_eq!(samples.len(), 100);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[1], 1);
        assert_eq!(samples[99], 99);
    }

    #[test]
    fn test_segment_source_rejects_unknown_extension() {
        let err = SegmentSource::load(Path::new("notes.txt"), 0, 1000).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported { .. }));
    }
}
