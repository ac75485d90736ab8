//! Audio container probing.
//!
//! Reads just enough of a WAV or FLAC header to establish sample rate,
//! channel count, bit depth, and duration. Segmentation only needs the
//! duration, so no sample data is decoded here; playback decodes separately.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy)]
pub struct AudioMetadata {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub duration_ms: u64,
}

/// Probe `path` for format metadata and total duration.
///
/// Fails with [`DecodeError`] on unsupported extensions, malformed headers,
/// or files whose length cannot be established. Segments are never computed
/// for a file that fails here.
pub fn probe(path: &Path) -> Result<AudioMetadata, DecodeError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("wav") => probe_wav(path),
        Some("flac") => probe_flac(path),
        other => Err(DecodeError::Unsupported {
            extension: other.unwrap_or("(none)").to_string(),
        }),
    }
}

fn probe_wav(path: &Path) -> Result<AudioMetadata, DecodeError> {
    let mut file = File::open(path)?;

    let mut riff = [0u8; 4];
    file.read_exact(&mut riff)?;
    if &riff != b"RIFF" {
        return Err(DecodeError::invalid(path, "not a valid WAV file"));
    }

    // Skip file size
    file.seek(SeekFrom::Current(4))?;

    let mut wave = [0u8; 4];
    file.read_exact(&mut wave)?;
    if &wave != b"WAVE" {
        return Err(DecodeError::invalid(path, "not a valid WAV file"));
    }

    // Find fmt chunk
    let mut chunk_id = [0u8; 4];
    let mut chunk_size = [0u8; 4];
    loop {
        if file.read_exact(&mut chunk_id).is_err() {
            return Err(DecodeError::invalid(path, "missing fmt chunk"));
        }
        file.read_exact(&mut chunk_size)?;
        let size = u32::from_le_bytes(chunk_size);

        if &chunk_id == b"fmt " {
            if size < 16 {
                return Err(DecodeError::invalid(path, "truncated fmt chunk"));
            }
            let mut fmt_data = [0u8; 16];
            file.read_exact(&mut fmt_data)?;
            if size > 16 {
                file.seek(SeekFrom::Current((size - 16) as i64))?;
            }

            let channels = u16::from_le_bytes([fmt_data[2], fmt_data[3]]);
            let sample_rate =
                u32::from_le_bytes([fmt_data[4], fmt_data[5], fmt_data[6], fmt_data[7]]);
            let bits_per_sample = u16::from_le_bytes([fmt_data[14], fmt_data[15]]);

            let bytes_per_sample = (bits_per_sample / 8) as u32;
            let bytes_per_second = sample_rate * channels as u32 * bytes_per_sample;
            if bytes_per_second == 0 {
                return Err(DecodeError::invalid(path, "invalid fmt chunk"));
            }

            // Find data chunk for the duration
            while file.read_exact(&mut chunk_id).is_ok() {
                file.read_exact(&mut chunk_size)?;
                let data_size = u32::from_le_bytes(chunk_size);

                if &chunk_id == b"data" {
                    let duration_ms = data_size as u64 * 1000 / bytes_per_second as u64;
                    return Ok(AudioMetadata {
                        sample_rate,
                        channels,
                        bits_per_sample,
                        duration_ms,
                    });
                }
                file.seek(SeekFrom::Current(data_size as i64))?;
            }
            return Err(DecodeError::invalid(path, "missing data chunk"));
        }

        // Skip this chunk
        file.seek(SeekFrom::Current(size as i64))?;
    }
}

fn probe_flac(path: &Path) -> Result<AudioMetadata, DecodeError> {
    let mut file = File::open(path)?;

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if &magic != b"fLaC" {
        return Err(DecodeError::invalid(path, "not a valid FLAC file"));
    }

    // METADATA_BLOCK_HEADER: 1 bit last-block flag, 7 bits block type
    // (0 = STREAMINFO), 24 bits block size
    let mut header = [0u8; 4];
    file.read_exact(&mut header)?;
    let block_type = header[0] & 0x7F;
    if block_type != 0 {
        return Err(DecodeError::invalid(path, "missing STREAMINFO block"));
    }

    // STREAMINFO is always 34 bytes
    let mut streaminfo = [0u8; 34];
    file.read_exact(&mut streaminfo)?;

    // Skip min/max block size (4 bytes) and min/max frame size (6 bytes)
    let sample_rate = u32::from_be_bytes([0, streaminfo[10], streaminfo[11], streaminfo[12]]) >> 4;
    let channels = ((streaminfo[12] & 0x0E) >> 1) + 1;
    let bits_per_sample = (((streaminfo[12] & 0x01) << 4) | ((streaminfo[13] & 0xF0) >> 4)) + 1;

    // Total samples is a 36-bit value (per channel)
    let total_samples = ((streaminfo[13] as u64 & 0x0F) << 32)
        | (streaminfo[14] as u64) << 24
        | (streaminfo[15] as u64) << 16
        | (streaminfo[16] as u64) << 8
        | (streaminfo[17] as u64);

    if sample_rate == 0 {
        return Err(DecodeError::invalid(path, "invalid STREAMINFO block"));
    }
    if total_samples == 0 {
        return Err(DecodeError::invalid(path, "stream length not recorded"));
    }

    Ok(AudioMetadata {
        sample_rate,
        channels: channels as u16,
        bits_per_sample: bits_per_sample as u16,
        duration_ms: total_samples * 1000 / sample_rate as u64,
    })
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
            writer.write_sample((i % 128) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_probe_wav_duration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one_second.wav");
        write_wav(&path, 44_100, 2, 44_100);

        let meta = probe(&path).unwrap();
        assert_eq!(meta.sample_rate, 44_100);
        assert_eq!(meta.channels, 2);
        assert_eq!(meta.bits_per_sample, 16);
        assert_eq!(meta.duration_ms, 1000);
    }

    #[test]
    fn test_probe_wav_partial_second() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.wav");
        // 8000 Hz mono, 2000 frames = 250 ms
        write_wav(&path, 8000, 1, 2000);

        let meta = probe(&path).unwrap();
        assert_eq!(meta.duration_ms, 250);
    }

    #[test]
    fn test_probe_flac_streaminfo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.flac");

        // Hand-built header: magic, a last-block STREAMINFO header, then the
        // 34-byte STREAMINFO for 44100 Hz / 2 channels / 16 bits / 88200
        // samples (2 seconds).
        let mut streaminfo = [0u8; 34];
        // bytes 10..13: 20 bits sample rate, 3 bits channels-1, 1 bit bps-1 high
        let sample_rate: u32 = 44_100;
        streaminfo[10] = (sample_rate >> 12) as u8;
        streaminfo[11] = (sample_rate >> 4) as u8;
        streaminfo[12] = ((sample_rate & 0x0F) as u8) << 4;
        streaminfo[12] |= (2 - 1) << 1; // channels - 1
        // bits_per_sample - 1 = 15: high bit into byte 12, low 4 bits into byte 13
        streaminfo[12] |= (15 >> 4) & 0x01;
        streaminfo[13] = (15 & 0x0F) << 4;
        // 36-bit total samples, low 32 bits in bytes 14..18
        let total_samples: u32 = 88_200;
        streaminfo[14..18].copy_from_slice(&total_samples.to_be_bytes());

        let mut contents = Vec::new();
        contents.extend_from_slice(b"fLaC");
        contents.extend_from_slice(&[0x80, 0, 0, 34]);
        contents.extend_from_slice(&streaminfo);
        std::fs::write(&path, contents).unwrap();

        let meta = probe(&path).unwrap();
        assert_eq!(meta.sample_rate, 44_100);
        assert_eq!(meta.channels, 2);
        assert_eq!(meta.bits_per_sample, 16);
        assert_eq!(meta.duration_ms, 2000);
    }

    #[test]
    fn test_probe_rejects_unsupported_extension() {
        let err = probe(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported { .. }));
    }

    #[test]
    fn test_probe_rejects_garbage_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.wav");
        std::fs::write(&path, b"this is not audio").unwrap();

        let err = probe(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Invalid { .. }));
    }

    #[test]
    fn test_probe_missing_file_is_io_error() {
        let err = probe(Path::new("/nonexistent/audio.wav")).unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }
}
