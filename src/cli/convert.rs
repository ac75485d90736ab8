//! Batch conversion of a folder's audio files to WAV.
//!
//! FLAC files are decoded and rewritten as 16-bit WAV; WAV files are copied
//! unless already present in the output folder. Files are independent, so
//! the work fans out across a thread pool.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use rayon::prelude::*;
use segmark::utils::scan;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome {
    Converted,
    Copied,
    AlreadyPresent,
}

pub fn handle_convert(input: &str, output: &str) -> Result<(), Box<dyn Error>> {
    let input_dir = PathBuf::from(shellexpand::tilde(input).as_ref());
    let output_dir = PathBuf::from(shellexpand::tilde(output).as_ref());

    let files = scan::collect_audio_files(&input_dir)?;
    if files.is_empty() {
        println!("No audio files found in {}", input_dir.display());
        return Ok(());
    }

    if !output_dir.exists() {
        fs::create_dir_all(&output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );

    // Errors are carried per file as strings so the fan-out can keep going.
    let results: Vec<(PathBuf, Result<Outcome, String>)> = files
        .par_iter()
        .map(|file| {
            let result = convert_file(file, &output_dir);
            pb.inc(1);
            (file.clone(), result)
        })
        .collect();
    pb.finish_and_clear();

    let mut converted = 0;
    let mut copied = 0;
    let mut skipped = 0;
    let mut failures = Vec::new();
    for (file, result) in results {
        match result {
            Ok(Outcome::Converted) => converted += 1,
            Ok(Outcome::Copied) => copied += 1,
            Ok(Outcome::AlreadyPresent) => skipped += 1,
            Err(reason) => failures.push((file, reason)),
        }
    }

    println!("{} Conversion complete", "✓".green().bold());
    println!("  Converted: {converted}");
    println!("  Copied: {copied}");
    println!("  Skipped: {skipped} (already present)");
    if !failures.is_empty() {
        println!("  {} {}", "Failed:".red().bold(), failures.len());
        for (file, reason) in &failures {
            eprintln!("    {}: {reason}", file.display());
        }
        return Err(format!("{} file(s) failed to convert", failures.len()).into());
    }

    Ok(())
}

fn convert_file(file: &Path, output_dir: &Path) -> Result<Outcome, String> {
    let Some(file_name) = file.file_name() else {
        return Err("missing file name".to_string());
    };
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "wav" => {
            let dest = output_dir.join(file_name);
            if dest.exists() {
                return Ok(Outcome::AlreadyPresent);
            }
            fs::copy(file, &dest).map_err(|e| e.to_string())?;
            Ok(Outcome::Copied)
        }
        "flac" => {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let dest = output_dir.join(format!("{stem}.wav"));
            if dest.exists() {
                return Ok(Outcome::AlreadyPresent);
            }
            flac_to_wav(file, &dest).map_err(|e| e.to_string())?;
            Ok(Outcome::Converted)
        }
        other => Err(format!("unsupported audio format: {other}")),
    }
}

fn flac_to_wav(source: &Path, dest: &Path) -> Result<(), Box<dyn Error>> {
    let mut reader = claxon::FlacReader::open(source)?;
    let info = reader.streaminfo();

    let spec = hound::WavSpec {
        channels: info.channels as u16,
        sample_rate: info.sample_rate,
        bits_per_sample: 16, // Convert to 16-bit for compatibility
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(dest, spec)?;

    for sample in reader.samples() {
        let sample = sample?;
        writer.write_sample(to_16bit(sample, info.bits_per_sample))?;
    }
    writer.finalize()?;

    Ok(())
}

fn to_16bit(sample: i32, bits_per_sample: u32) -> i16 {
    match bits_per_sample {
        16 => sample as i16,
        24 => (sample >> 8) as i16,
        32 => (sample >> 16) as i16,
        8 => (sample << 8) as i16,
        _ if bits_per_sample > 16 => (sample >> (bits_per_sample - 16)) as i16,
        _ => (sample << (16 - bits_per_sample)) as i16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..800i16 {
            writer.write_sample(i).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_to_16bit_bit_depths() {
        assert_eq!(to_16bit(1234, 16), 1234);
        assert_eq!(to_16bit(0x123456, 24), 0x1234);
        assert_eq!(to_16bit(0x12345678, 32), 0x1234);
        assert_eq!(to_16bit(0x12, 8), 0x1200);
        assert_eq!(to_16bit(0x12345, 20), 0x1234);
    }

    #[test]
    fn test_convert_copies_wav() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let source = input.path().join("a.wav");
        write_wav(&source);

        let outcome = convert_file(&source, output.path()).unwrap();
        assert_eq!(outcome, Outcome::Copied);
        assert!(output.path().join("a.wav").exists());

        // Second run leaves the existing copy alone
        let outcome = convert_file(&source, output.path()).unwrap();
        assert_eq!(outcome, Outcome::AlreadyPresent);
    }
}
