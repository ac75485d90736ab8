use owo_colors::OwoColorize;
use segmark::config::Config;
use segmark::media;
use segmark::segment;
use segmark::store::AnnotationStore;
use std::error::Error;
use std::path::Path;

pub fn handle_segments(file: &str, window_ms: Option<u64>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let window_ms = window_ms.unwrap_or(config.window_ms);
    if window_ms == 0 {
        return Err("Window length must be greater than zero".into());
    }

    let path = Path::new(file);
    let meta = media::probe(path)?;
    let spans = segment::compute_segments(meta.duration_ms, window_ms);

    let store = AnnotationStore::open(&config.annotations_path())?;
    let audio_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());

    println!(
        "{}: {} ms, {} Hz, {} channel(s), {} bits",
        audio_name.cyan().bold(),
        meta.duration_ms,
        meta.sample_rate,
        meta.channels,
        meta.bits_per_sample
    );
    println!("{} segments of at most {} ms:", spans.len(), window_ms);

    for (i, span) in spans.iter().enumerate() {
        let annotation = match store.get(&audio_name, i as u32) {
            Some(record) if record.class_names.is_empty() => {
                format!("{} (no classes)", "✓".green())
            }
            Some(record) => format!("{} {}", "✓".green(), record.class_names.join(", ")),
            None => String::new(),
        };
        println!(
            "  {:>4}  {:>8} - {:>8} ms  {}",
            i + 1,
            span.start_ms,
            span.end_ms,
            annotation
        );
    }

    Ok(())
}
