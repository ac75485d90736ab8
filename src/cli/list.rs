use owo_colors::OwoColorize;
use segmark::config::Config;
use segmark::store::AnnotationStore;
use std::collections::BTreeSet;
use std::error::Error;

pub fn handle_list(audio: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let store = AnnotationStore::open(&config.annotations_path())?;

    let records: Vec<_> = store
        .records()
        .iter()
        .filter(|r| audio.is_none_or(|a| r.audio_name == a))
        .collect();

    if records.is_empty() {
        match audio {
            Some(audio) => println!("No annotations found for '{audio}'"),
            None => println!("No annotations found in {}", store.path().display()),
        }
        return Ok(());
    }

    println!("{}", store.path().display().to_string().cyan());
    for record in &records {
        let labels = if record.class_names.is_empty() {
            "(no classes)".bright_black().to_string()
        } else {
            record.class_names.join(", ").yellow().to_string()
        };
        println!(
            "  {}  segment {:>3}  [{}s]  {}",
            record.audio_name.cyan(),
            record.segment_number,
            record.segment_time,
            labels
        );
    }

    let audio_count = records
        .iter()
        .map(|r| r.audio_name.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    println!(
        "\n{} {} annotated segments across {} audio files",
        "✓".green().bold(),
        records.len(),
        audio_count
    );

    Ok(())
}
