use owo_colors::OwoColorize;
use segmark::config::Config;
use segmark::store::AnnotationStore;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

pub fn handle_export(format: &str, output: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let store = AnnotationStore::open(&config.annotations_path())?;

    if store.is_empty() {
        println!("Nothing to export: {} has no rows", store.path().display());
        return Ok(());
    }

    let output = match output {
        Some(path) => PathBuf::from(path),
        None => {
            let date = chrono::Local::now().format("%Y%m%d");
            PathBuf::from(format!("annotations-{date}.{format}"))
        }
    };

    let contents = match format {
        "json" => serde_json::to_string_pretty(store.records())?,
        "csv" => store.to_table_string(),
        other => return Err(format!("Unsupported export format: {other}").into()),
    };
    fs::write(&output, contents)?;

    println!(
        "{} Exported {} records to {}",
        "✓".green().bold(),
        store.len(),
        output.display().to_string().cyan()
    );

    Ok(())
}
