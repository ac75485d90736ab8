use std::error::Error;

#[cfg(feature = "annotator")]
pub fn handle_annotate(folder: &str) -> Result<(), Box<dyn Error>> {
    use dialoguer::{Confirm, theme::ColorfulTheme};
    use owo_colors::OwoColorize;
    use segmark::config::Config;
    use segmark::error::StoreError;
    use segmark::store::AnnotationStore;

    let config = Config::load()?;
    let store_path = config.annotations_path();

    // A corrupt table is fatal unless the user explicitly abandons it. The
    // file itself is only replaced on the next save.
    let store = match AnnotationStore::open(&store_path) {
        Ok(store) => store,
        Err(e @ StoreError::Corrupt { .. }) => {
            eprintln!("{} {e}", "Error:".red().bold());
            let reinitialize = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Start with an empty annotation table?")
                .default(false)
                .interact()?;
            if !reinitialize {
                return Err(e.into());
            }
            AnnotationStore::reinitialize(&store_path)
        }
        Err(e) => return Err(e.into()),
    };

    crate::annotator::run(folder, config, store)
}

#[cfg(not(feature = "annotator"))]
pub fn handle_annotate(folder: &str) -> Result<(), Box<dyn Error>> {
    let _ = folder;
    use owo_colors::OwoColorize;
    println!("{} {}", "✏".cyan(), "Segment Annotator".bold());
    println!();
    println!(
        "{} The annotator requires the 'annotator' feature to be enabled.",
        "Note:".yellow()
    );
    println!();
    println!("To enable it, install with:");
    println!("  {}", "cargo install segmark --features annotator".cyan());
    println!();
    println!("Or if building from source:");
    println!("  {}", "cargo build --release --features annotator".cyan());

    Ok(())
}
