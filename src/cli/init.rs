use dialoguer::{Confirm, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use segmark::config::Config;
use std::error::Error;

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    if Config::exists()? {
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Configuration already exists. Overwrite with defaults?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Keeping existing configuration.");
            return Ok(());
        }
    }

    let config = Config::new();
    config.save()?;

    println!("{} segmark initialized", "✓".green().bold());
    println!("  Annotations file: {}", config.annotations_file.cyan());
    println!("  Window length: {} ms", config.window_ms);
    println!("  Classes: {}", config.classes.join(", ").cyan());
    println!(
        "  Configuration saved to: {}",
        Config::config_path()?.display()
    );

    Ok(())
}
