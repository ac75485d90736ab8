pub mod app;
pub mod audio;
pub mod ui;

use segmark::config::Config;
use segmark::store::AnnotationStore;
use std::error::Error;

pub fn run(folder: &str, config: Config, store: AnnotationStore) -> Result<(), Box<dyn Error>> {
    app::run(folder, config, store)
}
