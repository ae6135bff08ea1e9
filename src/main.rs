//! `get-image-info [DIR]`
//!
//! Gets meta information about the images used on wiki pages from the wiki's
//! MediaWiki API and writes it into the `wiki_images` table of
//! `DIR/taginfo-wiki.db` (DIR defaults to the current directory).

mod backends;
mod batch_fetcher;
mod config;
mod db_manager;
mod image_info_run;
mod protocol;
mod title_collector;
mod url_normalizer;

use std::path::PathBuf;

use backends::mediawiki::MediaWikiBackend;
use config::load_config;
use db_manager::DbManager;
use image_info_run::run_image_info_import;
use log::info;
use url_normalizer::UrlNormalizer;

/// Progress lines are part of the tool's regular output.
fn progress_log_target() -> env_logger::Target {
    env_logger::Target::Stdout
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.parse_default_env();
    clog.target(progress_log_target());
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config = load_config(&dir);

    let db_path = dir.join(&config.database.file_name);
    info!("Using database {}", db_path.display());
    let mut db = DbManager::open(&db_path)?;

    let backend = MediaWikiBackend::new(&config.wiki);
    let normalizer = UrlNormalizer::new(&config.wiki);

    if let Err(err) = run_image_info_import(&mut db, &backend, &normalizer) {
        log::error!("Image info import aborted, nothing was committed: {}", err);
        return Err(err.into());
    }
    Ok(())
}
