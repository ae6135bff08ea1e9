//! Collects the image titles referenced by wiki pages.

use rusqlite::Connection;

use crate::protocol::ImageTitle;

const REFERENCED_IMAGES_SQL: &str = "\
    SELECT DISTINCT(image) AS title FROM wikipages WHERE image IS NOT NULL AND image != '' \
    UNION SELECT DISTINCT(osmcarto_rendering) AS title FROM wikipages \
        WHERE osmcarto_rendering IS NOT NULL AND osmcarto_rendering != '' \
    UNION SELECT DISTINCT(image) AS title FROM relation_pages WHERE image IS NOT NULL AND image != ''";

/// Keeps file/image titles, sorted ascending without duplicates.
pub fn filter_image_titles<I>(titles: I) -> Vec<ImageTitle>
where
    I: IntoIterator<Item = String>,
{
    let mut image_titles: Vec<ImageTitle> = titles
        .into_iter()
        .filter_map(|title| ImageTitle::parse(&title))
        .collect();
    image_titles.sort();
    image_titles.dedup();
    image_titles
}

/// Reads every image title referenced from `wikipages` and `relation_pages`.
pub fn collect_image_titles(conn: &Connection) -> Result<Vec<ImageTitle>, rusqlite::Error> {
    let mut stmt = conn.prepare(REFERENCED_IMAGES_SQL)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut titles = Vec::new();
    for title in rows {
        titles.push(title?);
    }
    Ok(filter_image_titles(titles))
}
