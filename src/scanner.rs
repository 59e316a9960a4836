use std::path::Path;
use scraper::{Html, Node};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("I/O error while reading saved page")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Structural counts derived from a page's markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSummary {
    pub link_count: u64,
    pub image_count: u64,
}

/// Counts `<a>` elements carrying `href` and `<img>` elements carrying `src`.
///
/// Every node of the tree is visited once; text, comments and other
/// non-element nodes are skipped. The attribute value is irrelevant, an
/// empty `href=""` still counts.
pub fn scan_document(document: &Html) -> PageSummary {

    let mut summary = PageSummary::default();

    for node in document.tree.root().descendants() {
        let Node::Element(element) = node.value() else {
            continue;
        };

        match element.name() {
            "a" if element.attr("href").is_some() => summary.link_count += 1,
            "img" if element.attr("src").is_some() => summary.image_count += 1,
            _ => {}
        }
    }

    summary
}

pub fn scan_html(html: &str) -> PageSummary {
    scan_document(&Html::parse_document(html))
}

/// Scans a page previously saved to disk.
pub fn scan_file(path: &Path) -> Result<PageSummary> {
    let bytes = std::fs::read(path)?;
    let html = String::from_utf8_lossy(&bytes);
    Ok(scan_html(&html))
}
