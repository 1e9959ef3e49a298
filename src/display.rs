//! Display surface: the artist panel and the history list containers.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};

/// Output sink for rendered markup. Each call replaces its container wholesale.
pub trait DisplaySurface: Send + Sync {
    fn show_artist_info(&self, markup: &str) -> Result<(), String>;
    fn show_history(&self, markup: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Default)]
struct PageContainers {
    artist_info: String,
    history: String,
}

/// Writes both containers into one standalone HTML page on every change.
pub struct HtmlPageSurface {
    page_path: PathBuf,
    containers: Mutex<PageContainers>,
}

impl HtmlPageSurface {
    pub fn new(page_path: PathBuf) -> Self {
        Self {
            page_path,
            containers: Mutex::new(PageContainers::default()),
        }
    }

    pub fn page_path(&self) -> &Path {
        &self.page_path
    }

    fn update<F>(&self, apply: F) -> Result<(), String>
    where
        F: FnOnce(&mut PageContainers),
    {
        // The page is written while holding the lock so concurrent runs never
        // interleave partial files.
        let mut containers = self
            .containers
            .lock()
            .map_err(|_| "display surface lock poisoned".to_string())?;
        apply(&mut containers);
        let page = render_page(&containers);
        if let Some(parent) = self.page_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    format!(
                        "Failed to create page directory {}: {}",
                        parent.display(),
                        err
                    )
                })?;
            }
        }
        std::fs::write(&self.page_path, page).map_err(|err| {
            format!(
                "Failed to write page {}: {}",
                self.page_path.display(),
                err
            )
        })?;
        debug!("Display page updated: {}", self.page_path.display());
        Ok(())
    }

    /// Opens the page in the system browser. Failures are only logged.
    pub fn open_in_browser(&self) {
        let target = url::Url::from_file_path(&self.page_path)
            .map(|file_url| file_url.to_string())
            .unwrap_or_else(|_| self.page_path.display().to_string());
        if let Err(err) = webbrowser::open(&target) {
            warn!("Failed to open {} in browser: {}", target, err);
        }
    }
}

impl DisplaySurface for HtmlPageSurface {
    fn show_artist_info(&self, markup: &str) -> Result<(), String> {
        self.update(|containers| containers.artist_info = markup.to_string())
    }

    fn show_history(&self, markup: &str) -> Result<(), String> {
        self.update(|containers| containers.history = markup.to_string())
    }
}

fn render_page(containers: &PageContainers) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="2">
<title>Drown - Random Music Explorer</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
</head>
<body class="container py-4">
<h1>Drown</h1>
<p class="text-muted">Press Enter in the terminal to discover a random artist.</p>
<div id="artistInfo" class="mb-4">
{artist_info}
</div>
<h4>History</h4>
<ul id="history" class="list-group">
{history}
</ul>
</body>
</html>
"#,
        artist_info = containers.artist_info,
        history = containers.history,
    )
}
