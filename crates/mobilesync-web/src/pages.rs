//! Page template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/`) so the
//! wall's look can be changed without recompiling. The directory must
//! contain `index.html`, `video.html` and `image.html`. They are read once
//! at startup; a missing or malformed template stops the server from
//! starting at all.

use std::path::{Path, PathBuf};

use minijinja::Environment;
use mobilesync_core::session::{ContentMode, SessionConfig};
use serde::Serialize;

/// Grid page with one button per device slot.
pub const INDEX_TEMPLATE: &str = "index.html";

/// Per-device page for video walls.
pub const VIDEO_TEMPLATE: &str = "video.html";

/// Per-device page for image walls.
pub const IMAGE_TEMPLATE: &str = "image.html";

/// Errors from loading or rendering page templates.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// A template file could not be read.
    #[error("failed to read template {path}: {source}")]
    Load {
        /// Path of the template file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A template failed to compile or render.
    #[error("template {name}: {source}")]
    Template {
        /// Template name.
        name: &'static str,
        /// The underlying template error.
        source: minijinja::Error,
    },
}

/// Context for the grid page.
#[derive(Debug, Clone, Serialize)]
pub struct IndexPage {
    /// Screens per row.
    pub grid_width: u32,
    /// Number of rows.
    pub grid_height: u32,
    /// Resync period in seconds.
    pub period: u64,
    /// `video` or `image`.
    pub content_mode: ContentMode,
    /// Slot ids, one inner list per row.
    pub rows: Vec<Vec<u64>>,
}

impl IndexPage {
    /// Lay out every slot of the session's grid, left to right, top to
    /// bottom.
    pub fn for_session(session: &SessionConfig) -> Self {
        let width = u64::from(session.grid_width());
        let rows = (0..u64::from(session.grid_height()))
            .map(|row| {
                let first = row.saturating_mul(width);
                (first..first.saturating_add(width)).collect()
            })
            .collect();

        Self {
            grid_width: session.grid_width(),
            grid_height: session.grid_height(),
            period: session.period().as_secs(),
            content_mode: session.content_mode(),
            rows,
        }
    }
}

/// Context for a device's media page.
#[derive(Debug, Clone, Serialize)]
pub struct MediaPage {
    /// Screens per row.
    pub hor_screens: u32,
    /// Number of rows.
    pub ver_screens: u32,
    /// The slot id the device asked for.
    pub nid: i64,
    /// Resync period in seconds.
    pub resync: u64,
    /// Row of the slot, if it lies inside the grid.
    pub row: Option<u32>,
    /// Column of the slot, if it lies inside the grid.
    pub column: Option<u32>,
    /// Whether `nid` addresses a real slot.
    pub in_grid: bool,
}

impl MediaPage {
    /// Build the page context for device `nid`.
    ///
    /// Any integer is accepted; ids outside the grid simply get no tile
    /// position.
    pub fn for_device(session: &SessionConfig, nid: i64) -> Self {
        let position = session.slot_position(nid);
        Self {
            hor_screens: session.grid_width(),
            ver_screens: session.grid_height(),
            nid,
            resync: session.period().as_secs(),
            row: position.map(|p| p.row),
            column: position.map(|p| p.column),
            in_grid: position.is_some(),
        }
    }
}

/// Compiled page templates.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    /// Load all page templates from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, PageError> {
        let mut env = Environment::new();
        for name in [INDEX_TEMPLATE, VIDEO_TEMPLATE, IMAGE_TEMPLATE] {
            let source = load_template(dir, name)?;
            env.add_template_owned(name, source)
                .map_err(|source| PageError::Template { name, source })?;
        }
        Ok(Self { env })
    }

    /// Render the grid page.
    pub fn render_index(&self, page: &IndexPage) -> Result<String, PageError> {
        self.render(INDEX_TEMPLATE, page)
    }

    /// Render the media page matching the wall's content mode.
    pub fn render_media(&self, mode: ContentMode, page: &MediaPage) -> Result<String, PageError> {
        match mode {
            ContentMode::Video => self.render(VIDEO_TEMPLATE, page),
            ContentMode::Image => self.render(IMAGE_TEMPLATE, page),
        }
    }

    fn render<S: Serialize>(&self, name: &'static str, ctx: &S) -> Result<String, PageError> {
        self.env
            .get_template(name)
            .and_then(|tpl| tpl.render(ctx))
            .map_err(|source| PageError::Template { name, source })
    }
}

/// Read a template file from disk.
fn load_template(dir: &Path, filename: &str) -> Result<String, PageError> {
    let path = dir.join(filename);
    std::fs::read_to_string(&path).map_err(|source| PageError::Load { path, source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write_test_templates(dir: &Path) {
        std::fs::write(
            dir.join(INDEX_TEMPLATE),
            "{% for row in rows %}[{% for id in row %}{{ id }}{% if not loop.last %},{% endif %}{% endfor %}]{% endfor %}",
        )
        .ok();
        std::fs::write(
            dir.join(VIDEO_TEMPLATE),
            "video {{ nid }} every {{ resync }}s at {{ row }}/{{ column }}",
        )
        .ok();
        std::fs::write(
            dir.join(IMAGE_TEMPLATE),
            "image {{ nid }} in {{ hor_screens }}x{{ ver_screens }}{% if not in_grid %} outside{% endif %}",
        )
        .ok();
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let unique = format!(
            "mobilesync_test_{tag}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        dir
    }

    fn session(mode: ContentMode) -> SessionConfig {
        SessionConfig::new(3, 2, 30, mode).unwrap()
    }

    #[test]
    fn index_lays_out_rows() {
        let page = IndexPage::for_session(&session(ContentMode::Video));
        assert_eq!(page.rows, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn media_page_positions_device() {
        let page = MediaPage::for_device(&session(ContentMode::Video), 5);
        assert_eq!(page.row, Some(1));
        assert_eq!(page.column, Some(2));
        assert!(page.in_grid);

        let outside = MediaPage::for_device(&session(ContentMode::Video), 42);
        assert!(!outside.in_grid);
        assert_eq!(outside.row, None);
        assert_eq!(outside.nid, 42);
    }

    #[test]
    fn renders_from_directory() {
        let dir = temp_dir("render");
        write_test_templates(&dir);
        let renderer = PageRenderer::from_dir(&dir).unwrap();

        let video = session(ContentMode::Video);
        let index = renderer.render_index(&IndexPage::for_session(&video)).unwrap();
        assert_eq!(index, "[0,1,2][3,4,5]");

        let media = renderer
            .render_media(video.content_mode(), &MediaPage::for_device(&video, 4))
            .unwrap();
        assert_eq!(media, "video 4 every 30s at 1/1");

        let image = session(ContentMode::Image);
        let media = renderer
            .render_media(image.content_mode(), &MediaPage::for_device(&image, 9))
            .unwrap();
        assert_eq!(media, "image 9 in 3x2 outside");
    }

    #[test]
    fn missing_template_fails_to_load() {
        let dir = temp_dir("missing");
        let _ = std::fs::remove_file(dir.join(IMAGE_TEMPLATE));
        std::fs::write(dir.join(INDEX_TEMPLATE), "index").ok();
        std::fs::write(dir.join(VIDEO_TEMPLATE), "video").ok();

        let result = PageRenderer::from_dir(&dir);
        assert!(matches!(result, Err(PageError::Load { .. })));
    }
}
