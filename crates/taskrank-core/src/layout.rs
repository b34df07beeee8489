//! Named view slots and the loader that fills them from templates.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ui::Surface;

/// The eight regions the host document must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Header,
    Strategy,
    Tabs,
    Form,
    Staging,
    Loading,
    Error,
    Results,
}

impl Slot {
    pub const ALL: [Slot; 8] = [
        Slot::Header,
        Slot::Strategy,
        Slot::Tabs,
        Slot::Form,
        Slot::Staging,
        Slot::Loading,
        Slot::Error,
        Slot::Results,
    ];

    /// Element id in the host document.
    pub fn id(&self) -> &'static str {
        match self {
            Slot::Header => "slot-header",
            Slot::Strategy => "slot-strategy",
            Slot::Tabs => "slot-tabs",
            Slot::Form => "slot-form",
            Slot::Staging => "slot-staging",
            Slot::Loading => "slot-loading",
            Slot::Error => "slot-error",
            Slot::Results => "slot-results",
        }
    }

    /// Template loaded into the slot at startup, relative to the views root.
    pub fn default_template(&self) -> &'static str {
        match self {
            Slot::Header => "layout/header.html",
            Slot::Strategy => "input/strategy.html",
            Slot::Tabs => "input/tabs.html",
            Slot::Form => "input/form_single.html",
            Slot::Staging => "input/staging.html",
            Slot::Loading => "output/loader.html",
            Slot::Error => "output/error.html",
            Slot::Results => "output/empty_state.html",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Intake tab: single-entry form or bulk JSON paste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Single,
    Bulk,
}

impl Tab {
    pub fn form_id(&self) -> &'static str {
        match self {
            Tab::Single => "form-single",
            Tab::Bulk => "form-bulk",
        }
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single" | "form-single" => Ok(Tab::Single),
            "bulk" | "form-bulk" => Ok(Tab::Bulk),
            other => Err(format!("unknown tab '{other}' (expected single or bulk)")),
        }
    }
}

/// Where view templates come from.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch(&self, path: &str) -> std::io::Result<String>;
}

/// Templates read from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn fetch(&self, path: &str) -> std::io::Result<String> {
        tokio::fs::read_to_string(self.root.join(path)).await
    }
}

pub const LOAD_ERROR_HTML: &str =
    r#"<div class="alert alert-danger">Error loading component</div>"#;

/// Outcome of [`ComponentLoader::load_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<Slot>,
    pub missing_slots: Vec<Slot>,
    pub failed: Vec<Slot>,
}

/// Fills slots with their templates before the app initializes.
#[derive(Debug, Clone)]
pub struct ComponentLoader {
    components: Vec<(Slot, String)>,
}

impl Default for ComponentLoader {
    fn default() -> Self {
        Self::new(
            Slot::ALL
                .iter()
                .map(|slot| (*slot, slot.default_template().to_string()))
                .collect(),
        )
    }
}

impl ComponentLoader {
    pub fn new(components: Vec<(Slot, String)>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[(Slot, String)] {
        &self.components
    }

    /// Load every template. A missing slot is skipped with a warning; a
    /// template that cannot be read leaves an error notice in its slot.
    pub async fn load_all(&self, source: &dyn TemplateSource, surface: &dyn Surface) -> LoadReport {
        let mut report = LoadReport::default();
        for (slot, path) in &self.components {
            if !surface.has_slot(*slot) {
                tracing::warn!(slot = %slot, "slot not found");
                report.missing_slots.push(*slot);
                continue;
            }

            match source.fetch(path).await {
                Ok(html) => {
                    surface.set_slot_html(*slot, &html);
                    report.loaded.push(*slot);
                }
                Err(err) => {
                    tracing::error!(slot = %slot, path = %path, error = %err, "failed to load view");
                    surface.set_slot_html(*slot, LOAD_ERROR_HTML);
                    report.failed.push(*slot);
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::HeadlessSurface;

    #[test]
    fn slot_ids_are_unique() {
        let mut ids: Vec<&str> = Slot::ALL.iter().map(Slot::id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn tab_parses_short_and_form_names() {
        assert_eq!("bulk".parse::<Tab>().unwrap(), Tab::Bulk);
        assert_eq!("form-single".parse::<Tab>().unwrap(), Tab::Single);
        assert!("other".parse::<Tab>().is_err());
    }

    #[tokio::test]
    async fn load_all_fills_slots_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("layout")).unwrap();
        std::fs::write(dir.path().join("layout/header.html"), "<h1>Tasks</h1>").unwrap();

        let loader = ComponentLoader::new(vec![
            (Slot::Header, "layout/header.html".into()),
            (Slot::Results, "output/empty_state.html".into()),
        ]);
        let surface = HeadlessSurface::with_all_slots();

        let report = loader
            .load_all(&FsTemplateSource::new(dir.path()), &surface)
            .await;

        assert_eq!(report.loaded, vec![Slot::Header]);
        assert_eq!(report.failed, vec![Slot::Results]);
        assert_eq!(surface.slot_html(Slot::Header).as_deref(), Some("<h1>Tasks</h1>"));
        assert_eq!(surface.slot_html(Slot::Results).as_deref(), Some(LOAD_ERROR_HTML));
    }

    #[tokio::test]
    async fn missing_slots_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let surface = HeadlessSurface::with_slots(&[Slot::Header]);

        let report = ComponentLoader::default()
            .load_all(&FsTemplateSource::new(dir.path()), &surface)
            .await;

        assert_eq!(report.missing_slots.len(), 7);
        assert_eq!(report.failed, vec![Slot::Header]);
    }
}
