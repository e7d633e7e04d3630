//! Compiled template table.
//!
//! # Responsibilities
//! - Load every template file with the configured extension from a
//!   `FileSystem` root into one `tera::Tera`
//! - Expose renderable pages by name: the path relative to the root,
//!   without extension, using `/` separators
//! - Keep partials (`includes_dir`) and layouts (`layout`) loadable for
//!   `{% include %}` / `{% extends %}` but not renderable on their own
//!
//! # Design Decisions
//! - All files are registered in one batch so inheritance resolves no
//!   matter the file order
//! - Read-only after loading; shared behind `Arc` across requests

use std::collections::BTreeMap;
use std::error::Error as _;
use std::path::{Component, Path};

use serde::Serialize;
use tera::{Context, Tera};

use crate::config::TemplatesConfig;
use crate::error::TemplateError;
use crate::fs::FileSystem;

#[derive(Debug, Default)]
pub struct Templates {
    tera: Tera,
    /// Renderable name → registered tera name.
    pages: BTreeMap<String, String>,
}

impl Templates {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load templates below `root`.
    pub fn load(
        fs: &dyn FileSystem,
        root: &Path,
        config: &TemplatesConfig,
    ) -> Result<Self, TemplateError> {
        let files = fs
            .list_files(root)
            .map_err(|e| TemplateError::Load(format!("{}: {}", root.display(), e)))?;

        let mut raw = Vec::new();
        let mut pages = BTreeMap::new();

        for relative in files {
            let Some(name) = template_name(&relative) else {
                continue;
            };
            let Some(stem) = name.strip_suffix(config.ext.as_str()) else {
                continue;
            };

            let contents = fs
                .read(&root.join(&relative))
                .map_err(|e| TemplateError::Load(format!("{}: {}", name, e)))?;
            let contents = String::from_utf8(contents)
                .map_err(|_| TemplateError::Load(format!("{}: not valid UTF-8", name)))?;

            let first = stem.split('/').next().unwrap_or("");
            if first != config.includes_dir && first != config.layout {
                pages.insert(stem.to_string(), name.clone());
            }
            raw.push((name, contents));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(raw)
            .map_err(|e| TemplateError::Load(describe(&e)))?;

        tracing::info!(
            root = %root.display(),
            pages = pages.len(),
            "Templates loaded"
        );
        Ok(Self { tera, pages })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    /// Renderable page names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Render page `name` with `data` (any serializable map-like value).
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, TemplateError> {
        let registered = self
            .pages
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        let render_error = |reason: String| TemplateError::Render {
            name: name.to_string(),
            reason,
        };
        let context = Context::from_serialize(data).map_err(|e| render_error(describe(&e)))?;
        self.tera
            .render(registered, &context)
            .map_err(|e| render_error(describe(&e)))
    }
}

/// `a/b/c.html` from a relative path; `None` for paths escaping the root.
fn template_name(relative: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!segments.is_empty()).then(|| segments.join("/"))
}

/// Tera errors keep the useful detail in their source chain.
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use serde_json::json;

    fn fixture() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_file(
                "views/layouts/base.html",
                "<main>{% block content %}{% endblock content %}</main>",
            )
            .with_file("views/includes/nav.html", "<nav>{{ title }}</nav>")
            .with_file(
                "views/index.html",
                "{% extends \"layouts/base.html\" %}{% block content %}{% include \"includes/nav.html\" %}Hi {{ name }}{% endblock content %}",
            )
            .with_file("views/users/show.html", "user {{ id }}")
            .with_file("views/notes.txt", "ignored")
    }

    #[test]
    fn test_page_names_exclude_partials_and_layouts() {
        let templates =
            Templates::load(&fixture(), Path::new("views"), &TemplatesConfig::default()).unwrap();
        assert_eq!(templates.names().collect::<Vec<_>>(), vec!["index", "users/show"]);
        assert!(!templates.contains("includes/nav"));
        assert!(!templates.contains("layouts/base"));
    }

    #[test]
    fn test_render_with_layout_and_include() {
        let templates =
            Templates::load(&fixture(), Path::new("views"), &TemplatesConfig::default()).unwrap();
        let html = templates
            .render("index", &json!({"title": "Home", "name": "Ada"}))
            .unwrap();
        assert_eq!(html, "<main><nav>Home</nav>Hi Ada</main>");
    }

    #[test]
    fn test_render_missing_template() {
        let templates = Templates::empty();
        let err = templates.render("nope", &json!({})).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name) if name == "nope"));
    }

    #[test]
    fn test_render_requires_object_context() {
        let templates =
            Templates::load(&fixture(), Path::new("views"), &TemplatesConfig::default()).unwrap();
        let err = templates.render("users/show", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
    }

    #[test]
    fn test_broken_template_fails_load() {
        let fs = MemoryFileSystem::new().with_file("views/bad.html", "{% if %}");
        let err = Templates::load(&fs, Path::new("views"), &TemplatesConfig::default()).unwrap_err();
        assert!(matches!(err, TemplateError::Load(_)));
    }

    #[test]
    fn test_custom_extension() {
        let fs = MemoryFileSystem::new()
            .with_file("views/a.tera", "A")
            .with_file("views/b.html", "B");
        let config = TemplatesConfig {
            ext: ".tera".into(),
            ..TemplatesConfig::default()
        };
        let templates = Templates::load(&fs, Path::new("views"), &config).unwrap();
        assert_eq!(templates.names().collect::<Vec<_>>(), vec!["a"]);
    }
}
