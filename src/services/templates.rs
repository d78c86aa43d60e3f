// src/services/templates.rs

//! Rendering of the per-source HTML templates.
//!
//! Built once at startup and shared by reference between the page
//! handlers and the notifier.

use std::path::Path;

use minijinja::{Environment, Value, context, path_loader};

use crate::error::Result;
use crate::models::{ComicSource, Identifier, TemplateConfig};

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("xkcd.html", include_str!("../../templates/xkcd.html")),
    ("smbc.html", include_str!("../../templates/smbc.html")),
    ("jl8.html", include_str!("../../templates/jl8.html")),
];

/// Template environment for comic pages and mails.
pub struct TemplateService {
    env: Environment<'static>,
}

impl TemplateService {
    /// Environment with the templates compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in BUILTIN_TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// Environment that loads templates from `dir` on demand.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir.as_ref().to_path_buf()));
        Self { env }
    }

    pub fn from_config(config: &TemplateConfig) -> Result<Self> {
        match &config.dir {
            Some(dir) => {
                log::info!("Loading templates from {}", dir.display());
                Ok(Self::from_dir(dir))
            }
            None => Self::builtin(),
        }
    }

    /// Render `<source>.html` with the identifier bound to `data`, or
    /// `false` when there is none.
    pub fn render_comic(&self, source: ComicSource, data: Option<&Identifier>) -> Result<String> {
        let data = match data {
            Some(identifier) => Value::from_serialize(identifier),
            None => Value::from(false),
        };
        let template = self.env.get_template(&source.template_name())?;
        Ok(template.render(context! { data => data })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_xkcd_renders_pair() {
        let templates = TemplateService::builtin().unwrap();
        let html = templates
            .render_comic(
                ComicSource::Xkcd,
                Some(&Identifier::Pair("http://img/1.png".into(), "Title A".into())),
            )
            .unwrap();

        assert!(html.contains("1.png"));
        assert!(html.contains("Title A"));
    }

    #[test]
    fn test_builtin_templates_handle_missing_data() {
        let templates = TemplateService::builtin().unwrap();
        for source in ComicSource::ALL {
            let html = templates.render_comic(source, None).unwrap();
            assert!(html.contains("No comic found"), "{source}: {html}");
        }
    }

    #[test]
    fn test_caption_is_escaped() {
        let templates = TemplateService::builtin().unwrap();
        let html = templates
            .render_comic(
                ComicSource::Xkcd,
                Some(&Identifier::Pair("http://img/1.png".into(), "<b>bold</b>".into())),
            )
            .unwrap();

        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;b&gt;bold"));
    }

    #[test]
    fn test_jl8_and_smbc_render_values() {
        let templates = TemplateService::builtin().unwrap();

        let jl8 = templates
            .render_comic(ComicSource::Jl8, Some(&Identifier::Number(42)))
            .unwrap();
        assert!(jl8.contains("http://limbero.org/jl8/42"));

        let smbc = templates
            .render_comic(
                ComicSource::Smbc,
                Some(&Identifier::Url("http://smbc/strip.png".into())),
            )
            .unwrap();
        assert!(smbc.contains("strip.png"));
    }

    #[test]
    fn test_from_dir_loads_override() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("jl8.html"), "strip {{ data }}").unwrap();

        let templates = TemplateService::from_config(&TemplateConfig {
            dir: Some(tmp.path().to_path_buf()),
        })
        .unwrap();

        assert_eq!(
            templates
                .render_comic(ComicSource::Jl8, Some(&Identifier::Number(7)))
                .unwrap(),
            "strip 7"
        );
        assert!(templates.render_comic(ComicSource::Xkcd, None).is_err());
    }
}
