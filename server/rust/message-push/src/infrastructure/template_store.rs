use std::path::PathBuf;

use async_trait::async_trait;
use handlebars::Handlebars;
use serde_json::{Map, Value};

use crate::domain::service::{TemplateError, TemplateRenderer};

/// `<dir>/<name>.html` を都度読み込んで handlebars で描画する。
///
/// ファイルは毎回読み直すため、テンプレートの差し替えに再起動は不要。
pub struct HtmlTemplateStore {
    dir: PathBuf,
    registry: Handlebars<'static>,
}

impl HtmlTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            registry: Handlebars::new(),
        }
    }

    fn template_path(&self, template_name: &str) -> Option<PathBuf> {
        // ディレクトリ外のファイルは参照させない
        let valid = !template_name.is_empty()
            && !template_name.contains(&['/', '\\'][..])
            && !template_name.contains("..");
        valid.then(|| self.dir.join(format!("{template_name}.html")))
    }
}

#[async_trait]
impl TemplateRenderer for HtmlTemplateStore {
    async fn exists(&self, template_name: &str) -> bool {
        let Some(path) = self.template_path(template_name) else {
            return false;
        };
        tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_file())
    }

    async fn render(
        &self,
        template_name: &str,
        variables: &Map<String, Value>,
    ) -> Result<String, TemplateError> {
        let path = self
            .template_path(template_name)
            .ok_or_else(|| TemplateError::NotFound(template_name.to_string()))?;
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

        self.registry
            .render_template(&source, variables)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with(name: &str, content: &str) -> (tempfile::TempDir, HtmlTemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{name}.html")), content).unwrap();
        let store = HtmlTemplateStore::new(dir.path());
        (dir, store)
    }

    fn vars(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn exists_for_present_template() {
        let (_dir, store) = store_with("service_order", "<p>{{title}}</p>");
        assert!(store.exists("service_order").await);
        assert!(!store.exists("missing").await);
    }

    #[tokio::test]
    async fn rejects_names_outside_directory() {
        let (_dir, store) = store_with("service_order", "<p></p>");
        assert!(!store.exists("../service_order").await);
        assert!(!store.exists("sub/service_order").await);
        assert!(!store.exists("").await);
    }

    #[tokio::test]
    async fn renders_variables() {
        let (_dir, store) = store_with(
            "service_order",
            "<h1>{{title}}</h1><p>{{service_no}}</p>",
        );
        let html = store
            .render(
                "service_order",
                &vars(json!({"title": "Service order", "service_no": "202999999999"})),
            )
            .await
            .unwrap();
        assert_eq!(html, "<h1>Service order</h1><p>202999999999</p>");
    }

    #[tokio::test]
    async fn escapes_html_in_variables() {
        let (_dir, store) = store_with("t", "<p>{{name}}</p>");
        let html = store
            .render("t", &vars(json!({"name": "<b>x</b>"})))
            .await
            .unwrap();
        assert_eq!(html, "<p>&lt;b&gt;x&lt;/b&gt;</p>");
    }

    #[tokio::test]
    async fn render_missing_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = HtmlTemplateStore::new(dir.path());
        assert!(matches!(
            store.render("missing", &Map::new()).await,
            Err(TemplateError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn broken_template_is_render_error() {
        let (_dir, store) = store_with("broken", "<p>{{#if}}</p>");
        assert!(matches!(
            store.render("broken", &Map::new()).await,
            Err(TemplateError::Render(_))
        ));
    }

    #[tokio::test]
    async fn directory_with_html_suffix_is_not_a_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested.html")).unwrap();
        let store = HtmlTemplateStore::new(dir.path());
        assert!(!store.exists("nested").await);
    }
}
