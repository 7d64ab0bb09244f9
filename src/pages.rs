use std::sync::Arc;

use axum::response::Html;
use minijinja::{context, Environment};

use crate::models::PasteView;

/// HTML pages, rendered from the templates under `assets/`.
#[derive(Clone)]
pub struct Pages {
    env: Arc<Environment<'static>>,
}

impl Pages {
    pub fn load() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../assets/base.html"))?;
        env.add_template("index.html", include_str!("../assets/index.html"))?;
        env.add_template("paste.html", include_str!("../assets/paste.html"))?;
        env.add_template("not_found.html", include_str!("../assets/not_found.html"))?;
        Ok(Pages { env: Arc::new(env) })
    }

    /// The landing page with the create form.
    pub fn index(&self) -> crate::ApiResult<Html<String>> {
        self.render("index.html", context! {})
    }

    pub fn paste(&self, key: &str, paste: &PasteView) -> crate::ApiResult<Html<String>> {
        self.render("paste.html", context! { key, paste })
    }

    pub fn not_found(&self) -> crate::ApiResult<Html<String>> {
        self.render("not_found.html", context! {})
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> crate::ApiResult<Html<String>> {
        let html = self.env.get_template(name)?.render(ctx)?;
        Ok(Html(html))
    }
}
