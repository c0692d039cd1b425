//! Product address construction.

use ozprice_core::{AppConfig, ArticleId, UrlForm};

pub const DEFAULT_BASE_URL: &str = "https://www.ozon.ru";

/// Maps an article id to the address navigated for it.
pub trait ArticleUrl {
    fn article_url(&self, article: ArticleId) -> String;
}

impl<F> ArticleUrl for F
where
    F: Fn(ArticleId) -> String,
{
    fn article_url(&self, article: ArticleId) -> String {
        self(article)
    }
}

/// Builds Ozon product-page or composer-API addresses.
#[derive(Debug, Clone)]
pub struct OzonUrlBuilder {
    base_url: String,
    form: UrlForm,
}

impl Default for OzonUrlBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, UrlForm::default())
    }
}

impl OzonUrlBuilder {
    #[must_use]
    pub fn new(base_url: &str, form: UrlForm) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            form,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(&config.base_url, config.url_form)
    }
}

impl ArticleUrl for OzonUrlBuilder {
    fn article_url(&self, article: ArticleId) -> String {
        match self.form {
            UrlForm::ProductPage => format!("{}/product/{article}/", self.base_url),
            UrlForm::ComposerApi => format!(
                "{}/api/composer-api.bx/page/json/v2?url=/product/{article}/",
                self.base_url
            ),
        }
    }
}
