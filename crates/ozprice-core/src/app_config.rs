#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which page shape an article URL points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UrlForm {
    /// Canonical storefront path: `{base}/product/{id}/`. Full HTML, only
    /// readable through the markup fallback.
    ProductPage,
    /// Structured composer endpoint; the browser shows its JSON in a `<pre>`.
    #[default]
    ComposerApi,
}

impl std::fmt::Display for UrlForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlForm::ProductPage => write!(f, "product_page"),
            UrlForm::ComposerApi => write!(f, "composer_api"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub webdriver_url: String,
    pub base_url: String,
    pub url_form: UrlForm,
    pub max_articles_per_request: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub inter_article_delay_ms: u64,
    pub post_navigation_delay_ms: u64,
    pub payload_timeout_secs: u64,
    pub document_ready_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub page_load_timeout_secs: u64,
    pub driver_request_timeout_secs: u64,
    pub markup_fallback: bool,
}
