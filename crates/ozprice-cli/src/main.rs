mod fetch;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ozprice")]
#[command(about = "Fetch Ozon product prices through a WebDriver browser session")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch prices for one or more product article ids
    Fetch {
        /// Article ids, in the order results should be reported
        #[arg(required = true, num_args = 1..)]
        articles: Vec<u64>,

        /// WebDriver endpoint; overrides OZPRICE_WEBDRIVER_URL
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Attach to an already running driver session instead of creating one
        #[arg(long)]
        session_id: Option<String>,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Loads `.env` itself.
    let config = ozprice_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Fetch {
            articles,
            webdriver_url,
            session_id,
            pretty,
        }) => {
            let options = fetch::FetchOptions {
                webdriver_url,
                session_id,
                pretty,
            };
            fetch::run_fetch(&config, &articles, &options).await?;
        }
        Some(Commands::Config) => print_config(&config),
        None => println!("nothing to do; try `ozprice fetch <ARTICLE>...`"),
    }

    Ok(())
}

fn print_config(config: &ozprice_core::AppConfig) {
    let rows = [
        ("env", config.env.to_string()),
        ("log_level", config.log_level.clone()),
        ("webdriver_url", config.webdriver_url.clone()),
        ("base_url", config.base_url.clone()),
        ("url_form", config.url_form.to_string()),
        ("max_articles_per_request", config.max_articles_per_request.to_string()),
        ("max_retries", config.max_retries.to_string()),
        ("retry_delay_ms", config.retry_delay_ms.to_string()),
        ("inter_article_delay_ms", config.inter_article_delay_ms.to_string()),
        ("post_navigation_delay_ms", config.post_navigation_delay_ms.to_string()),
        ("payload_timeout_secs", config.payload_timeout_secs.to_string()),
        ("document_ready_timeout_secs", config.document_ready_timeout_secs.to_string()),
        ("poll_interval_ms", config.poll_interval_ms.to_string()),
        ("page_load_timeout_secs", config.page_load_timeout_secs.to_string()),
        ("driver_request_timeout_secs", config.driver_request_timeout_secs.to_string()),
        ("markup_fallback", config.markup_fallback.to_string()),
    ];
    for (key, value) in rows {
        println!("{key:<28} = {value}");
    }
}
