pub mod awaiter;
pub mod block;
pub mod decode;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod markup;
pub mod pipeline;
pub mod session;
pub mod url;
pub mod webdriver;

pub use awaiter::{AwaitOutcome, PayloadAwaiter};
pub use block::BlockDetector;
pub use decode::{decode_price_record, normalize_price, MARKER_FIELD};
pub use error::ScraperError;
pub use extract::{extract_payload, RawPayload};
pub use fetcher::{ArticleFetcher, FetchOnce};
pub use markup::scan_markup_prices;
pub use pipeline::{RetryPolicy, RetryingPipeline};
pub use session::{BrowserSession, SessionError};
pub use url::{ArticleUrl, OzonUrlBuilder};
pub use webdriver::WebDriverSession;
