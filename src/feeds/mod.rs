pub mod market;
pub mod news;

pub use market::MarketFeed;
pub use news::{NewsFeed, NewsTicker};
