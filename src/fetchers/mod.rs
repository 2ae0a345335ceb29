pub mod fetcher;
pub mod robots;
pub mod web;

pub use fetcher::{FetchError, FetchedPage, PageFetcher};
pub use robots::{RobotsDecision, check_robots};
pub use web::HttpFetcher;
