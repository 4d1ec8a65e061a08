pub mod alpha_vantage;
pub mod resolver;

pub use alpha_vantage::AlphaVantageProvider;
pub use resolver::CachingPriceResolver;
