mod sample;
mod yahoo;

pub use sample::SampleMarketData;
pub use yahoo::{YahooAdapter, YahooAuth};
