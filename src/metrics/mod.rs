pub mod tracker;

pub use tracker::{Series, StatsCollector};
