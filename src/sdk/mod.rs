pub mod batch;
pub mod config;
pub mod export;
pub mod geo;
pub mod map;
pub mod pairs;
pub mod report;
pub mod routing;
pub mod util;
