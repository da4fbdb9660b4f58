pub mod aggregator;
pub mod catalog;
pub mod geometry;
pub mod registry;
pub mod screener;
pub mod sequencer;
pub mod spotlight;
