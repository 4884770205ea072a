//! A terminal start page: a greeting for the time of day, a random quote and
//! a photograph fading in behind them.
//!
//! Each part of the page is a [`ui::widgets::PageWidget`]. Widgets cache
//! their slots in the [`page::Document`] once, start at most one network
//! acquisition through the [`feeds::Dispatcher`], and render when the
//! completion is dispatched back on the UI thread. Failures are logged and
//! leave the page as it was.

pub mod app;
pub mod config;
pub mod feeds;
pub mod logging;
pub mod page;
pub mod ui;
