mod app;
mod logging;
mod schedule;

pub use app::run_app;
