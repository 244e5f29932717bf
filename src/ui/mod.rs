pub mod app;
mod draw;
mod edit;
pub mod panes;
