mod app;
mod board;
mod dom;
mod history;
mod net;
mod panel;
mod render;
mod state;
mod tools;
mod ws;

pub use app::run;
