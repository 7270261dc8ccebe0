use std::env;

mod app;
mod audio;
mod config;
mod library;
mod logging;
mod mpris;
mod persist;
mod queue;
mod render_loop;
mod runtime;
mod ui;
mod visualizer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if env::args().skip(1).any(|a| a == "--print-config") {
        print!("{}", toml::to_string_pretty(&config::Settings::default())?);
        return Ok(());
    }

    runtime::run()
}
