//! grain - live granular sampler in the terminal
//!
//! Records the default input device and replays it through grain voices on
//! the default output device. Play notes from the computer keyboard.
//!
//! Run with: cargo run --bin grain

mod app;
mod ui;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    app::run()
}
