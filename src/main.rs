mod app;
mod config;
mod dot;
mod input;
mod render;
mod sim;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
