use anyhow::Result;
use clap::Parser;
use margin_core::zoom_percent;

/// Prints the zoom percentage of a display DPI.
#[derive(Parser, Debug, Clone)]
pub struct Zoom {
    /// Display DPI, 96 is 100%.
    pub dpi: f64,
}

impl Zoom {
    pub fn run(&self) -> Result<()> {
        println!("{}%", zoom_percent(self.dpi));
        Ok(())
    }
}
