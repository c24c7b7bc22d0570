//! Command-line argument parsing.

use clap::Parser;

/// How the output window is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Fullscreen,
    Windowed,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "impact")]
#[command(about = "MIDI and audio reactive video synthesizer", long_about = None)]
pub struct Args {
    /// Run in a window instead of fullscreen
    #[arg(long)]
    pub windowed: bool,
}

impl Args {
    /// Presentation mode selected by the flags.
    pub fn presentation(&self) -> Presentation {
        if self.windowed {
            Presentation::Windowed
        } else {
            Presentation::Fullscreen
        }
    }
}
