//! MIDI Control-Change input.
//!
//! This module provides:
//! - A router holding the latest value per CC number and per-CC callbacks
//! - Device connection and raw message parsing via midir
//! - CC value scaling helpers for visualizations

pub mod input;
pub mod router;

pub use input::{list_ports, parse_control_change, MidiError, MidiInputPort};
pub use router::{scale_cc, CcCallback, CcMessage, CcSender, MidiRouter, CC_MAX};
