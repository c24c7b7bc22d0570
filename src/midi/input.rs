//! MIDI input device connection via midir.
//!
//! Picks one input port (by name hint, else the first), parses incoming
//! Control-Change messages and forwards them to the router queue.

use midir::{Ignore, MidiInput, MidiInputConnection};
use thiserror::Error;

use super::router::{CcMessage, CcSender, MidiRouter};

const CLIENT_NAME: &str = "impact-synth";

/// Errors that can occur while opening MIDI input.
#[derive(Error, Debug)]
pub enum MidiError {
    #[error("Failed to initialize MIDI input: {0}")]
    Init(#[from] midir::InitError),

    #[error("Failed to read MIDI port info: {0}")]
    PortInfo(#[from] midir::PortInfoError),

    #[error("Failed to connect to MIDI port '{port}': {reason}")]
    Connect { port: String, reason: String },
}

/// Parse a raw MIDI message as Control-Change.
///
/// Returns `None` for any other status byte or malformed data bytes.
pub fn parse_control_change(message: &[u8]) -> Option<CcMessage> {
    let &[status, cc, value, ..] = message else {
        return None;
    };
    if status & 0xF0 != 0xB0 || cc > 0x7F || value > 0x7F {
        return None;
    }
    Some(CcMessage {
        cc,
        value,
        channel: status & 0x0F,
    })
}

/// Pick the port to open: first name containing `hint` (case-insensitive),
/// otherwise the first port.
pub fn select_port(names: &[String], hint: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    if let Some(hint) = hint {
        let hint = hint.to_lowercase();
        if let Some(index) = names
            .iter()
            .position(|name| name.to_lowercase().contains(&hint))
        {
            return Some(index);
        }
        log::warn!("No MIDI port matches '{hint}', using '{}'", names[0]);
    }
    Some(0)
}

/// List available MIDI input port names.
pub fn list_ports() -> Result<Vec<String>, MidiError> {
    let midi_in = MidiInput::new(CLIENT_NAME)?;
    midi_in
        .ports()
        .iter()
        .map(|port| midi_in.port_name(port).map_err(MidiError::from))
        .collect()
}

/// An open MIDI input. Dropping it closes the port.
pub struct MidiInputPort {
    _connection: MidiInputConnection<()>,
    name: String,
}

impl MidiInputPort {
    /// Connect to a device and feed the router.
    ///
    /// Returns `Ok(None)` when no device is present; the router then simply
    /// never receives events.
    pub fn connect(router: &MidiRouter, hint: Option<&str>) -> Result<Option<Self>, MidiError> {
        let mut midi_in = MidiInput::new(CLIENT_NAME)?;
        midi_in.ignore(Ignore::None);

        let ports = midi_in.ports();
        let names = ports
            .iter()
            .map(|port| midi_in.port_name(port))
            .collect::<Result<Vec<_>, _>>()?;
        for name in &names {
            log::info!("MIDI input available: {name}");
        }

        let Some(index) = select_port(&names, hint) else {
            log::warn!("No MIDI input devices found, CC values will use defaults");
            router.set_device(None);
            return Ok(None);
        };
        let name = names[index].clone();

        let sender: CcSender = router.sender();
        let connection = midi_in
            .connect(
                &ports[index],
                "impact-synth-in",
                move |_timestamp, message, _| {
                    if let Some(cc) = parse_control_change(message) {
                        sender.send(cc);
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect {
                port: name.clone(),
                reason: e.to_string(),
            })?;

        log::info!("Connected to MIDI input: {name}");
        router.set_device(Some(name.clone()));
        Ok(Some(Self {
            _connection: connection,
            name,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_control_change() {
        let cc = parse_control_change(&[0xB3, 21, 100]).unwrap();
        assert_eq!(cc.cc, 21);
        assert_eq!(cc.value, 100);
        assert_eq!(cc.channel, 3);
    }

    #[test]
    fn test_parse_rejects_other_messages() {
        // Note on, program change, too short, bad data byte
        assert!(parse_control_change(&[0x90, 60, 100]).is_none());
        assert!(parse_control_change(&[0xC0, 5]).is_none());
        assert!(parse_control_change(&[0xB0, 7]).is_none());
        assert!(parse_control_change(&[0xB0, 0x80, 1]).is_none());
        assert!(parse_control_change(&[]).is_none());
    }

    #[test]
    fn test_select_port() {
        let names = vec!["Midi Through".to_string(), "nanoKONTROL2 MIDI 1".to_string()];
        assert_eq!(select_port(&names, None), Some(0));
        assert_eq!(select_port(&names, Some("nanokontrol")), Some(1));
        assert_eq!(select_port(&names, Some("launchpad")), Some(0));
        assert_eq!(select_port(&[], Some("anything")), None);
    }
}
