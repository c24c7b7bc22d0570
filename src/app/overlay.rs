//! Window-title HUD shown while the overlay is on.

pub const BASE_TITLE: &str = "Impact Synth";

/// Everything the HUD reports.
#[derive(Debug, Clone, Default)]
pub struct HudInfo<'a> {
    pub visualization: &'a str,
    pub fps: f32,
    pub width: u32,
    pub height: u32,
    pub midi_device: Option<&'a str>,
    pub last_cc: Option<(u8, u8)>,
    pub brightness: f32,
}

/// Window title for the current frame.
pub fn hud_title(info: Option<&HudInfo<'_>>) -> String {
    let Some(info) = info else {
        return BASE_TITLE.to_string();
    };
    let midi = info.midi_device.unwrap_or("no device");
    let last_cc = match info.last_cc {
        Some((cc, value)) => format!("CC{cc}={value}"),
        None => "-".to_string(),
    };
    format!(
        "{BASE_TITLE} | {} | {:.0} FPS | {}x{} | MIDI: {midi} ({last_cc}) | brightness {:.2}",
        info.visualization, info.fps, info.width, info.height, info.brightness
    )
}
