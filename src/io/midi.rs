#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl MidiEvent {
    /// Decode a raw channel-voice message. Anything other than note on/off
    /// and control change yields `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;
        let d0 = *data.first()? & 0x7F;
        let d1 = *data.get(1)? & 0x7F;

        match status & 0xF0 {
            0x80 => Some(MidiEvent::NoteOff {
                channel,
                key: d0,
                velocity: d1,
            }),
            0x90 => Some(MidiEvent::NoteOn {
                channel,
                key: d0,
                velocity: d1,
            }),
            0xB0 => Some(MidiEvent::ControlChange {
                channel,
                controller: d0,
                value: d1,
            }),
            _ => None,
        }
    }
}
