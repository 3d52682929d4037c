/// Sounds a voice may be asked to play.
///
/// The set is closed: voices check acceptance with a `match`, not a runtime
/// type test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sound {
    /// Live granular playback from the shared recorder. Applies to every note
    /// on every MIDI channel.
    #[default]
    Granular,
}

impl Sound {
    pub fn applies_to_note(&self, _note: u8) -> bool {
        match self {
            Sound::Granular => true,
        }
    }

    pub fn applies_to_channel(&self, _channel: u8) -> bool {
        match self {
            Sound::Granular => true,
        }
    }
}
