// Purpose: grain voices, note events and polyphony
// This layer sits above the recorder and envelope and decides which voice
// plays which note.

pub mod message;
pub mod poly;
pub mod rate;
pub mod sound;
pub mod voice;

pub use message::{MessageReceiver, NoteEvent, SynthMessage};
pub use poly::{StealPolicy, VoicePool};
pub use rate::RatePolicy;
pub use sound::Sound;
pub use voice::{GrainVoice, VoiceState};
