//! Piezo buzzer cue playback
//!
//! Each cue maps to a short tone pattern. The player is advanced by
//! calling `update()` periodically and returns the frequency to drive the
//! PWM output with (0 = silent).
//!
//! ```ignore
//! let mut player = CuePlayer::new();
//! player.play(Cue::Start);
//!
//! // Every few milliseconds:
//! let freq = player.update(elapsed_ms);
//! buzzer.set_frequency(freq);
//! ```

use tensio_core::cue::Cue;

/// One note of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone {
    /// Frequency (Hz, 0 = pause)
    pub freq_hz: u16,
    /// Length (ms)
    pub duration_ms: u16,
}

const fn tone(freq_hz: u16, duration_ms: u16) -> Tone {
    Tone {
        freq_hz,
        duration_ms,
    }
}

const INTRO: &[Tone] = &[tone(660, 120), tone(0, 60), tone(880, 160)];
const START: &[Tone] = &[tone(1760, 250)];
const COUNTDOWN: &[Tone] = &[tone(1320, 80), tone(0, 80), tone(1320, 80)];
const END: &[Tone] = &[tone(880, 400)];
const VICTORY: &[Tone] = &[
    tone(1047, 120),
    tone(1319, 120),
    tone(1568, 120),
    tone(0, 60),
    tone(2093, 400),
];

/// Tone pattern for a cue
pub fn pattern(cue: Cue) -> &'static [Tone] {
    match cue {
        Cue::Intro => INTRO,
        Cue::Start => START,
        Cue::Countdown => COUNTDOWN,
        Cue::End => END,
        Cue::Victory => VICTORY,
    }
}

/// Plays one cue pattern at a time
///
/// A new cue replaces the one playing; cues are short and the newest
/// transition is the one that matters.
#[derive(Debug, Clone, Default)]
pub struct CuePlayer {
    pattern: &'static [Tone],
    index: usize,
    /// Time spent in the current note (ms)
    note_ms: u32,
}

impl CuePlayer {
    /// Create an idle player
    pub const fn new() -> Self {
        Self {
            pattern: &[],
            index: 0,
            note_ms: 0,
        }
    }

    /// Start playing `cue`
    pub fn play(&mut self, cue: Cue) {
        self.pattern = pattern(cue);
        self.index = 0;
        self.note_ms = 0;
    }

    /// Silence the current pattern
    pub fn stop(&mut self) {
        self.pattern = &[];
        self.index = 0;
        self.note_ms = 0;
    }

    /// Check if a pattern is playing
    pub fn is_playing(&self) -> bool {
        self.index < self.pattern.len()
    }

    /// Advance by `delta_ms` and return the frequency to output
    pub fn update(&mut self, delta_ms: u32) -> u16 {
        self.note_ms += delta_ms;
        while let Some(note) = self.pattern.get(self.index) {
            if self.note_ms < note.duration_ms as u32 {
                return note.freq_hz;
            }
            self.note_ms -= note.duration_ms as u32;
            self.index += 1;
        }
        self.note_ms = 0;
        0
    }
}
