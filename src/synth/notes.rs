// Note table - Santoor string set and octave shifting
//
// The instrument exposes a fixed set of named strings. Each name resolves to a
// base frequency; the player's octave shift multiplies it by a power of two.

/// Strings of the instrument, lowest first, with their base frequency in Hz.
///
/// C major over three octaves, equal temperament (A4 = 440 Hz).
pub const NOTE_FREQUENCIES: [(&str, f32); 21] = [
    ("C3", 130.81),
    ("D3", 146.83),
    ("E3", 164.81),
    ("F3", 174.61),
    ("G3", 196.00),
    ("A3", 220.00),
    ("B3", 246.94),
    ("C4", 261.63),
    ("D4", 293.66),
    ("E4", 329.63),
    ("F4", 349.23),
    ("G4", 392.00),
    ("A4", 440.00),
    ("B4", 493.88),
    ("C5", 523.25),
    ("D5", 587.33),
    ("E5", 659.25),
    ("F5", 698.46),
    ("G5", 783.99),
    ("A5", 880.00),
    ("B5", 987.77),
];

/// Look up the base frequency of a string. `None` for names outside the set.
pub fn base_frequency(note: &str) -> Option<f32> {
    NOTE_FREQUENCIES
        .iter()
        .find(|(name, _)| *name == note)
        .map(|(_, freq)| *freq)
}

/// Octave offset applied to every played note
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OctaveShift(i8);

impl OctaveShift {
    pub const MIN: i8 = -2;
    pub const MAX: i8 = 2;

    /// Build a shift, rejecting values outside [`MIN`, `MAX`].
    ///
    /// [`MIN`]: Self::MIN
    /// [`MAX`]: Self::MAX
    pub fn new(shift: i8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&shift).then_some(Self(shift))
    }

    /// Build a shift, saturating at the range bounds
    pub fn clamped(shift: i32) -> Self {
        Self(shift.clamp(Self::MIN as i32, Self::MAX as i32) as i8)
    }

    pub fn value(self) -> i8 {
        self.0
    }

    /// Frequency multiplier, 2^shift. Exact for every shift in range.
    pub fn factor(self) -> f32 {
        2.0_f32.powi(self.0 as i32)
    }

    /// Apply the shift to a base frequency
    pub fn apply(self, base_frequency: f32) -> f32 {
        base_frequency * self.factor()
    }
}
