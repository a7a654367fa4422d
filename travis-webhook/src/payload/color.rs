//! Status colors for rendering build state.

/// RGB color for a build state, packed as `0xRRGGBB`.
///
/// Callers pick a color from the [`Payload`](crate::Payload) predicates; the
/// enum itself carries no build logic.
///
/// # Examples
///
/// ```
/// use travis_webhook::Color;
///
/// assert_eq!(Color::Passed.value(), 0x39AA56);
/// assert_eq!(u32::from(Color::Cancel), 10_329_501);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Color {
    /// `#39AA56`
    Passed = 3_779_158,
    /// `#DB4545`
    Fail = 14_370_117,
    /// `#EDDE3F`
    InProgress = 15_588_927,
    /// `#9D9D9D`
    Cancel = 10_329_501,
}

impl Color {
    /// Returns the packed RGB value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self as u32
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.value()
    }
}
