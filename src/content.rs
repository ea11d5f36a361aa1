//! Copy shared between the Rust views and the static pages.

/// Words cycled by the hero intro, in order.
pub const INTRO_WORDS: [&str; 3] = ["smart", "bold", "connected"];

/// Words in the horizontally looping band. The leading blank keeps a gap
/// where the band wraps around.
pub const MARQUEE_WORDS: [&str; 10] = [
    "",
    "design",
    "innovate",
    "develop",
    "create",
    "engineer",
    "build",
    "transform",
    "lead",
    "inspire",
];
