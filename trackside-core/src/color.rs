use derivative::Derivative;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

/// Named palette for team identification. The original app stored a free-form
/// opponent color; here the palette is closed so contrast can be precomputed.
#[derive(Derivative, Serialize, Deserialize, Sequence)]
#[derivative(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TeamColor {
    #[derivative(Default)]
    Blue,
    Red,
    Green,
    Yellow,
    Orange,
    Purple,
    Teal,
    Pink,
    White,
    Black,
}

impl TeamColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Blue => (33, 102, 204),
            Self::Red => (204, 41, 54),
            Self::Green => (28, 145, 80),
            Self::Yellow => (240, 200, 8),
            Self::Orange => (236, 124, 38),
            Self::Purple => (122, 66, 191),
            Self::Teal => (26, 156, 176),
            Self::Pink => (226, 110, 178),
            Self::White => (245, 245, 245),
            Self::Black => (24, 24, 24),
        }
    }

    /// Relative luminance per the WCAG definition.
    pub fn relative_luminance(self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        let (r, g, b) = self.rgb();
        0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
    }

    /// WCAG contrast ratio against another color, in `[1.0, 21.0]`.
    pub fn contrast_ratio(self, other: TeamColor) -> f64 {
        let a = self.relative_luminance();
        let b = other.relative_luminance();
        let (lighter, darker) = if a >= b { (a, b) } else { (b, a) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Whether this color reads comfortably on the given background
    /// (contrast ratio of at least 3.0, the WCAG large-text threshold).
    pub fn readable_on(self, background: TeamColor) -> bool {
        self.contrast_ratio(background) >= 3.0
    }
}

impl core::fmt::Display for TeamColor {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::Blue => write!(f, "Blue"),
            Self::Red => write!(f, "Red"),
            Self::Green => write!(f, "Green"),
            Self::Yellow => write!(f, "Yellow"),
            Self::Orange => write!(f, "Orange"),
            Self::Purple => write!(f, "Purple"),
            Self::Teal => write!(f, "Teal"),
            Self::Pink => write!(f, "Pink"),
            Self::White => write!(f, "White"),
            Self::Black => write!(f, "Black"),
        }
    }
}
