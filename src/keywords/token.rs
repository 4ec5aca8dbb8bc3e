//! Positional token rendering for SCHEDULE keyword records.
//!
//! Every record field renders to exactly one whitespace-free token. Unset
//! optional fields render as the `*` default marker; they are never dropped
//! because the simulator reads items by position.

use serde::{Deserialize, Serialize};

/// Default-value marker for an unset positional item.
pub const WILDCARD: &str = "*";

/// Three-letter month codes used by `DATES`. July is `JLY`, not `JUL`.
pub const MONTH_CODES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JLY", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Renders a value as one positional token.
pub trait ToToken {
    fn to_token(&self) -> String;
}

impl ToToken for f64 {
    fn to_token(&self) -> String {
        format_real(*self)
    }
}

impl ToToken for u32 {
    fn to_token(&self) -> String {
        self.to_string()
    }
}

impl ToToken for String {
    fn to_token(&self) -> String {
        self.clone()
    }
}

impl<T: ToToken> ToToken for Option<T> {
    fn to_token(&self) -> String {
        match self {
            Some(v) => v.to_token(),
            None => WILDCARD.to_string(),
        }
    }
}

/// Shortest round-trip decimal; integral values keep a `.0` suffix so reals
/// stay distinguishable from integer items (`5.0`, `2.5`, `0.16`).
pub fn format_real(value: f64) -> String {
    format!("{value:?}")
}

/// A numeric item that keeps its integer/real flavour on output.
///
/// Defaults such as skin `0` or a reset efficiency of `1` are written as
/// integers, computed values as reals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Real(f64),
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => v as f64,
            Self::Real(v) => v,
        }
    }
}

impl ToToken for Numeric {
    fn to_token(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Real(v) => format_real(*v),
        }
    }
}

/// Keyword-level enumerations render through this macro so the token text
/// lives next to the variant.
macro_rules! token_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum $name {
            $($variant),+
        }

        impl ToToken for $name {
            fn to_token(&self) -> String {
                match self {
                    $(Self::$variant => $text.to_string()),+
                }
            }
        }
    };
}

token_enum!(
    /// Well or connection status.
    Status { Open => "OPEN", Shut => "SHUT", Stop => "STOP", Auto => "AUTO" }
);

token_enum!(
    /// Historical production control mode (`WCONHIST` item 3).
    ProductionMode {
        Orat => "ORAT",
        Wrat => "WRAT",
        Grat => "GRAT",
        Lrat => "LRAT",
        Resv => "RESV",
        Bhp => "BHP",
    }
);

token_enum!(
    /// Historical injection control mode (`WCONINJH` item 12).
    InjectionMode { Rate => "RATE", Bhp => "BHP", Thp => "THP" }
);

token_enum!(
    /// Injected phase (`WCONINJH` item 2).
    InjectedFluid { Water => "WATER", Gas => "GAS", Oil => "OIL" }
);

token_enum!(
    /// Preferred phase (`WELSPECS` item 6).
    Phase { Oil => "OIL", Water => "WATER", Gas => "GAS", Liq => "LIQ" }
);

token_enum!(
    /// Depth reference for `COMPDATMD` interval bounds.
    DepthType { Md => "MD", Tvd => "TVD" }
);
