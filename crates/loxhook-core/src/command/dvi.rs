// ── Digital virtual input vocabulary ──
//
// Two deliberately different sets: `DviCommand` is what a control may
// *declare* as allowed (the Miniserver web service commands, see
// https://www.loxone.com/enen/kb/web-services/), `DviAction` is what a
// caller may *request* and what gets sent downstream.

use std::str::FromStr;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::CommandError;

/// A command a `dvi` control may list in its `allowed` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DviCommand {
    /// Wildcard: every request-time command is allowed.
    #[strum(serialize = "<all>")]
    All,
    #[strum(serialize = "0")]
    Zero,
    #[strum(serialize = "1")]
    One,
    On,
    Off,
    Impuls,
    Pulse,
    ImpulsPlus,
    ImpulsMinus,
    PulseUp,
    PulseDown,
    ImpulsAuf,
    ImpulsAb,
    PulseOpen,
    PulseClose,
    PlusEin,
    PlusAus,
    UpOn,
    UpOff,
    AufEin,
    AufAus,
    OpenOn,
    OpenOff,
    MinusEin,
    MinusAus,
    DownOn,
    DownOff,
    AbEin,
    AbAus,
    CloseOn,
    CloseOff,
}

impl DviCommand {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn is_wildcard(self) -> bool {
        self == Self::All
    }

    /// Whether a raw request-time command is covered by this declaration.
    pub fn permits(self, requested: &str) -> bool {
        self.is_wildcard() || self.as_str().eq_ignore_ascii_case(requested)
    }
}

/// A normalized request-time command for a digital virtual input.
///
/// `Display` yields the exact path segment the Miniserver expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DviAction {
    #[strum(serialize = "on", serialize = "ein", to_string = "On")]
    On,
    #[strum(serialize = "off", serialize = "aus", to_string = "Off")]
    Off,
    #[strum(serialize = "pulse", serialize = "impuls", to_string = "Pulse")]
    Pulse,
}

impl DviAction {
    /// Normalize a raw request command (`ein`, `OFF`, `impuls`, ...).
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        Self::from_str(raw).map_err(|_| CommandError {
            category: "dvi",
            command: raw.to_owned(),
        })
    }
}
