// ── Command vocabulary and translation ──
//
// Maps an authorized (control, command) pair onto the Miniserver web
// service path. Every category gets its own closed vocabulary; adding a
// category means extending `AllowedCommand` and the matches below.

pub mod dvi;

pub use dvi::{DviAction, DviCommand};

use crate::model::Category;

/// Path prefix of the Miniserver I/O web services.
pub const VIRTUAL_INPUT_BASE_PATH: &str = "/dev/sps/io";

/// A command declared in a control's `allowed` list, typed by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowedCommand {
    Dvi(DviCommand),
}

impl AllowedCommand {
    /// Parse a declared command in the vocabulary of `category`.
    pub fn parse(category: Category, raw: &str) -> Option<Self> {
        match category {
            Category::Dvi => raw.parse().ok().map(Self::Dvi),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dvi(cmd) => cmd.as_str(),
        }
    }

    pub fn is_wildcard(self) -> bool {
        match self {
            Self::Dvi(cmd) => cmd.is_wildcard(),
        }
    }

    /// Whether a raw request-time command is covered by this declaration.
    pub fn permits(self, requested: &str) -> bool {
        match self {
            Self::Dvi(cmd) => cmd.permits(requested),
        }
    }
}

/// Build the Miniserver path for a digital virtual input command.
///
/// Pure and infallible: `action` has already been normalized by
/// [`DviAction::parse`].
pub fn translate(id: u32, action: DviAction) -> String {
    format!(
        "{VIRTUAL_INPUT_BASE_PATH}/{}{id}/{action}",
        Category::Dvi.path_prefix()
    )
}
