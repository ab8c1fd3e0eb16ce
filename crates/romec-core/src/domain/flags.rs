//! Command flags and the compile strategy they select.

use serde::{Deserialize, Serialize};

/// Flags accepted by the compile command.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandFlags {
    /// Bundle the whole module graph instead of compiling one file.
    pub bundle: bool,
}

impl CommandFlags {
    pub fn bundle() -> Self {
        Self { bundle: true }
    }

    pub fn strategy(&self) -> CompileStrategy {
        CompileStrategy::from(*self)
    }
}

/// Which collaborator produces the compile result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompileStrategy {
    /// Single-file compile through the worker client.
    Direct,
    /// Whole-program compile through the bundler.
    Bundle,
}

impl From<CommandFlags> for CompileStrategy {
    fn from(flags: CommandFlags) -> Self {
        if flags.bundle {
            CompileStrategy::Bundle
        } else {
            CompileStrategy::Direct
        }
    }
}

impl std::fmt::Display for CompileStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileStrategy::Direct => f.write_str("direct"),
            CompileStrategy::Bundle => f.write_str("bundle"),
        }
    }
}
