#![forbid(unsafe_code)]

//! Render options.
//!
//! The requested render depth is the only tunable of the instrumentation.
//! `depth = n` lets component logic run at instrumentation depths
//! `0..n`; anything deeper is replaced by an inert placeholder. Depth `1` is
//! a shallow render.
//!
//! # Environment
//!
//! [`RenderOptions::from_env`] reads `RSPY_DEPTH`: a positive integer, or
//! `0`/`inf`/`unbounded` (or unset) for no limit.

use std::fmt;
use std::num::NonZeroUsize;

/// Environment variable read by [`RenderOptions::from_env`].
pub const DEPTH_ENV: &str = "RSPY_DEPTH";

/// How many component levels may execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    #[default]
    Unbounded,
    Levels(NonZeroUsize),
}

impl Depth {
    /// One level: only the root request executes.
    pub const SHALLOW: Depth = Depth::Levels(NonZeroUsize::MIN);

    /// `n` levels. Zero falls back to unbounded.
    #[must_use]
    pub fn levels(n: usize) -> Self {
        NonZeroUsize::new(n).map_or(Self::Unbounded, Self::Levels)
    }

    /// Deepest instrumentation depth allowed to execute, if limited.
    #[must_use]
    pub fn budget(self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Levels(n) => Some(n.get() - 1),
        }
    }

    /// Whether a component scheduled at `depth` must be replaced.
    #[must_use]
    pub fn exceeded_by(self, depth: usize) -> bool {
        self.budget().is_some_and(|budget| depth > budget)
    }

    /// Parse the `RSPY_DEPTH` syntax.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("inf") || s.eq_ignore_ascii_case("unbounded") {
            return Some(Self::Unbounded);
        }
        s.parse::<usize>().ok().map(Self::levels)
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Levels(n) => write!(f, "{n}"),
        }
    }
}

/// Options for one render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub depth: Depth,
}

impl RenderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth-1 options.
    #[must_use]
    pub fn shallow() -> Self {
        Self {
            depth: Depth::SHALLOW,
        }
    }

    /// Limit execution to `n` levels (`0` means unbounded).
    #[must_use]
    pub fn depth(mut self, n: usize) -> Self {
        self.depth = Depth::levels(n);
        self
    }

    /// Create from environment variables. Unparseable values fall back to
    /// unbounded.
    #[must_use]
    pub fn from_env() -> Self {
        let depth = std::env::var(DEPTH_ENV)
            .ok()
            .and_then(|v| Depth::parse(&v))
            .unwrap_or_default();
        Self { depth }
    }
}
