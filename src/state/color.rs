//! Display color assignment.
//!
//! Two simultaneously active users get distinct colors as long as an unused
//! palette entry exists; once the palette is exhausted, a uniformly random
//! entry is reused. Colors are assigned once per session and never
//! re-balanced when others disconnect.

use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Assigns display colors from a fixed palette.
pub struct ColorAssigner {
    palette: Vec<String>,
}

impl ColorAssigner {
    pub fn new(palette: Vec<String>) -> Self {
        debug_assert!(!palette.is_empty());
        Self { palette }
    }

    /// Pick a color given the colors currently in use.
    pub fn assign<'a, I>(&self, in_use: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let used: HashSet<&str> = in_use.into_iter().collect();
        for color in &self.palette {
            if !used.contains(color.as_str()) {
                return color.clone();
            }
        }
        self.palette
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| "#888888".to_string())
    }

    /// The configured palette.
    #[allow(dead_code)] // exercised by tests
    pub fn palette(&self) -> &[String] {
        &self.palette
    }
}
