//! Append-only pool of string literals

use std::fmt;

/// String literals moved out of the tree, addressed by a permanent index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    /// Create an empty pool
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `string` and return its index
    pub fn add(&mut self, string: String) -> usize {
        self.strings.push(string);
        self.strings.len() - 1
    }

    /// String stored at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    /// Number of pooled strings
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if nothing has been pooled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Pooled strings with their indices, in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.strings.iter().map(String::as_str).enumerate()
    }

    /// Release every string and the pool storage, returning the count
    pub fn destroy(self) -> usize {
        let released = self.strings.len();
        drop(self.strings);
        released
    }
}

impl fmt::Display for StringPool {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, string) in self.iter() {
            writeln!(formatter, "{index}: {string}")?;
        }
        Ok(())
    }
}
