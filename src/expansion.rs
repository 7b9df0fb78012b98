/*!
 * Expanded/collapsed state of directory nodes, keyed by path so it survives
 * tree rebuilds. Paths absent from the map are collapsed.
 */

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashMap<String, bool>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.get(path).copied().unwrap_or(false)
    }

    pub fn set_expanded(&mut self, path: &str, expanded: bool) {
        self.expanded.insert(path.to_string(), expanded);
    }

    /// Flip the state of `path` and return the new value
    pub fn toggle(&mut self, path: &str) -> bool {
        let expanded = !self.is_expanded(path);
        self.set_expanded(path, expanded);
        expanded
    }

    /// Expanded paths in lexical order
    pub fn expanded_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .expanded
            .iter()
            .filter(|(_, v)| **v)
            .map(|(k, _)| k.as_str())
            .collect();
        paths.sort_unstable();
        paths
    }
}
