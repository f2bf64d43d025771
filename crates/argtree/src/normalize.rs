//! Alias reconciliation after parsing.

use crate::error::{Error, Result};
use crate::registry::FlagRegistry;

impl FlagRegistry {
    /// Propagate each explicitly set alias to its siblings.
    ///
    /// Scalar siblings receive the text form of the set alias' value. Aliases
    /// sharing one cell (accumulators, generic values) already agree and are
    /// only marked as set. Giving two aliases of the same flag is an error,
    /// even when the values match.
    pub fn normalize(&self) -> Result<()> {
        for group in &self.groups {
            if group.names.len() < 2 {
                continue;
            }

            let mut source: Option<&str> = None;
            for name in &group.names {
                if !self.is_visited(name) {
                    continue;
                }
                if let Some(earlier) = source {
                    return Err(Error::AliasConflict {
                        first: name.clone(),
                        second: earlier.to_string(),
                    });
                }
                source = Some(name.as_str());
            }
            let Some(source) = source else {
                continue;
            };

            let text = match self.value(source) {
                Some(value) => value.to_text(),
                None => continue,
            };
            for sibling in group.names.iter().filter(|n| n.as_str() != source) {
                if group.accumulator || self.shares_cell(source, sibling) {
                    self.mark_visited(sibling);
                    continue;
                }
                if let Err(reason) = self.assign(sibling, &text) {
                    tracing::warn!(flag = %sibling, from = source, %reason, "could not copy alias value");
                }
            }
            tracing::trace!(scope = self.scope(), flag = source, "normalized aliases");
        }
        Ok(())
    }
}
