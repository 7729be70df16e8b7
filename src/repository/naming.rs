//! Node name validation and "copy of" name derivation.

use anyhow::{bail, Result};
use lazy_static::lazy_static;
use regex::Regex;

use super::models::NodeId;
use super::trait_def::NodeStore;

lazy_static! {
    /// Names start with a word character and may continue with word
    /// characters, dashes, apostrophes and inner spaces.
    static ref NODE_NAME: Regex = Regex::new(r"^[\w][\w\-' ]*$").unwrap();
}

pub fn is_valid_node_name(name: &str) -> bool {
    NODE_NAME.is_match(name) && !name.ends_with(' ')
}

pub fn validate_node_name(name: &str) -> Result<()> {
    if !is_valid_node_name(name) {
        bail!("'{}' is not a valid node name", name);
    }
    Ok(())
}

/// Derives a "copy of {name}" name that is unique among the destination's
/// children, falling back to "copy of {name} (2)", "(3)", … when taken.
pub fn copy_of_name(store: &dyn NodeStore, destination: &NodeId, name: &str) -> Result<String> {
    let base = format!("copy of {}", name);
    if store.child_by_name(destination, &base)?.is_none() {
        return Ok(base);
    }
    let mut counter = 2u32;
    loop {
        let candidate = format!("{} ({})", base, counter);
        if store.child_by_name(destination, &candidate)?.is_none() {
            return Ok(candidate);
        }
        counter += 1;
    }
}
