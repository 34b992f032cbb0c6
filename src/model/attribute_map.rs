//! `AttributeMap`: the key-value store on frames and edges.

use std::collections::HashMap;
use super::Value;

/// A map of attribute names to values.
pub type AttributeMap = HashMap<String, Value>;
