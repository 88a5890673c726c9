//! Response envelopes.

use serde::{Deserialize, Serialize};

/// The `{ "json_list": [...] }` envelope wrapping every list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonList<T> {
    pub json_list: Vec<T>,
}

impl<T> JsonList<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.json_list
    }
}
