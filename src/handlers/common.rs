use serde::{Deserialize, Serialize};

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, Serialize)]
pub struct ListParams {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub(crate) fn default_limit() -> u64 {
    100
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
        }
    }
}
