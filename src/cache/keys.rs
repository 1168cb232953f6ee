//! Cache key generation for reference catalog entries

use crate::models::CatalogKind;
use std::fmt;

/// Identifies one reference catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogKey {
    pub kind: CatalogKind,
    pub id: String,
}

impl CatalogKey {
    /// Counterparty addresses are case-insensitive and normalised to lower case
    pub fn new(kind: CatalogKind, id: &str) -> Self {
        let id = match kind {
            CatalogKind::Counterparty => id.to_lowercase(),
            CatalogKind::Project | CatalogKind::Token => id.to_string(),
        };
        Self { kind, id }
    }

    pub fn token(id: &str) -> Self {
        Self::new(CatalogKind::Token, id)
    }

    pub fn counterparty(address: &str) -> Self {
        Self::new(CatalogKind::Counterparty, address)
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
