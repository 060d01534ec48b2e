//! Ownership and visibility rules. Pure decisions; callers turn a `false`
//! into the right error.

use logbook_types::models::{Entry, ScribeId, Visibility};

/// Strict self-ownership: only the owner may amend or delete a resource.
pub fn authorize(acting: ScribeId, owner: ScribeId) -> bool {
    acting == owner
}

/// Public entries are readable by anyone, private ones only by their owner.
pub fn can_view(entry: &Entry, viewer: Option<ScribeId>) -> bool {
    match entry.visibility {
        Visibility::Public => true,
        Visibility::Private => viewer == Some(entry.scribe_id),
    }
}
