//! Rename Advisor - clean up names that break the label format.
//!
//! The naming prompt asks for a bare name, but models still wrap it in
//! quotes, prefix it with `Category:`, or add trailing punctuation. Those
//! names are legal keys, so the store accepts them; this advisor proposes
//! their canonical form so the scheduler can rename them later.

use crate::category::CategoryStore;

/// A rename the scheduler may apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameProposal {
    /// Current name
    pub old: String,
    /// Canonical name
    pub new: String,
}

const CATEGORY_PREFIX: &str = "category:";
const WRAPPING_CHARS: &[char] = &['"', '\'', '`', '*'];
const TRAILING_CHARS: &[char] = &['.', ',', ';', ':', '!'];

/// Pure, oracle-free rename detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameAdvisor;

impl RenameAdvisor {
    /// First category, in creation order, whose canonical name differs from
    /// its current name and is free to take.
    #[must_use]
    pub fn find_rename(&self, store: &CategoryStore) -> Option<RenameProposal> {
        store.names().find_map(|name| {
            let canonical = canonical_name(name);
            let available = !canonical.is_empty() && canonical != name && !store.contains(&canonical);
            available.then(|| RenameProposal {
                old: name.to_string(),
                new: canonical,
            })
        })
    }
}

/// Canonical form of a category label.
///
/// Strips a leading `Category:` (any case), surrounding quotes, backticks or
/// asterisks, and trailing punctuation, then collapses internal whitespace.
///
/// ```rust
/// use triage_engine::engine::canonical_name;
///
/// assert_eq!(canonical_name("Category: 'Network   Issue'."), "Network Issue");
/// assert_eq!(canonical_name("Billing"), "Billing");
/// ```
#[must_use]
pub fn canonical_name(name: &str) -> String {
    let mut current = name.trim();
    loop {
        let before = current;
        if current.len() >= CATEGORY_PREFIX.len()
            && current.is_char_boundary(CATEGORY_PREFIX.len())
            && current[..CATEGORY_PREFIX.len()].eq_ignore_ascii_case(CATEGORY_PREFIX)
        {
            current = current[CATEGORY_PREFIX.len()..].trim();
        }
        current = current
            .trim_end_matches(TRAILING_CHARS)
            .trim_matches(WRAPPING_CHARS)
            .trim();
        if current == before {
            break;
        }
    }

    current.split_whitespace().collect::<Vec<_>>().join(" ")
}
