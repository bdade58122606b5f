//! Link resolution
//!
//! Maps parsed tokens to notes through a [`LinkLookup`]: wiki links by
//! title, reference and URL links by identifier. Resolution holds no
//! state of its own, so re-resolving the same tokens against an
//! unchanged lookup gives the same answer.

use super::note::NoteId;
use crate::analysis::{LinkKind, LinkToken};

/// Read access to the indices a resolver needs
pub trait LinkLookup {
    /// The registered identifier equal to `id`
    fn find_id(&self, id: &str) -> Option<&NoteId>;

    /// The note currently holding `title` in the title index
    fn find_title(&self, title: &str) -> Option<&NoteId>;
}

/// Outcome of resolving a note's tokens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Resolved targets in document order, repeats kept
    pub outbound: Vec<NoteId>,
    /// Tokens with no matching note, in document order
    pub dead: Vec<LinkToken>,
}

/// Resolve a single token, `None` if it is a dead link.
pub fn resolve_token<'a, L>(token: &LinkToken, lookup: &'a L) -> Option<&'a NoteId>
where
    L: LinkLookup + ?Sized,
{
    match token.kind {
        LinkKind::Wiki => lookup.find_title(&token.payload),
        LinkKind::Reference | LinkKind::Url => lookup.find_id(&token.payload),
    }
}

/// Resolve every token, splitting them into targets and dead links.
pub fn resolve<L>(tokens: &[LinkToken], lookup: &L) -> Resolution
where
    L: LinkLookup + ?Sized,
{
    let mut resolution = Resolution::default();
    for token in tokens {
        match resolve_token(token, lookup) {
            Some(id) => resolution.outbound.push(id.clone()),
            None => resolution.dead.push(token.clone()),
        }
    }
    resolution
}
