//! Kani Arbitrary implementations and proof harnesses for property verification.
//!
//! Kani is not a Cargo dependency. Install and run with:
//!
//! ```bash
//! cargo install --locked kani-verifier
//! cargo kani setup
//! cargo kani --features kani
//! ```
//!
//! This module is only compiled when using Kani (`#[cfg(kani)]`).

use crate::{Part, Position, Resource};

/// Valid first characters of a name
const NAME_FIRST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Valid trailing characters of a name
const NAME_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789-";

fn pick(chars: &[u8]) -> char {
    let idx: usize = kani::any();
    chars[idx % chars.len()] as char
}

/// Generate a 1-4 char name, valid by construction
fn arbitrary_name() -> String {
    let len: usize = kani::any();
    let len = 1 + (len % 4);
    (0..len)
        .map(|i| if i == 0 { pick(NAME_FIRST_CHARS) } else { pick(NAME_CHARS) })
        .collect()
}

/// Generate a 1-3 digit instance number
fn arbitrary_instance() -> String {
    let slot: u16 = kani::any();
    (slot % 1000).to_string()
}

impl kani::Arbitrary for Part {
    fn any() -> Self {
        let choice: u8 = kani::any();
        match choice % 3 {
            0 => Part::Absent,
            1 => Part::Wildcard,
            _ => Part::Named(arbitrary_name()),
        }
    }
}

/// Arbitrary fully qualified resource.
fn arbitrary_leaf() -> Resource {
    Resource::from_parts([
        Part::Named(arbitrary_name()),
        Part::Named(arbitrary_name()),
        Part::Named(arbitrary_name()),
        Part::Named(arbitrary_name()),
        Part::Named(arbitrary_instance()),
        Part::Named(arbitrary_name()),
    ])
}

// ============================================================================
// Kani Proof Harnesses
// ============================================================================

/// Proof: Display then parse is the identity for fully qualified resources
#[kani::proof]
#[kani::unwind(8)]
fn proof_leaf_roundtrip() {
    let leaf = arbitrary_leaf();
    let reparsed = Resource::parse(&leaf.to_string()).expect("leaf should parse");
    assert_eq!(reparsed, leaf);
}

/// Proof: every resource matches itself when used as a query
#[kani::proof]
#[kani::unwind(8)]
fn proof_match_reflexive() {
    let leaf = arbitrary_leaf();
    assert!(leaf.matches(&leaf));
}

/// Proof: an all-wildcard query matches every leaf
#[kani::proof]
#[kani::unwind(8)]
fn proof_wildcard_matches_everything() {
    let leaf = arbitrary_leaf();
    let query = Resource::from_parts(std::array::from_fn(|_| Part::Wildcard));
    assert!(query.matches(&leaf));
}

/// Proof: set and wildcard are never both true for a part
#[kani::proof]
#[kani::unwind(8)]
fn proof_part_flags_exclusive() {
    let part: Part = kani::any();
    assert!(!(part.is_set() && part.is_wildcard()));
}

/// Proof: truncation clears every part after the chosen position
#[kani::proof]
#[kani::unwind(8)]
fn proof_truncation_clears_deeper_parts() {
    let leaf = arbitrary_leaf();
    let idx: usize = kani::any();
    let position = Position::ALL[idx % Position::ALL.len()];
    let truncated = leaf.truncated_after(position);
    for p in Position::ALL {
        if p > position {
            assert!(truncated.part(p).is_absent());
        } else {
            assert_eq!(truncated.part(p), leaf.part(p));
        }
    }
}
