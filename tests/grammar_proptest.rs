//! Property-based tests validating the resource parser against its grammar.
//!
//! These tests generate random valid and invalid paths according to the
//! grammar constraints and check parsing, display and matching agree.

use proptest::prelude::*;

use srvdir::{MAX_INSTANCE_LENGTH, MAX_NAME_LENGTH, Part, Position, Resource};

/// Strategies for generating grammar-conformant inputs.
mod strategies {
    use super::*;

    /// Valid first characters of a name (wildcard handled separately)
    const NAME_FIRST: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

    /// Valid trailing characters of a name
    const NAME_REST: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789-";

    /// Generate a valid concrete name (1-20 chars to keep cases readable)
    pub fn name() -> impl Strategy<Value = String> {
        let first = prop::sample::select(NAME_FIRST.to_vec());
        let rest = prop::collection::vec(prop::sample::select(NAME_REST.to_vec()), 0..20);
        (first, rest).prop_map(|(f, r)| {
            let mut s = String::with_capacity(1 + r.len());
            s.push(f as char);
            for c in r {
                s.push(c as char);
            }
            s
        })
    }

    /// Generate a name or a wildcard
    pub fn name_or_wildcard() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => name(),
            1 => Just("*".to_string()),
        ]
    }

    /// Generate a numeric instance (1-5 digits)
    pub fn instance() -> impl Strategy<Value = String> {
        (0u32..100_000).prop_map(|n| n.to_string())
    }

    /// Generate an instance or a wildcard
    pub fn instance_or_wildcard() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => instance(),
            1 => Just("*".to_string()),
        ]
    }

    /// Generate a valid literal path: four structural parts, an optional
    /// instance, an optional service.
    pub fn path() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(name_or_wildcard(), 4..=4),
            prop::option::of(instance_or_wildcard()),
            prop::option::of(name_or_wildcard()),
        )
            .prop_map(|(structural, instance, service)| {
                let mut path = format!("/{}", structural.join("/"));
                if let Some(instance) = instance {
                    path.push('/');
                    path.push_str(&instance);
                }
                if let Some(service) = service {
                    path.push(':');
                    path.push_str(&service);
                }
                path
            })
    }

    /// Generate a fully qualified leaf path
    pub fn leaf() -> impl Strategy<Value = String> {
        (prop::collection::vec(name(), 4..=4), instance(), name()).prop_map(
            |(structural, instance, service)| {
                format!("/{}/{instance}:{service}", structural.join("/"))
            },
        )
    }

    /// Generate a browse prefix of 0-5 segments
    pub fn prefix() -> impl Strategy<Value = String> {
        (prop::collection::vec(name(), 0..=4), prop::option::of(instance())).prop_map(
            |(structural, instance)| {
                let mut segments = structural.clone();
                if structural.len() == 4
                    && let Some(instance) = instance
                {
                    segments.push(instance);
                }
                format!("/{}", segments.join("/"))
            },
        )
    }
}

mod parse_tests {
    use super::strategies::*;
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn valid_paths_parse(p in path()) {
            let result = Resource::parse(&p);
            prop_assert!(result.is_ok(), "Failed to parse path: {}", p);
        }

        #[test]
        fn display_inverts_parse(p in path()) {
            let parsed = Resource::parse(&p).unwrap();
            prop_assert_eq!(parsed.to_string(), p);
        }

        #[test]
        fn leaves_are_fully_qualified(p in leaf()) {
            let parsed = Resource::parse(&p).unwrap();
            prop_assert!(parsed.is_fully_qualified());
            prop_assert!(!parsed.is_any());
        }

        #[test]
        fn wildcard_flag_tracks_star(p in path()) {
            let parsed = Resource::parse(&p).unwrap();
            prop_assert_eq!(parsed.is_any(), p.contains('*'));
        }

        #[test]
        fn names_respect_length_limits(p in path()) {
            let parsed = Resource::parse(&p).unwrap();
            for position in Position::ALL {
                let max = if position == Position::Instance {
                    MAX_INSTANCE_LENGTH
                } else {
                    MAX_NAME_LENGTH
                };
                prop_assert!(parsed.part(position).name().len() <= max);
            }
        }
    }
}

mod rejection_tests {
    use super::strategies::*;
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn uppercase_component_rejected(p in leaf(), idx in 1usize..4) {
            let mut segments: Vec<String> = p.split('/').map(str::to_string).collect();
            segments[idx] = segments[idx].to_uppercase();
            let mutated = segments.join("/");
            prop_assert!(Resource::parse(&mutated).is_err(), "Accepted: {}", mutated);
        }

        #[test]
        fn extra_segment_rejected(p in leaf(), extra in name()) {
            let (path, service) = p.split_once(':').unwrap();
            let mutated = format!("{path}/{extra}:{service}");
            prop_assert!(Resource::parse(&mutated).is_err(), "Accepted: {}", mutated);
        }

        #[test]
        fn double_service_rejected(p in leaf(), extra in name()) {
            let mutated = format!("{p}:{extra}");
            prop_assert!(Resource::parse(&mutated).is_err(), "Accepted: {}", mutated);
        }

        #[test]
        fn overlong_name_rejected(p in leaf()) {
            let mutated = format!("/{}{}", "a".repeat(MAX_NAME_LENGTH + 1), &p[p.find('/').unwrap() + 1..]);
            prop_assert!(Resource::parse(&mutated).is_err(), "Accepted: {}", mutated);
        }
    }
}

mod match_tests {
    use super::strategies::*;
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn leaf_matches_itself(p in leaf()) {
            let parsed = Resource::parse(&p).unwrap();
            prop_assert!(parsed.matches(&parsed));
        }

        #[test]
        fn wildcarding_any_part_still_matches(p in leaf(), idx in 0usize..6) {
            let leaf = Resource::parse(&p).unwrap();
            let query = leaf.clone().with_part(Position::ALL[idx], Part::Wildcard);
            prop_assert!(query.matches(&leaf));
            prop_assert!(!leaf.matches(&query));
        }

        #[test]
        fn renewal_key_matches_every_instance(p in leaf(), slot in 0u32..100) {
            let leaf = Resource::parse(&p).unwrap();
            let key = leaf.without_instance();
            prop_assert!(key.matches(&leaf.with_instance(slot)));
        }

        #[test]
        fn differing_name_does_not_match(a in leaf(), b in leaf()) {
            let a = Resource::parse(&a).unwrap();
            let b = Resource::parse(&b).unwrap();
            prop_assert_eq!(a.matches(&b), a == b);
        }
    }
}

mod partial_tests {
    use super::strategies::*;
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn prefixes_round_trip(p in prefix()) {
            let parsed = Resource::parse_partial(&p).unwrap();
            let expected = if p == "/" { String::new() } else { p.clone() };
            prop_assert_eq!(parsed.to_string(), expected);
        }

        #[test]
        fn prefixes_are_never_fully_qualified(p in prefix()) {
            let parsed = Resource::parse_partial(&p).unwrap();
            prop_assert!(!parsed.is_fully_qualified());
            prop_assert!(parsed.first_absent().is_some());
        }
    }
}
