//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Determinism — same identity and edition give byte-identical JSON
//! 2. Sampling — picks are distinct members of the pool, exactly N of them
//! 3. Coverage — every score 0..=100 resolves to a non-empty variant
//! 4. Containment — the teaser is always a prefix of the paid result
//! 5. Idempotence — normalizing a canonical edition is a no-op
//! 6. Sensitivity — changing one identity field changes the seed and the picks

use proptest::prelude::*;
use std::collections::HashSet;

use augury_core::compute::compute;
use augury_core::config::EngineConfig;
use augury_core::demo::demo_definition;
use augury_core::gate::{is_prefix_of, slice, GateConfig};
use augury_core::identity::{Identity, IdentityInput};
use augury_core::normalize::normalize_json;
use augury_core::rng::Generator;
use augury_core::sampler::{pick_without_replacement, plausible_in_range, SampleMode};
use augury_core::seed::Seed;
use augury_core::variant::resolve;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_birth_date() -> impl Strategy<Value = String> {
    (1930..2020i32, 1..=12u32, 1..=28u32).prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

fn arb_identity() -> impl Strategy<Value = IdentityInput> {
    (
        "[a-z]{3,10}",
        arb_birth_date(),
        proptest::option::of("[A-Za-z ]{0,16}"),
        proptest::option::of("[a-z]{2}"),
    )
        .prop_map(|(subject, birth_date, name, locale)| IdentityInput {
            subject,
            birth_date,
            name,
            locale,
        })
}

fn identity(input: &IdentityInput) -> Identity {
    Identity::from_input(input, "en").unwrap()
}

// ── 1. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn compute_is_deterministic(input in arb_identity(), pool in 5..40usize) {
        let def = demo_definition("prop-edition", pool);
        let id = identity(&input);
        let config = EngineConfig::default();
        let a = serde_json::to_string(&compute(&id, &def, &config).unwrap()).unwrap();
        let b = serde_json::to_string(&compute(&id, &def, &config).unwrap()).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Whitespace and case variations of the same person hash the same.
    #[test]
    fn normalized_inputs_share_a_seed(input in arb_identity()) {
        let noisy = IdentityInput {
            subject: format!("  {} ", input.subject.to_uppercase()),
            birth_date: format!(" {} ", input.birth_date),
            name: input.name.as_ref().map(|n| format!("  {}  ", n.to_uppercase())),
            locale: input.locale.clone(),
        };
        prop_assert_eq!(identity(&input).root_seed(), identity(&noisy).root_seed());
    }
}

// ── 2. Sampling ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn picks_are_distinct_pool_members(seed in any::<u32>(), len in 1..80usize, n in 0..10usize) {
        let pool: Vec<usize> = (0..len).map(|i| i * 7).collect();
        let mut rng = Generator::new(Seed(seed));
        match pick_without_replacement(&pool, n, &mut rng, SampleMode::Strict) {
            Ok(picked) => {
                prop_assert!(n <= len);
                prop_assert_eq!(picked.len(), n);
                let unique: HashSet<_> = picked.iter().collect();
                prop_assert_eq!(unique.len(), n);
                prop_assert!(picked.iter().all(|p| pool.contains(p)));
            }
            Err(_) => prop_assert!(n > len),
        }
    }

    #[test]
    fn clamp_mode_never_fails(seed in any::<u32>(), len in 0..12usize, n in 0..20usize) {
        let pool: Vec<usize> = (0..len).collect();
        let mut rng = Generator::new(Seed(seed));
        let picked = pick_without_replacement(&pool, n, &mut rng, SampleMode::Clamp).unwrap();
        prop_assert_eq!(picked.len(), n.min(len));
    }

    #[test]
    fn plausible_numbers_stay_in_range(
        seed in any::<u32>(),
        lo in -1000..1000i64,
        span in 0..5000i64,
    ) {
        let mut rng = Generator::new(Seed(seed));
        let value = plausible_in_range(&mut rng, lo, lo + span);
        prop_assert!((lo..=lo + span).contains(&value));
    }
}

// ── 3. Coverage ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_score_resolves(pool in 5..12usize, score in 0..=100u8) {
        let def = demo_definition("prop-edition", pool);
        for category in &def.categories {
            for task in &category.pool {
                prop_assert!(!resolve(&task.variants, score).is_empty());
            }
        }
    }
}

// ── 4. Containment ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn teaser_is_prefix_of_paid(
        input in arb_identity(),
        teaser_categories in 0..7usize,
        teaser_items in 0..6usize,
    ) {
        let def = demo_definition("prop-edition", 8);
        let full = compute(&identity(&input), &def, &EngineConfig::default()).unwrap();
        let gate = GateConfig { teaser_categories, teaser_items };
        let teaser = slice(&full, false, &gate);
        prop_assert!(is_prefix_of(&teaser, &full));
        prop_assert!(teaser.item_count() <= full.item_count());
        prop_assert_eq!(slice(&full, true, &gate), full);
    }
}

// ── 5. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn normalizing_twice_changes_nothing(
        titles in proptest::collection::vec("[ A-Za-z]{0,12}", 1..8),
        slug in "[ A-Za-z-]{0,10}",
    ) {
        let categories: Vec<_> = (0..5)
            .map(|c| {
                serde_json::json!({
                    "key": format!("k{c}"),
                    "title": titles[c % titles.len()],
                    "tasks": titles,
                })
            })
            .collect();
        let raw = serde_json::json!({
            "slug": slug,
            "title": " Loose edition ",
            "engine": {"subject": "demo", "locale": "EN"},
            "categories": categories,
        });
        let once = normalize_json(&raw.to_string()).unwrap();
        let twice = normalize_json(&serde_json::to_string(&once).unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }
}

// ── 6. Sensitivity ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn changing_one_part_changes_the_seed(
        parts in proptest::collection::vec("[a-z0-9]{1,8}", 1..5),
        index in any::<prop::sample::Index>(),
    ) {
        let i = index.index(parts.len());
        let mut changed = parts.clone();
        changed[i].push('x');
        prop_assert_ne!(Seed::from_parts(&parts), Seed::from_parts(&changed));
    }

    /// Subject, name and locale each steer the picked items on their own.
    #[test]
    fn each_identity_field_changes_the_items(
        input in arb_identity(),
        field in 0..3usize,
        pool in 10..40usize,
    ) {
        let def = demo_definition("prop-edition", pool);
        let config = EngineConfig::default();
        let base = identity(&input);
        let mut changed = input.clone();
        match field {
            0 => changed.subject.push('x'),
            1 => changed.name = Some(format!("{} q", base.display_name)),
            _ => changed.locale = Some(format!("{}x", base.locale)),
        }
        let changed = identity(&changed);
        prop_assert_ne!(base.root_seed(), changed.root_seed());

        let a = compute(&base, &def, &config).unwrap();
        let b = compute(&changed, &def, &config).unwrap();
        prop_assert_ne!(a.categories, b.categories);
    }

    #[test]
    fn derived_streams_are_stable(root in any::<u32>(), key in "[a-z]{1,8}") {
        let a: Vec<u32> = {
            let mut g = Generator::derived(Seed(root), &[key.as_str(), "0"]);
            (0..8).map(|_| rand::RngCore::next_u32(&mut g)).collect()
        };
        let b: Vec<u32> = {
            let mut g = Generator::derived(Seed(root), &[key.as_str(), "0"]);
            (0..8).map(|_| rand::RngCore::next_u32(&mut g)).collect()
        };
        prop_assert_eq!(a, b);
    }
}
