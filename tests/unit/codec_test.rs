//! Property checks for the query state codec

use std::collections::BTreeMap;

use live_query::config::ViewConfig;
use live_query::core::{EntityKind, QueryMutation, QueryState, QueryStateCodec};
use live_query::infra::params::RawParams;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ITERATIONS: usize = 500;
const WORDS: &[&str] = &["alpha", "beta", "run 42", "x", "Flyte", "a&b", "c=d"];
const FIELDS: &[&str] = &["name", "created_at", "phase", "duration"];
const TOKENS: &[&str] = &["running", "queued", "v1", "v2", "lp.daily"];

fn codec() -> QueryStateCodec {
    QueryStateCodec::new(&ViewConfig::for_entity("executions", EntityKind::Execution))
}

fn random_state(rng: &mut StdRng, codec: &QueryStateCodec) -> QueryState {
    let free_text_query = rng
        .random_bool(0.5)
        .then(|| WORDS[rng.random_range(0..WORDS.len())].to_string());
    let sort_field = rng
        .random_bool(0.7)
        .then(|| FIELDS[rng.random_range(0..FIELDS.len())].to_string());

    let mut filters = BTreeMap::new();
    for key in codec.filter_keys() {
        if rng.random_bool(0.4) {
            let count = rng.random_range(1..4);
            let values = (0..count)
                .map(|_| TOKENS[rng.random_range(0..TOKENS.len())].to_string())
                .collect();
            filters.insert(key.clone(), values);
        }
    }

    let sizes = [10, 25, 50, 100];
    codec.normalize(QueryState {
        free_text_query,
        sort_field,
        sort_descending: rng.random_bool(0.5),
        filters,
        page_index: rng.random_range(0..1_000),
        page_size: sizes[rng.random_range(0..sizes.len())],
    })
}

fn random_mutation(rng: &mut StdRng) -> QueryMutation {
    match rng.random_range(0..8) {
        0 => QueryMutation::SetSearch(Some(WORDS[rng.random_range(0..WORDS.len())].to_string())),
        1 => QueryMutation::Sort(FIELDS[rng.random_range(0..FIELDS.len())].to_string()),
        2 => QueryMutation::SetFilter {
            key: "status".to_string(),
            values: vec![TOKENS[rng.random_range(0..TOKENS.len())].to_string()],
        },
        3 => QueryMutation::ClearFilters,
        4 => QueryMutation::SetPage(rng.random_range(0..50)),
        5 => QueryMutation::NextPage,
        6 => QueryMutation::PreviousPage,
        _ => QueryMutation::SetPageSize([10, 25, 50, 100][rng.random_range(0..4)]),
    }
}

#[test]
fn test_decode_of_encode_is_identity() {
    let codec = codec();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..ITERATIONS {
        let state = random_state(&mut rng, &codec);
        let raw = codec.encode(&state, &RawParams::new());
        assert_eq!(codec.decode(&raw), state, "raw: {raw}");

        // Survives the trip through a real query string as well.
        let reparsed = RawParams::parse(&raw.to_query_string());
        assert_eq!(codec.decode(&reparsed), state);
    }
}

#[test]
fn test_defaults_encode_to_nothing() {
    let codec = codec();
    let foreign = RawParams::parse("project=flytesnacks&domain=development");

    let out = codec.encode(&codec.defaults(), &foreign);
    assert_eq!(out, foreign);

    // Any state with a default field drops that key, even if it was present.
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..ITERATIONS {
        let state = random_state(&mut rng, &codec);
        let full = codec.encode(&state, &foreign);
        let mut reset = state.clone();
        reset.page_index = 0;
        let sparse = codec.encode(&reset, &full);
        assert!(!sparse.contains_key("page"));
        assert_eq!(sparse.get("project"), Some("flytesnacks"));
    }
}

#[test]
fn test_direction_never_written_without_field() {
    let codec = codec();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..ITERATIONS {
        let state = random_state(&mut rng, &codec);
        let raw = codec.encode(&state, &RawParams::new());
        if raw.contains_key("descending") {
            assert!(raw.contains_key("sort_by"), "raw: {raw}");
        }
    }
}

#[test]
fn test_sort_twice_restores_direction() {
    let codec = codec();
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..ITERATIONS {
        let state = random_state(&mut rng, &codec);
        let Some(field) = state.sort_field.clone() else {
            continue;
        };
        let once = codec.apply(&state, QueryMutation::Sort(field.clone()));
        let twice = codec.apply(&once, QueryMutation::Sort(field));
        assert_eq!(once.sort_descending, !state.sort_descending);
        assert_eq!(twice.sort_descending, state.sort_descending);
        assert_eq!(twice.page_index, 0);
    }
}

#[test]
fn test_mutations_keep_state_canonical() {
    let codec = codec();
    let mut rng = StdRng::seed_from_u64(13);
    let mut state = codec.defaults();

    for _ in 0..ITERATIONS {
        let mutation = random_mutation(&mut rng);
        let resets = mutation.resets_page();
        state = codec.apply(&state, mutation);
        if resets {
            assert_eq!(state.page_index, 0);
        }
        let raw = codec.encode(&state, &RawParams::new());
        assert_eq!(codec.decode(&raw), state);
    }
}

const RAW_QUERIES: &[&str] = &["alpha", "run 42", "  ", ""];
const RAW_FIELDS: &[&str] = &["name", "created_at", " phase", " ", ""];
const RAW_DIRECTIONS: &[&str] = &["true", "false", "yes", ""];
const RAW_FILTERS: &[&str] = &["running", "running, queued", "running,,queued", " v1", ",", ""];
const RAW_PAGES: &[&str] = &["1", "02", "050", "7", "0", "abc", ""];
const RAW_SIZES: &[&str] = &["25", "050", "10", "0100", "33", "abc"];

fn pick<'a>(rng: &mut StdRng, values: &[&'a str]) -> &'a str {
    values[rng.random_range(0..values.len())]
}

fn random_raw(rng: &mut StdRng, codec: &QueryStateCodec) -> RawParams {
    let mut raw = RawParams::new();
    if rng.random_bool(0.5) {
        raw.insert("tab", "graph");
    }
    if rng.random_bool(0.3) {
        raw.insert("project", "flytesnacks");
    }
    let owned: [(&str, &[&str]); 5] = [
        ("q", RAW_QUERIES),
        ("sort_by", RAW_FIELDS),
        ("descending", RAW_DIRECTIONS),
        ("page", RAW_PAGES),
        ("rows_per_page", RAW_SIZES),
    ];
    for (key, values) in owned {
        if rng.random_bool(0.5) {
            raw.insert(key, pick(rng, values));
        }
    }
    for key in codec.filter_keys() {
        if rng.random_bool(0.4) {
            raw.insert(key.clone(), pick(rng, RAW_FILTERS));
        }
    }
    raw
}

/// What re-encoding `raw` must produce: foreign keys and non-default owned
/// keys with their raw spelling, plus the sort field a pinned direction needs.
fn expected_reencoding(codec: &QueryStateCodec, raw: &RawParams) -> RawParams {
    let state = codec.decode(raw);
    let defaults = codec.defaults();
    let mut expected: RawParams = raw
        .iter()
        .filter(|(k, _)| !codec.owns_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let mut keep = |key: &str| {
        if let Some(value) = raw.get(key) {
            expected.insert(key, value);
        }
    };

    if state.free_text_query.is_some() {
        keep("q");
    }
    for key in state.filters.keys() {
        keep(key.as_str());
    }
    if state.page_index > 0 {
        keep("page");
    }
    if state.page_size != defaults.page_size {
        keep("rows_per_page");
    }

    if let Some(field) = &state.sort_field {
        let default_descending =
            defaults.sort_field.as_ref() == Some(field) && defaults.sort_descending;
        let pinned = state.sort_descending != default_descending;
        if defaults.sort_field.as_ref() != Some(field) || pinned {
            let spelled = raw.get("sort_by").filter(|f| !f.trim().is_empty());
            expected.insert("sort_by", spelled.unwrap_or(field.as_str()));
        }
        if pinned {
            expected.insert("descending", state.sort_descending.to_string());
        }
    }
    expected
}

#[test]
fn test_reencoding_raw_params_drops_only_defaults() {
    let codec = codec();
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..ITERATIONS {
        let raw = random_raw(&mut rng, &codec);
        let state = codec.decode(&raw);
        let out = codec.encode(&state, &raw);
        assert_eq!(out, expected_reencoding(&codec, &raw), "raw: {raw}");
        assert_eq!(codec.decode(&out), state, "raw: {raw}");
    }
}

#[test]
fn test_reencoding_canonical_params_is_identity() {
    let codec = codec();
    let foreign = RawParams::parse("tab=graph&project=flytesnacks");
    let mut rng = StdRng::seed_from_u64(19);
    for _ in 0..ITERATIONS {
        let canonical = codec.encode(&random_state(&mut rng, &codec), &foreign);
        let again = codec.encode(&codec.decode(&canonical), &canonical);
        assert_eq!(again, canonical);
    }
}
