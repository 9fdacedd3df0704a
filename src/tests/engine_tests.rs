use crate::engine::Engine;
use crate::error::RemoldError;
use crate::limits::Limits;
use crate::template::{Rule, Template};
use crate::transformer::Transforms;
use serde_json::{json, Value};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_transform_item_resolves_paths_and_sentinel() {
    let engine = Engine::new();
    let template = Template::from_value(json!({
        "name": "user.name",
        "id": "=item",
    }))
    .unwrap();
    let item = json!({"user": {"name": "Bob"}, "id": 42});

    let output = engine.transform_item(&template, None, &item).unwrap();
    assert_eq!(*output, json!({"name": "Bob", "id": {"user": {"name": "Bob"}, "id": 42}}));
}

#[test]
fn test_function_rule_gets_raw_item() {
    let engine = Engine::new();
    let mut template = Template::new();
    template.insert(
        "full",
        Rule::function("full_label", |item| {
            let name = item["user"]["name"].as_str().unwrap_or_default();
            json!(format!("{} {}", name, item["id"]))
        }),
    );
    let item = json!({"user": {"name": "Bob"}, "id": 42});

    let output = engine.transform_item(&template, None, &item).unwrap();
    assert_eq!(*output, json!({"full": "Bob 42"}));
}

#[test]
fn test_merged_sequence_builds_lookup_map() {
    let engine = Engine::new();
    let template = Template::from_value(json!({".id": {"name": ".name"}})).unwrap();
    let items = vec![json!({"id": 1, "name": "a"}), json!({"id": 2, "name": "b"})];

    let merged = engine.transform_merged(&template, None, &items).unwrap();
    assert_eq!(*merged, json!({"1": {"name": "a"}, "2": {"name": "b"}}));
}

#[test]
fn test_merged_later_item_wins() {
    let engine = Engine::new();
    let template = Template::from_value(json!({".id": {"name": ".name"}})).unwrap();
    let items = vec![json!({"id": 1, "name": "a"}), json!({"id": 1, "name": "z"})];

    let merged = engine.transform_merged(&template, None, &items).unwrap();
    assert_eq!(*merged, json!({"1": {"name": "z"}}));
}

#[test]
fn test_merged_empty_sequence_is_empty_object() {
    let engine = Engine::new();
    let template = Template::from_value(json!({"x": 1})).unwrap();
    let merged = engine.transform_merged(&template, None, &[]).unwrap();
    assert_eq!(*merged, json!({}));
}

#[test]
fn test_sequence_preserves_length_and_order() {
    let engine = Engine::new();
    let template = Template::from_value(json!({"n": ".n"})).unwrap();
    let items = vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})];

    let outputs = engine.transform_sequence(&template, None, &items).unwrap();
    assert_eq!(outputs.len(), 3);
    let ns: Vec<&Value> = outputs.iter().map(|o| o.get("n").unwrap()).collect();
    assert_eq!(ns, vec![&json!(1), &json!(2), &json!(3)]);
}

#[test]
fn test_identical_templates_share_one_transformer() {
    let engine = Engine::new();
    let calls = Rc::new(Cell::new(0u32));
    let calls_in_rule = Rc::clone(&calls);

    let mut first = Template::new();
    first.insert(
        "n",
        Rule::function("count_calls", move |_| {
            calls_in_rule.set(calls_in_rule.get() + 1);
            json!(1)
        }),
    );
    // structurally identical, separately built
    let mut second = Template::new();
    second.insert("n", Rule::function("count_calls", |_| json!(99)));

    let item = json!({"id": 1});
    let a = engine.transform_item(&first, None, &item).unwrap();
    let b = engine.transform_item(&second, None, &item).unwrap();

    // the second call is served entirely from cache: same output object,
    // the second closure never runs
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_repeat_items_return_cache_identical_output() {
    let engine = Engine::new();
    let template = Template::from_value(json!({"name": "user.name"})).unwrap();

    let a = engine
        .transform_item(&template, None, &json!({"user": {"name": "Bob"}}))
        .unwrap();
    let b = engine
        .transform_item(&template, None, &json!({"user": {"name": "Bob"}}))
        .unwrap();
    assert!(Rc::ptr_eq(&a, &b));
}

#[test]
fn test_transforms_are_fixed_by_first_compilation() {
    let engine = Engine::new();
    let template = Template::from_value(json!({"name": "user.name"})).unwrap();
    let transforms = Transforms::new().map_keys(|key| key.to_uppercase());

    engine.compile(&template, Some(transforms)).unwrap();
    // recompiling without transforms returns the first transformer
    let output = engine
        .transform_item(&template, None, &json!({"user": {"name": "Bob"}}))
        .unwrap();
    assert_eq!(*output, json!({"NAME": "Bob"}));
}

#[test]
fn test_value_transform_post_processes_outputs() {
    let engine = Engine::new();
    let template = Template::from_value(json!({"n": ".n"})).unwrap();
    let transforms = Transforms::new().map_values(|value| match value.as_i64() {
        Some(n) => json!(n * 10),
        None => value,
    });

    let output = engine
        .transform_item(&template, Some(transforms), &json!({"n": 4}))
        .unwrap();
    assert_eq!(*output, json!({"n": 40}));
}

#[test]
fn test_remove_template_evicts_transformer() {
    let engine = Engine::new();
    let template = Template::from_value(json!({"x": 1})).unwrap();
    engine.compile(&template, None).unwrap();
    assert_eq!(engine.cache_stats().templates, 1);

    assert!(engine.remove_template(&template));
    assert_eq!(engine.cache_stats().templates, 0);
    assert!(!engine.remove_template(&template));
}

#[test]
fn test_clear_drops_every_tier() {
    let engine = Engine::new();
    let template = Template::from_value(json!({"name": "user.name"})).unwrap();
    engine
        .transform_item(&template, None, &json!({"user": {"name": "Bob"}}))
        .unwrap();

    let stats = engine.cache_stats();
    assert_eq!(stats.templates, 1);
    assert!(stats.entries > 0);

    engine.clear();
    let stats = engine.cache_stats();
    assert_eq!(stats.templates, 0);
    assert_eq!(stats.batches, 0);
    assert_eq!(stats.values, 0);
    assert_eq!(stats.entries, 0);
}

#[test]
fn test_engines_share_nothing() {
    let first = Engine::new();
    let second = Engine::new();
    let template = Template::from_value(json!({"x": 1})).unwrap();

    first.compile(&template, None).unwrap();
    assert_eq!(first.cache_stats().templates, 1);
    assert_eq!(second.cache_stats().templates, 0);
}

#[test]
fn test_template_depth_limit() {
    let engine = Engine::with_limits(Limits {
        max_template_depth: 1,
        ..Limits::default()
    });
    let flat = Template::from_value(json!({"x": 1})).unwrap();
    assert!(engine.compile(&flat, None).is_ok());

    let nested = Template::from_value(json!({"x": {"y": 1}})).unwrap();
    let err = engine.compile(&nested, None).unwrap_err();
    assert!(matches!(err, RemoldError::LimitExceeded { .. }));
}

#[test]
fn test_path_segment_limit() {
    let engine = Engine::with_limits(Limits {
        max_path_segments: 2,
        ..Limits::default()
    });
    let template = Template::from_value(json!({"v": "a.b.c"})).unwrap();
    let err = engine.compile(&template, None).unwrap_err();
    assert!(matches!(err, RemoldError::LimitExceeded { .. }));
}

#[test]
fn test_non_object_template_is_rejected() {
    let err = Template::from_value(json!([1, 2])).unwrap_err();
    assert!(err.to_string().contains("invalid template"));
}

#[test]
fn test_function_failure_propagates() {
    let engine = Engine::new();
    let mut template = Template::new();
    template.insert(
        "v",
        Rule::try_function("always_fails", |_| {
            Err(RemoldError::function_rule("always_fails", "nope"))
        }),
    );

    let err = engine.transform_item(&template, None, &json!({})).unwrap_err();
    assert!(err.to_string().contains("always_fails"));
    // nothing was frozen: the item tier stayed empty
    let transformer = engine.compile(&template, None).unwrap();
    assert_eq!(transformer.cached_items(), 0);
}
