//! Runtime-checked accessors

use super::test_utils::component_tree;
use scoped_context::{
    ContextError, ContextKey, ContextOptions, ContextPolicy, DefaultValue, DynContext, Host,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_all_policy_combinations() {
    let scope = Host::new().mount("Consumer");

    let required_eager = DynContext::new(
        ContextOptions::new(ContextKey::unique("a")).default_value(DefaultValue::Value(1u32)),
    )
    .unwrap();
    assert_eq!(required_eager.read_in(&scope), Ok(Some(1)));

    let required_factory = DynContext::new(
        ContextOptions::new(ContextKey::unique("b"))
            .default_value(DefaultValue::factory(|| Some(2u32)))
            .default_is_factory(true),
    )
    .unwrap();
    assert_eq!(required_factory.read_in(&scope), Ok(Some(2)));

    let nullable_eager = DynContext::new(
        ContextOptions::<u32>::new(ContextKey::unique("c")).nullable_allowed(true),
    )
    .unwrap();
    assert_eq!(nullable_eager.read_in(&scope), Ok(None));

    let nullable_factory = DynContext::new(
        ContextOptions::new(ContextKey::unique("d"))
            .default_value(DefaultValue::factory(|| None::<u32>))
            .policy(ContextPolicy {
                nullable_allowed: true,
                default_is_factory: true,
            }),
    )
    .unwrap();
    assert_eq!(nullable_factory.read_in(&scope), Ok(None));
}

#[test]
fn test_required_factory_yielding_absent_fails() {
    let context = DynContext::new(
        ContextOptions::new("config")
            .default_value(DefaultValue::factory(|| None::<String>))
            .default_is_factory(true),
    )
    .unwrap();
    let scope = Host::new().mount("Consumer");

    assert_eq!(
        context.read_in(&scope),
        Err(ContextError::MissingContextValue {
            key: "config".to_string()
        })
    );
}

#[test]
fn test_factory_default_is_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let context = DynContext::new(
        ContextOptions::new(ContextKey::unique("n"))
            .default_value(DefaultValue::factory(move || {
                Some(counter.fetch_add(1, Ordering::SeqCst))
            }))
            .default_is_factory(true),
    )
    .unwrap();
    let scope = Host::new().mount("Consumer");

    assert_eq!(context.read_in(&scope), Ok(Some(0)));
    assert_eq!(context.read_in(&scope), Ok(Some(1)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_ambient_write_and_read() {
    let context = DynContext::new(
        ContextOptions::<String>::new(ContextKey::unique("user")).nullable_allowed(true),
    )
    .unwrap();
    let tree = component_tree();

    tree.provider
        .enter(|| context.write(Some("alice".to_string())))
        .unwrap();
    tree.middle.enter(|| context.write(None)).unwrap();

    assert_eq!(tree.middle.enter(|| context.read()), Ok(Some("alice".to_string())));
    assert_eq!(tree.consumer.enter(|| context.read()), Ok(None));
}

#[test]
fn test_required_rejects_absent_write() {
    let context = DynContext::new(ContextOptions::<u8>::new(ContextKey::unique("level"))).unwrap();
    let tree = component_tree();

    let result = tree.provider.enter(|| context.write(None));
    assert!(matches!(result, Err(ContextError::ContractViolation { .. })));
    assert_eq!(tree.provider.registration_count(), 0);
}

#[test]
fn test_policy_from_toml() {
    let policy: ContextPolicy = toml::from_str("nullable_allowed = true").unwrap();
    assert_eq!(
        policy,
        ContextPolicy {
            nullable_allowed: true,
            default_is_factory: false,
        }
    );

    let context = DynContext::new(
        ContextOptions::<u8>::new(ContextKey::unique("optional")).policy(policy),
    )
    .unwrap();
    assert_eq!(context.policy(), policy);
    assert_eq!(context.read_in(&Host::new().mount("Consumer")), Ok(None));
}

#[test]
fn test_mismatched_policy_rejected_at_construction() {
    let result = DynContext::new(
        ContextOptions::new(ContextKey::unique("bad"))
            .default_value(DefaultValue::Value(vec![1, 2]))
            .default_is_factory(true),
    );
    assert!(matches!(
        result,
        Err(ContextError::InvalidPolicyUsage { key, .. }) if key == "Symbol(bad)"
    ));
}
