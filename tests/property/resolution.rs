//! Property-based tests for nearest-ancestor resolution

use proptest::prelude::*;
use scoped_context::{Context, ContextKey, Host, Scope};

const DEFAULT: usize = usize::MAX;

/// Builds a chain of `len` nested scopes below `host`.
fn chain(host: &Host, len: usize) -> Vec<Scope> {
    let mut scopes: Vec<Scope> = Vec::with_capacity(len);
    for depth in 0..len {
        let scope = match scopes.last() {
            Some(parent) => parent.child(format!("Level{}", depth)),
            None => host.mount("Level0"),
        };
        scopes.push(scope);
    }
    scopes
}

/// A reader below the chain sees the deepest writer, or the default.
#[test]
fn test_reader_sees_deepest_writer() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(any::<bool>(), 1..16), |writers| {
            let context = Context::new(ContextKey::unique("level"), Some(DEFAULT));
            let host = Host::new();
            let scopes = chain(&host, writers.len());
            for (depth, writes) in writers.iter().enumerate() {
                if *writes {
                    scopes[depth].enter(|| context.write(depth));
                }
            }

            let leaf = scopes[writers.len() - 1].child("Reader");
            let expected = writers.iter().rposition(|w| *w).unwrap_or(DEFAULT);
            prop_assert_eq!(leaf.enter(|| context.read()), Ok(expected));
            Ok(())
        })
        .unwrap();
}

/// A branch forked from the chain at `fork` sees writers at or above the fork,
/// never the ones further down the sibling chain.
#[test]
fn test_sibling_branch_isolation() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec(any::<bool>(), 1..16), any::<prop::sample::Index>()),
            |(writers, fork)| {
                let context = Context::nullable(ContextKey::unique("level"), None::<usize>);
                let host = Host::new();
                let scopes = chain(&host, writers.len());
                for (depth, writes) in writers.iter().enumerate() {
                    if *writes {
                        context.write_in(&scopes[depth], Some(depth));
                    }
                }

                let fork = fork.index(writers.len());
                let branch = scopes[fork].child("Branch");
                let expected = writers[..=fork].iter().rposition(|w| *w);
                prop_assert_eq!(context.read_in(&branch), expected);
                Ok(())
            },
        )
        .unwrap();
}
