//! Properties of target expansion

use invoke_addrs::{Action, InstanceKey, Module, ModuleInstance};
use invoke_kernel::changes::ActionInvocation;
use invoke_kernel::configs::Expr;
use invoke_kernel::expander::Expansion;
use invoke_test_utils::*;
use invoke_value::Value;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn env_with(expansion: Expansion) -> TestEnv {
    let mut env = TestEnv::new();
    env.declare(&Module::root(), notify_decl("notify", Expr::string("hi")));
    env.expand(
        &Action::new(NOTIFY_TYPE, "notify").absolute(&ModuleInstance::root()),
        expansion,
    );
    env
}

fn sorted_addrs(records: &[Arc<ActionInvocation>]) -> Vec<String> {
    let mut addrs: Vec<String> = records.iter().map(|inv| inv.addr().to_string()).collect();
    addrs.sort();
    addrs
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_count_plans_one_record_per_index(n in 0..12usize) {
        let env = env_with(Expansion::Count(n));
        let report = runtime().block_on(
            env.walker().walk(&env.context(), &[target("action.webhook_notify.notify")]),
        );

        prop_assert!(!report.has_errors());
        prop_assert_eq!(report.instances_run, n);
        prop_assert_eq!(report.changes.len(), n);
        prop_assert_eq!(env.client.call_count(), n);
    }

    #[test]
    fn prop_for_each_records_match_keys(
        keys in proptest::collection::btree_set("[a-z]{1,6}", 0..8)
    ) {
        let items: BTreeMap<String, Value> = keys
            .iter()
            .map(|k| (k.clone(), Value::string(k.clone())))
            .collect();
        let env = env_with(Expansion::ForEach(items));
        let report = runtime().block_on(
            env.walker().walk(&env.context(), &[target("action.webhook_notify.notify")]),
        );

        let mut recorded: Vec<InstanceKey> = report
            .changes
            .action_invocations()
            .iter()
            .map(|inv| inv.addr().action.key.clone())
            .collect();
        recorded.sort();
        let expected: Vec<InstanceKey> = keys.into_iter().map(InstanceKey::Str).collect();
        prop_assert_eq!(recorded, expected);
    }

    #[test]
    fn prop_repeated_walks_append_again(n in 1..6usize) {
        let env = env_with(Expansion::Count(n));
        let ctx = env.context();
        let walker = env.walker();
        let rt = runtime();
        let first = rt.block_on(walker.walk(&ctx, &[target("action.webhook_notify.notify")]));
        let first_addrs = sorted_addrs(&ctx.changes().action_invocations()[..]);
        let second = rt.block_on(walker.walk(&ctx, &[target("action.webhook_notify.notify")]));
        let second_addrs = sorted_addrs(&ctx.changes().action_invocations()[n..]);

        prop_assert_eq!(first.instances_run, second.instances_run);
        prop_assert_eq!(ctx.changes().len(), 2 * n);
        prop_assert!(second.diagnostics.is_empty());
        prop_assert_eq!(first_addrs.len(), n);
        prop_assert_eq!(first_addrs, second_addrs);
    }
}
