//! Races between exit and waitpid, and randomized process trees.


use common::{boot, record, run_to_completion, Record};
use proptest::prelude::*;
use tkos_hosted::UserEnv;

#[test]
fn wait_racing_exit_always_sees_status() {
    let kernel = boot();

    kernel.register("/bin/init", |env| {
        for _ in 0..50 {
            let child = env.fork_with(|_env| 7).unwrap();
            let (pid, status) = env.waitpid(child, 0).unwrap();
            assert_eq!(pid, child);
            assert_eq!(status.exit_code(), Some(7));
        }
        0
    });

    run_to_completion(&kernel, "/bin/init", &["init"]);
}

#[test]
fn many_children_waited_in_any_order() {
    let kernel = boot();

    kernel.register("/bin/init", |env| {
        let mut children: Vec<(i32, i32)> = (0..16)
            .map(|code| (env.fork_with(move |_env| code).unwrap(), code))
            .collect();
        children.reverse();
        children.swap(0, 7);
        for (pid, code) in children {
            assert_eq!(env.waitpid(pid, 0).unwrap().1.exit_code(), Some(code));
        }
        0
    });

    run_to_completion(&kernel, "/bin/init", &["init"]);
}

#[test]
fn independent_trees_run_side_by_side() {
    let kernel = boot();

    kernel.register("/bin/tree", |env| {
        let children: Vec<i32> = (0..4)
            .map(|_| {
                env.fork_with(|env| {
                    let grandchild = env.fork_with(|_env| 2).unwrap();
                    env.waitpid(grandchild, 0).unwrap().1.exit_code().unwrap_or(-1) + 1
                })
                .unwrap()
            })
            .collect();
        for child in children {
            assert_eq!(env.waitpid(child, 0).unwrap().1.exit_code(), Some(3));
        }
        0
    });

    for _ in 0..4 {
        kernel.run("/bin/tree", &["tree"]).unwrap();
    }
    kernel.wait_idle();
    assert_eq!(kernel.manager().process_count(), 0);
    assert_eq!(kernel.live_spaces(), 0);
}

/// What one process does: fork children (waiting for some), then exit.
#[derive(Debug, Clone)]
struct Plan {
    code: i32,
    children: Vec<(Plan, bool)>,
}

impl Plan {
    fn waited(&self) -> usize {
        self.children
            .iter()
            .map(|(child, wait)| usize::from(*wait) + child.waited())
            .sum()
    }
}

fn arb_plan() -> impl Strategy<Value = Plan> {
    let leaf = (0..128i32).prop_map(|code| Plan {
        code,
        children: Vec::new(),
    });
    leaf.prop_recursive(3, 16, 4, |inner| {
        (0..128i32, prop::collection::vec((inner, any::<bool>()), 0..4))
            .prop_map(|(code, children)| Plan { code, children })
    })
}

fn run_plan(env: &UserEnv, plan: &Plan, reaped: &Record<(i32, i32)>) -> i32 {
    let mut waits = Vec::new();
    for (child, wait) in &plan.children {
        let child_plan = child.clone();
        let log = reaped.clone();
        let pid = env
            .fork_with(move |env| run_plan(env, &child_plan, &log))
            .unwrap();
        if *wait {
            waits.push((pid, child.code));
        }
    }

    for (pid, code) in waits {
        let (got, status) = env.waitpid(pid, 0).unwrap();
        assert_eq!(got, pid);
        assert_eq!(status.exit_code(), Some(code));
        reaped.lock().unwrap().push((pid, code));
        // A second wait on the same child never succeeds.
        assert!(env.waitpid(pid, 0).is_err());
    }
    plan.code
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn random_trees_reap_exactly_once(plan in arb_plan()) {
        let kernel = boot();
        let reaped = record::<(i32, i32)>();

        let root = plan.clone();
        let log = reaped.clone();
        kernel.register("/bin/plan", move |env| run_plan(env, &root, &log));

        kernel.run("/bin/plan", &["plan"]).unwrap();
        kernel.wait_idle();

        prop_assert_eq!(reaped.lock().unwrap().len(), plan.waited());
        prop_assert_eq!(kernel.manager().process_count(), 0);
        prop_assert_eq!(kernel.live_spaces(), 0);
    }
}
