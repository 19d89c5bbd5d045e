use std::sync::{Arc, Barrier};
use std::thread;

use pretty_assertions::assert_eq;
use reify_types::{ClassRegistry, Descriptor, MethodTypeArgs};
use reify_witness::{ContextId, WitnessChannel};

fn string(env: &ClassRegistry) -> Descriptor {
    Descriptor::class(env.class_id("java.lang.String").unwrap())
}

#[test]
fn constructor_witness_is_consumed_exactly_once() {
    let env = ClassRegistry::with_minimal_jdk();
    let channel = WitnessChannel::new();

    channel.push_constructor_witness(string(&env));
    assert_eq!(channel.take_constructor_witness(), Some(string(&env)));
    for _ in 0..3 {
        assert_eq!(channel.take_constructor_witness(), None);
    }
}

#[test]
fn method_witness_is_only_handed_to_the_tagged_caller() {
    let env = ClassRegistry::with_minimal_jdk();
    let caller_a = env.class_id("java.util.ArrayList").unwrap();
    let caller_b = env.class_id("java.util.HashMap").unwrap();
    let channel = WitnessChannel::new();
    let witness = MethodTypeArgs::new(vec![string(&env)]).unwrap();

    channel.push_method_witness(witness.clone(), caller_a);
    assert_eq!(channel.take_method_witness(Some(caller_b)), None);

    channel.push_method_witness(witness.clone(), caller_a);
    assert_eq!(channel.take_method_witness(Some(caller_a)), Some(witness));
}

#[test]
fn a_later_push_replaces_the_pending_witness() {
    let env = ClassRegistry::with_minimal_jdk();
    let integer = Descriptor::class(env.class_id("java.lang.Integer").unwrap());
    let channel = WitnessChannel::new();

    channel.push_constructor_witness(string(&env));
    channel.push_constructor_witness(integer.clone());
    assert_eq!(channel.take_constructor_witness(), Some(integer));
    assert_eq!(channel.take_constructor_witness(), None);
}

#[test]
fn disabled_channel_behaves_as_if_nothing_was_pushed() {
    let env = ClassRegistry::with_minimal_jdk();
    let channel = WitnessChannel::new();

    channel.disable();
    channel.push_constructor_witness(string(&env));
    assert_eq!(channel.take_constructor_witness(), None);
    channel.enable();
    assert_eq!(channel.take_constructor_witness(), None);

    channel.push_constructor_witness(string(&env));
    {
        let _guard = channel.suppress();
        assert_eq!(channel.take_constructor_witness(), None);
    }
    // The witness pushed before suppression is still waiting for its receiver.
    assert_eq!(channel.take_constructor_witness(), Some(string(&env)));
}

#[test]
fn contexts_never_observe_each_others_witnesses() {
    let env = Arc::new(ClassRegistry::with_minimal_jdk());
    let channel = Arc::new(WitnessChannel::new());
    let barrier = Arc::new(Barrier::new(2));

    let names = ["java.lang.String", "java.lang.Integer"];
    let handles: Vec<_> = names
        .into_iter()
        .map(|name| {
            let env = Arc::clone(&env);
            let channel = Arc::clone(&channel);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let own = Descriptor::class(env.class_id(name).unwrap());
                channel.push_constructor_witness(own.clone());
                // Both threads have pushed before either takes.
                barrier.wait();
                assert_eq!(channel.take_constructor_witness(), Some(own));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn explicit_contexts_are_independent_of_the_current_thread() {
    let env = ClassRegistry::with_minimal_jdk();
    let channel = WitnessChannel::new();
    let task = ContextId::fresh();
    assert_ne!(task, ContextId::current());

    channel.push_constructor_witness_in(task, string(&env));
    assert_eq!(channel.take_constructor_witness(), None);
    assert_eq!(channel.take_constructor_witness_in(task), Some(string(&env)));
}

#[test]
fn global_channel_forgets_a_thread_once_it_exits() {
    let handle = thread::spawn(|| {
        let env = ClassRegistry::with_minimal_jdk();
        WitnessChannel::global().push_constructor_witness(string(&env));
        ContextId::current()
    });
    let finished = handle.join().unwrap();

    assert_eq!(
        WitnessChannel::global().take_constructor_witness_in(finished),
        None
    );
}

#[test]
fn overlapping_suppression_from_two_threads_holds_until_both_end() {
    let env = ClassRegistry::with_minimal_jdk();
    let channel = WitnessChannel::new();
    let barrier = Barrier::new(2);

    let outer = channel.suppress();
    thread::scope(|scope| {
        scope.spawn(|| {
            let _inner = channel.suppress();
            barrier.wait();
            // The other thread has dropped its guard by now.
            barrier.wait();
            assert!(!channel.is_enabled());
            channel.push_constructor_witness(string(&env));
            assert_eq!(channel.take_constructor_witness(), None);
        });
        barrier.wait();
        drop(outer);
        barrier.wait();
    });
    assert!(channel.is_enabled());
}

#[test]
fn exited_threads_leave_no_slots_behind() {
    let env = Arc::new(ClassRegistry::with_minimal_jdk());
    let channel = Arc::new(WitnessChannel::new());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let env = Arc::clone(&env);
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                channel.push_constructor_witness(string(&env));
                assert_eq!(channel.take_constructor_witness(), Some(string(&env)));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(channel.context_count(), 0);
}
