//! End-to-end scenarios for the time-ordered event queue.

use sim_events::{EventQueue, Payload};

#[test]
fn scenario_out_of_order_schedule_pops_chronologically() {
    let mut q = EventQueue::new();
    q.schedule_at(20.0, 0, "c", Payload::new()).unwrap();
    q.schedule_at(10.0, 0, "a", Payload::new()).unwrap();
    q.schedule_at(15.0, 0, "b", Payload::new()).unwrap();

    let mut popped = Vec::new();
    while let Some(event) = q.pop() {
        popped.push((event.time, event.event_type));
    }

    assert_eq!(
        popped,
        vec![(10.0, "a".to_string()), (15.0, "b".to_string()), (20.0, "c".to_string())]
    );
}

#[test]
fn scenario_schedule_cancel_pop_second_cancel_fails() {
    let mut q = EventQueue::new();
    let id = q.schedule_at(5.0, 0, "reminder", Payload::new()).unwrap();

    assert!(q.cancel(id), "first cancel should succeed");

    let event = q.pop().expect("cancelled event is still yielded by pop");
    assert_eq!(event.id, id);
    assert!(event.is_cancelled());

    assert!(!q.cancel(id), "cancelling an already-cancelled event is a no-op");
    assert!(q.is_empty());
}

#[test]
fn schedule_after_is_relative_to_the_given_now() {
    let mut q = EventQueue::new();
    q.schedule_after(100.0, 5.0, 0, "later", Payload::new()).unwrap();
    let event = q.peek().unwrap();
    assert_eq!(event.time, 105.0);
}
