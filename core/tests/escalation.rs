//! Escalation tests: tier ladder, re-routing, the senior ceiling.

use callcenter_core::{
    config::{DispatchPolicy, RosterConfig},
    CallState, DispatchError, Dispatcher, Routing, Tier,
};

fn build_with(
    junior: &[&str],
    mid: &[&str],
    senior: &[&str],
    policy: DispatchPolicy,
) -> Dispatcher {
    let mut roster = RosterConfig::new();
    for (tier, ids) in [(Tier::Junior, junior), (Tier::Mid, mid), (Tier::Senior, senior)] {
        for id in ids {
            roster = roster.with(tier, id, id);
        }
    }
    Dispatcher::new(&roster, policy).expect("build dispatcher")
}

fn build(junior: &[&str], mid: &[&str], senior: &[&str]) -> Dispatcher {
    build_with(junior, mid, senior, DispatchPolicy::default())
}

/// A lone junior escalates. The call becomes Mid and, with no mid or
/// senior staff, lands in the backlog.
#[test]
fn junior_escalation_without_seniors_lands_in_backlog() {
    let mut d = build(&["j1"], &[], &[]);
    let x = d.submit_call(Tier::Junior).unwrap();

    let routing = d.escalate_call("j1").unwrap();
    assert_eq!(routing, Routing::Queued { position: 0 });

    let call = d.call(x).unwrap();
    assert_eq!(call.required_tier(), Tier::Mid);
    assert_eq!(call.state(), CallState::Pending);
    assert_eq!(call.assigned_employee(), None);
    assert_eq!(call.escalations(), 1);
    assert!(d.employee("j1").unwrap().is_free());
    assert_eq!(d.backlog_len(), 1);
    d.check_invariants().unwrap();
}

#[test]
fn escalated_call_is_rerouted_immediately() {
    let mut d = build(&["j1"], &["m1"], &[]);
    let x = d.submit_call(Tier::Junior).unwrap();

    let routing = d.escalate_call("j1").unwrap();
    assert_eq!(routing, Routing::Assigned { employee_id: "m1".into() });
    assert_eq!(d.call(x).unwrap().state(), CallState::Assigned);
    assert_eq!(d.employee("m1").unwrap().current_call(), Some(x));
    d.check_invariants().unwrap();
}

/// A senior cannot escalate. The call stays exactly where it was.
#[test]
fn senior_escalation_is_refused_and_call_is_untouched() {
    let mut d = build(&[], &[], &["s1"]);
    let x = d.submit_call(Tier::Senior).unwrap();
    let before = d.call(x).unwrap().clone();

    let err = d.escalate_call("s1").unwrap_err();
    assert!(
        matches!(err, DispatchError::EscalationNotSupported { ref employee_id, tier: Tier::Senior } if employee_id == "s1"),
        "got {err:?}"
    );

    assert_eq!(d.call(x).unwrap(), &before);
    assert_eq!(d.call(x).unwrap().state(), CallState::Assigned);
    assert_eq!(d.employee("s1").unwrap().current_call(), Some(x));
    assert_eq!(d.backlog_len(), 0);
    d.check_invariants().unwrap();
}

#[test]
fn idle_senior_escalation_is_still_not_supported() {
    let mut d = build(&[], &[], &["s1"]);
    assert!(matches!(
        d.escalate_call("s1"),
        Err(DispatchError::EscalationNotSupported { .. })
    ));
}

#[test]
fn idle_junior_escalation_has_no_active_call() {
    let mut d = build(&["j1"], &[], &[]);
    assert!(matches!(
        d.escalate_call("j1"),
        Err(DispatchError::NoActiveCall { ref employee_id }) if employee_id == "j1"
    ));
    assert!(matches!(
        d.escalate_call("nobody"),
        Err(DispatchError::UnknownEmployee { .. })
    ));
}

/// Each escalation moves the call exactly one step above its handler,
/// and the required tier only ever rises.
#[test]
fn ladder_walk_junior_to_senior() {
    let mut d = build(&["j1"], &["m1"], &["s1"]);
    let x = d.submit_call(Tier::Junior).unwrap();

    let mut tiers = vec![d.call(x).unwrap().required_tier()];
    d.escalate_call("j1").unwrap();
    tiers.push(d.call(x).unwrap().required_tier());
    d.escalate_call("m1").unwrap();
    tiers.push(d.call(x).unwrap().required_tier());

    assert_eq!(tiers, vec![Tier::Junior, Tier::Mid, Tier::Senior]);
    assert_eq!(d.call(x).unwrap().assigned_employee(), Some("s1"));
    assert_eq!(d.call(x).unwrap().escalations(), 2);
    assert!(d.escalate_call("s1").is_err());
}

/// A junior call that overflowed to a mid employee escalates past Mid:
/// the new tier is one step above the employee, not the call.
#[test]
fn escalation_steps_from_handler_tier() {
    let mut d = build(&["j1"], &["m1"], &["s1"]);
    d.submit_call(Tier::Junior).unwrap();
    let overflow = d.submit_call(Tier::Junior).unwrap();
    assert_eq!(d.call(overflow).unwrap().assigned_employee(), Some("m1"));

    let routing = d.escalate_call("m1").unwrap();
    assert_eq!(routing, Routing::Assigned { employee_id: "s1".into() });
    assert_eq!(d.call(overflow).unwrap().required_tier(), Tier::Senior);
}

/// The slot freed by an escalation is not used to drain the backlog
/// under the default policy. The escalated call queues behind older calls.
#[test]
fn escalation_does_not_drain_by_default() {
    let mut d = build(&["j1"], &["m1"], &[]);
    let x = d.submit_call(Tier::Junior).unwrap(); // j1
    d.submit_call(Tier::Junior).unwrap(); // m1
    let z = d.submit_call(Tier::Junior).unwrap(); // queued

    let routing = d.escalate_call("j1").unwrap();
    assert_eq!(routing, Routing::Queued { position: 1 });

    let queued: Vec<_> = d.backlog().map(|c| c.id()).collect();
    assert_eq!(queued, vec![z, x], "Escalated call joins the back of the queue");
    assert!(d.employee("j1").unwrap().is_free());
    d.check_invariants().unwrap();
}

#[test]
fn drain_on_escalation_fills_the_freed_slot() {
    let policy = DispatchPolicy { drain_on_escalation: true };
    let mut d = build_with(&["j1"], &["m1"], &[], policy);
    let x = d.submit_call(Tier::Junior).unwrap(); // j1
    d.submit_call(Tier::Junior).unwrap(); // m1
    let z = d.submit_call(Tier::Junior).unwrap(); // queued

    d.escalate_call("j1").unwrap();

    assert_eq!(d.call(z).unwrap().assigned_employee(), Some("j1"));
    let queued: Vec<_> = d.backlog().map(|c| c.id()).collect();
    assert_eq!(queued, vec![x]);
    d.check_invariants().unwrap();
}
