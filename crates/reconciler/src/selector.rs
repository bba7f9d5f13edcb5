//! Phase selection.

use caldera_claim::{Action, ClaimResource};

use crate::phase::PhaseKind;

/// Compute the ordered phase list for one pass over a claim snapshot.
///
/// `Ready` always runs first. At most one further phase is appended, first
/// match wins: a pending `Approve`/`Reject` decision routes to the approval
/// phase, then an explicit `Plan` or `Apply` command, and only a claim with
/// no pending command at all falls through to teardown when
/// `spec.destroy` is set.
///
/// The list is computed once from the snapshot handed in; phases mutating
/// the claim mid-pass influence the next pass, never this one.
pub fn select_phases(claim: &ClaimResource) -> Vec<PhaseKind> {
    let mut phases = vec![PhaseKind::Ready];

    match claim.status.action {
        Some(Action::Approve | Action::Reject) => phases.push(PhaseKind::Approve),
        Some(Action::Plan) => phases.push(PhaseKind::Plan),
        Some(Action::Apply) => phases.push(PhaseKind::Apply),
        None if claim.spec.destroy => phases.push(PhaseKind::Destroy),
        None => {}
    }

    phases
}

#[cfg(test)]
mod tests {
    use caldera_claim::{ClaimKey, ClaimSpec};

    use super::*;

    fn claim_with(action: Option<Action>, destroy: bool) -> ClaimResource {
        let mut claim = ClaimResource::new(
            ClaimKey::new("infra", "network-prod"),
            ClaimSpec::new("git://modules/network").with_destroy(destroy),
        );
        claim.status.action = action;
        claim
    }

    #[test]
    fn test_idle_claim_gets_ready_only() {
        let phases = select_phases(&claim_with(None, false));
        assert_eq!(phases, vec![PhaseKind::Ready]);
    }

    #[test]
    fn test_approve_and_reject_route_to_approval() {
        let phases = select_phases(&claim_with(Some(Action::Approve), false));
        assert_eq!(phases, vec![PhaseKind::Ready, PhaseKind::Approve]);

        let phases = select_phases(&claim_with(Some(Action::Reject), false));
        assert_eq!(phases, vec![PhaseKind::Ready, PhaseKind::Approve]);
    }

    #[test]
    fn test_plan_and_apply_commands() {
        let phases = select_phases(&claim_with(Some(Action::Plan), false));
        assert_eq!(phases, vec![PhaseKind::Ready, PhaseKind::Plan]);

        let phases = select_phases(&claim_with(Some(Action::Apply), false));
        assert_eq!(phases, vec![PhaseKind::Ready, PhaseKind::Apply]);
    }

    #[test]
    fn test_pending_action_outranks_destroy() {
        let phases = select_phases(&claim_with(Some(Action::Apply), true));
        assert_eq!(phases, vec![PhaseKind::Ready, PhaseKind::Apply]);

        let phases = select_phases(&claim_with(Some(Action::Reject), true));
        assert_eq!(phases, vec![PhaseKind::Ready, PhaseKind::Approve]);
    }

    #[test]
    fn test_destroy_selected_only_when_idle() {
        let phases = select_phases(&claim_with(None, true));
        assert_eq!(phases, vec![PhaseKind::Ready, PhaseKind::Destroy]);
    }

    #[test]
    fn test_never_more_than_two_phases() {
        let actions = [
            None,
            Some(Action::Approve),
            Some(Action::Reject),
            Some(Action::Plan),
            Some(Action::Apply),
        ];
        for action in actions {
            for destroy in [false, true] {
                let phases = select_phases(&claim_with(action, destroy));
                assert!(phases.len() <= 2);
                assert_eq!(phases.first(), Some(&PhaseKind::Ready));
            }
        }
    }
}
