//! Pod state-transition detection across polls
//!
//! Compares each pod in the current snapshot against the state
//! retained from the previous poll, emits transition alerts, then
//! replaces the retained map with exactly the identities seen in this
//! poll. Identities absent from the snapshot are forgotten, which
//! bounds the map to the live fleet.

use std::collections::HashMap;

use crate::models::{Alert, AlertBundle, PodInstance, PodPhase, Tier};

/// Last observation retained for one pod identity between polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodState {
    pub phase: PodPhase,
    pub restarts: u32,
    pub age: String,
}

impl PodState {
    /// Placeholder written into the store before the first comparison.
    ///
    /// Comparisons on a pod's first sighting run against this seed: a
    /// pod first seen `Running` reports a recovery from `Unknown`, and
    /// one first seen with a nonzero restart count reports a restart
    /// (its seeded prior count is 0).
    fn seed() -> Self {
        Self {
            phase: PodPhase::Unknown,
            restarts: 0,
            age: "0m".to_string(),
        }
    }

    fn observed(pod: &PodInstance) -> Self {
        Self {
            phase: pod.phase.clone(),
            restarts: pod.restarts,
            age: pod.age.clone(),
        }
    }
}

/// Run the transition checks for every pod in the snapshot and commit
/// the new retained state.
///
/// Per pod, in order: recovery transition, restart-count increase,
/// terminal-status check. The checks are independent and may all fire
/// for the same pod in one pass.
pub(crate) fn workload_alerts(
    bundle: &mut AlertBundle,
    retained: &mut HashMap<String, PodState>,
    pods: &[PodInstance],
) {
    let mut seen = HashMap::with_capacity(pods.len());

    for pod in pods {
        let key = pod.identity();
        let prior = retained
            .entry(key.clone())
            .or_insert_with(PodState::seed)
            .clone();

        if prior.phase != PodPhase::Running && pod.phase == PodPhase::Running {
            bundle.push(Tier::Serious, recovered_alert(pod, &prior.phase));
        }

        if pod.restarts > prior.restarts && pod.restarts > 0 {
            bundle.push(
                Tier::Serious,
                restarted_alert(pod, pod.restarts - prior.restarts),
            );
        }

        match pod.phase {
            PodPhase::Failed | PodPhase::Error => {
                bundle.push(Tier::Critical, unhealthy_alert(pod));
            }
            PodPhase::Pending => {
                bundle.push(Tier::Serious, pending_alert(pod));
            }
            _ => {}
        }

        seen.insert(key, PodState::observed(pod));
    }

    // Wholesale replacement: only identities present in this poll survive.
    *retained = seen;
}

fn recovered_alert(pod: &PodInstance, prior: &PodPhase) -> Alert {
    Alert::new(
        format!("Pod recovered: {}", pod.name),
        format!(
            "Namespace: {}, previous status: {}",
            pod.namespace, prior
        ),
        format!(
            "Check what failed before: kubectl describe pod {} -n {}",
            pod.name, pod.namespace
        ),
    )
}

fn restarted_alert(pod: &PodInstance, delta: u32) -> Alert {
    Alert::new(
        format!("Pod restarted: {}", pod.name),
        format!(
            "Namespace: {}, restart count: {} (up {delta})",
            pod.namespace, pod.restarts
        ),
        format!(
            "kubectl logs {} -n {} --previous for the crashed container's output",
            pod.name, pod.namespace
        ),
    )
}

fn unhealthy_alert(pod: &PodInstance) -> Alert {
    Alert::new(
        format!("Pod unhealthy: {}", pod.name),
        format!("Namespace: {}, status: {}", pod.namespace, pod.phase),
        format!("kubectl describe pod {} -n {}", pod.name, pod.namespace),
    )
}

fn pending_alert(pod: &PodInstance) -> Alert {
    Alert::new(
        format!("Pod pending: {}", pod.name),
        format!("Namespace: {}", pod.namespace),
        format!("kubectl describe pod {} -n {}", pod.name, pod.namespace),
    )
}
