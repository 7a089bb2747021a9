use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use argus_audit::{
    generate_report, verify_chain, AuditBundle, ChainVerification, ComplianceReport, Event,
    EventChain, EventStore, EventType,
};
use argus_core::{
    ActionProposal, ArgusError, Command, Decision, Goal, GovernanceDecision, Intent, Mission,
    MissionId, MissionStatus, PolicyInfo, PolicyState, Run, RunId, RunStatus, SimWorld,
    StreamMessage, TelemetrySample, Waypoint,
};
use argus_llm::ReasoningClient;
use argus_planner::{
    plan_path, AgenticPlanner, DirectPlanner, HeuristicPlanner, PathNote, Planner, ThoughtStep,
};
use argus_policy::{evaluate, policy_catalog, PolicyConfig};
use argus_sim::Simulator;
use argus_store::{MissionStore, RunQuery, RunStore, TelemetryStore};

use crate::broadcast::{Broadcaster, SubscriberHandle};
use crate::config::{PlannerMode, RuntimeConfig};
use crate::error::{audit_err, sim_err, store_err};
use crate::missions::MissionService;
use crate::registry::RunRegistry;
use crate::replay::RunTimeline;

/// Everything the controller needs to run. Stores and clients arrive as
/// trait objects so the whole runtime can be wired against in-memory
/// backends in tests.
pub struct RuntimeServices {
    pub config: RuntimeConfig,
    pub policy: PolicyConfig,
    pub missions: Arc<dyn MissionStore>,
    pub runs: Arc<dyn RunStore>,
    pub telemetry: Arc<dyn TelemetryStore>,
    pub events: Arc<dyn EventStore>,
    pub sim: Arc<dyn Simulator>,
    pub llm: Arc<dyn ReasoningClient>,
}

/// Per-waypoint governance verdict in a pre-approved plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointDecision {
    pub waypoint_index: usize,
    pub decision: Decision,
    pub policy_hits: Vec<String>,
    pub reasons: Vec<String>,
    pub policy_state: PolicyState,
}

/// A generated plan together with its per-waypoint governance report.
///
/// This surface only reports; it executes nothing. A waypoint that is not
/// `APPROVED` shows up in `governance` and clears `all_approved`, and it
/// is the caller's decision whether to proceed. The in-loop controller is
/// stricter: there, anything but `APPROVED` does not execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanGovernance {
    pub waypoints: Vec<Waypoint>,
    pub rationale: String,
    pub estimated_time_s: f64,
    pub governance: Vec<WaypointDecision>,
    pub all_approved: bool,
}

/// Owns every run's lifecycle and loop task.
///
/// The controller is the sole mutator of a run's state machine and the
/// only writer to its event chain. Each run gets one loop task; runs are
/// independent except for the shared simulator and broadcaster.
pub struct RunController {
    inner: Arc<Inner>,
}

/// Clearance used when previewing paths around obstacles.
const PATH_PREVIEW_CLEARANCE_M: f64 = 0.75;

struct Inner {
    config: RuntimeConfig,
    policy: PolicyConfig,
    missions: Arc<dyn MissionStore>,
    mission_service: MissionService,
    runs: Arc<dyn RunStore>,
    telemetry: Arc<dyn TelemetryStore>,
    chain: EventChain,
    sim: Arc<dyn Simulator>,
    llm: Arc<dyn ReasoningClient>,
    planner: Arc<dyn Planner>,
    direct: DirectPlanner,
    broadcaster: Broadcaster,
    registry: RunRegistry,
    tracker: TaskTracker,
}

impl RunController {
    /// Wire up a controller. The in-loop planner follows
    /// `config.planner_mode`; the direct planner is always constructed for
    /// plan seeding and the pre-approved-plan surface.
    #[must_use]
    pub fn new(services: RuntimeServices) -> Self {
        let RuntimeServices {
            config,
            policy,
            missions,
            runs,
            telemetry,
            events,
            sim,
            llm,
        } = services;

        let planner: Arc<dyn Planner> = match config.planner_mode {
            PlannerMode::Heuristic => Arc::new(HeuristicPlanner::new()),
            PlannerMode::Direct => {
                Arc::new(DirectPlanner::new(Arc::clone(&llm), policy.clone()))
            }
            PlannerMode::Agentic => {
                Arc::new(AgenticPlanner::new(Arc::clone(&llm), policy.clone()))
            }
        };

        let inner = Inner {
            mission_service: MissionService::new(Arc::clone(&missions), Arc::clone(&sim)),
            direct: DirectPlanner::new(Arc::clone(&llm), policy.clone()),
            llm,
            broadcaster: Broadcaster::new(config.subscriber_capacity),
            registry: RunRegistry::new(),
            tracker: TaskTracker::new(),
            chain: EventChain::new(events),
            config,
            policy,
            missions,
            runs,
            telemetry,
            sim,
            planner,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// The mission control-plane surface.
    #[must_use]
    pub fn missions(&self) -> &MissionService {
        &self.inner.mission_service
    }

    /// Start a run for a mission: create the run, mark the mission
    /// executing, seed the initial plan, and spawn the loop task.
    pub async fn start_run(&self, mission_id: &MissionId) -> Result<Run, ArgusError> {
        let mission = self.inner.mission_service.get(mission_id).await?;
        if mission.status == MissionStatus::Deleted {
            return Err(ArgusError::Precondition(format!(
                "mission {mission_id} is deleted"
            )));
        }

        let run = Run::start(mission_id.clone());
        self.inner
            .runs
            .insert(run.clone())
            .await
            .map_err(store_err)?;
        self.inner
            .mission_service
            .set_status(
                mission_id,
                MissionStatus::Executing,
                Some(format!("Run {} started", run.id)),
                "system",
            )
            .await?;

        self.inner.seed_initial_plan(&run, &mission).await?;
        Inner::spawn_loop(&self.inner, run.id.clone());
        info!(run_id = %run.id, mission_id = %mission_id, "run started");
        Ok(run)
    }

    /// Signal a run's loop to stop and transition the run to `stopped`.
    pub async fn stop_run(&self, run_id: &RunId) -> Result<(), ArgusError> {
        let run = self.get_run_record(run_id).await?;
        self.inner.registry.cancel(run_id);

        if run.status == RunStatus::Running {
            self.inner
                .runs
                .set_status(run_id, RunStatus::Stopped, Some(Utc::now()))
                .await
                .map_err(store_err)?;
            self.inner
                .mission_service
                .set_status(
                    &run.mission_id,
                    MissionStatus::Paused,
                    Some(format!("Run {run_id} stopped by operator")),
                    "operator",
                )
                .await?;
            self.inner
                .broadcaster
                .broadcast(run_id, &StreamMessage::status("stopped"));
        }
        Ok(())
    }

    /// Fetch a run, reviving its loop task if the process restarted.
    pub async fn get_run(&self, run_id: &RunId) -> Result<Run, ArgusError> {
        let run = self.get_run_record(run_id).await?;
        Inner::ensure_running(&self.inner, &run).await;
        Ok(run)
    }

    /// List runs, most recent first.
    pub async fn list_runs(&self, query: &RunQuery) -> Result<Vec<Run>, ArgusError> {
        self.inner.runs.list(query).await.map_err(store_err)
    }

    /// Delete a terminal run and cascade to its events and telemetry.
    pub async fn delete_run(&self, run_id: &RunId) -> Result<(), ArgusError> {
        let run = self.get_run_record(run_id).await?;
        if run.status == RunStatus::Running {
            return Err(ArgusError::Precondition(format!(
                "run {run_id} is running; stop it before deleting"
            )));
        }
        self.inner.runs.delete(run_id).await.map_err(store_err)?;
        self.inner
            .chain
            .delete_run(run_id)
            .await
            .map_err(audit_err)?;
        self.inner
            .telemetry
            .delete_run(run_id)
            .await
            .map_err(store_err)?;
        self.inner.registry.remove(run_id);
        Ok(())
    }

    /// A run's event chain, ordered by `ts` ascending.
    pub async fn events(
        &self,
        run_id: &RunId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Event>, ArgusError> {
        self.get_run_record(run_id).await?;
        self.inner
            .chain
            .list(run_id, limit, offset)
            .await
            .map_err(audit_err)
    }

    /// A run's raw telemetry samples, ordered by `ts` ascending.
    pub async fn telemetry_samples(
        &self,
        run_id: &RunId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TelemetrySample>, ArgusError> {
        self.get_run_record(run_id).await?;
        self.inner
            .telemetry
            .list(run_id, limit, offset)
            .await
            .map_err(store_err)
    }

    /// Reconstruct the full timeline of a run for audit replay.
    pub async fn timeline(
        &self,
        run_id: &RunId,
        include_telemetry: bool,
    ) -> Result<RunTimeline, ArgusError> {
        let run = self.get_run_record(run_id).await?;
        let events = self
            .inner
            .chain
            .full_chain(run_id)
            .await
            .map_err(audit_err)?;
        let telemetry = if include_telemetry {
            Some(
                self.inner
                    .telemetry
                    .list(run_id, usize::MAX, 0)
                    .await
                    .map_err(store_err)?,
            )
        } else {
            None
        };
        Ok(RunTimeline::build(&run, events, telemetry))
    }

    /// Export a self-contained audit bundle for regulatory submission.
    pub async fn export_bundle(&self, run_id: &RunId) -> Result<AuditBundle, ArgusError> {
        let run = self.get_run_record(run_id).await?;
        let events = self
            .inner
            .chain
            .full_chain(run_id)
            .await
            .map_err(audit_err)?;
        let telemetry = self
            .inner
            .telemetry
            .list(run_id, usize::MAX, 0)
            .await
            .map_err(store_err)?;
        Ok(AuditBundle::build(&run, events, Some(telemetry)))
    }

    /// Generate a compliance report over a run's decision history.
    pub async fn compliance_report(&self, run_id: &RunId) -> Result<ComplianceReport, ArgusError> {
        self.get_run_record(run_id).await?;
        let events = self
            .inner
            .chain
            .full_chain(run_id)
            .await
            .map_err(audit_err)?;
        Ok(generate_report(run_id, &events))
    }

    /// Subscribe to a run's real-time frames, reviving the loop if needed.
    pub async fn subscribe(
        &self,
        run_id: &RunId,
    ) -> Result<
        (
            SubscriberHandle,
            tokio::sync::mpsc::Receiver<StreamMessage>,
        ),
        ArgusError,
    > {
        let run = self.get_run_record(run_id).await?;
        Inner::ensure_running(&self.inner, &run).await;
        Ok(self.inner.broadcaster.subscribe(run_id))
    }

    /// Drop a subscription.
    pub fn unsubscribe(&self, handle: &SubscriberHandle) {
        self.inner.broadcaster.unsubscribe(handle);
    }

    /// Relaunch loop tasks for every run persisted as `running`. Called
    /// once at process start; idempotent.
    pub async fn resume_all(&self) -> Result<usize, ArgusError> {
        let query = RunQuery {
            status: Some(RunStatus::Running),
            limit: 200,
            ..RunQuery::default()
        };
        let runs = self.inner.runs.list(&query).await.map_err(store_err)?;
        let mut resumed = 0;
        for run in runs {
            if !self.inner.registry.is_live(&run.id) {
                Inner::ensure_running(&self.inner, &run).await;
                resumed += 1;
            }
        }
        Ok(resumed)
    }

    /// The policy catalog the evaluator enforces.
    #[must_use]
    pub fn policies(&self) -> Vec<PolicyInfo> {
        policy_catalog()
    }

    /// Walk a run's chain of trust and report on its integrity.
    pub async fn verify_run_chain(
        &self,
        run_id: &RunId,
    ) -> Result<ChainVerification, ArgusError> {
        self.get_run_record(run_id).await?;
        let events = self
            .inner
            .chain
            .full_chain(run_id)
            .await
            .map_err(audit_err)?;
        Ok(verify_chain(&events))
    }

    /// The in-loop planner's memory state, if it keeps any. `None` for
    /// memoryless planners.
    pub async fn agent_memory(&self) -> Option<Value> {
        self.inner.planner.memory_summary().await
    }

    /// Preview a path from the robot's current position to a goal: a
    /// straight line, or one detour waypoint around the first blocking
    /// obstacle.
    pub async fn path_preview(
        &self,
        goal: &Goal,
    ) -> Result<(Vec<(f64, f64)>, PathNote), ArgusError> {
        let telemetry = self.inner.sim.get_telemetry().await.map_err(sim_err)?;
        let world = self.inner.sim.get_world().await.map_err(sim_err)?;
        Ok(plan_path(
            (telemetry.x, telemetry.y),
            (goal.x(), goal.y()),
            &world.obstacles,
            PATH_PREVIEW_CLEARANCE_M,
        ))
    }

    /// Generate a waypoint plan and validate every waypoint against the
    /// policy set, without executing anything.
    ///
    /// Unlike the in-loop planners this surface does not degrade silently:
    /// an unconfigured reasoning service is the caller's problem to fix.
    pub async fn plan_with_governance(
        &self,
        instruction: &str,
        goal: Option<&Goal>,
    ) -> Result<PlanGovernance, ArgusError> {
        if !self.inner.llm.is_available() {
            return Err(ArgusError::Reasoning(
                "reasoning service is not configured".to_owned(),
            ));
        }
        let telemetry = self.inner.sim.get_telemetry().await.map_err(sim_err)?;
        let plan = self
            .inner
            .direct
            .generate_plan(&telemetry, instruction, goal)
            .await;

        let mut governance = Vec::with_capacity(plan.waypoints.len());
        let mut all_approved = true;
        for (index, wp) in plan.waypoints.iter().enumerate() {
            let proposal = ActionProposal::move_to(
                wp.x,
                wp.y,
                wp.max_speed,
                format!("Waypoint {} of generated plan", index + 1),
            );
            let decision = evaluate(&self.inner.policy, &telemetry, &proposal);
            if decision.decision != Decision::Approved {
                all_approved = false;
            }
            governance.push(WaypointDecision {
                waypoint_index: index,
                decision: decision.decision,
                policy_hits: decision.policy_hits,
                reasons: decision.reasons,
                policy_state: decision.policy_state,
            });
        }

        Ok(PlanGovernance {
            waypoints: plan.waypoints,
            rationale: plan.rationale,
            estimated_time_s: plan.estimated_time_s,
            governance,
            all_approved,
        })
    }

    /// Graceful shutdown: signal every live run, then wait (bounded) for
    /// loop tasks to drain.
    pub async fn shutdown(&self) {
        info!("runtime shutting down");
        self.inner.registry.cancel_all();
        self.inner.tracker.close();
        if tokio::time::timeout(self.inner.config.shutdown_grace, self.inner.tracker.wait())
            .await
            .is_err()
        {
            warn!("shutdown grace period elapsed with loop tasks still live");
        }
    }

    async fn get_run_record(&self, run_id: &RunId) -> Result<Run, ArgusError> {
        self.inner
            .runs
            .get(run_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| ArgusError::NotFound(format!("run {run_id}")))
    }
}

impl Inner {
    fn spawn_loop(inner: &Arc<Inner>, run_id: RunId) {
        let cancel = inner.registry.register(&run_id);
        let task_inner = Arc::clone(inner);
        inner.tracker.spawn(async move {
            run_loop(task_inner, run_id, cancel).await;
        });
    }

    /// Revive the loop task for a persisted-running run, rehydrating the
    /// plan queue from the latest PLAN event. Idempotent.
    async fn ensure_running(inner: &Arc<Inner>, run: &Run) {
        if run.status != RunStatus::Running || inner.registry.is_live(&run.id) {
            return;
        }
        if inner.config.seed_plan_queue && inner.config.planner_mode != PlannerMode::Agentic {
            match inner.latest_plan_waypoints(&run.id).await {
                Ok(Some(waypoints)) => {
                    debug!(run_id = %run.id, count = waypoints.len(), "plan queue rehydrated");
                    inner.registry.seed_plan(&run.id, waypoints);
                }
                Ok(None) => {}
                Err(e) => warn!(run_id = %run.id, error = %e, "plan rehydration failed"),
            }
        }
        info!(run_id = %run.id, "resuming run loop");
        Self::spawn_loop(inner, run.id.clone());
    }

    /// Waypoints of the latest PLAN event, if any.
    async fn latest_plan_waypoints(
        &self,
        run_id: &RunId,
    ) -> Result<Option<Vec<Waypoint>>, ArgusError> {
        let events = self.chain.full_chain(run_id).await.map_err(audit_err)?;
        let latest_plan = events
            .iter()
            .rev()
            .find(|e| e.event_type == EventType::Plan);
        Ok(latest_plan.and_then(|event| {
            event
                .payload
                .get("waypoints")
                .cloned()
                .and_then(|wps| serde_json::from_value::<Vec<Waypoint>>(wps).ok())
        }))
    }

    /// One direct plan call at run start, so the audit log opens with the
    /// initial strategy.
    async fn seed_initial_plan(&self, run: &Run, mission: &Mission) -> Result<(), ArgusError> {
        let telemetry = match self.sim.get_telemetry().await {
            Ok(t) => t,
            Err(e) => {
                // The loop will retry; starting without a seeded plan is fine.
                warn!(run_id = %run.id, error = %e, "plan seeding skipped, simulator unavailable");
                return Ok(());
            }
        };

        let instruction = format!(
            "Mission '{}': reach the goal position ({}, {}).",
            mission.title,
            mission.goal.x(),
            mission.goal.y()
        );
        let plan = self
            .direct
            .generate_plan(&telemetry, &instruction, Some(&mission.goal))
            .await;
        if plan.waypoints.is_empty() {
            return Ok(());
        }

        self.chain
            .append(
                &run.id,
                EventType::Plan,
                json!({
                    "waypoints": &plan.waypoints,
                    "rationale": &plan.rationale,
                    "estimated_time_s": plan.estimated_time_s,
                }),
            )
            .await
            .map_err(audit_err)?;

        if self.config.seed_plan_queue && self.config.planner_mode != PlannerMode::Agentic {
            self.registry.seed_plan(&run.id, plan.waypoints);
        }
        Ok(())
    }

    /// Mark the run and its mission completed and broadcast the terminal
    /// status.
    async fn complete_run(&self, run_id: &RunId, mission_id: &MissionId) -> Result<(), ArgusError> {
        self.runs
            .set_status(run_id, RunStatus::Completed, Some(Utc::now()))
            .await
            .map_err(store_err)?;
        self.mission_service
            .set_status(
                mission_id,
                MissionStatus::Completed,
                Some(format!("Run {run_id} completed")),
                "system",
            )
            .await?;
        self.broadcaster
            .broadcast(run_id, &StreamMessage::status("completed"));
        info!(run_id = %run_id, "run completed");
        Ok(())
    }

    /// Mark the run failed, best-effort mark the mission failed, and
    /// broadcast the terminal status once.
    async fn fail_run(&self, run_id: &RunId, error: &ArgusError) {
        error!(run_id = %run_id, error = %error, "run failed");
        if let Err(e) = self
            .runs
            .set_status(run_id, RunStatus::Failed, Some(Utc::now()))
            .await
        {
            error!(run_id = %run_id, error = %e, "failed to persist run failure");
        }
        if let Ok(Some(run)) = self.runs.get(run_id).await {
            if let Err(e) = self
                .mission_service
                .set_status(
                    &run.mission_id,
                    MissionStatus::Failed,
                    Some(format!("Run {run_id} failed: {error}")),
                    "system",
                )
                .await
            {
                warn!(run_id = %run_id, error = %e, "failed to persist mission failure");
            }
        }
        self.broadcaster
            .broadcast(run_id, &StreamMessage::status("failed"));
    }
}

/// Outcome of a single tick, driving the loop's control flow.
enum Tick {
    /// Sleep, then run the next tick.
    Continue,
    /// The run reached a terminal state; exit cleanly.
    Exit,
}

/// The per-run loop task. Single writer for the run's state machine and
/// event chain; every await point doubles as a cancellation check because
/// the stop signal is sampled at the top of each tick and during the
/// inter-tick sleep.
async fn run_loop(inner: Arc<Inner>, run_id: RunId, cancel: CancellationToken) {
    info!(run_id = %run_id, "run loop started");

    // The world is static; fetch it once, best-effort, for planner context.
    let world = inner.sim.get_world().await.ok();

    let mut consecutive_sim_failures: u32 = 0;
    let mut last_governance: Option<GovernanceDecision> = None;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let tick = run_tick(
            &inner,
            &run_id,
            world.as_ref(),
            &mut consecutive_sim_failures,
            &mut last_governance,
        )
        .await;

        match tick {
            Ok(Tick::Continue) => {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(inner.config.tick_interval) => {}
                }
            }
            Ok(Tick::Exit) => break,
            Err(e) => {
                inner.fail_run(&run_id, &e).await;
                break;
            }
        }
    }

    inner.registry.remove(&run_id);
    info!(run_id = %run_id, "run loop ended");
}

/// One loop tick: sample, plan, govern, execute, audit, broadcast.
async fn run_tick(
    inner: &Arc<Inner>,
    run_id: &RunId,
    world: Option<&SimWorld>,
    consecutive_sim_failures: &mut u32,
    last_governance: &mut Option<GovernanceDecision>,
) -> Result<Tick, ArgusError> {
    // Idempotent shutdown: someone else may have finished the run.
    let run = match inner.runs.get(run_id).await.map_err(store_err)? {
        Some(run) if run.status == RunStatus::Running => run,
        _ => return Ok(Tick::Exit),
    };
    let mission = inner
        .missions
        .get(&run.mission_id)
        .await
        .map_err(store_err)?;
    let goal = mission
        .as_ref()
        .map_or_else(|| Goal::at(0.0, 0.0), |m| m.goal.clone());
    let task = mission.as_ref().map_or_else(
        || "Reach the mission goal.".to_owned(),
        |m| {
            format!(
                "Mission '{}': reach the goal position ({}, {}).",
                m.title,
                m.goal.x(),
                m.goal.y()
            )
        },
    );

    // Telemetry. A failed read aborts the tick; repeated failures fail the
    // run.
    let telemetry = match inner.sim.get_telemetry().await {
        Ok(telemetry) => {
            *consecutive_sim_failures = 0;
            telemetry
        }
        Err(e) => {
            *consecutive_sim_failures += 1;
            warn!(
                run_id = %run_id,
                consecutive = consecutive_sim_failures,
                error = %e,
                "telemetry read failed"
            );
            let payload = json!({
                "alert": "simulator_unreachable",
                "error": e.to_string(),
                "consecutive_failures": *consecutive_sim_failures,
            });
            inner
                .chain
                .append(run_id, EventType::Alert, payload.clone())
                .await
                .map_err(audit_err)?;
            inner
                .broadcaster
                .broadcast(run_id, &StreamMessage::alert(payload));
            if *consecutive_sim_failures >= inner.config.sim_failure_threshold {
                return Err(ArgusError::Simulator(format!(
                    "simulator unreachable for {consecutive_sim_failures} consecutive ticks: {e}"
                )));
            }
            return Ok(Tick::Continue);
        }
    };

    // Persist and fan out the sample.
    let telemetry_value = telemetry.to_value();
    inner
        .telemetry
        .add_sample(TelemetrySample {
            run_id: run_id.clone(),
            ts: Utc::now(),
            payload: telemetry_value.clone(),
        })
        .await
        .map_err(store_err)?;
    inner
        .broadcaster
        .broadcast(run_id, &StreamMessage::telemetry(telemetry_value.clone()));

    // Simulator-reported occurrences become ALERT events.
    for name in &telemetry.events {
        let payload = json!({"event": name});
        inner
            .chain
            .append(run_id, EventType::Alert, payload.clone())
            .await
            .map_err(audit_err)?;
        inner
            .broadcaster
            .broadcast(run_id, &StreamMessage::alert(payload));
    }

    // Next proposal: the plan queue head if one exists, otherwise ask the
    // planner.
    let queued = if inner.config.planner_mode == PlannerMode::Agentic {
        None
    } else {
        inner.registry.peek_waypoint(run_id)
    };
    let (mut proposal, thought_chain, from_queue): (ActionProposal, Vec<ThoughtStep>, bool) =
        match queued {
            Some(wp) => (
                wp.into_proposal(format!(
                    "Execute planned waypoint toward ({}, {}).",
                    wp.x, wp.y
                )),
                Vec::new(),
                true,
            ),
            None => {
                let proposed = inner
                    .planner
                    .propose(&telemetry, &goal, &task, last_governance.as_ref(), world)
                    .await;
                (proposed.proposal, proposed.thought_chain, false)
            }
        };

    // Clamp into the legal envelope, then to the zone limit, before the
    // evaluator ever sees the proposal.
    if let Some(target) = proposal.move_target() {
        let zone_limit = inner.policy.zone_speed_limit(&telemetry.zone);
        let clamped = target.max_speed.clamp(0.1, 1.0).min(zone_limit);
        if (clamped - target.max_speed).abs() > f64::EPSILON {
            proposal.set_max_speed(clamped);
        }
    }

    // Govern, and chain the decision regardless of outcome.
    let governance = evaluate(&inner.policy, &telemetry, &proposal);
    let decision_payload = json!({
        "context": {
            "telemetry": telemetry_value,
            "mission_goal": goal.0,
        },
        "proposal": &proposal,
        "governance": &governance,
    });
    inner
        .chain
        .append(run_id, EventType::Decision, decision_payload)
        .await
        .map_err(audit_err)?;

    // Execute only what policy allows. NEEDS_REVIEW blocks execution in
    // the live loop.
    let mut execution: Option<Value> = None;
    let mut was_executed = false;
    if governance.decision.allows_execution() {
        let command = Command::from_proposal(&proposal);
        match inner.sim.send_command(&command).await {
            Ok(result) => {
                was_executed = true;
                inner
                    .chain
                    .append(
                        run_id,
                        EventType::Execution,
                        json!({"command": command.to_value(), "result": result}),
                    )
                    .await
                    .map_err(audit_err)?;
                execution = Some(result);
                if from_queue {
                    inner.registry.pop_waypoint(run_id);
                }
            }
            Err(e) => {
                // The DECISION stands; the tick aborts without EXECUTION.
                *consecutive_sim_failures += 1;
                warn!(run_id = %run_id, error = %e, "command send failed");
                let payload = json!({
                    "alert": "command_failed",
                    "error": e.to_string(),
                    "consecutive_failures": *consecutive_sim_failures,
                });
                inner
                    .chain
                    .append(run_id, EventType::Alert, payload.clone())
                    .await
                    .map_err(audit_err)?;
                inner
                    .broadcaster
                    .broadcast(run_id, &StreamMessage::alert(payload));
                if *consecutive_sim_failures >= inner.config.sim_failure_threshold {
                    return Err(ArgusError::Simulator(format!(
                        "command delivery failed for {consecutive_sim_failures} consecutive ticks: {e}"
                    )));
                }
            }
        }
    }

    // Outcomes feed agent memory whether or not the agent proposed them.
    inner
        .planner
        .record_outcome(&proposal, &governance, was_executed)
        .await;

    // Fan out the decision summary, then the reasoning chain if present.
    inner.broadcaster.broadcast(
        run_id,
        &StreamMessage::event(json!({
            "type": "DECISION",
            "proposal": &proposal,
            "governance": &governance,
            "execution": &execution,
        })),
    );
    if !thought_chain.is_empty() {
        inner.broadcaster.broadcast(
            run_id,
            &StreamMessage::agent_reasoning(json!({"steps": thought_chain})),
        );
    }

    let stop_approved =
        proposal.intent == Intent::Stop && governance.decision == Decision::Approved;
    *last_governance = Some(governance);

    // An approved STOP completes the run.
    if stop_approved {
        inner.complete_run(run_id, &run.mission_id).await?;
        return Ok(Tick::Exit);
    }

    Ok(Tick::Continue)
}
