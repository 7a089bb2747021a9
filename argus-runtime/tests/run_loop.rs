//! End-to-end tests of the governed run loop against in-memory backends
//! and a scripted simulator.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use argus_audit::{verify_chain, EventChain, EventStore, EventType};
use argus_audit_memory::MemoryEventStore;
use argus_core::{
    Goal, Intent, MissionId, MissionStatus, Run, RunStatus, StreamKind, Telemetry,
};
use argus_llm::{ReasoningClient, ScriptedReasoningClient};
use argus_policy::PolicyConfig;
use argus_runtime::{PlannerMode, RunController, RuntimeConfig, RuntimeServices};
use argus_sim::testing::ScriptedSimulator;
use argus_store::{RunStore, TelemetryStore};
use argus_store_memory::{MemoryMissionStore, MemoryRunStore, MemoryTelemetryStore};

struct Harness {
    controller: RunController,
    sim: Arc<ScriptedSimulator>,
    runs: Arc<MemoryRunStore>,
    telemetry: Arc<MemoryTelemetryStore>,
}

fn fast_config(mode: PlannerMode) -> RuntimeConfig {
    RuntimeConfig {
        tick_interval: Duration::from_millis(5),
        sim_failure_threshold: 3,
        planner_mode: mode,
        ..RuntimeConfig::default()
    }
}

fn harness_with(config: RuntimeConfig, llm: Arc<dyn ReasoningClient>) -> Harness {
    let sim = Arc::new(ScriptedSimulator::new());
    let runs = Arc::new(MemoryRunStore::new());
    let telemetry = Arc::new(MemoryTelemetryStore::new());
    let controller = RunController::new(RuntimeServices {
        config,
        policy: PolicyConfig::default(),
        missions: Arc::new(MemoryMissionStore::new()),
        runs: Arc::clone(&runs) as Arc<dyn RunStore>,
        telemetry: Arc::clone(&telemetry) as Arc<dyn TelemetryStore>,
        events: Arc::new(MemoryEventStore::new()),
        sim: Arc::clone(&sim) as _,
        llm,
    });
    Harness {
        controller,
        sim,
        runs,
        telemetry,
    }
}

fn harness() -> Harness {
    harness_with(
        fast_config(PlannerMode::Heuristic),
        Arc::new(ScriptedReasoningClient::unavailable()),
    )
}

fn telemetry_at(x: f64, y: f64) -> Telemetry {
    serde_json::from_value(json!({
        "x": x, "y": y, "theta": 0.0, "speed": 0.0,
        "zone": "aisle", "nearest_obstacle_m": 5.0,
        "human_detected": false, "human_conf": 0.0
    }))
    .unwrap()
}

async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..400 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within deadline");
}

async fn wait_for_status(runs: &Arc<MemoryRunStore>, run: &Run, status: RunStatus) {
    wait_until(|| {
        let runs = Arc::clone(runs);
        let run_id = run.id.clone();
        async move {
            runs.get(&run_id)
                .await
                .unwrap()
                .is_some_and(|r| r.status == status)
        }
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn run_completes_when_goal_reached() {
    let h = harness();
    // Robot already at the goal: the plan queue drains, then the planner
    // proposes STOP, which completes the run.
    h.sim.set_telemetry(telemetry_at(5.0, 5.0));

    let mission = h
        .controller
        .missions()
        .create("Hold position", Goal::at(5.0, 5.0))
        .await
        .unwrap();
    let run = h.controller.start_run(&mission.id).await.unwrap();

    wait_for_status(&h.runs, &run, RunStatus::Completed).await;

    // Mission completed alongside the run.
    let mission = h.controller.missions().get(&mission.id).await.unwrap();
    assert_eq!(mission.status, MissionStatus::Completed);

    // The terminal sequence is an approved STOP decision followed by its
    // execution, and the whole chain verifies.
    let events = h.controller.events(&run.id, usize::MAX, 0).await.unwrap();
    assert!(verify_chain(&events).valid);
    assert_eq!(events[0].event_type, EventType::Plan);

    let last_two: Vec<_> = events.iter().rev().take(2).collect();
    assert_eq!(last_two[0].event_type, EventType::Execution);
    assert_eq!(last_two[1].event_type, EventType::Decision);
    assert_eq!(last_two[1].payload["proposal"]["intent"], "STOP");
    assert_eq!(last_two[1].payload["governance"]["decision"], "APPROVED");

    // Consecutive events always chain.
    for pair in events.windows(2) {
        assert_eq!(pair[1].prev_hash, pair[0].hash);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn commanded_speed_is_clamped_to_zone_limit() {
    let h = harness();
    h.sim.set_telemetry(telemetry_at(2.0, 2.0));

    let mission = h
        .controller
        .missions()
        .create("Cross the aisle", Goal::at(20.0, 10.0))
        .await
        .unwrap();
    let _run = h.controller.start_run(&mission.id).await.unwrap();

    let sim = Arc::clone(&h.sim);
    wait_until(|| {
        let sim = Arc::clone(&sim);
        async move { !sim.commands().is_empty() }
    })
    .await;
    h.controller.shutdown().await;

    for command in h.sim.commands() {
        if command.intent == Intent::MoveTo {
            let speed = command.params["max_speed"].as_f64().unwrap();
            assert!(speed <= 0.5, "speed {speed} exceeds aisle limit");
            assert!(speed >= 0.1);
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn denied_proposals_never_execute() {
    let h = harness();
    // Human inside the stop radius: every MOVE_TO is denied.
    h.sim.set_telemetry(
        serde_json::from_value(json!({
            "x": 2.0, "y": 2.0, "zone": "aisle",
            "nearest_obstacle_m": 5.0,
            "human_detected": true, "human_conf": 0.9, "human_distance_m": 0.5
        }))
        .unwrap(),
    );

    let mission = h
        .controller
        .missions()
        .create("Blocked path", Goal::at(20.0, 10.0))
        .await
        .unwrap();
    let run = h.controller.start_run(&mission.id).await.unwrap();

    let controller = &h.controller;
    let run_id = run.id.clone();
    wait_until(|| {
        let run_id = run_id.clone();
        async move {
            controller
                .events(&run_id, usize::MAX, 0)
                .await
                .unwrap()
                .iter()
                .filter(|e| e.event_type == EventType::Decision)
                .count()
                >= 3
        }
    })
    .await;
    h.controller.shutdown().await;

    assert!(h.sim.commands().is_empty(), "denied proposals were executed");
    let events = h.controller.events(&run.id, usize::MAX, 0).await.unwrap();
    assert!(events.iter().all(|e| e.event_type != EventType::Execution));
    let decision = events
        .iter()
        .find(|e| e.event_type == EventType::Decision)
        .unwrap();
    assert_eq!(decision.payload["governance"]["decision"], "DENIED");
    assert!(verify_chain(&events).valid);
}

#[tokio::test(flavor = "multi_thread")]
async fn persistent_simulator_failure_fails_the_run() {
    let h = harness();
    h.sim.set_telemetry(telemetry_at(2.0, 2.0));

    let mission = h
        .controller
        .missions()
        .create("Doomed", Goal::at(20.0, 10.0))
        .await
        .unwrap();
    // Fail every telemetry read from here on.
    h.sim.fail_next_telemetry(u32::MAX);
    let run = h.controller.start_run(&mission.id).await.unwrap();

    wait_for_status(&h.runs, &run, RunStatus::Failed).await;

    // The chain survives up to the failure, with the alerts recorded.
    let events = h.controller.events(&run.id, usize::MAX, 0).await.unwrap();
    assert!(verify_chain(&events).valid);
    assert!(events.iter().any(
        |e| e.event_type == EventType::Alert && e.payload["alert"] == "simulator_unreachable"
    ));

    let mission = h.controller.missions().get(&mission.id).await.unwrap();
    assert_eq!(mission.status, MissionStatus::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_run_transitions_to_stopped() {
    let h = harness();
    h.sim.set_telemetry(telemetry_at(2.0, 2.0));

    let mission = h
        .controller
        .missions()
        .create("Short errand", Goal::at(20.0, 10.0))
        .await
        .unwrap();
    let run = h.controller.start_run(&mission.id).await.unwrap();

    let sim = Arc::clone(&h.sim);
    wait_until(|| {
        let sim = Arc::clone(&sim);
        async move { !sim.commands().is_empty() }
    })
    .await;

    h.controller.stop_run(&run.id).await.unwrap();
    let stopped = h.controller.get_run(&run.id).await.unwrap();
    assert_eq!(stopped.status, RunStatus::Stopped);
    assert!(stopped.ended_at.is_some());

    // Mission is paused so it can be edited or replayed.
    let mission = h.controller.missions().get(&mission.id).await.unwrap();
    assert_eq!(mission.status, MissionStatus::Paused);

    h.controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn subscribers_receive_live_frames_and_terminal_status() {
    let h = harness();
    h.sim.set_telemetry(telemetry_at(2.0, 2.0));

    let mission = h
        .controller
        .missions()
        .create("Streamed", Goal::at(20.0, 10.0))
        .await
        .unwrap();
    let run = h.controller.start_run(&mission.id).await.unwrap();
    let (_handle, mut rx) = h.controller.subscribe(&run.id).await.unwrap();

    // Collect frames until both a telemetry and a decision frame showed up.
    let mut saw_telemetry = false;
    let mut saw_event = false;
    while !(saw_telemetry && saw_event) {
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("frame within deadline")
            .expect("stream open");
        match frame.kind {
            StreamKind::Telemetry => saw_telemetry = true,
            StreamKind::Event => {
                assert_eq!(frame.data["type"], "DECISION");
                saw_event = true;
            }
            _ => {}
        }
    }

    // Stopping broadcasts the terminal status exactly once.
    h.controller.stop_run(&run.id).await.unwrap();
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("status frame within deadline")
            .expect("stream open");
        if frame.kind == StreamKind::Status {
            assert_eq!(frame.data["status"], "stopped");
            break;
        }
    }
    h.controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn restart_rehydrates_plan_queue_from_latest_plan_event() {
    let sim = Arc::new(ScriptedSimulator::new());
    sim.set_telemetry(telemetry_at(2.0, 2.0));
    let runs = Arc::new(MemoryRunStore::new());
    let events = Arc::new(MemoryEventStore::new());

    // A run persisted as running, with two PLAN events: rehydration must
    // take the waypoints of the latest one.
    let run = Run::start(MissionId::new("mis_persisted"));
    runs.insert(run.clone()).await.unwrap();
    let chain = EventChain::new(Arc::clone(&events) as Arc<dyn EventStore>);
    chain
        .append(
            &run.id,
            EventType::Plan,
            json!({"waypoints": [{"x": 4.0, "y": 4.0, "max_speed": 0.4}], "rationale": "old"}),
        )
        .await
        .unwrap();
    chain
        .append(
            &run.id,
            EventType::Plan,
            json!({"waypoints": [{"x": 9.0, "y": 9.0, "max_speed": 0.4}], "rationale": "new"}),
        )
        .await
        .unwrap();

    let controller = RunController::new(RuntimeServices {
        config: fast_config(PlannerMode::Heuristic),
        policy: PolicyConfig::default(),
        missions: Arc::new(MemoryMissionStore::new()),
        runs: Arc::clone(&runs) as Arc<dyn RunStore>,
        telemetry: Arc::new(MemoryTelemetryStore::new()),
        events: Arc::clone(&events) as Arc<dyn EventStore>,
        sim: Arc::clone(&sim) as _,
        llm: Arc::new(ScriptedReasoningClient::unavailable()),
    });

    let resumed = controller.resume_all().await.unwrap();
    assert_eq!(resumed, 1);
    // A second resume finds the loop already live.
    assert_eq!(controller.resume_all().await.unwrap(), 0);

    let sim_probe = Arc::clone(&sim);
    wait_until(|| {
        let sim = Arc::clone(&sim_probe);
        async move { !sim.commands().is_empty() }
    })
    .await;
    controller.shutdown().await;

    // The first executed command targets the latest plan's waypoint.
    let first = &sim.commands()[0];
    assert_eq!(first.params["x"].as_f64().unwrap(), 9.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn bundle_exports_with_valid_chain_after_completion() {
    let h = harness();
    h.sim.set_telemetry(telemetry_at(5.0, 5.0));

    let mission = h
        .controller
        .missions()
        .create("Bundled", Goal::at(5.0, 5.0))
        .await
        .unwrap();
    let run = h.controller.start_run(&mission.id).await.unwrap();

    wait_for_status(&h.runs, &run, RunStatus::Completed).await;

    let bundle = h.controller.export_bundle(&run.id).await.unwrap();
    assert!(bundle.chain_valid);
    assert_eq!(bundle.event_count, bundle.events.len());
    assert_eq!(bundle.format_version, "1.0");
    assert_eq!(bundle.derive_bundle_hash(), bundle.bundle_hash);
    assert!(bundle.telemetry.is_some());

    let report = h.controller.compliance_report(&run.id).await.unwrap();
    assert!(report.chain_valid);
    assert!(report.metrics.total_decisions > 0);
    assert!(report.metrics.approval_rate > 0.0);

    let timeline = h.controller.timeline(&run.id, true).await.unwrap();
    assert!(timeline.chain_valid);
    assert_eq!(timeline.event_count, bundle.event_count);

    // Samples were persisted alongside the chain.
    assert!(!h
        .telemetry
        .list(&run.id, usize::MAX, 0)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn plan_with_governance_flags_speeding_waypoints() {
    let llm = Arc::new(ScriptedReasoningClient::with_responses([json!({
        "waypoints": [
            {"x": 5.0, "y": 5.0, "max_speed": 0.3},
            {"x": 10.0, "y": 10.0, "max_speed": 0.9},
        ],
        "rationale": "two legs",
        "estimated_time_s": 40.0,
    })
    .to_string()]));
    let h = harness_with(fast_config(PlannerMode::Heuristic), llm);
    h.sim.set_telemetry(telemetry_at(2.0, 2.0));

    let plan = h
        .controller
        .plan_with_governance("cross the floor", Some(&Goal::at(10.0, 10.0)))
        .await
        .unwrap();

    assert_eq!(plan.waypoints.len(), 2);
    assert!(!plan.all_approved);
    assert_eq!(plan.governance[0].decision, argus_core::Decision::Approved);
    assert!(plan.governance[1]
        .policy_hits
        .iter()
        .any(|hit| hit == "SAFE_SPEED_01"));

    // The agentic memory surface is empty for memoryless planners.
    assert!(h.controller.agent_memory().await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn chain_verification_surface_reports_intact_chain() {
    let h = harness();
    h.sim.set_telemetry(telemetry_at(5.0, 5.0));

    let mission = h
        .controller
        .missions()
        .create("Verified", Goal::at(5.0, 5.0))
        .await
        .unwrap();
    let run = h.controller.start_run(&mission.id).await.unwrap();
    wait_for_status(&h.runs, &run, RunStatus::Completed).await;

    let verification = h.controller.verify_run_chain(&run.id).await.unwrap();
    assert!(verification.valid);
    assert!(verification.events_checked > 0);
    assert!(verification.first_broken_at.is_none());

    // The exported bundle passes independent auditor verification.
    let bundle = h.controller.export_bundle(&run.id).await.unwrap();
    bundle.verify().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn policy_catalog_and_path_preview_surfaces() {
    let h = harness();
    h.sim.set_telemetry(telemetry_at(2.0, 2.0));

    let policies = h.controller.policies();
    assert!(policies.iter().any(|p| p.policy_id == "GEOFENCE_01"));

    let (points, _note) = h.controller.path_preview(&Goal::at(10.0, 10.0)).await.unwrap();
    assert_eq!(points.first().copied(), Some((2.0, 2.0)));
    assert_eq!(points.last().copied(), Some((10.0, 10.0)));
}

#[tokio::test(flavor = "multi_thread")]
async fn agentic_mode_drives_loop_with_reasoning_frames() {
    let steps = json!([
        {"thought": "assess", "action": "get_world_state", "action_input": {}},
        {"thought": "verify", "action": "check_policy",
         "action_input": {"intent": "MOVE_TO", "x": 6.0, "y": 6.0, "max_speed": 0.3}},
        {"thought": "proceed", "action": "submit_action",
         "action_input": {"intent": "MOVE_TO", "x": 6.0, "y": 6.0, "max_speed": 0.3,
                          "rationale": "Path is clear."}},
    ])
    .to_string();
    // Enough scripted turns for several ticks.
    let responses: Vec<String> = std::iter::repeat(steps).take(20).collect();
    let llm = Arc::new(ScriptedReasoningClient::with_responses(responses));
    let h = harness_with(fast_config(PlannerMode::Agentic), llm);
    h.sim.set_telemetry(telemetry_at(2.0, 2.0));

    let mission = h
        .controller
        .missions()
        .create("Agentic errand", Goal::at(6.0, 6.0))
        .await
        .unwrap();
    let run = h.controller.start_run(&mission.id).await.unwrap();
    let (_handle, mut rx) = h.controller.subscribe(&run.id).await.unwrap();

    let mut saw_reasoning = false;
    for _ in 0..200 {
        let Ok(Some(frame)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await
        else {
            break;
        };
        if frame.kind == StreamKind::AgentReasoning {
            let steps = frame.data["steps"].as_array().unwrap();
            assert!(!steps.is_empty());
            assert!(steps[0]["thought"].is_string());
            saw_reasoning = true;
            break;
        }
    }
    h.controller.shutdown().await;
    assert!(saw_reasoning, "no agent_reasoning frame observed");

    // Executed commands came from the agent's submitted action.
    let commands = h.sim.commands();
    assert!(commands
        .iter()
        .any(|c| c.intent == Intent::MoveTo && c.params["x"].as_f64() == Some(6.0)));

    // Outcomes were fed back into agent memory.
    let memory = h.controller.agent_memory().await.expect("agentic memory");
    assert!(memory["total_entries"].as_u64().unwrap() >= 1);
}
