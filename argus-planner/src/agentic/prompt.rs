use argus_core::{Goal, SimWorld, Telemetry};
use argus_policy::PolicyConfig;

use super::tools::TOOL_DESCRIPTIONS;

/// Build the ReAct system prompt with tools, memory and denial feedback.
#[allow(clippy::too_many_arguments)]
pub(super) fn build_react_prompt(
    policy: &PolicyConfig,
    telemetry: &Telemetry,
    goal: &Goal,
    task: &str,
    world: Option<&SimWorld>,
    memory_text: &str,
    denial_feedback: Option<&str>,
) -> String {
    let denial_text = denial_feedback.map_or_else(String::new, |feedback| {
        format!(
            "\nIMPORTANT - YOUR PREVIOUS PROPOSAL WAS DENIED:\n{feedback}\n\
             You MUST propose a DIFFERENT action that avoids the denied policies. \
             Do NOT repeat the same proposal.\n\
             Consider: different route, lower speed, waiting, or requesting a human override.\n"
        )
    });

    let fence = &policy.geofence;
    let world_line = world.map_or_else(String::new, |w| {
        let zones: Vec<String> = w.zones.iter().map(|z| z.name.clone()).collect();
        format!("- World zones: {}\n", zones.join(", "))
    });

    format!(
        "You are an autonomous warehouse robot AI planning agent.\n\
         \n\
         TASK: {task}\n\
         GOAL POSITION: ({gx}, {gy})\n\
         \n\
         CURRENT STATE:\n\
         - Position: ({x}, {y})\n\
         - Speed: {speed} m/s | Zone: {zone}\n\
         - Human: {human} at {human_dist}m\n\
         - Nearest obstacle: {obstacle}m\n\
         {world_line}\
         \n\
         {memory_text}\n\
         {denial_text}\
         TOOLS (use in order: get_world_state -> check_policy -> submit_action):\n\
         {tools}\n\
         \n\
         POLICY RULES:\n\
         - Geofence: x[{min_x}-{max_x}], y[{min_y}-{max_y}] - STOP if outside\n\
         - Aisle: max {aisle} m/s | Corridor: max {corridor} m/s | Loading bay: max {bay} m/s\n\
         - Human <{stop_r}m: STOP | Human <{slow_r}m: max {near_human} m/s\n\
         - Obstacle clearance: min {clearance}m\n\
         \n\
         HARD CONSTRAINTS (never violate):\n\
         - You CANNOT move the robot directly - you only propose actions\n\
         - You CANNOT override or bypass safety policies\n\
         - You MUST accept policy rejections and replan with different parameters\n\
         - If you cannot find a safe plan after retrying, respond with WAIT and rationale \
         \"Unable to generate safe plan - recommend manual override\"\n\
         \n\
         Respond with a JSON array of exactly 3 steps:\n\
         [\n\
         \x20 {{\"thought\": \"brief assessment\", \"action\": \"get_world_state\", \"action_input\": {{}}}},\n\
         \x20 {{\"thought\": \"brief policy reasoning\", \"action\": \"check_policy\", \"action_input\": {{\"intent\": \"MOVE_TO\", \"x\": 15, \"y\": 10, \"max_speed\": 0.4}}}},\n\
         \x20 {{\"thought\": \"brief conclusion\", \"action\": \"submit_action\", \"action_input\": {{\"intent\": \"MOVE_TO\", \"x\": 15, \"y\": 10, \"max_speed\": 0.4, \"rationale\": \"Concise reason.\"}}}}\n\
         ]\n\
         \n\
         Keep each thought under 30 words. ALWAYS check_policy before submit_action.\n",
        gx = goal.x(),
        gy = goal.y(),
        x = telemetry.x,
        y = telemetry.y,
        speed = telemetry.speed,
        zone = telemetry.zone,
        human = telemetry.human_detected,
        human_dist = telemetry.human_distance_m,
        obstacle = telemetry.nearest_obstacle_m,
        tools = TOOL_DESCRIPTIONS,
        min_x = fence.min_x,
        max_x = fence.max_x,
        min_y = fence.min_y,
        max_y = fence.max_y,
        aisle = policy.aisle_speed_limit,
        corridor = policy.corridor_speed_limit,
        bay = policy.loading_bay_speed_limit,
        stop_r = policy.human_stop_radius_m,
        slow_r = policy.human_slow_radius_m,
        near_human = policy.max_speed_near_human,
        clearance = policy.min_obstacle_clearance_m,
    )
}
