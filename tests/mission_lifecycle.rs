//! End-to-end mission lifecycle tests over simulated action servers.
//!
//! Each test spins up a real coordinator task with a fleet of scripted
//! follow-reference servers and a scripted follow-path server, then drives
//! missions through the public handle only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use aeroswarm::actions::FollowReferenceClient;
use aeroswarm::{
    build_fleet, Coordinator, CoordinatorConfig, CoordinatorHandle, FrameBroadcaster, FrameTree,
    LinearTrajectoryGenerator, MissionGoal, Pose, SimAgentBehavior, SimFollowPath,
    SimFollowReference, SimPathOutcome, TrajectorySampler, Waypoint, YawAngle,
};

const RESULT_WAIT: Duration = Duration::from_secs(5);

fn spawn_swarm(
    agent_servers: Vec<(&str, SimFollowReference)>,
    path_server: SimFollowPath,
) -> (CoordinatorHandle, tokio::task::JoinHandle<()>) {
    let tree = Arc::new(FrameTree::new());
    let broadcaster = FrameBroadcaster::new(tree.clone(), "earth", "swarm");

    let names: Vec<String> = agent_servers.iter().map(|(n, _)| n.to_string()).collect();
    let clients: HashMap<String, Arc<dyn FollowReferenceClient>> = agent_servers
        .into_iter()
        .map(|(n, s)| (n.to_string(), Arc::new(s) as Arc<dyn FollowReferenceClient>))
        .collect();

    let fleet = build_fleet(
        &names,
        1.0,
        &broadcaster,
        |name| clients[name].clone(),
        0.5,
        Duration::from_millis(100),
    );

    let sampler = TrajectorySampler::new(Box::new(LinearTrajectoryGenerator::new()), 0.05, 5);
    let config = CoordinatorConfig {
        tick_ms: 10,
        init_timeout_secs: 1,
        feedback_buffer: 64,
    };
    let (coordinator, handle) = Coordinator::new(
        config,
        fleet,
        tree,
        broadcaster,
        sampler,
        Arc::new(path_server),
        Pose::from_xyz(0.0, 0.0, 1.0),
    );
    let task = tokio::spawn(coordinator.run());
    (handle, task)
}

fn line_goal(max_speed: f64) -> MissionGoal {
    MissionGoal {
        frame_id: "earth".into(),
        path: vec![
            Waypoint::new("wp1", Pose::from_xyz(1.0, 0.0, 1.0)),
            Waypoint::new("wp2", Pose::from_xyz(2.0, 0.0, 1.0)),
        ],
        yaw_swarm: YawAngle { angle: 0.0 },
        max_speed,
    }
}

#[tokio::test]
async fn test_two_agent_mission_succeeds_with_feedback() {
    let (handle, task) = spawn_swarm(
        vec![
            ("drone0", SimFollowReference::tracking()),
            ("drone1", SimFollowReference::tracking()),
        ],
        SimFollowPath::succeeding(),
    );

    let (mut feedback_rx, mut result_rx) = handle.submit_mission(line_goal(2.0)).await.unwrap();

    let mut frames = Vec::new();
    let result = loop {
        tokio::select! {
            Some(fb) = feedback_rx.recv() => frames.push(fb),
            result = &mut result_rx => break result.unwrap(),
            _ = tokio::time::sleep(RESULT_WAIT) => panic!("mission did not finish"),
        }
    };

    assert!(result.swarm_success);
    assert!(result.reason.is_none());
    assert!(!frames.is_empty(), "tracking produced no feedback frames");
    let first = frames.first().unwrap().actual_distance_to_next_waypoint;
    let last = frames.last().unwrap().actual_distance_to_next_waypoint;
    assert!(last <= first, "distance to next waypoint did not shrink");

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_agent_abort_mid_mission_fails_the_swarm() {
    let (handle, task) = spawn_swarm(
        vec![
            ("drone0", SimFollowReference::tracking()),
            (
                "drone1",
                SimFollowReference::with_behavior(SimAgentBehavior::AbortAfter(
                    Duration::from_millis(100),
                )),
            ),
        ],
        // Slow path so the agent abort lands while still tracking
        SimFollowPath::succeeding(),
    );

    let (_feedback_rx, result_rx) = handle.submit_mission(line_goal(0.1)).await.unwrap();
    let result = timeout(RESULT_WAIT, result_rx).await.unwrap().unwrap();

    assert!(!result.swarm_success);
    let reason = result.reason.unwrap();
    assert!(reason.contains("drone1"), "unexpected reason: {reason}");

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_unavailable_agent_endpoint_rejects_the_mission() {
    let (handle, task) = spawn_swarm(
        vec![
            ("drone0", SimFollowReference::tracking()),
            ("drone1", SimFollowReference::unavailable()),
        ],
        SimFollowPath::succeeding(),
    );

    let (_feedback_rx, result_rx) = handle.submit_mission(line_goal(1.0)).await.unwrap();
    let result = timeout(RESULT_WAIT, result_rx).await.unwrap().unwrap();

    assert!(!result.swarm_success);
    let reason = result.reason.unwrap();
    assert!(
        reason.contains("failed to initialize"),
        "unexpected reason: {reason}"
    );

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_rejected_agent_goal_fails_the_mission() {
    let (handle, task) = spawn_swarm(
        vec![(
            "drone0",
            SimFollowReference::with_behavior(SimAgentBehavior::Reject),
        )],
        SimFollowPath::succeeding(),
    );

    let (_feedback_rx, result_rx) = handle.submit_mission(line_goal(0.1)).await.unwrap();
    let result = timeout(RESULT_WAIT, result_rx).await.unwrap().unwrap();

    assert!(!result.swarm_success);
    let reason = result.reason.unwrap();
    assert!(reason.contains("drone0"), "unexpected reason: {reason}");

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_path_abort_fails_the_mission() {
    let (handle, task) = spawn_swarm(
        vec![
            ("drone0", SimFollowReference::tracking()),
            ("drone1", SimFollowReference::tracking()),
        ],
        SimFollowPath::with_outcome(SimPathOutcome::AbortAfter(Duration::from_millis(60))),
    );

    let (_feedback_rx, result_rx) = handle.submit_mission(line_goal(0.1)).await.unwrap();
    let result = timeout(RESULT_WAIT, result_rx).await.unwrap().unwrap();

    assert!(!result.swarm_success);
    let reason = result.reason.unwrap();
    assert!(reason.contains("aborted"), "unexpected reason: {reason}");

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_cancel_resolves_the_active_mission() {
    let (handle, task) = spawn_swarm(
        vec![
            ("drone0", SimFollowReference::tracking()),
            ("drone1", SimFollowReference::tracking()),
        ],
        SimFollowPath::succeeding(),
    );

    // Slow enough that cancellation lands while tracking
    let (mut feedback_rx, result_rx) = handle.submit_mission(line_goal(0.05)).await.unwrap();
    // Wait for the first feedback frame so the mission is demonstrably live
    timeout(RESULT_WAIT, feedback_rx.recv())
        .await
        .unwrap()
        .unwrap();

    handle.cancel().await.unwrap();
    let result = timeout(RESULT_WAIT, result_rx).await.unwrap().unwrap();

    assert!(!result.swarm_success);
    assert!(result.reason.unwrap().contains("cancelled"));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_second_mission_rejected_while_first_is_active() {
    let (handle, task) = spawn_swarm(
        vec![("drone0", SimFollowReference::tracking())],
        SimFollowPath::succeeding(),
    );

    let (mut feedback_rx, _first_result) = handle.submit_mission(line_goal(0.05)).await.unwrap();
    timeout(RESULT_WAIT, feedback_rx.recv())
        .await
        .unwrap()
        .unwrap();

    let (_fb2, second_result) = handle.submit_mission(line_goal(1.0)).await.unwrap();
    let result = timeout(RESULT_WAIT, second_result).await.unwrap().unwrap();
    assert!(!result.swarm_success);
    assert!(result.reason.unwrap().contains("another mission is active"));

    handle.cancel().await.unwrap();
    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_invalid_goal_rejected_and_coordinator_stays_usable() {
    let (handle, task) = spawn_swarm(
        vec![("drone0", SimFollowReference::tracking())],
        SimFollowPath::succeeding(),
    );

    let empty = MissionGoal {
        frame_id: "earth".into(),
        path: vec![],
        yaw_swarm: YawAngle { angle: 0.0 },
        max_speed: 1.0,
    };
    let (_fb, result_rx) = handle.submit_mission(empty).await.unwrap();
    let result = timeout(RESULT_WAIT, result_rx).await.unwrap().unwrap();
    assert!(!result.swarm_success);
    assert!(result.reason.unwrap().contains("path is empty"));

    // The rejection leaves no latched state behind
    let (_fb, result_rx) = handle.submit_mission(line_goal(2.0)).await.unwrap();
    let result = timeout(RESULT_WAIT, result_rx).await.unwrap().unwrap();
    assert!(result.swarm_success);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_pause_gates_polling_and_resume_restores_it() {
    let (handle, task) = spawn_swarm(
        vec![("drone0", SimFollowReference::tracking())],
        SimFollowPath::succeeding(),
    );

    let (mut feedback_rx, result_rx) = handle.submit_mission(line_goal(0.05)).await.unwrap();
    timeout(RESULT_WAIT, feedback_rx.recv())
        .await
        .unwrap()
        .unwrap();

    handle.pause().await.unwrap();
    // Drain anything emitted before the pause took effect
    tokio::time::sleep(Duration::from_millis(50)).await;
    while feedback_rx.try_recv().is_ok() {}

    // No ticks while paused means no new feedback frames
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(feedback_rx.try_recv().is_err());

    handle.resume().await.unwrap();
    timeout(RESULT_WAIT, feedback_rx.recv())
        .await
        .unwrap()
        .unwrap();

    handle.cancel().await.unwrap();
    let result = timeout(RESULT_WAIT, result_rx).await.unwrap().unwrap();
    assert!(!result.swarm_success);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}
