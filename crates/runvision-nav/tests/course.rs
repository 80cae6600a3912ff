use runvision_nav::{
    ActuatorCommand, Challenges, NavParams, NavState, NavigationStateMachine, Observation,
};

const W: usize = 640;
const H: usize = 480;

/// Step course: walk, see the step marker come down the frame, climb,
/// walk again, then lose the track at the finish.
#[test]
fn step_course_visits_every_stage_in_order() {
    let params = NavParams::default();
    let macro_len = params.step_macro.total_cycles() as usize;
    let mut m = NavigationStateMachine::new(
        params,
        Challenges {
            step: true,
            swerve: false,
        },
    );

    let mut frames = Vec::new();
    for i in 0..10 {
        frames.push(Observation::blind(W, H).with_track(320.0 + i as f32, 300.0));
    }
    for row in (0..12).map(|i| 250.0 + 20.0 * i as f32) {
        frames.push(
            Observation::blind(W, H)
                .with_track(320.0, 300.0)
                .with_step_marker(320.0, row.min(470.0)),
        );
    }
    // Vision is ignored while climbing.
    for _ in 0..macro_len {
        frames.push(Observation::blind(W, H).with_track(320.0, 300.0));
    }
    for _ in 0..5 {
        frames.push(Observation::blind(W, H).with_track(300.0, 300.0));
    }
    frames.push(Observation::blind(W, H));

    let mut visited = vec![NavState::Idle];
    let mut published = Vec::new();
    for obs in &frames {
        let out = m.step(obs);
        published.push(out.command);
        if visited.last() != Some(&out.state) {
            visited.push(out.state);
        }
    }

    assert_eq!(
        visited,
        vec![
            NavState::Idle,
            NavState::Walking,
            NavState::Approaching,
            NavState::StepUp,
            NavState::Walking,
            NavState::Stopped,
        ]
    );
    assert_eq!(published.len(), frames.len());
    assert_eq!(
        published.last(),
        Some(&ActuatorCommand::stand(&m.params().codes))
    );
}

#[test]
fn plain_run_never_approaches() {
    let mut m = NavigationStateMachine::new(NavParams::default(), Challenges::default());
    for i in 0..50 {
        let obs = Observation::blind(W, H)
            .with_track(100.0 + 10.0 * i as f32, 300.0)
            .with_step_marker(320.0, 470.0);
        let out = m.step(&obs);
        assert_eq!(out.state, NavState::Walking);
        assert!(out.command.turning.abs() <= 60.0);
    }
}
