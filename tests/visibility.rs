//! Line-of-sight checks against the reference world's colliders.

use std::f32::consts::PI;

use glam::Vec2;
use hideseek::arena::WallSegment;
use hideseek::visibility::sees;
use hideseek::{BodyState, EntityLifecycle, Prefab, SimWorld, VisibilityMatrix, VisionCone};
use rstest::rstest;
use test_utils::{spawn_agents, spawn_boxes, world_with_agents, AgentSpec};

fn sight(world: &SimWorld, observer: hideseek::EntityHandle, target: hideseek::EntityHandle) -> bool {
    let eye = world.pose(observer).expect("observer pose");
    let pose = world.pose(target).expect("target pose");
    sees(&VisionCone::default(), &eye, &pose, target, world).is_some()
}

#[rstest]
fn wall_between_agents_blocks_sight() {
    let (mut world, roster) = world_with_agents(&[
        AgentSpec::hider(6.0, 0.0, 0.0),
        AgentSpec::seeker(0.0, 0.0, 0.0),
    ]);
    let hider = roster.hiders()[0].entity;
    let seeker = roster.seekers()[0].entity;
    assert!(sight(&world, seeker, hider));

    let wall = world.instantiate(
        Prefab::Wall(WallSegment::new(Vec2::new(3.0, -1.0), Vec2::new(3.0, 1.0), 0.25)),
        None,
    );
    assert!(!sight(&world, seeker, hider));

    world.set_active(wall, false);
    assert!(sight(&world, seeker, hider));
}

#[rstest]
fn prop_in_front_of_hider_hides_it() {
    let (mut world, roster) = world_with_agents(&[
        AgentSpec::hider(6.0, 0.0, 0.0),
        AgentSpec::seeker(0.0, 0.0, 0.0),
    ]);
    spawn_boxes(&mut world, &[Vec2::new(4.5, 0.0)]);
    assert!(!sight(&world, roster.seekers()[0].entity, roster.hiders()[0].entity));
}

#[rstest]
#[case::behind(PI, false)]
#[case::beside(0.5 * PI, false)]
#[case::slightly_off(0.3, true)]
fn cone_limits_sight_without_occluders(#[case] heading: f32, #[case] visible: bool) {
    let (world, roster) = world_with_agents(&[
        AgentSpec::hider(5.0, 0.0, 0.0),
        AgentSpec::seeker(0.0, 0.0, heading),
    ]);
    assert_eq!(
        sight(&world, roster.seekers()[0].entity, roster.hiders()[0].entity),
        visible
    );
}

#[rstest]
fn matrix_records_each_seeker_independently() {
    let mut world = SimWorld::new();
    let roster = spawn_agents(
        &mut world,
        &[
            AgentSpec::hider(0.0, 5.0, 0.0),
            AgentSpec::hider(0.0, -5.0, 0.0),
            AgentSpec::seeker(0.0, 0.0, 0.5 * PI),
            AgentSpec::seeker(3.0, 0.0, 0.0),
        ],
    );
    let mut matrix = VisibilityMatrix::new(2, 2);
    matrix.fill(&VisionCone::default(), &roster, &world);

    assert!(matrix.get(0, 0));
    assert!(!matrix.get(1, 0));
    assert!(!matrix.seeker_sees(1));
    assert!(!matrix.all_hidden());
    assert!(matrix.hider_seen(0));
    assert!(!matrix.hider_seen(1));
}
