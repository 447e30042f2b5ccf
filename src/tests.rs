//! Scenario tests driving the solver the way an outer physics step would.

use crate::prelude::*;
use approx::assert_relative_eq;

const DT: Scalar = 1.0 / 60.0;

/// A minimal physics world: one island, explicit integration between the
/// velocity and position phases.
struct TestWorld {
    bodies: Vec<RigidBody>,
    positions: Vec<Vector>,
    angles: Vec<Scalar>,
    linear_velocities: Vec<Vector>,
    angular_velocities: Vec<Scalar>,
    settings: SolverSettings,
}

impl TestWorld {
    fn new() -> Self {
        Self {
            bodies: Vec::new(),
            positions: Vec::new(),
            angles: Vec::new(),
            linear_velocities: Vec::new(),
            angular_velocities: Vec::new(),
            settings: SolverSettings::default(),
        }
    }

    fn add_body(&mut self, body: RigidBody) -> BodyId {
        let index = self.bodies.len();
        let body = body.with_island_index(index);

        self.positions.push(body.position);
        self.angles.push(body.rotation.as_radians());
        self.linear_velocities.push(Vector::ZERO);
        self.angular_velocities.push(0.0);
        self.bodies.push(body);

        BodyId(index as u32)
    }

    fn set_velocity(&mut self, body: BodyId, linear: Vector, angular: Scalar) {
        self.linear_velocities[body.index()] = linear;
        self.angular_velocities[body.index()] = angular;
    }

    fn position(&self, body: BodyId) -> Vector {
        self.positions[body.index()]
    }

    fn angle(&self, body: BodyId) -> Scalar {
        self.angles[body.index()]
    }

    fn velocity(&self, body: BodyId) -> Vector {
        self.linear_velocities[body.index()]
    }

    fn angular_velocity(&self, body: BodyId) -> Scalar {
        self.angular_velocities[body.index()]
    }

    fn step(&mut self, joints: &mut [Joint]) {
        let mut data = SolverData {
            frame_time: DT,
            inv_dt: DT.recip(),
            dt_ratio: 1.0,
            warm_starting: self.settings.warm_starting,
            linear_slop: self.settings.linear_slop,
            angular_slop: self.settings.angular_slop,
            max_linear_correction: self.settings.max_linear_correction,
            max_angular_correction: self.settings.max_angular_correction,
            island_offset: 0,
            positions: &mut self.positions,
            angles: &mut self.angles,
            linear_velocities: &mut self.linear_velocities,
            angular_velocities: &mut self.angular_velocities,
        };

        init_velocity_constraints(joints, &self.bodies, &mut data);

        for _ in 0..self.settings.velocity_iterations {
            solve_velocity_constraints(joints, &mut data);
        }

        // Symplectic Euler integration, owned by the outer step.
        for index in 0..data.positions.len() {
            let velocity = data.linear_velocities[index];
            data.positions[index] += velocity * DT;
            data.angles[index] += data.angular_velocities[index] * DT;
        }

        for _ in 0..self.settings.position_iterations {
            if solve_position_constraints(joints, &mut data) {
                break;
            }
        }

        validate_joints(joints, DT.recip());

        for (index, body) in self.bodies.iter_mut().enumerate() {
            body.position = self.positions[index];
            body.rotation = Rotation::radians(self.angles[index]);
        }
    }

    fn step_n(&mut self, joints: &mut [Joint], steps: usize) {
        for _ in 0..steps {
            self.step(joints);
        }
    }
}

fn dynamic_body(position: Vector) -> RigidBody {
    RigidBody::new()
        .with_position(position)
        .with_mass(1.0)
        .with_angular_inertia(1.0)
}

#[test]
fn distance_joint_converges_to_rest_length() {
    let mut world = TestWorld::new();
    let a = world.add_body(dynamic_body(Vector::ZERO));
    let b = world.add_body(dynamic_body(Vector::new(10.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0),
    )];

    world.step_n(&mut joints, 10);

    let separation = world.position(b).distance(world.position(a));
    assert_relative_eq!(separation, 5.0, epsilon = 0.01);

    // Position correction alone must not inject velocity.
    assert_relative_eq!(world.velocity(a), Vector::ZERO, epsilon = 1.0e-4);
    assert_relative_eq!(world.velocity(b), Vector::ZERO, epsilon = 1.0e-4);
}

#[test]
fn distance_joint_is_symmetric_for_equal_masses() {
    let mut world = TestWorld::new();
    let a = world.add_body(dynamic_body(Vector::ZERO));
    let b = world.add_body(dynamic_body(Vector::new(10.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0),
    )];

    world.step_n(&mut joints, 10);

    // Both bodies moved the same amount towards each other.
    let momentum = world.velocity(a) + world.velocity(b);
    assert_relative_eq!(momentum, Vector::ZERO, epsilon = 1.0e-4);
    assert_relative_eq!(
        world.position(a).x,
        10.0 - world.position(b).x,
        epsilon = 0.01
    );
}

#[test]
fn every_joint_kind_conserves_linear_momentum() {
    // Every two-body joint applies its impulses equal and opposite, so for
    // equal masses the total linear velocity must come out unchanged. The
    // mouse joint is excluded: it pulls a single body towards an external
    // target on purpose.
    let kinds: [JointKind; 5] = [
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 2.0).into(),
        RevoluteJoint::new(Vector::new(2.0, 0.0), Vector::ZERO).into(),
        WeldJoint::new(Vector::new(2.0, 0.0), Vector::ZERO).into(),
        PrismaticJoint::new(Vector::ZERO, Vector::ZERO, Vector::X).into(),
        FrictionJoint::new()
            .with_max_force(10.0)
            .with_max_torque(5.0)
            .into(),
    ];

    for kind in kinds {
        let mut world = TestWorld::new();
        let a = world.add_body(dynamic_body(Vector::ZERO));
        let b = world.add_body(dynamic_body(Vector::new(2.0, 0.0)));

        let mut joints = [Joint::new(a, b, kind)];
        let joint_type = joints[0].joint_type();

        world.set_velocity(a, Vector::new(1.0, 2.0), 1.0);
        world.set_velocity(b, Vector::new(-1.0, 1.0), -1.0);
        let before = world.velocity(a) + world.velocity(b);

        world.step_n(&mut joints, 30);

        let after = world.velocity(a) + world.velocity(b);
        assert!(
            (after - before).length() < 1.0e-3,
            "{joint_type:?} changed the total velocity from {before} to {after}"
        );
    }
}

#[test]
fn distance_spring_pulls_bodies_together_gradually() {
    let mut world = TestWorld::new();
    let a = world.add_body(dynamic_body(Vector::ZERO));
    let b = world.add_body(dynamic_body(Vector::new(10.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0).with_limits(1.0, 20.0).with_spring(
            20.0, 2.0,
        ),
    )];

    world.step(&mut joints);

    // A spring accelerates the bodies instead of teleporting them.
    let separation = world.position(b).distance(world.position(a));
    assert!(separation > 8.0, "spring should not snap, was {separation}");
    assert!(world.velocity(a).x > 0.0);
    assert!(world.velocity(b).x < 0.0);

    world.step_n(&mut joints, 300);

    let separation = world.position(b).distance(world.position(a));
    assert_relative_eq!(separation, 5.0, epsilon = 0.1);
}

#[test]
fn distance_limits_contain_the_separation() {
    let mut world = TestWorld::new();
    let a = world.add_body(RigidBody::new());
    let b = world.add_body(dynamic_body(Vector::new(4.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 4.0)
            .with_limits(2.0, 5.0)
            .with_spring(5.0, 0.5),
    )];

    // Fling the body outward against the upper limit.
    world.set_velocity(b, Vector::new(50.0, 0.0), 0.0);
    world.step_n(&mut joints, 60);

    let separation = world.position(b).distance(world.position(a));
    assert!(
        separation < 5.0 + 0.1,
        "upper limit exceeded: separation {separation}"
    );
}

#[test]
fn distance_lower_limit_resists_compression() {
    let mut world = TestWorld::new();
    let a = world.add_body(RigidBody::new());
    let b = world.add_body(dynamic_body(Vector::new(4.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 4.0)
            .with_limits(2.0, 5.0)
            .with_spring(5.0, 0.5),
    )];

    // Fling the body inward against the lower limit.
    world.set_velocity(b, Vector::new(-50.0, 0.0), 0.0);
    world.step_n(&mut joints, 60);

    let separation = world.position(b).distance(world.position(a));
    assert!(
        separation > 2.0 - 0.1,
        "lower limit exceeded: separation {separation}"
    );
}

#[test]
fn solved_state_stays_at_rest() {
    let mut world = TestWorld::new();
    let a = world.add_body(dynamic_body(Vector::ZERO));
    let b = world.add_body(dynamic_body(Vector::new(10.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0),
    )];

    world.step_n(&mut joints, 10);
    let before_a = world.position(a);
    let before_b = world.position(b);

    // Warm-started re-solving of a converged configuration must not drift.
    world.step_n(&mut joints, 60);

    assert_relative_eq!(world.position(a), before_a, epsilon = 1.0e-3);
    assert_relative_eq!(world.position(b), before_b, epsilon = 1.0e-3);
}

#[test]
fn overloaded_joint_breaks_and_stays_inert() {
    let mut world = TestWorld::new();
    let a = world.add_body(dynamic_body(Vector::ZERO));
    let b = world.add_body(dynamic_body(Vector::new(5.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0),
    )
    .with_breakpoint(10.0)];

    // Rip the bodies apart; holding them together needs far more than the
    // breakpoint force.
    world.set_velocity(a, Vector::new(-10.0, 0.0), 0.0);
    world.set_velocity(b, Vector::new(10.0, 0.0), 0.0);
    world.step(&mut joints);

    assert!(!joints[0].enabled, "joint should have broken");

    // A broken joint no longer constrains the bodies.
    let separation_before = world.position(b).distance(world.position(a));
    world.set_velocity(a, Vector::new(-1.0, 0.0), 0.0);
    world.set_velocity(b, Vector::new(1.0, 0.0), 0.0);
    world.step_n(&mut joints, 10);
    let separation_after = world.position(b).distance(world.position(a));
    assert!(separation_after > separation_before + 0.1);
}

#[test]
fn strong_joint_does_not_break() {
    let mut world = TestWorld::new();
    let a = world.add_body(dynamic_body(Vector::ZERO));
    let b = world.add_body(dynamic_body(Vector::new(5.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0),
    )
    .with_breakpoint(1.0e6)];

    world.set_velocity(a, Vector::new(-10.0, 0.0), 0.0);
    world.set_velocity(b, Vector::new(10.0, 0.0), 0.0);
    world.step_n(&mut joints, 10);

    assert!(joints[0].enabled);
}

#[test]
fn revolute_joint_pins_bodies_together() {
    let mut world = TestWorld::new();
    let anchor = world.add_body(RigidBody::new());
    let swinging = world.add_body(dynamic_body(Vector::new(1.0, 0.0)));

    let mut joints = [Joint::new(
        anchor,
        swinging,
        RevoluteJoint::new(Vector::new(1.0, 0.0), Vector::ZERO),
    )];

    // Push the body away from the pin; the joint must hold it in place.
    world.set_velocity(swinging, Vector::new(0.0, 3.0), 0.0);
    world.step_n(&mut joints, 30);

    assert_relative_eq!(
        world.position(swinging),
        Vector::new(1.0, 0.0),
        epsilon = 0.02
    );
}

#[test]
fn revolute_limits_contain_the_angle() {
    let mut world = TestWorld::new();
    let anchor = world.add_body(RigidBody::new());
    let spinning = world.add_body(dynamic_body(Vector::ZERO));

    let mut joints = [Joint::new(
        anchor,
        spinning,
        RevoluteJoint::new(Vector::ZERO, Vector::ZERO).with_angle_limits(-0.5, 0.5),
    )];

    world.set_velocity(spinning, Vector::ZERO, 10.0);
    world.step_n(&mut joints, 60);

    let angle = world.angle(spinning);
    assert!(angle <= 0.5 + 0.05, "upper angle limit exceeded: {angle}");
    assert!(
        world.angular_velocity(spinning).abs() < 0.5,
        "spin should have been stopped at the limit"
    );
}

#[test]
fn revolute_lower_angle_limit_holds() {
    let mut world = TestWorld::new();
    let anchor = world.add_body(RigidBody::new());
    let spinning = world.add_body(dynamic_body(Vector::ZERO));

    let mut joints = [Joint::new(
        anchor,
        spinning,
        RevoluteJoint::new(Vector::ZERO, Vector::ZERO).with_angle_limits(-0.5, 0.5),
    )];

    world.set_velocity(spinning, Vector::ZERO, -10.0);
    world.step_n(&mut joints, 60);

    let angle = world.angle(spinning);
    assert!(angle >= -0.5 - 0.05, "lower angle limit exceeded: {angle}");
    assert!(
        world.angular_velocity(spinning).abs() < 0.5,
        "spin should have been stopped at the limit"
    );
}

#[test]
fn revolute_motor_spins_up_to_speed() {
    let mut world = TestWorld::new();
    let anchor = world.add_body(RigidBody::new());
    let wheel = world.add_body(dynamic_body(Vector::ZERO));

    let mut joints = [Joint::new(
        anchor,
        wheel,
        RevoluteJoint::new(Vector::ZERO, Vector::ZERO).with_motor(4.0, 50.0),
    )];

    world.step_n(&mut joints, 60);

    assert_relative_eq!(world.angular_velocity(wheel), 4.0, epsilon = 0.01);
}

#[test]
fn weak_motor_torque_is_clamped() {
    let mut world = TestWorld::new();
    let anchor = world.add_body(RigidBody::new());
    let wheel = world.add_body(dynamic_body(Vector::ZERO));

    let max_torque = 0.6;
    let mut joints = [Joint::new(
        anchor,
        wheel,
        RevoluteJoint::new(Vector::ZERO, Vector::ZERO).with_motor(100.0, max_torque),
    )];

    world.step(&mut joints);

    // One tick can add at most max_torque * dt / inertia of angular velocity.
    let limit = max_torque * DT / 1.0;
    assert!(world.angular_velocity(wheel) <= limit + 1.0e-6);
    assert_relative_eq!(
        joints[0].reaction_torque(DT.recip()),
        max_torque,
        epsilon = 1.0e-4
    );
}

#[test]
fn prismatic_joint_allows_motion_along_the_axis_only() {
    let mut world = TestWorld::new();
    let rail = world.add_body(RigidBody::new());
    let slider = world.add_body(dynamic_body(Vector::new(1.0, 0.0)));

    let mut joints = [Joint::new(
        rail,
        slider,
        PrismaticJoint::new(Vector::ZERO, Vector::ZERO, Vector::X),
    )];

    world.set_velocity(slider, Vector::new(2.0, 3.0), 1.0);
    world.step(&mut joints);

    // Off-axis and angular motion is removed, axial motion is preserved.
    assert_relative_eq!(world.velocity(slider).y, 0.0, epsilon = 1.0e-4);
    assert_relative_eq!(world.angular_velocity(slider), 0.0, epsilon = 1.0e-4);
    assert_relative_eq!(world.velocity(slider).x, 2.0, epsilon = 1.0e-4);
}

#[test]
fn prismatic_limits_contain_the_translation() {
    let mut world = TestWorld::new();
    let rail = world.add_body(RigidBody::new());
    let slider = world.add_body(dynamic_body(Vector::ZERO));

    let mut joints = [Joint::new(
        rail,
        slider,
        PrismaticJoint::new(Vector::ZERO, Vector::ZERO, Vector::X)
            .with_translation_limits(-2.0, 2.0),
    )];

    world.set_velocity(slider, Vector::new(20.0, 0.0), 0.0);
    world.step_n(&mut joints, 60);

    let translation = world.position(slider).x;
    assert!(
        translation <= 2.0 + 0.05,
        "translation limit exceeded: {translation}"
    );
}

#[test]
fn prismatic_lower_translation_limit_holds() {
    let mut world = TestWorld::new();
    let rail = world.add_body(RigidBody::new());
    let slider = world.add_body(dynamic_body(Vector::ZERO));

    let mut joints = [Joint::new(
        rail,
        slider,
        PrismaticJoint::new(Vector::ZERO, Vector::ZERO, Vector::X)
            .with_translation_limits(-2.0, 2.0),
    )];

    world.set_velocity(slider, Vector::new(-20.0, 0.0), 0.0);
    world.step_n(&mut joints, 60);

    let translation = world.position(slider).x;
    assert!(
        translation >= -2.0 - 0.05,
        "lower translation limit exceeded: {translation}"
    );
}

#[test]
fn prismatic_motor_drives_the_slider() {
    let mut world = TestWorld::new();
    let rail = world.add_body(RigidBody::new());
    let slider = world.add_body(dynamic_body(Vector::ZERO));

    let mut joints = [Joint::new(
        rail,
        slider,
        PrismaticJoint::new(Vector::ZERO, Vector::ZERO, Vector::X).with_motor(1.5, 100.0),
    )];

    world.step_n(&mut joints, 30);

    assert_relative_eq!(world.velocity(slider).x, 1.5, epsilon = 0.01);
    assert!(world.position(slider).x > 0.0);
}

#[test]
fn friction_joint_brings_a_sliding_body_to_rest() {
    let mut world = TestWorld::new();
    let ground = world.add_body(RigidBody::new());
    let puck = world.add_body(dynamic_body(Vector::ZERO));

    let mut joints = [Joint::new(
        ground,
        puck,
        FrictionJoint::new().with_max_force(10.0).with_max_torque(5.0),
    )];

    world.set_velocity(puck, Vector::new(4.0, 0.0), 2.0);

    let mut previous_speed = world.velocity(puck).length();
    for _ in 0..60 {
        world.step(&mut joints);
        let speed = world.velocity(puck).length();
        assert!(speed <= previous_speed + 1.0e-6, "friction sped the body up");
        previous_speed = speed;
    }

    assert_relative_eq!(world.velocity(puck), Vector::ZERO, epsilon = 1.0e-3);
    assert_relative_eq!(world.angular_velocity(puck), 0.0, epsilon = 1.0e-3);
}

#[test]
fn friction_force_is_capped() {
    let mut world = TestWorld::new();
    let ground = world.add_body(RigidBody::new());
    let puck = world.add_body(dynamic_body(Vector::ZERO));

    let max_force = 6.0;
    let mut joints = [Joint::new(
        ground,
        puck,
        FrictionJoint::new().with_max_force(max_force),
    )];

    world.set_velocity(puck, Vector::new(100.0, 0.0), 0.0);
    world.step(&mut joints);

    let force = joints[0].reaction_force(DT.recip());
    assert!(force.length() <= max_force + 1.0e-4);
}

#[test]
fn mouse_joint_drags_the_body_to_the_target() {
    let mut world = TestWorld::new();
    let reference = world.add_body(RigidBody::new());
    let grabbed = world.add_body(dynamic_body(Vector::ZERO));

    let mouse = MouseJoint::new(&world.bodies[grabbed.index()], Vector::ZERO)
        .with_max_force(1000.0);
    let mut joints = [Joint::new(reference, grabbed, mouse)];

    // Move the target after grabbing, like a dragging cursor.
    if let JointKind::Mouse(mouse) = &mut joints[0].kind {
        mouse.target = Vector::new(2.0, 1.0);
    }

    world.step_n(&mut joints, 240);

    assert_relative_eq!(
        world.position(grabbed),
        Vector::new(2.0, 1.0),
        epsilon = 0.05
    );
}

#[test]
fn weld_joint_removes_all_relative_motion() {
    let mut world = TestWorld::new();
    let base = world.add_body(RigidBody::new());
    let attachment = world
        .add_body(dynamic_body(Vector::new(1.2, 0.3)).with_rotation(Rotation::radians(0.2)));

    // The weld wants the attachment at (1, 0) with zero relative angle.
    let mut joints = [Joint::new(
        base,
        attachment,
        WeldJoint::new(Vector::new(1.0, 0.0), Vector::ZERO),
    )];

    world.step_n(&mut joints, 60);

    assert_relative_eq!(
        world.position(attachment),
        Vector::new(1.0, 0.0),
        epsilon = 0.02
    );
    assert_relative_eq!(world.angle(attachment), 0.0, epsilon = 0.02);
}

#[test]
fn soft_weld_flexes_but_recenters() {
    let mut world = TestWorld::new();
    let base = world.add_body(RigidBody::new());
    let attachment = world.add_body(dynamic_body(Vector::new(1.0, 0.0)));

    let mut joints = [Joint::new(
        base,
        attachment,
        WeldJoint::new(Vector::new(1.0, 0.0), Vector::ZERO).with_spring(4.0, 0.8),
    )];

    // Twist it; the soft angular part should swing back instead of locking.
    world.set_velocity(attachment, Vector::ZERO, 4.0);
    world.step(&mut joints);
    assert!(
        world.angular_velocity(attachment).abs() > 0.5,
        "soft weld should not stop rotation dead"
    );

    world.step_n(&mut joints, 600);
    assert_relative_eq!(world.angle(attachment), 0.0, epsilon = 0.05);
}

#[test]
fn disabled_joints_are_skipped() {
    let mut world = TestWorld::new();
    let a = world.add_body(dynamic_body(Vector::ZERO));
    let b = world.add_body(dynamic_body(Vector::new(10.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0),
    )];
    joints[0].enabled = false;

    world.step_n(&mut joints, 10);

    // Nothing moved.
    assert_eq!(world.position(a), Vector::ZERO);
    assert_eq!(world.position(b), Vector::new(10.0, 0.0));
}

#[test]
fn solve_joints_reports_convergence() {
    let mut world = TestWorld::new();
    let a = world.add_body(dynamic_body(Vector::ZERO));
    let b = world.add_body(dynamic_body(Vector::new(5.0, 0.0)));

    let mut joints = [Joint::new(
        a,
        b,
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0),
    )];

    let settings = world.settings;
    let mut data = SolverData {
        frame_time: DT,
        inv_dt: DT.recip(),
        dt_ratio: 1.0,
        warm_starting: settings.warm_starting,
        linear_slop: settings.linear_slop,
        angular_slop: settings.angular_slop,
        max_linear_correction: settings.max_linear_correction,
        max_angular_correction: settings.max_angular_correction,
        island_offset: 0,
        positions: &mut world.positions,
        angles: &mut world.angles,
        linear_velocities: &mut world.linear_velocities,
        angular_velocities: &mut world.angular_velocities,
    };

    let solved = solve_joints(
        &mut joints,
        &world.bodies,
        &mut data,
        settings.velocity_iterations,
        settings.position_iterations,
    );

    assert!(solved, "a satisfied constraint should solve immediately");
}

#[test]
fn island_offset_addresses_packed_arrays() {
    // Two islands packed into the same arrays; the joint lives in the second.
    let body_a = RigidBody::new()
        .with_mass(1.0)
        .with_angular_inertia(1.0)
        .with_island_index(0);
    let body_b = RigidBody::new()
        .with_position(Vector::new(10.0, 0.0))
        .with_mass(1.0)
        .with_angular_inertia(1.0)
        .with_island_index(1);
    let bodies = [body_a, body_b];

    let offset = 3;
    let mut positions = vec![Vector::ZERO; offset + 2];
    let mut angles = vec![0.0; offset + 2];
    let mut linear_velocities = vec![Vector::ZERO; offset + 2];
    let mut angular_velocities = vec![0.0; offset + 2];
    positions[offset] = body_a.position;
    positions[offset + 1] = body_b.position;

    let settings = SolverSettings::default();
    let mut data = SolverData {
        frame_time: DT,
        inv_dt: DT.recip(),
        dt_ratio: 1.0,
        warm_starting: settings.warm_starting,
        linear_slop: settings.linear_slop,
        angular_slop: settings.angular_slop,
        max_linear_correction: settings.max_linear_correction,
        max_angular_correction: settings.max_angular_correction,
        island_offset: offset,
        positions: &mut positions,
        angles: &mut angles,
        linear_velocities: &mut linear_velocities,
        angular_velocities: &mut angular_velocities,
    };

    let mut joints = [Joint::new(
        BodyId(0),
        BodyId(1),
        DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0),
    )];

    solve_joints(
        &mut joints,
        &bodies,
        &mut data,
        settings.velocity_iterations,
        settings.position_iterations,
    );

    // Only the slots of the second island changed.
    assert!(positions[..offset].iter().all(|&p| p == Vector::ZERO));
    let separation = positions[offset + 1].distance(positions[offset]);
    assert_relative_eq!(separation, 5.0, epsilon = 0.01);
}

#[test]
fn warm_starting_reapplies_the_accumulated_impulse() {
    // A spring in steady tension: with warm starting the solver starts at
    // the converged impulse, so one extra tick barely changes velocities.
    let run = |warm_starting: bool| -> Scalar {
        let mut world = TestWorld::new();
        world.settings.warm_starting = warm_starting;
        world.settings.velocity_iterations = 1;

        let a = world.add_body(RigidBody::new());
        let b = world.add_body(dynamic_body(Vector::new(10.0, 0.0)));

        let mut joints = [Joint::new(
            a,
            b,
            DistanceJoint::new(Vector::ZERO, Vector::ZERO, 5.0),
        )];

        world.set_velocity(b, Vector::new(5.0, 0.0), 0.0);
        world.step_n(&mut joints, 5);
        world.velocity(b).length()
    };

    // With a single velocity iteration, warm starting converges the
    // constraint where cold starting still leaves residual velocity error.
    let warm = run(true);
    let cold = run(false);
    assert!(
        warm <= cold + 1.0e-6,
        "warm starting should not converge slower: warm {warm}, cold {cold}"
    );
}
