use std::cell::RefCell;
use std::rc::Rc;

use kinemix_animation_core::{
    share, AnimationController, AnimationError, AnimationId, AnimationKind, Config,
    EngineEvent, Engine, FnTarget, Pose, PoseBlender, RepeatMode, SharedSkeleton, Skeleton,
    SkeletonAnimation, SkeletonClip,
};
use kinemix_test_fixtures::clips;

struct Rig {
    pose: Pose,
}

impl Skeleton for Rig {
    fn bone_count(&self) -> usize {
        self.pose.bone_count()
    }
    fn pose(&self) -> &Pose {
        &self.pose
    }
    fn pose_mut(&mut self) -> &mut Pose {
        &mut self.pose
    }
    fn notify_pose_changed(&mut self) {}
}

fn recorder(duration: f32) -> (AnimationController<FnTarget<impl FnMut(f32)>>, Rc<RefCell<Vec<f32>>>) {
    let ratios = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&ratios);
    let c = AnimationController::new(FnTarget(move |r: f32| sink.borrow_mut().push(r)), duration)
        .unwrap();
    (c, ratios)
}

fn clip(name: &str) -> SkeletonClip {
    clips::load(name).unwrap()
}

fn close(a: &[f32], b: &[f32]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= 1e-4)
}

#[test]
fn finished_animations_are_reported_and_removed() {
    let mut engine = Engine::default();
    let (mut c, ratios) = recorder(1.0);
    c.set_name("fade");
    let id = engine.start(c);
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.get(id).unwrap().kind(), AnimationKind::Generic);

    let events = engine.tick(0.5).events.clone();
    assert_eq!(
        events,
        vec![EngineEvent::AnimationStarted {
            id,
            name: Some("fade".into())
        }]
    );
    assert!(engine.contains(id));

    let events = engine.tick(0.5).events.clone();
    assert_eq!(
        events,
        vec![EngineEvent::AnimationFinished {
            id,
            name: Some("fade".into())
        }]
    );
    assert!(engine.is_empty());
    assert!(engine.get(id).is_none());
    assert_eq!(*ratios.borrow(), vec![0.5, 1.0]);

    assert!(engine.tick(0.5).is_empty());
}

#[test]
fn repeats_are_reported_per_cycle() {
    let mut engine = Engine::default();
    let (mut c, _) = recorder(1.0);
    c.set_repeat_mode(RepeatMode::Repeated).set_repeat_count(1);
    let id = engine.start(c);

    engine.tick(0.75);
    let events = engine.tick(0.5).events.clone();
    assert_eq!(
        events,
        vec![EngineEvent::AnimationRepeated { id, iteration: 1 }]
    );
    assert_eq!(engine.get(id).unwrap().iteration_count(), 1);

    let events = engine.tick(1.0).events.clone();
    assert!(matches!(events.as_slice(), [EngineEvent::AnimationFinished { .. }]));
}

#[test]
fn stop_removes_without_final_apply() {
    let mut engine = Engine::default();
    let (c, ratios) = recorder(2.0);
    let id = engine.start(c);
    engine.tick(0.5);

    let stopped = engine.stop(id).unwrap();
    assert!(!stopped.is_finished());
    assert!(engine.is_empty());
    assert_eq!(*ratios.borrow(), vec![0.25]);
    assert_eq!(
        engine.tick(0.5).events,
        vec![EngineEvent::AnimationStopped { id }]
    );

    assert_eq!(
        engine.stop(id).err(),
        Some(AnimationError::AnimationNotFound { id: id.0 })
    );
}

#[test]
fn frame_delta_is_clamped() {
    let mut engine = Engine::new(Config {
        max_frame_delta: Some(0.1),
        ..Config::default()
    });
    let (c, ratios) = recorder(1.0);
    engine.start(c);
    engine.tick(5.0);
    assert!((ratios.borrow()[0] - 0.1).abs() < 1e-6);
}

#[test]
fn ids_follow_start_order() {
    let mut engine = Engine::default();
    let a = engine.start(recorder(1.0).0);
    let b = engine.start(recorder(1.0).0);
    assert!(a < b);
    assert_eq!(engine.ids().collect::<Vec<AnimationId>>(), vec![a, b]);
}

struct Walkthrough {
    engine: Engine,
    skeleton: SharedSkeleton<Rig>,
    blender: AnimationId,
    walk: AnimationId,
}

fn walking() -> Walkthrough {
    let skeleton = share(Rig { pose: Pose::new(3) });
    let mut engine = Engine::default();
    // started first on purpose: blenders always tick after clips
    let blender = engine.start(PoseBlender::new(skeleton.clone()).unwrap());

    let mut walk = AnimationController::new(
        SkeletonAnimation::new(clip("walk"), skeleton.clone()),
        1.0,
    )
    .unwrap();
    walk.set_repeat_mode(RepeatMode::Repeated)
        .set_repeat_count(-1)
        .set_name("walk");
    let walk = engine.start(walk);
    engine.tick(0.5);
    Walkthrough {
        engine,
        skeleton,
        blender,
        walk,
    }
}

#[test]
fn crossfade_walk_to_run() {
    let Walkthrough {
        mut engine,
        skeleton,
        blender,
        walk,
    } = walking();
    assert!(close(&skeleton.borrow().pose.bones()[0].position, &[0.0, 0.1, 0.5]));

    let run = engine.start(
        AnimationController::new(SkeletonAnimation::new(clip("run"), skeleton.clone()), 0.6)
            .unwrap(),
    );
    engine.crossfade(blender, walk, run, 0.3).unwrap();

    let events = engine.tick(0.15).events.clone();
    assert!(events.contains(&EngineEvent::BlendStarted {
        blender,
        from: walk,
        to: run,
        duration: 0.3
    }));
    {
        let sk = skeleton.borrow();
        let bones = sk.pose.bones();
        assert!(close(&bones[0].position, &[0.0, 0.05, 0.25]), "{:?}", bones[0]);
    }

    let events = engine.tick(0.15).events.clone();
    assert_eq!(events, vec![EngineEvent::BlendEnded { blender }]);
    {
        let sk = skeleton.borrow();
        let bones = sk.pose.bones();
        assert!(close(&bones[0].position, &[0.0; 3]));
        assert!(close(&bones[1].rotation, &[0.0, 0.0, 0.5, 0.8660254]));
    }

    // the blend is over: stop the outgoing clip and let run drive alone
    engine.stop(walk).unwrap();
    engine.tick(0.1);
    let sk = skeleton.borrow();
    let expected = [0.0, 0.2 * (2.0 / 3.0), 1.0 + 1.0 / 3.0];
    assert!(close(&sk.pose.bones()[0].position, &expected), "{:?}", sk.pose.bones()[0]);
}

#[test]
fn crossfade_checks_capabilities() {
    let Walkthrough {
        mut engine,
        skeleton,
        blender,
        walk,
    } = walking();
    let generic = engine.start(recorder(1.0).0);
    let run = engine.start(
        AnimationController::new(SkeletonAnimation::new(clip("run"), skeleton.clone()), 0.6)
            .unwrap(),
    );

    let err = engine.crossfade(generic, walk, run, 0.3).unwrap_err();
    assert!(matches!(err, AnimationError::MissingCapability { ref capability, .. } if capability == "crossfade"));

    let err = engine.crossfade(blender, generic, run, 0.3).unwrap_err();
    assert!(matches!(err, AnimationError::MissingCapability { .. }));
    assert_eq!(err.category(), "consumer");

    assert_eq!(
        engine.crossfade(blender, walk, walk, 0.3).unwrap_err(),
        AnimationError::CrossfadeAlias { id: walk.0 }
    );
    assert_eq!(
        engine.crossfade(blender, blender, run, 0.3).unwrap_err(),
        AnimationError::CrossfadeAlias { id: blender.0 }
    );
    assert_eq!(
        engine.crossfade(blender, walk, AnimationId(999), 0.3).unwrap_err(),
        AnimationError::AnimationNotFound { id: 999 }
    );

    // nothing started, so the next tick reports no blend
    let events = engine.tick(0.0).events.clone();
    assert!(!events
        .iter()
        .any(|e| matches!(e, EngineEvent::BlendStarted { .. })));
}
