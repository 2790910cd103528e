use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kinemix_animation_core::{
    share, AnimationController, Engine, KeyframeTrack, Pose, PoseBlender, RepeatMode, Skeleton,
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

fn dense_track(keys: usize) -> KeyframeTrack {
    let data: Vec<(f32, [f32; 3])> = (0..keys)
        .map(|i| {
            let t = i as f32 / 30.0;
            (t, [t.sin(), t.cos(), t])
        })
        .collect();
    KeyframeTrack::vec3(&data).expect("valid track")
}

fn bench_track_sampling(c: &mut Criterion) {
    let mut track = dense_track(600);
    let duration = track.duration();
    let mut out = [0.0f32; 3];

    c.bench_function("track_sweep_cached", |b| {
        b.iter(|| {
            for i in 0..600 {
                let t = duration * i as f32 / 600.0;
                track.sample_into(black_box(t), &mut out);
            }
            black_box(out)
        })
    });

    c.bench_function("track_sweep_uncached", |b| {
        b.iter(|| {
            for i in 0..600 {
                let t = duration * i as f32 / 600.0;
                track.sample_uncached(black_box(t), &mut out);
            }
            black_box(out)
        })
    });
}

fn bench_engine_crossfade(c: &mut Criterion) {
    let walk: SkeletonClip = clips::load("walk").expect("walk fixture");
    let run: SkeletonClip = clips::load("run").expect("run fixture");

    c.bench_function("engine_tick_crossfade", |b| {
        b.iter_batched(
            || {
                let skeleton = share(Rig { pose: Pose::new(3) });
                let mut engine = Engine::default();
                let blender = engine.start(PoseBlender::new(skeleton.clone()).expect("blender"));
                let mut w = AnimationController::new(
                    SkeletonAnimation::new(walk.clone(), skeleton.clone()),
                    walk.duration(),
                )
                .expect("walk controller");
                w.set_repeat_mode(RepeatMode::Repeated).set_repeat_count(-1);
                let w = engine.start(w);
                let r = engine.start(
                    AnimationController::new(
                        SkeletonAnimation::new(run.clone(), skeleton),
                        run.duration(),
                    )
                    .expect("run controller"),
                );
                engine.tick(0.5);
                engine.crossfade(blender, w, r, 0.5).expect("crossfade");
                engine
            },
            |mut engine| {
                for _ in 0..30 {
                    black_box(engine.tick(1.0 / 60.0));
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_track_sampling, bench_engine_crossfade);
criterion_main!(benches);
