use kinemix_animation_core::{parse_skeleton_clip_json, AnimationError, Pose, SkeletonClip};
use kinemix_test_fixtures::clips;

fn close(a: &[f32], b: &[f32]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= 1e-5)
}

#[test]
fn all_fixture_clips_parse() {
    let names = clips::keys();
    assert_eq!(names, vec!["run", "walk", "wave"]);
    for name in names {
        let json = clips::json(&name).unwrap();
        let clip = parse_skeleton_clip_json(&json).unwrap();
        assert_eq!(clip.name(), name);
        assert_eq!(clip.bone_count(), 3);
        assert!(clip.duration() > 0.0);
    }
    assert_eq!(clips::skeleton("walk").unwrap().as_deref(), Some("biped3"));
    assert_eq!(clips::skeleton("wave").unwrap(), None);
}

#[test]
fn walk_pose_between_keys() {
    let mut clip: SkeletonClip = clips::load("walk").unwrap();
    let mut pose = Pose::new(3);
    clip.compute_pose(0.25, &mut pose).unwrap();
    let bones = pose.bones();
    assert!(close(&bones[0].position, &[0.0, 0.05, 0.25]));
    // bone 2 has no channel and keeps the identity transform
    assert_eq!(bones[2], Pose::new(3).bones()[2]);
}

#[test]
fn wave_peaks_at_ninety_degrees() {
    let mut clip: SkeletonClip = clips::load("wave").unwrap();
    let mut pose = Pose::new(3);
    clip.compute_pose(1.0, &mut pose).unwrap();
    let h = std::f32::consts::FRAC_1_SQRT_2;
    assert!(close(&pose.bones()[2].rotation, &[0.0, 0.0, h, h]));

    // past the end: clamped to the last key
    clip.compute_pose(5.0, &mut pose).unwrap();
    assert!(close(&pose.bones()[2].rotation, &[0.0, 0.0, 0.0, 1.0]));
}

#[test]
fn pose_size_must_match_clip() {
    let mut clip: SkeletonClip = clips::load("run").unwrap();
    let mut pose = Pose::new(2);
    assert_eq!(
        clip.compute_pose(0.0, &mut pose).unwrap_err(),
        AnimationError::BoneCountMismatch {
            expected: 3,
            actual: 2
        }
    );
}

#[test]
fn clip_json_round_trip() {
    let clip: SkeletonClip = clips::load("run").unwrap();
    let json = serde_json::to_string(&clip).unwrap();
    let back = parse_skeleton_clip_json(&json).unwrap();
    assert_eq!(back.name(), "run");
    assert_eq!(back.duration(), clip.duration());
    assert_eq!(back.channels().len(), 2);
    assert!(json.contains("\"boneCount\":3"));
    assert!(json.contains("\"floatsPerKey\":5"));
}

#[test]
fn invalid_clips_are_rejected() {
    let err = parse_skeleton_clip_json("{ not json").unwrap_err();
    assert_eq!(err.category(), "data");

    let out_of_range = r#"{
        "name": "bad", "duration": 1.0, "boneCount": 2,
        "channels": [{ "bone": 5 }]
    }"#;
    let err = parse_skeleton_clip_json(out_of_range).unwrap_err();
    assert!(err.to_string().contains("Bone 5 is out of range"), "{err}");

    let linear_rotation = r#"{
        "name": "bad", "duration": 1.0, "boneCount": 1,
        "channels": [{ "bone": 0, "rotation": { "kind": "linear", "floatsPerKey": 5, "keys": [0, 0, 0, 0, 1] } }]
    }"#;
    assert!(parse_skeleton_clip_json(linear_rotation).is_err());

    let zero_duration = r#"{ "name": "bad", "duration": 0.0, "boneCount": 1, "channels": [] }"#;
    assert!(parse_skeleton_clip_json(zero_duration).is_err());
}
