use super::*;

fn assets(n: usize) -> ValidatedAssetSet {
    ValidatedAssetSet {
        images: (0..n).map(|i| PathBuf::from(format!("img{i}.png"))).collect(),
        audio: None,
    }
}

fn builder() -> TimelineBuilder {
    TimelineBuilder::from_config(&EngineConfig::default())
}

#[test]
fn scenes_partition_the_total_duration() {
    let cfg = EngineConfig::default();
    for words in [None, Some(0), Some(300), Some(451), Some(617), Some(5_000)] {
        for n in 1..=64 {
            let tl = TimelineBuilder::from_config(&cfg).build(&assets(n), words, Style::Folklore);
            assert_eq!(tl.scenes.len(), n);

            let sum: f64 = tl.scenes.iter().map(|s| s.duration).sum();
            assert!((sum - tl.total_duration).abs() < 1e-3, "n={n} sum={sum}");

            assert_eq!(tl.scenes[0].start_time, 0.0);
            assert_eq!(tl.scenes[n - 1].end_time, tl.total_duration);
            for (i, pair) in tl.scenes.windows(2).enumerate() {
                assert_eq!(pair[0].end_time, pair[1].start_time, "gap after scene {i}");
            }
            for (i, s) in tl.scenes.iter().enumerate() {
                assert_eq!(s.index, i);
                assert!(s.duration > 0.0);
            }
        }
    }
}

#[test]
fn duration_is_clamped_to_configured_range() {
    let b = builder();
    assert_eq!(b.total_duration(Some(100)), 120.0);
    assert_eq!(b.total_duration(Some(300)), 120.0);
    assert_eq!(b.total_duration(Some(450)), 180.0);
    assert_eq!(b.total_duration(Some(600)), 240.0);
    assert_eq!(b.total_duration(Some(2_000)), 300.0);
    assert_eq!(b.total_duration(None), 180.0);
}

#[test]
fn positions_mark_first_and_last_scene() {
    let tl = builder().build(&assets(4), Some(300), Style::Mysterious);
    let positions: Vec<ScenePosition> = tl.scenes.iter().map(|s| s.effects.position).collect();
    assert_eq!(
        positions,
        vec![
            ScenePosition::Start,
            ScenePosition::Middle,
            ScenePosition::Middle,
            ScenePosition::End
        ]
    );

    let single = builder().build(&assets(1), None, Style::Mysterious);
    assert_eq!(single.scenes[0].effects.position, ScenePosition::Start);
    assert_eq!(single.scenes[0].duration, 180.0);
}

#[test]
fn effects_follow_style_and_transition_is_constant() {
    let slow = builder().build(&assets(3), None, Style::Horror);
    assert!(slow.scenes.iter().all(|s| s.effects.fade && s.effects.zoom));
    assert!(slow.scenes.iter().all(|s| s.transition == TransitionKind::Fade));

    let fast = builder().build(&assets(3), None, Style::Energetic);
    assert!(fast.scenes.iter().all(|s| !s.effects.fade && !s.effects.zoom));
    assert!(fast.scenes.iter().all(|s| s.transition == TransitionKind::Slide));

    assert_eq!(slow.transition_duration, 1.0);
    assert_eq!(fast.transition_duration, 1.0);
}

#[test]
fn five_images_over_three_hundred_words_are_24_seconds_each() {
    let tl = builder().build(&assets(5), Some(300), Style::Scientific);
    assert_eq!(tl.total_duration, 120.0);
    assert_eq!(tl.image_duration, 24.0);
    for s in &tl.scenes {
        assert!((s.duration - 24.0).abs() < 1e-9);
    }
}

#[test]
fn audio_is_carried_into_the_timeline() {
    let mut a = assets(2);
    a.audio = Some(PathBuf::from("voice.mp3"));
    let tl = builder().build(&a, None, Style::Documentary);
    assert!(tl.has_audio());
    assert_eq!(tl.audio, Some(PathBuf::from("voice.mp3")));
}
