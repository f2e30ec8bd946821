use super::*;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "stillreel_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(dir: &Path, name: &str, bytes: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![7u8; bytes]).unwrap();
    path
}

#[test]
fn all_empty_images_fail_with_asset_error() {
    let dir = temp_dir("assets_all_empty");
    let images: Vec<PathBuf> = (0..4)
        .map(|i| write_file(&dir, &format!("img{i}.png"), 0))
        .collect();

    let err = AssetValidator::new(1024)
        .validate(&images, None)
        .unwrap_err();
    assert!(matches!(err, AssemblyError::Asset(_)));
    assert!(err.to_string().contains("no valid images"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn keeps_valid_images_in_relative_order() {
    let dir = temp_dir("assets_order");
    let images = vec![
        write_file(&dir, "a.png", 4096),
        write_file(&dir, "b.png", 0),
        write_file(&dir, "c.JPG", 2048),
        write_file(&dir, "d.txt", 4096),
        write_file(&dir, "e.webp", 1500),
    ];

    let set = AssetValidator::new(1024).validate(&images, None).unwrap();
    assert_eq!(
        set.images,
        vec![images[0].clone(), images[2].clone(), images[4].clone()]
    );
    assert_eq!(set.audio, None);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn size_floor_is_exclusive() {
    let dir = temp_dir("assets_floor");
    let exact = write_file(&dir, "exact.png", 1024);
    let above = write_file(&dir, "above.png", 1025);

    let v = AssetValidator::new(1024);
    assert_eq!(
        v.check_image(&exact),
        Err(Rejection::TooSmall { bytes: 1024 })
    );
    assert_eq!(v.check_image(&above), Ok(()));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_image_is_rejected() {
    let v = AssetValidator::new(1024);
    assert_eq!(
        v.check_image(Path::new("does/not/exist.png")),
        Err(Rejection::Missing)
    );
}

#[test]
fn invalid_audio_degrades_to_video_only() {
    let dir = temp_dir("assets_audio");
    let images = vec![write_file(&dir, "a.png", 4096)];
    let tiny_audio = write_file(&dir, "voice.mp3", 10);
    let wrong_type = write_file(&dir, "voice.txt", 4096);
    let good_audio = write_file(&dir, "voice.WAV", 4096);

    let v = AssetValidator::new(1024);
    assert_eq!(v.validate(&images, Some(&tiny_audio)).unwrap().audio, None);
    assert_eq!(v.validate(&images, Some(&wrong_type)).unwrap().audio, None);
    assert_eq!(
        v.validate(&images, Some(&good_audio)).unwrap().audio,
        Some(good_audio.clone())
    );

    std::fs::remove_dir_all(&dir).ok();
}
