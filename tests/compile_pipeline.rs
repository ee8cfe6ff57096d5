mod common;

use chaos_cut::agent::audio_tools::read_hits_file;
use chaos_cut::agent::compiler::{VideoCompiler, CONCAT_FILE, HITS_FILE, SEGMENTS_DIR};
use chaos_cut::{ChaosConfig, ChaosError};
use common::{FakeAnalyzer, FakeTranscoder};
use std::path::Path;

fn project(dir: &Path, clips: &[(&str, f64)]) -> FakeTranscoder {
    std::fs::write(dir.join("audio.mp3"), b"mp3").unwrap();
    let mut transcoder = FakeTranscoder::new();
    for (name, duration) in clips {
        let path = dir.join(name);
        std::fs::write(&path, b"video").unwrap();
        transcoder = transcoder.with_source(path, *duration);
    }
    transcoder
}

fn seeded() -> ChaosConfig {
    ChaosConfig {
        seed: Some(7),
        ..ChaosConfig::default()
    }
}

#[tokio::test]
async fn test_full_compile_with_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let transcoder = project(dir.path(), &[("a.mov", 30.0), ("b.mp4", 20.0), ("short.mp4", 2.0)]);
    let analyzer = FakeAnalyzer {
        onsets: vec![0.0, 0.1, 1.0, 2.0, 3.5, 5.0],
        duration: 8.0,
    };
    let config = ChaosConfig {
        delete_small_files: true,
        write_diagnostics: true,
        ..seeded()
    };

    let compiler = VideoCompiler::new(dir.path(), config, transcoder, analyzer);
    let summary = compiler.compile().await.unwrap();

    assert_eq!(summary.hits, 6);
    assert_eq!(summary.plans, 5);
    assert_eq!(summary.delivered, 5);
    assert!(summary.failed.is_empty());

    let output = summary.output.expect("muxed output");
    assert!(output.exists());
    let name = output.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("compiled_"));

    let hits = read_hits_file(&dir.path().join(HITS_FILE)).await.unwrap();
    assert_eq!(hits, vec![0.0, 1.0, 2.0, 3.5, 5.0, 8.0]);

    assert!(dir.path().join("bass_report_20_150.json").exists());
    assert!(!dir.path().join("short.mp4").exists(), "short clip should be deleted");
    assert!(!dir.path().join(SEGMENTS_DIR).exists());
    assert!(!dir.path().join(CONCAT_FILE).exists());
}

#[tokio::test]
async fn test_compile_from_saved_hits_without_audio_stage() {
    let dir = tempfile::tempdir().unwrap();
    let transcoder = project(dir.path(), &[("a.mov", 30.0)]);
    std::fs::write(dir.path().join(HITS_FILE), "0\n1\n2.5\n").unwrap();
    let analyzer = FakeAnalyzer {
        onsets: vec![],
        duration: 0.0,
    };
    let config = ChaosConfig {
        enable_bass_detection: false,
        enable_add_audio: false,
        enable_cleanup: false,
        ..seeded()
    };

    let summary = VideoCompiler::new(dir.path(), config, transcoder, analyzer)
        .compile()
        .await
        .unwrap();

    assert_eq!(summary.plans, 2);
    assert_eq!(summary.delivered, 2);
    assert_eq!(summary.output, Some(dir.path().join(CONCAT_FILE)));

    let listing = std::fs::read_to_string(dir.path().join(CONCAT_FILE)).unwrap();
    assert_eq!(listing, "seg_0000.mp4\nseg_0001.mp4");
    assert!(dir.path().join(SEGMENTS_DIR).join("seg_0001.mp4").exists());
}

#[tokio::test]
async fn test_single_hit_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let transcoder = project(dir.path(), &[("a.mov", 30.0)]);
    let analyzer = FakeAnalyzer {
        onsets: vec![1.0],
        duration: 1.0,
    };

    let err = VideoCompiler::new(dir.path(), seeded(), transcoder, analyzer)
        .compile()
        .await
        .unwrap_err();
    match err.downcast_ref::<ChaosError>() {
        Some(ChaosError::InsufficientOnsets { found }) => assert_eq!(*found, 1),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_folder_without_usable_clips_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let transcoder = project(dir.path(), &[("tiny.mov", 3.0)]);
    let analyzer = FakeAnalyzer {
        onsets: vec![0.0, 1.0, 2.0],
        duration: 2.0,
    };

    let err = VideoCompiler::new(dir.path(), seeded(), transcoder, analyzer)
        .compile()
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<ChaosError>(), Some(ChaosError::EmptyPool)));
    assert!(dir.path().join("tiny.mov").exists(), "not deleted unless asked");
}

#[tokio::test]
async fn test_invalid_config_refused() {
    let dir = tempfile::tempdir().unwrap();
    let transcoder = project(dir.path(), &[("a.mov", 30.0)]);
    let analyzer = FakeAnalyzer {
        onsets: vec![0.0, 1.0],
        duration: 1.0,
    };
    let config = ChaosConfig {
        min_clip: 6.0,
        ..seeded()
    };

    let err = VideoCompiler::new(dir.path(), config, transcoder, analyzer)
        .compile()
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<ChaosError>(), Some(ChaosError::InvalidConfig(_))));
}
