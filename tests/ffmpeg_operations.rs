use chaos_cut::agent::production_tools::{get_media_duration, FfmpegTranscoder, MediaTranscoder};
use chaos_cut::config::ExtractMode;
use std::path::Path;
use std::process::Command;

fn ffmpeg_available() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}

/// testsrc pattern with a sine track, one keyframe per frame so copies cut cleanly.
fn make_test_video(path: &Path, seconds: u32) {
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={}:size=320x240:rate=30", seconds),
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=60:duration={}", seconds),
            "-c:v",
            "libx264",
            "-g",
            "1",
            "-c:a",
            "aac",
            "-shortest",
        ])
        .arg(path)
        .output()
        .expect("Failed to execute ffmpeg");

    if !status.status.success() {
        eprintln!("FFmpeg stderr: {}", String::from_utf8_lossy(&status.stderr));
        panic!("Failed to create dummy video");
    }
}

#[tokio::test]
async fn test_trim_video_integration() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not installed, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    make_test_video(&input, 5);

    for mode in [ExtractMode::FrameAccurate, ExtractMode::FastCopy] {
        let output = dir.path().join(format!("trim_{:?}.mp4", mode));
        let transcoder = FfmpegTranscoder::new(mode);
        transcoder.trim(&input, 1.0, 2.0, &output).await.unwrap();

        let duration = transcoder.probe_duration(&output).await.unwrap();
        assert!(
            (duration - 2.0).abs() < 0.5,
            "{:?}: duration should be approx 2.0s, got {}",
            mode,
            duration
        );
    }
}

#[tokio::test]
async fn test_concat_and_mux_integration() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not installed, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    make_test_video(&input, 4);

    let transcoder = FfmpegTranscoder::default();
    let mut segments = Vec::new();
    for (i, start) in [0.0, 2.0].iter().enumerate() {
        let seg = dir.path().join(format!("seg_{:04}.mp4", i));
        transcoder.trim(&input, *start, 1.0, &seg).await.unwrap();
        segments.push(seg);
    }

    let concat = dir.path().join("concat.mp4");
    transcoder.concat(&segments, &concat).await.unwrap();
    let joined = get_media_duration(&concat).await.unwrap();
    assert!((joined - 2.0).abs() < 0.5, "concat duration {}", joined);
    assert!(!dir.path().join("concat.concat_manifest.txt").exists());

    let muxed = dir.path().join("compiled.mp4");
    let result = transcoder.mux_audio(&concat, &input, &muxed).await.unwrap();
    assert!(result.output_path.exists());
    assert!(result.size_mb > 0.0);
    let final_len = get_media_duration(&muxed).await.unwrap();
    assert!(final_len <= joined + 0.5, "mux should stop at the shorter stream");
}

#[tokio::test]
async fn test_duration_of_missing_file_fails() {
    if !ffmpeg_available() {
        return;
    }
    assert!(get_media_duration(Path::new("/no/such/file.mp4")).await.is_err());
}
