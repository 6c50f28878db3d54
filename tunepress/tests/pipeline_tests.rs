//! End-to-end pipeline tests
//!
//! Drive the batch driver against temp directories with a canned ffprobe stand-in.

mod helpers;

use std::time::{Duration, SystemTime};

use helpers::{
    backdate, flac_probe_json, read_record, set_mtime, test_driver, write_audio_file, FakeProber,
};
use tunepress::models::AudioFormat;
use tunepress::services::metadata_extractor::MetadataExtractor;
use tunepress::{BatchDriver, BatchError, BatchOptions};
use tunepress_common::build_dates::{BuildDateStore, JsonFileBuildDateStore};

fn song_tags(title: &str) -> Vec<(&str, &str)> {
    vec![
        ("TITLE", title),
        ("ARTIST", "Test Artist"),
        ("ALBUM", "Test Album"),
        ("DATE", "2024"),
        ("GENRE", "Electronic; Ambient"),
        ("COMMENT", "Recorded at home"),
    ]
}

#[tokio::test]
async fn second_run_performs_no_write() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");
    let audio = write_audio_file(dir.path(), "track.flac");
    backdate(&audio);

    let prober = FakeProber::new().with_output("track.flac", flac_probe_json(&song_tags("Track"), 180.0));

    let first = test_driver(prober.clone(), &out, false).run(&audio).await.unwrap();
    assert_eq!(first.generated, vec![out.join("track.md")]);

    let record = out.join("track.md");
    let before = std::fs::read(&record).unwrap();
    let mtime_before = std::fs::metadata(&record).unwrap().modified().unwrap();

    let second = test_driver(prober, &out, false).run(&audio).await.unwrap();
    assert!(second.generated.is_empty());
    assert_eq!(second.skipped, vec![record.clone()]);

    assert_eq!(std::fs::read(&record).unwrap(), before);
    assert_eq!(std::fs::metadata(&record).unwrap().modified().unwrap(), mtime_before);
}

#[tokio::test]
async fn manual_edits_survive_regeneration() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");
    let audio = write_audio_file(dir.path(), "track.flac");
    backdate(&audio);

    let prober = FakeProber::new().with_output("track.flac", flac_probe_json(&song_tags("Track"), 180.0));
    test_driver(prober, &out, false).run(&audio).await.unwrap();

    // Hand-edit the record
    let record = out.join("track.md");
    let (content, _) = read_record(&record);
    let edited = content
        .replacen("---\n", "---\npublishDate: '2024-09-01'\n", 1)
        .replace("description: Recorded at home", "description: Written by hand");
    std::fs::write(&record, edited).unwrap();

    // Retag the audio and make it newer than the record
    let mut tags = song_tags("Track");
    tags.push(("COMPOSER", "New Composer"));
    let prober = FakeProber::new().with_output("track.flac", flac_probe_json(&tags, 200.4));
    set_mtime(&audio, SystemTime::now() + Duration::from_secs(60));

    let report = test_driver(prober, &out, false).run(&audio).await.unwrap();
    assert_eq!(report.generated, vec![record.clone()]);

    let (content, front) = read_record(&record);
    assert_eq!(front.description.as_deref(), Some("Written by hand"));
    assert_eq!(front.publish_date.as_deref(), Some("2024-09-01"));
    assert_eq!(front.date.as_deref(), Some("2024-01-01"));
    assert_eq!(front.extra["duration"].as_u64(), Some(200));
    assert!(content.contains("**Composer:** New Composer"));
    assert!(content.contains("Written by hand"));
}

#[tokio::test]
async fn free_form_date_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let audio = write_audio_file(dir.path(), "dated.flac");

    let tags = vec![("TITLE", "Dated"), ("DATE", "August 26, 2024")];
    let prober = FakeProber::new().with_output("dated.flac", flac_probe_json(&tags, 60.0));

    let out = dir.path().join("records");
    test_driver(prober, &out, false).run(&audio).await.unwrap();

    let (_, front) = read_record(&out.join("dated.md"));
    assert_eq!(front.date.as_deref(), Some("2024-08-26"));
    assert_eq!(front.created_date.as_deref(), Some("2024-08-26"));
}

#[tokio::test]
async fn record_named_after_title_slug() {
    let dir = tempfile::tempdir().unwrap();
    let audio = write_audio_file(dir.path(), "01.flac");

    let tags = vec![("TITLE", "Song Title: With Special Characters! & Symbols")];
    let prober = FakeProber::new().with_output("01.flac", flac_probe_json(&tags, 60.0));

    let out = dir.path().join("records");
    let report = test_driver(prober, &out, false).run(&audio).await.unwrap();

    assert_eq!(
        report.generated,
        vec![out.join("song-title-with-special-characters-symbols.md")]
    );
}

#[tokio::test]
async fn extensionless_vorbis_is_ogg() {
    let dir = tempfile::tempdir().unwrap();
    let audio = write_audio_file(dir.path(), "recording");

    let json = r#"{
        "streams": [{"codec_type": "audio", "codec_name": "vorbis", "sample_rate": "48000", "channels": 1}],
        "format": {"duration": "12.0", "tags": {}}
    }"#;
    let extractor = MetadataExtractor::new(FakeProber::new().with_output("recording", json));

    let meta = extractor.extract(&audio).await.unwrap();
    assert_eq!(meta.format, AudioFormat::Ogg);
    assert_eq!(meta.mime_type, "audio/ogg");
    assert_eq!(meta.channel_label(), "Mono");
    assert_eq!(meta.bit_depth, None);
}

#[tokio::test]
async fn one_failing_file_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    std::fs::create_dir(&music).unwrap();
    write_audio_file(&music, "a.flac");
    let broken = write_audio_file(&music, "b.flac");
    write_audio_file(&music, "c.mp3");
    write_audio_file(&music, "notes.txt");

    let prober = FakeProber::new()
        .with_output("a.flac", flac_probe_json(&[("TITLE", "Alpha")], 10.0))
        .with_failure("b.flac", "moov atom not found")
        .with_output("c.mp3", flac_probe_json(&[("TITLE", "Charlie")], 10.0));

    let out = dir.path().join("records");
    let report = test_driver(prober, &out, false).run(&music).await.unwrap();

    assert_eq!(report.generated.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, broken);
    assert!(report.failures[0].reason.contains("moov atom not found"));
    assert_eq!(report.unsupported, 1);
    assert_eq!(report.display_string(), "2 generated, 0 unchanged, 1 failed");

    let mut written: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    written.sort();
    assert_eq!(written, vec!["alpha.md", "charlie.md"]);
}

#[tokio::test]
async fn newer_record_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");
    std::fs::create_dir(&out).unwrap();

    let audio = write_audio_file(dir.path(), "keep.flac");
    backdate(&audio);
    let record = out.join("keep.md");
    std::fs::write(&record, "---\ntitle: Keep\n---\n\nhand made\n").unwrap();

    let prober = FakeProber::new().with_output("keep.flac", flac_probe_json(&[("TITLE", "Keep")], 5.0));
    let report = test_driver(prober, &out, false).run(&audio).await.unwrap();

    assert_eq!(report.skipped, vec![record.clone()]);
    assert!(report.generated.is_empty());
    assert_eq!(
        std::fs::read_to_string(&record).unwrap(),
        "---\ntitle: Keep\n---\n\nhand made\n"
    );
}

#[tokio::test]
async fn force_rewrites_current_record() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");
    std::fs::create_dir(&out).unwrap();

    let audio = write_audio_file(dir.path(), "keep.flac");
    backdate(&audio);
    std::fs::write(out.join("keep.md"), "---\ndescription: Mine\n---\n").unwrap();

    let prober = FakeProber::new().with_output("keep.flac", flac_probe_json(&[("TITLE", "Keep")], 5.0));
    let report = test_driver(prober, &out, true).run(&audio).await.unwrap();

    assert_eq!(report.generated, vec![out.join("keep.md")]);
    let (content, front) = read_record(&out.join("keep.md"));
    assert_eq!(front.description.as_deref(), Some("Mine"));
    // existing record had no createdDate, so none is invented
    assert!(front.created_date.is_none());
    assert!(content.contains("## Audio Player"));
}

#[tokio::test]
async fn malformed_existing_record_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");
    std::fs::create_dir(&out).unwrap();

    let audio = write_audio_file(dir.path(), "x.flac");
    std::fs::write(out.join("x.md"), "---\ndescription: [broken\n---\n").unwrap();

    let prober = FakeProber::new().with_output("x.flac", flac_probe_json(&[("TITLE", "X")], 5.0));
    test_driver(prober, &out, true).run(&audio).await.unwrap();

    let (_, front) = read_record(&out.join("x.md"));
    assert_eq!(front.description.as_deref(), Some("No description available."));
}

#[tokio::test]
async fn missing_input_is_rejected_before_work() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");

    let result = test_driver(FakeProber::new(), &out, false)
        .run(&dir.path().join("nope"))
        .await;

    assert!(matches!(result, Err(BatchError::InvalidInputPath(_))));
    assert!(!out.exists());
}

#[tokio::test]
async fn unsupported_single_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");
    let file = dir.path().join("cover.jpg");
    std::fs::write(&file, b"jpeg").unwrap();

    let report = test_driver(FakeProber::new(), &out, false)
        .run(&file)
        .await
        .unwrap();

    assert_eq!(report.unsupported, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, file);
    assert_eq!(
        report.failures[0].reason,
        BatchError::UnsupportedFormat(file.clone()).to_string()
    );
    assert!(report.generated.is_empty());
    assert!(!out.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn symlinked_audio_in_directory_gets_a_record() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("library");
    let music = dir.path().join("music");
    let out = dir.path().join("records");
    std::fs::create_dir(&library).unwrap();
    std::fs::create_dir(&music).unwrap();
    write_audio_file(&library, "original.flac");
    std::os::unix::fs::symlink("../library/original.flac", music.join("linked.flac")).unwrap();

    let prober = FakeProber::new().with_output("linked.flac", flac_probe_json(&song_tags("Linked"), 60.0));
    let report = test_driver(prober, &out, false).run(&music).await.unwrap();

    assert_eq!(report.generated, vec![out.join("linked.md")]);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn shared_title_is_flagged_as_collision() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");
    write_audio_file(dir.path(), "a.flac");
    write_audio_file(dir.path(), "b.flac");

    let prober = FakeProber::new()
        .with_output("a.flac", flac_probe_json(&song_tags("Same Song"), 60.0))
        .with_output("b.flac", flac_probe_json(&song_tags("Same Song"), 90.0));

    let report = test_driver(prober, &out, false)
        .run(dir.path())
        .await
        .unwrap();

    assert_eq!(report.slug_collisions, vec![dir.path().join("b.flac")]);
    assert!(out.join("same-song.md").exists());
}

#[tokio::test]
async fn release_date_only_rendered_when_tagged() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");
    let audio = write_audio_file(dir.path(), "undated.flac");

    let tags = [("TITLE", "Undated"), ("ARTIST", "Test Artist"), ("ALBUM", "Test Album")];
    let prober = FakeProber::new().with_output("undated.flac", flac_probe_json(&tags, 60.0));
    test_driver(prober, &out, false).run(&audio).await.unwrap();

    let (content, _) = read_record(&out.join("undated.md"));
    assert!(content.contains("*by Test Artist*"));
    assert!(content.contains("**Album:** Test Album"));
    assert!(!content.contains("**Release Date:**"));
}

#[tokio::test]
async fn build_dates_persist_for_written_records() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("records");
    let cache = dir.path().join("cache").join("build-dates.json");
    let audio = write_audio_file(dir.path(), "song.flac");
    backdate(&audio);

    let prober = FakeProber::new().with_output("song.flac", flac_probe_json(&[("TITLE", "Song")], 5.0));
    let options = BatchOptions {
        output_dir: out.clone(),
        force: false,
    };

    let mut driver = BatchDriver::new(
        prober.clone(),
        options.clone(),
        Box::new(JsonFileBuildDateStore::open(&cache)),
    );
    driver.run(&audio).await.unwrap();
    let first = driver.build_dates().get("song").unwrap();

    // Forced rewrite with identical content keeps the original timestamp
    let mut forced = BatchDriver::new(
        prober,
        BatchOptions {
            force: true,
            ..options
        },
        Box::new(JsonFileBuildDateStore::open(&cache)),
    );
    forced.run(&audio).await.unwrap();

    let reopened = JsonFileBuildDateStore::open(&cache);
    assert_eq!(reopened.get("song"), Some(first));
}
