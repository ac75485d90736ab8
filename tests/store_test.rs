use segmark::store::{AnnotationRecord, AnnotationStore};
use tempfile::TempDir;

fn record(audio_name: &str, segment_number: u32, class_ids: Vec<u32>, class_names: Vec<&str>) -> AnnotationRecord {
    AnnotationRecord {
        audio_name: audio_name.to_string(),
        file_location: format!("/audio/{audio_name}"),
        segment_number,
        segment_time: format!("{}-{}", segment_number * 5, (segment_number + 1) * 5),
        class_ids,
        class_names: class_names.into_iter().map(String::from).collect(),
    }
}

#[test]
fn test_store_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("annotations.csv");

    // A missing file starts an empty table without creating the file
    let mut store = AnnotationStore::open(&path).unwrap();
    assert!(store.is_empty());
    assert!(!path.exists());

    // First save creates the file
    store
        .upsert(record("take1.wav", 0, vec![0, 4], vec!["Male", "Music"]))
        .unwrap();
    store
        .upsert(record("take1.wav", 1, vec![3], vec!["No_sound"]))
        .unwrap();
    store
        .upsert(record("take2.wav", 0, vec![], vec![]))
        .unwrap();
    assert!(path.exists());
    assert_eq!(store.len(), 3);

    // Re-labeling a segment replaces its row in place
    store
        .upsert(record("take1.wav", 0, vec![1], vec!["Female"]))
        .unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.get("take1.wav", 0).unwrap().class_names, vec!["Female"]);

    // A fresh process sees exactly what was saved, in the same order
    let reloaded = AnnotationStore::open(&path).unwrap();
    assert_eq!(reloaded.records(), store.records());
    let names: Vec<_> = reloaded
        .records()
        .iter()
        .map(|r| (r.audio_name.as_str(), r.segment_number))
        .collect();
    assert_eq!(
        names,
        vec![("take1.wav", 0), ("take1.wav", 1), ("take2.wav", 0)]
    );

    // Empty-label rows persist and still count as annotated
    let empty = reloaded.get("take2.wav", 0).unwrap();
    assert!(empty.class_ids.is_empty());
    assert!(reloaded.is_audio_annotated("take2.wav"));
    assert!(!reloaded.is_audio_annotated("take3.wav"));

    // Lookups for unknown keys return nothing rather than failing
    assert!(reloaded.get("take1.wav", 99).is_none());
}

#[test]
fn test_backing_file_matches_table_after_every_save() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("annotations.csv");

    let mut store = AnnotationStore::open(&path).unwrap();
    for segment in 0..5 {
        store
            .upsert(record("long.wav", segment, vec![2], vec!["Engine_rev"]))
            .unwrap();

        let on_disk = AnnotationStore::open(&path).unwrap();
        assert_eq!(on_disk.records(), store.records());
    }

    // No leftover temp file from the rewrites
    let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec!["annotations.csv"]);
}
