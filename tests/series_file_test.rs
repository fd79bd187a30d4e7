use shape_match::{Error, Observation, Series};
use std::fs;
use std::io::Write;

fn sample_series(n: usize) -> Series {
    (0..n)
        .map(|i| Observation {
            timestamp: 1_483_228_800 + 60 * i as i64,
            price: 6.5 + (i as f32 * 0.37).sin() * 0.25 + i as f32 * 1e-4,
        })
        .collect()
}

#[test]
fn test_save_load_roundtrip_every_slice() {
    let series = sample_series(64);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.dat");
    series.save(&path).unwrap();

    let meta = fs::metadata(&path).unwrap();
    assert_eq!(meta.len(), 8 + 12 * 64);

    let loaded = Series::load(&path).unwrap();
    assert_eq!(loaded.len(), series.len());

    for offset in 0..=series.len() {
        for length in 0..=(series.len() - offset) {
            let a = series.slice(offset, length).unwrap();
            let b = loaded.slice(offset, length).unwrap();
            let bits_a: Vec<u32> = a.iter().map(|x| x.to_bits()).collect();
            let bits_b: Vec<u32> = b.iter().map(|x| x.to_bits()).collect();
            assert_eq!(bits_a, bits_b, "slice({offset}, {length})");
        }
    }
    for i in 0..series.len() {
        assert_eq!(loaded.timestamp_at(i).unwrap(), series.timestamp_at(i).unwrap());
    }
}

#[test]
fn test_declared_count_exceeds_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.dat");
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(&10_i64.to_le_bytes()).unwrap();
    for i in 0..7_i64 {
        f.write_all(&i.to_le_bytes()).unwrap();
        f.write_all(&(i as f32).to_le_bytes()).unwrap();
    }
    drop(f);

    match Series::load(&path) {
        Err(Error::Format(msg)) => assert!(msg.contains("truncated"), "{msg}"),
        other => panic!("expected FormatError, got {other:?}"),
    }
}

#[test]
fn test_empty_file_is_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.dat");
    fs::File::create(&path).unwrap();
    assert!(matches!(Series::load(&path), Err(Error::Format(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Series::load(dir.path().join("nope.dat")).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "got {err:?}");
}
