//! End-to-end compress/expand round trip through the compiled binary, in the shape of
//! the teacher's `tests/cli_test.rs` (`assert_cmd` driving the binary, `tempfile` for
//! scratch output). Generates its own fixtures instead of relying on retrieved binary
//! fixtures that have no counterpart in this pack.

use assert_cmd::prelude::*;
use std::io::Write;
use std::process::Command;

type StdResult = Result<(), Box<dyn std::error::Error>>;

fn roundtrip(base_name: &str, contents: &[u8]) -> StdResult {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join(format!("{base_name}.txt"));
    let compressed_path = temp_dir.path().join(format!("{base_name}.zz"));
    let out_path = temp_dir.path().join(format!("{base_name}.out"));

    let mut f = std::fs::File::create(&in_path)?;
    f.write_all(contents)?;
    drop(f);

    Command::cargo_bin("vitterflate")?
        .arg("compress")
        .arg("-i")
        .arg(&in_path)
        .arg("-o")
        .arg(&compressed_path)
        .assert()
        .success();

    Command::cargo_bin("vitterflate")?
        .arg("expand")
        .arg("-i")
        .arg(&compressed_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    let restored = std::fs::read(&out_path)?;
    assert_eq!(restored, contents);
    Ok(())
}

#[test]
fn roundtrips_empty_file() -> StdResult {
    roundtrip("empty", b"")
}

#[test]
fn roundtrips_small_text() -> StdResult {
    roundtrip(
        "small",
        b"The quick brown fox jumps over the lazy dog. The quick brown fox jumps again.",
    )
}

#[test]
fn roundtrips_repetitive_data() -> StdResult {
    let mut data = Vec::new();
    for _ in 0..2000 {
        data.extend_from_slice(b"abcabcabcabc");
    }
    roundtrip("repetitive", &data)
}

#[test]
fn compressed_file_is_smaller_for_repetitive_input() -> StdResult {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("big.txt");
    let compressed_path = temp_dir.path().join("big.zz");

    let data = vec![b'x'; 100_000];
    std::fs::write(&in_path, &data)?;

    Command::cargo_bin("vitterflate")?
        .arg("compress")
        .arg("-i")
        .arg(&in_path)
        .arg("-o")
        .arg(&compressed_path)
        .assert()
        .success();

    let compressed_len = std::fs::metadata(&compressed_path)?.len();
    assert!((compressed_len as usize) < data.len() / 10);
    Ok(())
}

#[test]
fn expand_rejects_truncated_input() -> StdResult {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("bad.zz");
    let out_path = temp_dir.path().join("bad.out");
    std::fs::write(&in_path, [0x78u8])?;

    Command::cargo_bin("vitterflate")?
        .arg("expand")
        .arg("-i")
        .arg(&in_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .failure();
    Ok(())
}

#[test]
fn compress_respects_custom_window_size() -> StdResult {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("win.txt");
    let compressed_path = temp_dir.path().join("win.zz");
    let out_path = temp_dir.path().join("win.out");

    let data: Vec<u8> = (0..5000u32).map(|i| (i % 250) as u8).collect();
    std::fs::write(&in_path, &data)?;

    Command::cargo_bin("vitterflate")?
        .arg("compress")
        .arg("-i")
        .arg(&in_path)
        .arg("-o")
        .arg(&compressed_path)
        .arg("-w")
        .arg("512")
        .assert()
        .success();

    Command::cargo_bin("vitterflate")?
        .arg("expand")
        .arg("-i")
        .arg(&compressed_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(&out_path)?, data);
    Ok(())
}

