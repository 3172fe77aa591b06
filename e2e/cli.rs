//! E2E Test Suite: CLI integration
//!
//! Runs the `lz4stream` binary against temp files and validates its output
//! with the reference block decoder.

use std::fs;
use std::io::Write as _;
use std::process::{Command, Stdio};

/// Decodes one LZ4 block (reference oracle; see stream_roundtrip.rs).
fn decode_block(mut input: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        assert!(!input.is_empty(), "block ended without a final literal run");
        let token = input[0];
        input = &input[1..];

        let mut lit_len = (token >> 4) as usize;
        if lit_len == 15 {
            loop {
                let b = input[0];
                input = &input[1..];
                lit_len += b as usize;
                if b != 255 {
                    break;
                }
            }
        }
        out.extend_from_slice(&input[..lit_len]);
        input = &input[lit_len..];

        if input.is_empty() {
            break;
        }

        let offset = u16::from_le_bytes([input[0], input[1]]) as usize;
        input = &input[2..];
        assert!(offset >= 1 && offset <= out.len());

        let mut match_len = (token & 0x0F) as usize + 4;
        if token & 0x0F == 15 {
            loop {
                let b = input[0];
                input = &input[1..];
                match_len += b as usize;
                if b != 255 {
                    break;
                }
            }
        }
        let start = out.len() - offset;
        for i in 0..match_len {
            let byte = out[start + i];
            out.push(byte);
        }
    }
    out
}

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lz4stream"))
}

#[test]
fn test_compress_file_to_default_output_name() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("input.bin");
    let data: Vec<u8> = b"CLI roundtrip payload. "
        .iter()
        .copied()
        .cycle()
        .take(50_000)
        .collect();
    fs::write(&src_path, &data).unwrap();

    let status = bin().arg(&src_path).arg("-q").status().unwrap();
    assert!(status.success());

    let compressed = fs::read(dir.path().join("input.bin.lz4b")).unwrap();
    assert!(compressed.len() < data.len());
    assert_eq!(decode_block(&compressed), data);
}

#[test]
fn test_compress_with_explicit_output_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("a.txt");
    let dst_path = dir.path().join("a.out");
    fs::write(&src_path, b"explicit output path").unwrap();

    let output = bin()
        .arg(&src_path)
        .arg("-o")
        .arg(&dst_path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Compressed"),
        "summary line missing: {}",
        stderr
    );

    let compressed = fs::read(&dst_path).unwrap();
    assert_eq!(decode_block(&compressed), b"explicit output path");
}

#[test]
fn test_stdin_to_stdout_pipe() {
    let data: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();
    let mut child = bin()
        .arg("-c")
        .arg("-q")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child.stdin.as_mut().unwrap().write_all(&data).unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(decode_block(&output.stdout), data);
}

#[test]
fn test_checksum_flag_reports_xxh32() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("sum.bin");
    fs::write(&src_path, b"checksummed payload").unwrap();

    let output = bin()
        .arg(&src_path)
        .arg("--checksum")
        .arg("-q")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let expected = format!(
        "0x{:08X}",
        lz4stream::xxh32_oneshot(b"checksummed payload", 0)
    );
    assert!(
        stderr.contains(&expected),
        "expected {} in: {}",
        expected,
        stderr
    );
}

#[test]
fn test_missing_input_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let status = bin()
        .arg(dir.path().join("does-not-exist.bin"))
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(!status.success());
}
