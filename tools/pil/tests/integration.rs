//! Integration tests for the pil binary.
//!
//! These tests run the compiled binary as a subprocess against images
//! written to a scratch directory.

use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pil_elf::{ElfClass, ElfHeader, Endian, Ident, ProgramHeader};

const HASH: u32 = 2 << 24;

fn pil(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pil"))
        .args(args)
        .output()
        .expect("failed to execute pil")
}

/// A scratch directory under the system temp dir, removed on drop.
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("pil-cli-{}-{name}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).expect("failed to create scratch directory");
        Self(dir)
    }
}

impl Deref for Scratch {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.0).ok();
    }
}

fn scratch(name: &str) -> Scratch {
    Scratch::new(name)
}

/// A little-endian image: segment 0 spans the headers, the rest follow the
/// table.
fn firmware(class: ElfClass, segments: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let layout = class.layout();
    let phnum = segments.len() + 1;
    let header = ElfHeader {
        ident: Ident::new(class, Endian::Little),
        e_type: 2,
        e_machine: 164,
        e_version: 1,
        e_entry: 0,
        e_phoff: layout.ehdr_size as u64,
        e_shoff: 0,
        e_flags: 0,
        e_ehsize: u16::try_from(layout.ehdr_size).unwrap(),
        e_phentsize: u16::try_from(layout.phdr_size).unwrap(),
        e_phnum: u16::try_from(phnum).unwrap(),
        e_shentsize: 0,
        e_shnum: 0,
        e_shstrndx: 0,
    };
    let table_end = layout.ehdr_size + phnum * layout.phdr_size;
    let mut buf = vec![0u8; table_end];
    header.encode_into(&mut buf).unwrap();

    let mut entries = vec![(0x0700_0000, 0, table_end)];
    for (flags, data) in segments {
        entries.push((*flags, buf.len(), data.len()));
        buf.extend_from_slice(data);
    }
    for (index, (flags, offset, size)) in entries.into_iter().enumerate() {
        let phdr = ProgramHeader {
            p_type: 1,
            p_flags: flags,
            p_offset: offset as u64,
            p_filesz: size as u64,
            p_memsz: size as u64,
            ..ProgramHeader::default()
        };
        let at = layout.ehdr_size + index * layout.phdr_size;
        phdr.encode_into(&header, &mut buf[at..]).unwrap();
    }
    buf
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed (exit={:?}):\nstdout:\n{}\nstderr:\n{}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn split_then_squash_reproduces_image() {
    let dir = scratch("roundtrip");
    let data = firmware(
        ElfClass::Elf32,
        &[(HASH, vec![0xa5; 64]), (0x0100_0005, b"modem text".to_vec())],
    );
    let mbn = dir.join("modem.mbn");
    let mdt = dir.join("modem.mdt");
    let out = dir.join("rebuilt.mbn");
    fs::write(&mbn, &data).unwrap();

    let split = Command::new(env!("CARGO_BIN_EXE_pil"))
        .arg("split")
        .arg(&mbn)
        .arg(&mdt)
        .output()
        .expect("failed to execute pil split");
    assert_success(&split, "pil split");
    for blob in ["modem.b00", "modem.b01", "modem.b02"] {
        assert!(dir.join(blob).exists(), "{blob} was not created");
    }

    let squash = Command::new(env!("CARGO_BIN_EXE_pil"))
        .args(["-q", "squash"])
        .arg(&out)
        .arg(&mdt)
        .output()
        .expect("failed to execute pil squash");
    assert_success(&squash, "pil squash");
    assert!(squash.stdout.is_empty(), "quiet mode printed output");
    assert_eq!(fs::read(&out).unwrap(), data);
}

#[test]
fn wrong_argument_count_exits_one() {
    let output = pil(&[Path::new("split"), Path::new("only-one.mbn")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty(), "no usage message");

    let output = pil(&[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn usage_message_reaches_the_right_stream() {
    let output = pil(&[Path::new("squash")]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr:\n{stderr}");

    let output = pil(&[Path::new("--help")]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("split") && stdout.contains("squash"), "stdout:\n{stdout}");
}

#[test]
fn metadata_path_without_marker_fails() {
    let dir = scratch("marker");
    let mbn = dir.join("fw.mbn");
    fs::write(&mbn, firmware(ElfClass::Elf64, &[])).unwrap();

    let output = pil(&[Path::new("split"), &mbn, &dir.join("fw.bin")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is not a .mdt file"), "stderr:\n{stderr}");
}

#[test]
fn unsupported_class_fails_without_output() {
    let dir = scratch("bad-class");
    let mut data = firmware(ElfClass::Elf32, &[(0, b"abc".to_vec())]);
    data[4] = 9;
    let mbn = dir.join("fw.mbn");
    fs::write(&mbn, &data).unwrap();

    let output = pil(&[Path::new("split"), &mbn, &dir.join("fw.mdt")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.join("fw.mdt").exists());
}

#[test]
fn truncated_segment_warns_and_succeeds() {
    let dir = scratch("truncated");
    let mut data = firmware(ElfClass::Elf32, &[(0, vec![1; 32])]);
    data.truncate(data.len() - 8);
    let mbn = dir.join("fw.mbn");
    fs::write(&mbn, &data).unwrap();

    let output = pil(&[Path::new("split"), &mbn, &dir.join("fw.mdt")]);
    assert_success(&output, "pil split");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: segment 1 is truncated"), "stderr:\n{stderr}");
    assert_eq!(fs::read(dir.join("fw.b01")).unwrap().len(), 24);
}

#[test]
fn info_lists_entries_with_digests() {
    let dir = scratch("info");
    let mbn = dir.join("fw.mbn");
    fs::write(
        &mbn,
        firmware(ElfClass::Elf64, &[(HASH, b"abc".to_vec()), (0, Vec::new())]),
    )
    .unwrap();

    let output = pil(&[Path::new("info"), &mbn]);
    assert_success(&output, "pil info");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ELF64, 3 program headers"), "stdout:\n{stdout}");
    assert!(
        stdout.contains("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"),
        "hash segment digest missing:\n{stdout}"
    );
    assert!(stdout.contains("hash"), "stdout:\n{stdout}");
}
