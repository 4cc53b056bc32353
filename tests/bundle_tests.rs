//! Tests for embedded-archive inspection.
//!
//! Validates central-directory scanning, member classification, bundle-name
//! discovery, and the reserved-member readers, over archives built on the
//! fly. A stub-prefixed archive is included because that is exactly what a
//! packed launcher binary looks like.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use puisne::{Archive, EntryKind, Error};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Builds an archive at `path`. `Some(contents)` adds a file member,
/// `None` a directory member.
fn write_archive(path: &Path, members: &[(&str, Option<&str>)]) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    append_members(&mut writer, members);
    writer.finish().unwrap();
}

fn append_members(writer: &mut ZipWriter<File>, members: &[(&str, Option<&str>)]) {
    let options = SimpleFileOptions::default();
    for (name, contents) in members {
        match contents {
            Some(data) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data.as_bytes()).unwrap();
            }
            None => writer.add_directory(*name, options).unwrap(),
        }
    }
}

fn scan(members: &[(&str, Option<&str>)]) -> Result<Option<puisne::Bundle>, Error> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packed");
    write_archive(&path, members);
    Archive::open(&path)?.scan()
}

// =============================================================================
// Discovery Tests
// =============================================================================

#[test]
fn test_scan_discovers_single_bundle() {
    let bundle = scan(&[
        ("puisne/help.txt", Some("usage\n")),
        (".args", Some("-u\nnew\n")),
        ("foo.app", None),
        ("foo.app/foo", Some("#!/bin/sh\necho hi\n")),
        ("foo.app/data/cfg.toml", Some("k = 1\n")),
    ])
    .unwrap()
    .expect("bundle should be discovered");

    assert_eq!(bundle.name, "foo");
    let paths: Vec<&str> = bundle
        .entries
        .iter()
        .map(|e| e.relative_path.as_str())
        .collect();
    assert_eq!(paths, ["", "foo", "data/cfg.toml"]);
    assert_eq!(bundle.entries[0].kind, EntryKind::Directory);
    assert_eq!(bundle.entries[1].kind, EntryKind::File);
}

#[test]
fn test_reserved_members_never_reach_the_manifest() {
    let bundle = scan(&[
        ("puisne/help.txt", Some("usage\n")),
        (".argsomething", Some("x")),
        (".cosmopolitan", Some("x")),
        ("usr/share/zoneinfo/UTC", Some("TZif")),
        ("foo.app/foo", Some("x")),
    ])
    .unwrap()
    .expect("bundle should be discovered");

    assert_eq!(bundle.entries.len(), 1);
    assert_eq!(bundle.entries[0].relative_path, "foo");
}

#[test]
fn test_reserved_only_archive_is_an_empty_bundle() {
    let result = scan(&[
        ("puisne/help.txt", Some("usage\n")),
        (".cosmo.base", Some("x")),
        ("usr/share/zoneinfo/Europe/Berlin", Some("TZif")),
    ])
    .unwrap();
    assert!(result.is_none(), "reserved members alone are not a bundle");
}

#[test]
fn test_member_name_reconstructs_archive_paths() {
    let bundle = scan(&[("foo.app/data/cfg.toml", Some("k = 1\n"))])
        .unwrap()
        .unwrap();
    assert_eq!(
        bundle.member_name(&bundle.entries[0]),
        "foo.app/data/cfg.toml"
    );
}

#[test]
fn test_scan_timestamps_are_epoch_seconds() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packed");
    let file = File::create(&path).unwrap();
    let mut writer = ZipWriter::new(file);

    let past = SimpleFileOptions::default()
        .last_modified_time(zip::DateTime::from_date_and_time(2000, 6, 15, 12, 0, 0).unwrap());
    let future = SimpleFileOptions::default()
        .last_modified_time(zip::DateTime::from_date_and_time(2099, 6, 15, 12, 0, 0).unwrap());
    writer.start_file("foo.app/old", past).unwrap();
    writer.write_all(b"o").unwrap();
    writer.start_file("foo.app/new", future).unwrap();
    writer.write_all(b"n").unwrap();
    writer.finish().unwrap();

    let bundle = Archive::open(&path).unwrap().scan().unwrap().unwrap();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    assert!(bundle.entries[0].mtime < now, "2000 stamps before now");
    assert!(bundle.entries[1].mtime > now, "2099 stamps after now");
}

// =============================================================================
// Structure Error Tests
// =============================================================================

#[test]
fn test_multiple_app_folders_are_rejected() {
    let err = scan(&[("a.app/a", Some("x")), ("b.app/b", Some("x"))]).unwrap_err();
    assert!(matches!(err, Error::MultipleAppFolders));
    assert!(err.to_string().contains("multiple top level app folders"));
}

#[test]
fn test_same_app_folder_twice_is_fine() {
    let bundle = scan(&[("a.app/x", Some("x")), ("a.app/y", Some("y"))])
        .unwrap()
        .unwrap();
    assert_eq!(bundle.name, "a");
    assert_eq!(bundle.entries.len(), 2);
}

#[test]
fn test_stray_top_level_file_is_rejected() {
    let err = scan(&[("foo.app/foo", Some("x")), ("README", Some("x"))]).unwrap_err();
    assert!(matches!(err, Error::AdditionalTopLevelFile(name) if name == "README"));
}

#[test]
fn test_non_app_top_level_folder_is_rejected() {
    let err = scan(&[("junk/file", Some("x"))]).unwrap_err();
    assert!(matches!(err, Error::InvalidTopLevelFolder(name) if name == "junk"));
}

#[test]
fn test_nameless_app_folder_is_rejected() {
    let err = scan(&[(".app/x", Some("x"))]).unwrap_err();
    assert!(matches!(err, Error::EmptyAppName));
}

// =============================================================================
// Reserved Reader Tests
// =============================================================================

#[test]
fn test_help_text_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packed");
    write_archive(&path, &[("puisne/help.txt", Some("usage: p\n"))]);

    let mut archive = Archive::open(&path).unwrap();
    assert_eq!(archive.help_text().unwrap(), "usage: p\n");
}

#[test]
fn test_missing_help_text_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packed");
    write_archive(&path, &[("foo.app/foo", Some("x"))]);

    let mut archive = Archive::open(&path).unwrap();
    assert!(matches!(archive.help_text(), Err(Error::HelpUnreadable)));
}

#[test]
fn test_defaults_are_tokenized() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packed");
    write_archive(&path, &[(".args", Some("-u\n new \n\n...\n"))]);

    let mut archive = Archive::open(&path).unwrap();
    assert_eq!(archive.defaults().unwrap(), ["-u", "new", "..."]);
}

#[test]
fn test_absent_defaults_are_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packed");
    write_archive(&path, &[("foo.app/foo", Some("x"))]);

    let mut archive = Archive::open(&path).unwrap();
    assert!(archive.defaults().unwrap().is_empty());
}

// =============================================================================
// Stub Prefix Tests
// =============================================================================

#[test]
fn test_stub_prefixed_archive_scans() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packed");

    let mut file = File::create(&path).unwrap();
    file.write_all(b"\x7fELF launcher stub stand-in bytes\n")
        .unwrap();
    let mut writer = ZipWriter::new(file);
    append_members(
        &mut writer,
        &[
            ("puisne/help.txt", Some("usage\n")),
            ("foo.app/foo", Some("#!/bin/sh\n")),
        ],
    );
    writer.finish().unwrap();

    let mut archive = Archive::open(&path).unwrap();
    let bundle = archive.scan().unwrap().expect("bundle behind stub");
    assert_eq!(bundle.name, "foo");
    assert_eq!(archive.help_text().unwrap(), "usage\n");
}
