//! Zip container reading and writing.
//!
//! Members are exposed as named byte blobs in central-directory order.
//! Written archives are deterministic: deflate compression and a fixed
//! modification time for every member.

use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use log::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{ContextExt, Result};

/// One file stored in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub data: Bytes,
}

impl Member {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// List member names in container order, directories included.
///
/// # Errors
///
/// Returns an unexpected error when the bytes are not a readable zip archive.
pub fn list(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).with_context("opening the archive")?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .with_context(format!("reading archive entry {i}"))?;
        names.push(file.name().to_string());
    }
    Ok(names)
}

/// Decompress every file member in container order. Directory entries are skipped.
///
/// # Errors
///
/// Returns an unexpected error when the archive or one of its members cannot
/// be read.
pub fn extract_all(bytes: &[u8]) -> Result<Vec<Member>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).with_context("opening the archive")?;
    let mut members = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(format!("reading archive entry {i}"))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .with_context(format!("decompressing '{name}'"))?;
        debug!("Extracted '{name}' ({} bytes)", data.len());
        members.push(Member::new(name, data));
    }

    Ok(members)
}

/// Build an archive holding `members` in the given order.
///
/// # Errors
///
/// Returns an unexpected error when the zip writer fails.
pub fn build(members: &[Member]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for member in members {
        zip.start_file(member.name.as_str(), options)
            .with_context(format!("adding '{}' to the archive", member.name))?;
        zip.write_all(&member.data)
            .with_context(format!("writing '{}' to the archive", member.name))?;
    }

    let cursor = zip.finish().with_context("finishing the archive")?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SprayError;

    #[test]
    fn test_members_come_back_in_order() {
        let members = vec![
            Member::new("b.txt", b"second".to_vec()),
            Member::new("a.txt", b"first".to_vec()),
            Member::new("nested/c.txt", Vec::new()),
        ];
        let archive = build(&members).unwrap();

        assert_eq!(list(&archive).unwrap(), vec!["b.txt", "a.txt", "nested/c.txt"]);
        assert_eq!(extract_all(&archive).unwrap(), members);
    }

    #[test]
    fn test_build_is_deterministic() {
        let members = vec![Member::new("field.prj", b"PROJCS[\"x\"]".to_vec())];
        assert_eq!(build(&members).unwrap(), build(&members).unwrap());
    }

    #[test]
    fn test_directories_are_listed_but_not_extracted() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        zip.add_directory("survey/", options).unwrap();
        zip.start_file("survey/readme.txt", options).unwrap();
        zip.write_all(b"hi").unwrap();
        let archive = zip.finish().unwrap().into_inner();

        assert_eq!(list(&archive).unwrap(), vec!["survey/", "survey/readme.txt"]);
        let members = extract_all(&archive).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "survey/readme.txt");
    }

    #[test]
    fn test_garbage_is_unexpected() {
        let err = extract_all(b"PK\x03\x04 not really a zip").unwrap_err();
        assert!(matches!(err, SprayError::Unexpected { .. }));
        assert!(err.to_string().contains("opening the archive"));
    }
}
