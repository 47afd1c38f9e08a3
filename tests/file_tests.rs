//! File adapters and capability delegation through whole chains.

use std::io::SeekFrom;

use sluice::io::{FileReadStream, FileWriteStream, ReadStream, TextBuffer, TextFile, WriteStream};
use sluice::operators::{limit, map};
use sluice::prelude::*;

fn temp_path(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("sluice-file-{tag}-{}.txt", std::process::id()))
}

#[test]
fn test_line_copy_between_files() {
    let input = temp_path("copy-in");
    let output = temp_path("copy-out");
    std::fs::write(&input, "alpha\nbeta\ngamma\n").unwrap();

    let mut copy = (FileReadStream::open(&input).unwrap() >> map(|line: String| line.trim_end().to_uppercase()))
        .and_then(|c| c >> FileWriteStream::create(&output)?)
        .unwrap();
    let written = copy.scoped(|c| c.collect_items()).unwrap();
    assert_eq!(written, vec!["ALPHA", "BETA", "GAMMA"]);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "ALPHA\nBETA\nGAMMA\n");

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

#[test]
fn test_tail_reaches_source_resource() {
    let path = temp_path("delegate");
    std::fs::write(&path, "one\ntwo\n").unwrap();

    let mut chain = (FileReadStream::open(&path).unwrap() >> limit(1)).unwrap();
    assert!(chain.resource_name().unwrap().contains("sluice-file-delegate"));
    assert_eq!(chain.collect_items().unwrap(), vec!["one\n"]);

    chain.seek(SeekFrom::Start(0)).unwrap();
    let mut line = String::new();
    chain.read_line(&mut line).unwrap();
    assert_eq!(line, "one\n");

    chain.close().unwrap();
    assert!(chain.is_closed().unwrap());
    assert!(matches!(chain.read_line(&mut line), Err(Error::Closed { .. })));
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_nearest_writer_wins() {
    let near = TextBuffer::new().named("near");
    let far = TextBuffer::new().named("far");
    let mut chain = (Source::new(vec!["x"]) >> WriteStream::new(far.clone()))
        .and_then(|c| c >> WriteStream::new(near.clone()))
        .unwrap();

    assert_eq!(chain.resource_name().unwrap(), "near");
    chain.run().unwrap();
    chain.write_bytes(b"!").unwrap();
    assert_eq!(near.contents(), "x\n!");
    assert_eq!(far.contents(), "x\n");
}

#[test]
fn test_chunked_reader_over_buffer() {
    let text = "0123456789";
    let mut chunks = (ReadStream::new(TextBuffer::from_text(text), 4).unwrap()
        >> map(|chunk: String| chunk.len()))
    .unwrap();
    assert_eq!(chunks.collect_items().unwrap(), vec![4, 4, 2]);
}

#[test]
fn test_source_from_line_resource() {
    let mut lines = Source::from_resource(TextBuffer::from_text("a\nb")).unwrap();
    assert_eq!(lines.collect_items().unwrap(), vec!["a\n", "b"]);

    let path = temp_path("write-only");
    let err = Source::from_resource(TextFile::create(&path).unwrap())
        .err()
        .expect("write-only file is not line-readable");
    assert!(matches!(err, Error::NotIterable { .. }));
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_missing_capability_is_reported() {
    let mut chain = (Source::new(vec![1, 2]) >> limit(1)).unwrap();
    let err = chain.seek(SeekFrom::Start(0)).unwrap_err();
    assert!(matches!(
        err,
        Error::AttributeNotFound {
            capability: Capability::Seek
        }
    ));
}
