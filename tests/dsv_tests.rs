//! DSV layer end to end: resolver, round trips, and file compositions.

use std::collections::BTreeSet;
use std::path::PathBuf;

use sluice::io::{
    CsvFileReader, CsvFileWriter, Deselect, Dialect, DsvFileReader, DsvFileWriter, DsvFormat,
    DsvParse, FieldFilter, FieldMap, ReadStream, Select, Selector, TextBuffer, ToMapping,
};
use sluice::operators::limit;
use sluice::prelude::*;

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn rows(items: &[&[&str]]) -> Vec<Vec<String>> {
    items.iter().map(|r| header(r)).collect()
}

fn temp_path(tag: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sluice-{tag}-{}.{ext}", std::process::id()))
}

#[test]
fn test_field_resolver_examples() {
    let h = header(&["id", "name", "value"]);
    let set = |xs: &[usize]| xs.iter().copied().collect::<BTreeSet<_>>();

    assert_eq!(Selector::from("na.*").resolve(&h).unwrap(), set(&[1]));
    assert_eq!(Selector::from(("id", 2usize)).resolve(&h).unwrap(), set(&[0, 2]));
    assert_eq!(Selector::from("zzz").resolve(&h).unwrap(), set(&[]));
}

#[test]
fn test_format_then_parse_reproduces_rows() {
    let original = rows(&[
        &["plain", "with,comma", "with \"quotes\""],
        &["", "multi\nline", "tab\there"],
        &["1", "2", "3"],
    ]);

    for dialect in [Dialect::csv(), Dialect::tsv(), Dialect::with_delimiter(';')] {
        let dialect = dialect.without_header();
        let formatted = (Source::new(original.clone()) >> Relay::new(DsvFormat::new(dialect.clone())))
            .unwrap()
            .collect_items()
            .unwrap();

        // Re-chunk the text at awkward boundaries before parsing it back.
        let buffer = TextBuffer::from_text(&formatted.concat());
        let parsed = (ReadStream::new(buffer, 5).unwrap() >> Relay::new(DsvParse::new(dialect)))
            .unwrap()
            .collect_items()
            .unwrap();
        assert_eq!(parsed, original);
    }
}

#[test]
fn test_empty_records_survive_format_parse() {
    let original = rows(&[&["a"], &[], &["b"], &[""]]);

    for dialect in [Dialect::csv(), Dialect::tsv().terminated_by("\r\n")] {
        let dialect = dialect.without_header();
        let formatted = (Source::new(original.clone()) >> Relay::new(DsvFormat::new(dialect.clone())))
            .unwrap()
            .collect_items()
            .unwrap();
        let buffer = TextBuffer::from_text(&formatted.concat());
        let parsed = (ReadStream::new(buffer, 1).unwrap() >> Relay::new(DsvParse::new(dialect)))
            .unwrap()
            .collect_items()
            .unwrap();
        assert_eq!(parsed, original);
    }

    // Selecting no columns leaves empty records, header included.
    let mut chain = (Source::new(vec!["k,v\na,1\nb,2\n".to_string()]) >> Relay::new(DsvParse::csv()))
        .and_then(|c| c >> Relay::new(Select::new("missing")))
        .and_then(|c| c >> Relay::new(DsvFormat::csv()))
        .and_then(|c| c >> Relay::new(DsvParse::csv()))
        .unwrap();
    assert_eq!(chain.fields().unwrap(), Some(Vec::new()));
    assert_eq!(chain.collect_items().unwrap(), rows(&[&[], &[]]));
}

#[test]
fn test_header_survives_format_parse() {
    let text = "k,v\na,1\nb,2\n";
    let mut chain = (Source::new(vec![text.to_string()]) >> Relay::new(DsvParse::csv()))
        .and_then(|c| c >> Relay::new(DsvFormat::csv()))
        .and_then(|c| c >> Relay::new(DsvParse::csv()))
        .unwrap();
    assert_eq!(chain.fields().unwrap(), Some(header(&["k", "v"])));
    assert_eq!(chain.collect_items().unwrap(), rows(&[&["a", "1"], &["b", "2"]]));
}

#[test]
fn test_field_operators_compose() {
    let text = "id,name,score,note\n1,ann,90,x\n2,bo,40,y\n3,cy,75,z\n";
    let mut chain = (Source::new(vec![text.to_string()]) >> Relay::new(DsvParse::csv()))
        .and_then(|c| {
            c >> Relay::new(FieldFilter::new(
                |f: &str| f.parse::<u32>().map_or(false, |n| n >= 50),
                "score",
            ))
        })
        .and_then(|c| c >> Relay::new(FieldMap::new(|f: String| format!("<{f}>"), "name")))
        .and_then(|c| c >> Relay::new(Deselect::new("note")))
        .and_then(|c| c >> Relay::new(Select::new(vec!["name", "id"])))
        .unwrap();

    // Select keeps header order, not selector order.
    assert_eq!(chain.fields().unwrap(), Some(header(&["id", "name"])));
    assert_eq!(
        chain.collect_items().unwrap(),
        rows(&[&["1", "<ann>"], &["3", "<cy>"]])
    );
}

#[test]
fn test_records_to_mappings() {
    let mut chain = (Source::new(vec!["a,b\n1,2\n".to_string()]) >> Relay::new(DsvParse::csv()))
        .and_then(|c| c >> Relay::new(ToMapping::new()))
        .unwrap();
    let maps = chain.collect_items().unwrap();
    assert_eq!(maps.len(), 1);
    assert_eq!(maps[0]["a"], "1");
    assert_eq!(maps[0]["b"], "2");
}

#[test]
fn test_csv_file_copy_with_projection() {
    let input = temp_path("people-in", "csv");
    let output = temp_path("people-out", "tsv");
    std::fs::write(&input, "id,name,age\n1,ann,31\n2,bo,27\n3,cy,45\n").unwrap();

    let reader = CsvFileReader::open(&input).unwrap();
    let writer = DsvFileWriter::create(&output, Dialect::tsv()).unwrap();
    let mut copy = (reader >> Relay::new(Select::new(("name", "age"))))
        .and_then(|c| c >> limit(2))
        .and_then(|c| c >> writer)
        .unwrap();
    copy.scoped(|c| c.run().map(|_| ())).unwrap();
    drop(copy);

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "name\tage\nann\t31\nbo\t27\n"
    );

    let mut back = DsvFileReader::open(&output, Dialect::tsv()).unwrap();
    assert_eq!(back.fields().unwrap(), Some(header(&["name", "age"])));
    assert_eq!(back.collect_items().unwrap().len(), 2);

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

#[test]
fn test_csv_writer_fragment_reused_after_splice() {
    let output = temp_path("fragment", "csv");
    let fragment = CsvFileWriter::create(&output).unwrap();
    assert!(fragment.is_open());

    let mut chain = (Source::new(rows(&[&["x", "y"]])) >> fragment).unwrap();
    assert!(!chain.is_open());
    assert_eq!(chain.collect_items().unwrap(), vec!["x,y\n"]);
    drop(chain);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "x,y\n");
    std::fs::remove_file(&output).ok();
}
