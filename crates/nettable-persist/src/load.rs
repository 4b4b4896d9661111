//! Persistent load path
//!
//! Parses line by line. A malformed line is reported through the warning
//! callback and skipped; only a stream-level read failure or a bad header
//! aborts the load. Surviving entries are applied through the store's
//! restore path, so they win over whatever is in memory and come back
//! tagged Persistent.

use std::io::BufRead;

use bytes::Bytes;
use tracing::warn;

use nettable_core::{TableError, TableResult, Value};
use nettable_store::EntryStore;

use crate::escape::parse_quoted;
use crate::save::FILE_HEADER;

/// Parse a persistent stream and apply every well-formed line to the store
pub fn load_persistent(
    store: &EntryStore,
    reader: impl BufRead,
    mut warn_fn: impl FnMut(usize, &str),
) -> TableResult<()> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(TableError::PersistHeader("empty stream".into())),
    };
    if header.trim_end() != FILE_HEADER {
        return Err(TableError::PersistHeader(header));
    }

    for (index, line) in lines.enumerate() {
        let line = line?;
        // Header is line 1
        let line_number = index + 2;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok((name, value)) => store.load_entry(&name, value),
            Err(message) => {
                warn!(line = line_number, %message, "malformed persistent line");
                warn_fn(line_number, &message);
            }
        }
    }
    Ok(())
}

/// Parse one body line into a name and value
pub fn parse_line(line: &str) -> Result<(String, Value), String> {
    let (tag, rest) = split_tag(line)?;
    let (name, rest) = parse_quoted(rest)?;
    let literal = rest
        .strip_prefix('=')
        .ok_or_else(|| "expected '=' after name".to_string())?;

    let value = match tag {
        Tag::Boolean => Value::Boolean(parse_bool(literal)?),
        Tag::Double => Value::Double(parse_double(literal)?),
        Tag::Str => {
            let (s, rest) = parse_quoted(literal)?;
            if !rest.is_empty() {
                return Err(format!("trailing data after string literal: {rest:?}"));
            }
            Value::Str(s)
        }
        Tag::Raw => Value::Raw(parse_hex(literal)?),
        Tag::Rpc => Value::Rpc(parse_hex(literal)?),
        Tag::BooleanArray => Value::BooleanArray(parse_array(literal, parse_bool)?),
        Tag::DoubleArray => Value::DoubleArray(parse_array(literal, parse_double)?),
        Tag::StringArray => Value::StringArray(parse_string_array(literal)?),
    };
    Ok((name, value))
}

#[derive(Clone, Copy)]
enum Tag {
    Boolean,
    Double,
    Str,
    Raw,
    Rpc,
    BooleanArray,
    DoubleArray,
    StringArray,
}

fn split_tag(line: &str) -> Result<(Tag, &str), String> {
    // Longest tags first so "array boolean" is not read as unknown
    const TAGS: &[(&str, Tag)] = &[
        ("array boolean ", Tag::BooleanArray),
        ("array double ", Tag::DoubleArray),
        ("array string ", Tag::StringArray),
        ("boolean ", Tag::Boolean),
        ("double ", Tag::Double),
        ("string ", Tag::Str),
        ("raw ", Tag::Raw),
        ("rpc ", Tag::Rpc),
    ];
    for &(prefix, tag) in TAGS {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Ok((tag, rest));
        }
    }
    Err(format!(
        "unknown type tag: {:?}",
        line.split('"').next().unwrap_or(line).trim_end()
    ))
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("bad boolean literal: {other:?}")),
    }
}

fn parse_double(s: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .map_err(|_| format!("bad double literal: {s:?}"))
}

fn parse_hex(s: &str) -> Result<Bytes, String> {
    hex::decode(s)
        .map(Bytes::from)
        .map_err(|_| format!("bad hex literal: {s:?}"))
}

fn parse_array<T>(literal: &str, item: fn(&str) -> Result<T, String>) -> Result<Vec<T>, String> {
    let body = strip_brackets(literal)?;
    if body.is_empty() {
        return Ok(Vec::new());
    }
    body.split(',').map(item).collect()
}

fn parse_string_array(literal: &str) -> Result<Vec<String>, String> {
    let mut rest = strip_brackets(literal)?;
    let mut items = Vec::new();
    if rest.is_empty() {
        return Ok(items);
    }
    loop {
        let (item, tail) = parse_quoted(rest)?;
        items.push(item);
        match tail {
            "" => return Ok(items),
            _ => {
                rest = tail
                    .strip_prefix(',')
                    .ok_or_else(|| "expected ',' between array strings".to_string())?;
            }
        }
    }
}

fn strip_brackets(literal: &str) -> Result<&str, String> {
    literal
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("bad array literal: {literal:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::save_persistent;
    use nettable_core::EntryFlags;
    use nettable_store::Dispatcher;
    use std::sync::Arc;

    fn store() -> EntryStore {
        EntryStore::new(Arc::new(Dispatcher::new(256).unwrap()))
    }

    fn persistent() -> Option<EntryFlags> {
        Some(EntryFlags::new(EntryFlags::PERSISTENT))
    }

    fn load_str(store: &EntryStore, text: &str) -> Vec<(usize, String)> {
        let mut warnings = Vec::new();
        load_persistent(store, text.as_bytes(), |line, msg| {
            warnings.push((line, msg.to_string()))
        })
        .unwrap();
        warnings
    }

    #[test]
    fn test_load_basic_types() {
        let store = store();
        let warnings = load_str(
            &store,
            "[NetworkTables Storage 3.0]\n\
             boolean \"/flag\"=true\n\
             double \"/num\"=-2.5\n\
             string \"/s\"=\"a\\\"b\"\n\
             raw \"/r\"=0a0b\n\
             array double \"/d\"=[1,2.5,3]\n\
             array string \"/names\"=[\"x\",\"y\"]\n",
        );

        assert!(warnings.is_empty());
        assert_eq!(store.get("/flag"), Value::Boolean(true));
        assert_eq!(store.get("/num"), Value::Double(-2.5));
        assert_eq!(store.get("/s"), Value::Str("a\"b".into()));
        assert_eq!(store.get("/r"), Value::Raw(Bytes::from_static(b"\x0a\x0b")));
        assert_eq!(store.get("/d"), Value::DoubleArray(vec![1.0, 2.5, 3.0]));
        assert_eq!(
            store.get("/names"),
            Value::StringArray(vec!["x".into(), "y".into()])
        );
        assert!(store.get_flags("/flag").is_persistent());
    }

    #[test]
    fn test_malformed_lines_warn_and_continue() {
        let store = store();
        let warnings = load_str(
            &store,
            "[NetworkTables Storage 3.0]\n\
             boolean \"/good\"=true\n\
             flavor \"/bad-tag\"=1\n\
             double \"/bad-literal\"=abc\n\
             array boolean \"/trunc\"=[true,\n\
             string \"/unterminated\"=\"oops\n\
             double \"/also-good\"=4\n",
        );

        // Every bad line reported with its number, parsing continued
        let lines: Vec<usize> = warnings.iter().map(|(l, _)| *l).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
        assert_eq!(store.get("/good"), Value::Boolean(true));
        assert_eq!(store.get("/also-good"), Value::Double(4.0));
        assert_eq!(store.get("/bad-literal"), Value::Unassigned);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_bad_header_is_fatal() {
        let store = store();
        let result = load_persistent(&store, "not a header\n".as_bytes(), |_, _| {});
        assert!(matches!(result, Err(TableError::PersistHeader(_))));

        let result = load_persistent(&store, "".as_bytes(), |_, _| {});
        assert!(matches!(result, Err(TableError::PersistHeader(_))));
    }

    #[test]
    fn test_load_wins_over_memory() {
        let store = store();
        store.apply_update("/x", Value::Double(1.0), 1_000);
        load_str(&store, "[NetworkTables Storage 3.0]\ndouble \"/x\"=7\n");
        assert_eq!(store.get("/x"), Value::Double(7.0));
    }

    #[test]
    fn test_persistent_only_round_trip() {
        // {"a": Boolean(true), Persistent} and {"b": Double(2.5), no flags}:
        // after save and reload into an empty store only "a" survives
        let source = store();
        source.set("/a", Value::Boolean(true), persistent());
        source.set("/b", Value::Double(2.5), None);

        let mut buf = Vec::new();
        save_persistent(&source, &mut buf).unwrap();

        let target = store();
        load_persistent(&target, buf.as_slice(), |_, _| {}).unwrap();
        assert_eq!(target.len(), 1);
        assert_eq!(target.get("/a"), Value::Boolean(true));
        assert!(target.get_flags("/a").is_persistent());
        assert_eq!(target.get("/b"), Value::Unassigned);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_value() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<bool>().prop_map(Value::Boolean),
                // Finite doubles; NaN never compares equal to itself
                (-1e12f64..1e12).prop_map(Value::Double),
                "[ -~]{0,20}".prop_map(Value::Str),
                proptest::collection::vec(any::<u8>(), 0..16)
                    .prop_map(|b| Value::Raw(Bytes::from(b))),
                proptest::collection::vec(any::<bool>(), 0..8).prop_map(Value::BooleanArray),
                proptest::collection::vec(-1e6f64..1e6, 0..8).prop_map(Value::DoubleArray),
                proptest::collection::vec("[ -~]{0,10}", 0..6).prop_map(Value::StringArray),
            ]
        }

        proptest! {
            // save → clear → load reproduces the persistent entries
            // exactly, values and flags included
            #[test]
            fn prop_round_trip(
                entries in proptest::collection::btree_map("/[a-z]{1,8}", arb_value(), 0..12)
            ) {
                let source = store();
                for (name, value) in &entries {
                    source.set(name, value.clone(), persistent());
                }

                let mut buf = Vec::new();
                save_persistent(&source, &mut buf).unwrap();

                let target = store();
                let mut warnings = 0usize;
                load_persistent(&target, buf.as_slice(), |_, _| warnings += 1).unwrap();

                prop_assert_eq!(warnings, 0);
                prop_assert_eq!(target.len(), entries.len());
                for (name, value) in &entries {
                    prop_assert_eq!(&target.get(name), value);
                    prop_assert!(target.get_flags(name).is_persistent());
                }
            }
        }
    }
}
