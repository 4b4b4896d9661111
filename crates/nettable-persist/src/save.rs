//! Persistent save path
//!
//! Writes every Persistent-flagged entry with an assigned value, one per
//! line, name-sorted, so repeated saves of an unchanged table are
//! byte-identical.

use std::io::Write;

use nettable_core::{TableResult, Value};
use nettable_store::EntryStore;

use crate::escape::escape;

/// File header line
pub const FILE_HEADER: &str = "[NetworkTables Storage 3.0]";

/// Serialize the store's persistent entries to a writer
pub fn save_persistent(store: &EntryStore, writer: &mut impl Write) -> TableResult<()> {
    writeln!(writer, "{FILE_HEADER}")?;
    for entry in store.persistent_snapshot() {
        write_line(writer, &entry.name, &entry.value)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_line(writer: &mut impl Write, name: &str, value: &Value) -> TableResult<()> {
    let name = escape(name);
    match value {
        // The snapshot already excludes unassigned values
        Value::Unassigned => {}
        Value::Boolean(b) => writeln!(writer, "boolean \"{name}\"={b}")?,
        Value::Double(d) => writeln!(writer, "double \"{name}\"={d}")?,
        Value::Str(s) => writeln!(writer, "string \"{name}\"=\"{}\"", escape(s))?,
        Value::Raw(bytes) => writeln!(writer, "raw \"{name}\"={}", hex::encode(bytes))?,
        Value::Rpc(bytes) => writeln!(writer, "rpc \"{name}\"={}", hex::encode(bytes))?,
        Value::BooleanArray(items) => {
            let body: Vec<String> = items.iter().map(|b| b.to_string()).collect();
            writeln!(writer, "array boolean \"{name}\"=[{}]", body.join(","))?;
        }
        Value::DoubleArray(items) => {
            let body: Vec<String> = items.iter().map(|d| d.to_string()).collect();
            writeln!(writer, "array double \"{name}\"=[{}]", body.join(","))?;
        }
        Value::StringArray(items) => {
            let body: Vec<String> = items
                .iter()
                .map(|s| format!("\"{}\"", escape(s)))
                .collect();
            writeln!(writer, "array string \"{name}\"=[{}]", body.join(","))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use nettable_core::EntryFlags;
    use nettable_store::Dispatcher;
    use std::sync::Arc;

    fn store() -> EntryStore {
        EntryStore::new(Arc::new(Dispatcher::new(256).unwrap()))
    }

    fn persistent() -> Option<EntryFlags> {
        Some(EntryFlags::new(EntryFlags::PERSISTENT))
    }

    fn save_to_string(store: &EntryStore) -> String {
        let mut buf = Vec::new();
        save_persistent(store, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_save_sorted_and_typed() {
        let store = store();
        store.set("/b/double", Value::Double(2.5), persistent());
        store.set("/a/flag", Value::Boolean(true), persistent());
        store.set("/c/text", Value::Str("hi\nthere".into()), persistent());
        store.set("/d/raw", Value::Raw(Bytes::from_static(b"\x01\x02")), persistent());
        store.set(
            "/e/bools",
            Value::BooleanArray(vec![true, false]),
            persistent(),
        );
        store.set("/f/nums", Value::DoubleArray(vec![1.0, 2.5]), persistent());
        store.set(
            "/g/names",
            Value::StringArray(vec!["x".into(), "y\"z".into()]),
            persistent(),
        );
        store.set("/skipped", Value::Double(9.0), None);

        let text = save_to_string(&store);
        let expected = "[NetworkTables Storage 3.0]\n\
                        boolean \"/a/flag\"=true\n\
                        double \"/b/double\"=2.5\n\
                        string \"/c/text\"=\"hi\\nthere\"\n\
                        raw \"/d/raw\"=0102\n\
                        array boolean \"/e/bools\"=[true,false]\n\
                        array double \"/f/nums\"=[1,2.5]\n\
                        array string \"/g/names\"=[\"x\",\"y\\\"z\"]\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_save_deterministic() {
        let store = store();
        store.set("/x", Value::Double(1.0), persistent());
        store.set("/y", Value::Boolean(false), persistent());

        assert_eq!(save_to_string(&store), save_to_string(&store));
    }

    #[test]
    fn test_empty_store_writes_header_only() {
        let store = store();
        assert_eq!(save_to_string(&store), "[NetworkTables Storage 3.0]\n");
    }
}
