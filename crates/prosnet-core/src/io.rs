//! Embedding dump format.
//!
//! Both formats start with a text header line `<num_nodes> <dim>` and then hold
//! one record per node in dictionary order:
//!
//! - text: `node_id v1 v2 ... vD\n`, values space separated;
//! - binary: `node_id`, one space, `D` little-endian `f32` values with no
//!   separators, then `\n`.
//!
//! Text values are written with the shortest representation that parses back
//! to the same `f32`, so both formats reload exactly.

use crate::embedding::EmbeddingStore;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Write every vector of `store` to `path`.
pub fn write_embeddings(store: &EmbeddingStore, path: impl AsRef<Path>, binary: bool) -> Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    let dim = store.dim();
    let mut buf = vec![0.0f32; dim];

    writeln!(out, "{} {}", store.len(), dim)?;
    for (idx, id) in store.dictionary().iter() {
        store.vector_of(idx)?.read_into(&mut buf);
        write!(out, "{id}")?;
        if binary {
            out.write_all(b" ")?;
            for v in &buf {
                out.write_all(&v.to_le_bytes())?;
            }
        } else {
            for v in &buf {
                write!(out, " {v}")?;
            }
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Read a dump written by [`write_embeddings`].
pub fn read_embeddings(path: impl AsRef<Path>, binary: bool) -> Result<Vec<(String, Vec<f32>)>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let mut header = String::new();
    reader.read_line(&mut header)?;
    let (count, dim) = parse_header(path, &header)?;

    let mut records = Vec::with_capacity(count);
    if binary {
        let mut id_bytes = Vec::new();
        let mut raw = vec![0u8; dim * 4];
        for i in 0..count {
            let lineno = i + 2;
            id_bytes.clear();
            reader.read_until(b' ', &mut id_bytes)?;
            if id_bytes.pop() != Some(b' ') {
                return Err(Error::parse(path, lineno, "truncated record id"));
            }
            let id = String::from_utf8(id_bytes.clone())
                .map_err(|_| Error::parse(path, lineno, "node id is not UTF-8"))?;
            reader
                .read_exact(&mut raw)
                .map_err(|_| Error::parse(path, lineno, "truncated vector"))?;
            let vector = raw
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            let mut newline = [0u8; 1];
            reader
                .read_exact(&mut newline)
                .map_err(|_| Error::parse(path, lineno, "missing record terminator"))?;
            if newline[0] != b'\n' {
                return Err(Error::parse(path, lineno, "missing record terminator"));
            }
            records.push((id, vector));
        }
    } else {
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = i + 2;
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let id = parts
                .next()
                .ok_or_else(|| Error::parse(path, lineno, "missing node id"))?
                .to_string();
            let vector = parts
                .map(|tok| {
                    tok.parse::<f32>()
                        .map_err(|_| Error::parse(path, lineno, format!("invalid value '{tok}'")))
                })
                .collect::<Result<Vec<f32>>>()?;
            if vector.len() != dim {
                return Err(Error::parse(
                    path,
                    lineno,
                    format!("expected {dim} values, found {}", vector.len()),
                ));
            }
            records.push((id, vector));
        }
        if records.len() != count {
            return Err(Error::parse(
                path,
                1,
                format!("header declares {count} records, found {}", records.len()),
            ));
        }
    }

    Ok(records)
}

fn parse_header(path: &Path, header: &str) -> Result<(usize, usize)> {
    let mut parts = header.split_whitespace();
    let mut field = |name: &str| -> Result<usize> {
        parts
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| Error::parse(path, 1, format!("invalid header: missing {name}")))
    };
    let count = field("node count")?;
    let dim = field("dimension")?;
    Ok((count, dim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeDictionary;
    use std::sync::Arc;

    fn store() -> EmbeddingStore {
        let dict = Arc::new(NodeDictionary::from_ids(["TP53", "人参", "fatigue"]));
        EmbeddingStore::new(dict, 5, 3).unwrap()
    }

    #[test]
    fn test_text_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vec.txt");
        let store = store();
        store.output(&path, false).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("3 5"));
        let first: Vec<&str> = lines.next().unwrap().split(' ').collect();
        assert_eq!(first[0], "TP53");
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn test_binary_record_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vec.bin");
        store().output(&path, true).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let header = b"3 5\n".len();
        let ids = "TP53".len() + "人参".len() + "fatigue".len();
        // id + space + 5 floats + newline per record
        assert_eq!(bytes.len(), header + ids + 3 * (1 + 5 * 4 + 1));
    }

    #[test]
    fn test_text_and_binary_reload_equal() {
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("vec.txt");
        let bin_path = dir.path().join("vec.bin");
        let store = store();
        store.output(&text_path, false).unwrap();
        store.output(&bin_path, true).unwrap();

        let text = read_embeddings(&text_path, false).unwrap();
        let bin = read_embeddings(&bin_path, true).unwrap();
        assert_eq!(text.len(), 3);
        for (i, ((tid, tv), (bid, bv))) in text.iter().zip(bin.iter()).enumerate() {
            assert_eq!(tid, bid);
            let original = store.vector(i).unwrap();
            for ((a, b), c) in tv.iter().zip(bv).zip(&original) {
                assert!((a - c).abs() < 1e-6);
                assert_eq!(b, c);
            }
        }
    }

    #[test]
    fn test_truncated_text_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "2 3\nA 1 2 3\nB 1 2\n").unwrap();
        let err = read_embeddings(&path, false).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }
}
