//! CSR matrices stored as `.npz` archives.
//!
//! The layout is the one NumPy/SciPy tooling expects for a compressed sparse
//! row matrix: a zip of five `.npy` members (`data`, `indices`, `indptr`,
//! `format`, `shape`).

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::tfidf::CsrMatrix;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
/// Header (magic + version + length + dict) is padded to this alignment.
const NPY_ALIGN: usize = 64;

/// Write `matrix` to `path` as a deflate-compressed `.npz`.
pub fn write_npz(matrix: &CsrMatrix, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let shape = [matrix.n_rows as i64, matrix.n_cols as i64];
    let members: [(&str, Vec<u8>); 5] = [
        ("indices.npy", npy("<i4", &[matrix.indices.len()], &le_i32(&matrix.indices))),
        ("indptr.npy", npy("<i4", &[matrix.indptr.len()], &le_i32(&matrix.indptr))),
        ("format.npy", npy("|S3", &[], b"csr")),
        ("shape.npy", npy("<i8", &[2], &le_i64(&shape))),
        ("data.npy", npy("<f8", &[matrix.data.len()], &le_f64(&matrix.data))),
    ];

    for (name, bytes) in members {
        zip.start_file(name, options)
            .with_context(|| format!("adding {name}"))?;
        zip.write_all(&bytes)?;
    }
    zip.finish().context("finishing npz archive")?;
    Ok(())
}

/// Read a CSR `.npz` written by [`write_npz`].
pub fn read_npz(path: &Path) -> Result<CsrMatrix> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = ZipArchive::new(file).context("reading npz archive")?;

    let mut member = |name: &str| -> Result<NpyArray> {
        let mut entry = archive
            .by_name(name)
            .with_context(|| format!("npz missing '{name}'"))?;
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;
        parse_npy(&buf).with_context(|| format!("parsing {name}"))
    };

    let format = member("format.npy")?;
    ensure!(format.payload == b"csr", "unsupported sparse format");
    let shape = member("shape.npy")?.expect_descr("<i8")?;
    let indptr = member("indptr.npy")?.expect_descr("<i4")?;
    let indices = member("indices.npy")?.expect_descr("<i4")?;
    let data = member("data.npy")?.expect_descr("<f8")?;

    let shape: Vec<i64> = shape
        .chunks_exact(8)
        .map(|c| i64::from_le_bytes(word8(c)))
        .collect();
    ensure!(shape.len() == 2, "shape must have two entries");

    Ok(CsrMatrix {
        n_rows: shape[0] as usize,
        n_cols: shape[1] as usize,
        indptr: from_le_i32(&indptr),
        indices: from_le_i32(&indices),
        data: data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(word8(c)))
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// .npy encoding
// ---------------------------------------------------------------------------

/// Encode one array as `.npy` version 1.0.  An empty `shape` is a 0-d array.
fn npy(descr: &str, shape: &[usize], payload: &[u8]) -> Vec<u8> {
    let shape = match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        dims => format!(
            "({})",
            dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    };
    let mut header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
    let unpadded = NPY_MAGIC.len() + 2 + 2 + header.len() + 1;
    let pad = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    header.extend(std::iter::repeat(' ').take(pad));
    header.push('\n');

    let mut out = Vec::with_capacity(unpadded + pad + payload.len());
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}

struct NpyArray {
    descr: String,
    payload: Vec<u8>,
}

impl NpyArray {
    fn expect_descr(self, descr: &str) -> Result<Vec<u8>> {
        ensure!(self.descr == descr, "expected dtype {descr}, got {}", self.descr);
        Ok(self.payload)
    }
}

fn parse_npy(buf: &[u8]) -> Result<NpyArray> {
    ensure!(buf.len() >= 10 && buf.starts_with(NPY_MAGIC), "not an npy array");
    if buf[6] != 1 {
        bail!("unsupported npy version {}.{}", buf[6], buf[7]);
    }
    let header_len = u16::from_le_bytes([buf[8], buf[9]]) as usize;
    let header_end = 10 + header_len;
    ensure!(buf.len() >= header_end, "truncated npy header");
    let header = std::str::from_utf8(&buf[10..header_end]).context("npy header is not UTF-8")?;

    let descr = header
        .split("'descr': '")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .context("npy header has no descr")?;

    Ok(NpyArray {
        descr: descr.to_string(),
        payload: buf[header_end..].to_vec(),
    })
}

fn le_i32(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn le_i64(values: &[i64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn le_f64(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn from_le_i32(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn word8(chunk: &[u8]) -> [u8; 8] {
    let mut word = [0u8; 8];
    word.copy_from_slice(chunk);
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> CsrMatrix {
        CsrMatrix {
            n_rows: 3,
            n_cols: 4,
            indptr: vec![0, 2, 2, 3],
            indices: vec![0, 3, 1],
            data: vec![0.6, 0.8, 1.0],
        }
    }

    #[test]
    fn npy_header_is_aligned() {
        let bytes = npy("<f8", &[3], &[0u8; 24]);
        assert!(bytes.starts_with(NPY_MAGIC));
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % NPY_ALIGN, 0);
        assert_eq!(bytes[10 + header_len - 1], b'\n');
        assert_eq!(bytes.len(), 10 + header_len + 24);

        let header = std::str::from_utf8(&bytes[10..10 + header_len]).unwrap();
        assert!(header.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (3,), }"));
    }

    #[test]
    fn archive_has_csr_members() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npz");
        write_npz(&small(), &path).unwrap();

        let archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            ["data.npy", "format.npy", "indices.npy", "indptr.npy", "shape.npy"]
        );
    }

    #[test]
    fn matrix_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npz");
        write_npz(&small(), &path).unwrap();
        assert_eq!(read_npz(&path).unwrap(), small());
    }
}
