use anyhow::{Context, Result};
use flate2::read;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read normal or compressed files seamlessly
/// Uses the presence of a `.gz` extension to decide.
/// Pass "-" to read from stdin.
pub fn reader(filename: &str) -> Result<Box<dyn BufRead>> {
    if filename == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let path = Path::new(filename);
    let file = File::open(path).with_context(|| format!("couldn't open {}", path.display()))?;

    if path.extension() == Some(OsStr::new("gz")) {
        Ok(Box::new(BufReader::with_capacity(
            128 * 1024,
            read::GzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(128 * 1024, file)))
    }
}

/// Collect every line of a (possibly compressed) file.
pub fn lines(filename: &str) -> Result<Vec<String>> {
    reader(filename)?
        .lines()
        .collect::<io::Result<Vec<String>>>()
        .with_context(|| format!("error reading {}", filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn reads_plain_and_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("a.txt");
        std::fs::write(&plain, "one\ntwo\n").unwrap();

        let gz = dir.path().join("a.txt.gz");
        let mut enc = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        enc.write_all(b"one\ntwo\n").unwrap();
        enc.finish().unwrap();

        for path in [plain, gz] {
            let lines = lines(path.to_str().unwrap()).unwrap();
            assert_eq!(lines, vec!["one", "two"]);
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(reader("no/such/file.tsv").is_err());
    }
}
