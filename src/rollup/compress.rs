use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn temp_sibling(dest: &Path) -> Result<NamedTempFile> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))
}

fn persist(tmp: NamedTempFile, dest: &Path) -> Result<()> {
    tmp.persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    Ok(())
}

/// Byte-for-byte concatenation of `inputs`, in order, into `dest`.
pub fn concat_files(inputs: &[impl AsRef<Path>], dest: &Path) -> Result<u64> {
    let tmp = temp_sibling(dest)?;
    let mut writer = BufWriter::new(tmp.as_file());
    let mut total = 0u64;
    for input in inputs {
        let input = input.as_ref();
        let mut reader = BufReader::new(
            File::open(input).with_context(|| format!("failed to open {}", input.display()))?,
        );
        total += io::copy(&mut reader, &mut writer)
            .with_context(|| format!("failed to append {}", input.display()))?;
    }
    writer.flush()?;
    drop(writer);
    persist(tmp, dest)?;
    Ok(total)
}

/// Decompress each gzip input in order and concatenate the payloads into `dest`.
pub fn decompress_concat(inputs: &[impl AsRef<Path>], dest: &Path) -> Result<u64> {
    let tmp = temp_sibling(dest)?;
    let mut writer = BufWriter::new(tmp.as_file());
    let mut total = 0u64;
    for input in inputs {
        let input = input.as_ref();
        let file =
            File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
        let mut decoder = MultiGzDecoder::new(BufReader::new(file));
        total += io::copy(&mut decoder, &mut writer)
            .with_context(|| format!("failed to decompress {}", input.display()))?;
    }
    writer.flush()?;
    drop(writer);
    persist(tmp, dest)?;
    Ok(total)
}

/// Gzip `src` at the best compression level into `dest`, then remove `src`.
pub fn compress_replace(src: &Path, dest: &Path) -> Result<()> {
    let tmp = temp_sibling(dest)?;
    {
        let mut reader = BufReader::new(
            File::open(src).with_context(|| format!("failed to open {}", src.display()))?,
        );
        let mut encoder = GzEncoder::new(BufWriter::new(tmp.as_file()), Compression::best());
        io::copy(&mut reader, &mut encoder)
            .with_context(|| format!("failed to compress {}", src.display()))?;
        encoder
            .finish()
            .with_context(|| format!("failed to finish {}", dest.display()))?
            .flush()?;
    }
    persist(tmp, dest)?;
    fs::remove_file(src).with_context(|| format!("failed to remove {}", src.display()))?;
    Ok(())
}

pub fn file_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
pub fn read_gz_to_string(path: &Path) -> Result<String> {
    use std::io::Read;
    let mut out = String::new();
    MultiGzDecoder::new(File::open(path)?).read_to_string(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn monthly_style_merge_keeps_input_order() {
        let tmp = tempdir().expect("tempdir");
        let a = tmp.path().join("daily_1.ndjson");
        let b = tmp.path().join("daily_2.ndjson");
        fs::write(&a, "{\"n\":1}\n").expect("write a");
        fs::write(&b, "{\"n\":2}\n").expect("write b");

        let combined = tmp.path().join("monthly_1_2.ndjson");
        let bytes = concat_files(&[&b, &a], &combined).expect("concat");
        assert_eq!(bytes, 16);
        assert_eq!(
            fs::read_to_string(&combined).expect("read"),
            "{\"n\":2}\n{\"n\":1}\n"
        );

        let gz = tmp.path().join("monthly_1_2.ndjson.gz");
        compress_replace(&combined, &gz).expect("compress");
        assert!(!combined.exists());
        assert_eq!(
            read_gz_to_string(&gz).expect("gunzip"),
            "{\"n\":2}\n{\"n\":1}\n"
        );
    }

    #[test]
    fn yearly_style_merge_decompresses_each_input() {
        let tmp = tempdir().expect("tempdir");
        let mut archives = Vec::new();
        for (name, body) in [("m1", "a\nb\n"), ("m2", "c\n")] {
            let raw = tmp.path().join(format!("{name}.ndjson"));
            fs::write(&raw, body).expect("write");
            let gz = tmp.path().join(format!("{name}.ndjson.gz"));
            compress_replace(&raw, &gz).expect("compress");
            archives.push(gz);
        }

        let merged = tmp.path().join("yearly.ndjson");
        decompress_concat(archives.as_slice(), &merged).expect("merge");
        assert_eq!(fs::read_to_string(&merged).expect("read"), "a\nb\nc\n");
    }

    #[test]
    fn missing_input_fails_without_creating_dest() {
        let tmp = tempdir().expect("tempdir");
        let dest = tmp.path().join("out.ndjson");
        let err = concat_files(&[tmp.path().join("nope")], &dest);
        assert!(err.is_err());
        assert!(!dest.exists());
    }
}
