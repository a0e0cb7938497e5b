//! Where targets come from: `-t`, `-l`, or piped stdin.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Targets from flags and list file, in that order; `stdin` is read only
/// when the caller decided it is piped. Lines from the list and stdin may
/// hold several whitespace-separated targets.
pub fn collect_targets<R: BufRead>(flags: &[String], list: Option<&Path>, stdin: Option<R>) -> Result<Vec<String>> {
    let mut targets: Vec<String> = flags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if let Some(path) = list {
        let file = File::open(path).with_context(|| format!("open target list {}", path.display()))?;
        targets.extend(read_lines(BufReader::new(file)).with_context(|| format!("read target list {}", path.display()))?);
    }
    if let Some(reader) = stdin {
        targets.extend(read_lines(reader).context("read targets from stdin")?);
    }
    Ok(targets)
}

fn read_lines<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut out = Vec::new();
    for line in reader.lines() {
        out.extend(line?.split_whitespace().map(str::to_string));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn flags_then_list_then_stdin() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "b.example.com\n\n  c.example.com  ").unwrap();
        f.flush().unwrap();

        let flags = vec!["a.example.com".to_string(), " ".to_string()];
        let stdin = Cursor::new("d.example.com\n");
        let got = collect_targets(&flags, Some(f.path()), Some(stdin)).unwrap();
        assert_eq!(got, vec!["a.example.com", "b.example.com", "c.example.com", "d.example.com"]);
    }

    #[test]
    fn several_targets_on_one_line_are_split() {
        let stdin = Cursor::new("a.com b.com\n\tc.com   d.com/x\n");
        let got = collect_targets(&[], None, Some(stdin)).unwrap();
        assert_eq!(got, vec!["a.com", "b.com", "c.com", "d.com/x"]);
    }

    #[test]
    fn missing_list_file_is_an_error() {
        let err = collect_targets::<Cursor<&[u8]>>(&[], Some(Path::new("/nonexistent/targets.txt")), None)
            .unwrap_err();
        assert!(format!("{err:#}").contains("open target list"));
    }
}
