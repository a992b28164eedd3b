use chrono::{DateTime, Local, TimeZone};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Builds the result file name for a run that completed at `at`
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tidewalk::output::output_file_name;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(output_file_name(&at), "urls_20240309_140507.txt");
/// ```
pub fn output_file_name<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("urls_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Writes `urls` to `path`, sorted and deduplicated, one per line
///
/// The list is written to a sibling temporary file first and renamed into
/// place, so `path` never holds a partial list. An existing file is replaced.
pub fn write_url_list<I, S>(path: &Path, urls: I) -> io::Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sorted: BTreeSet<String> = urls.into_iter().map(|u| u.as_ref().to_string()).collect();

    let tmp_path = path.with_extension("txt.tmp");
    {
        let mut writer = BufWriter::new(fs::File::create(&tmp_path)?);
        for url in &sorted {
            writeln!(writer, "{}", url)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;

    Ok(sorted.len())
}

/// Writes the final visited set into a timestamp-named file
#[derive(Debug, Clone)]
pub struct ResultSink {
    dir: PathBuf,
}

impl ResultSink {
    /// Creates a sink writing into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory result files are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `urls` to `<dir>/urls_<timestamp>.txt` and returns the path
    pub fn write<I, S>(&self, urls: I) -> io::Result<PathBuf>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_at(urls, &Local::now())
    }

    /// Like [`write`](Self::write) with an explicit completion time
    pub fn write_at<I, S, Tz>(&self, urls: I, at: &DateTime<Tz>) -> io::Result<PathBuf>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(output_file_name(at));
        let count = write_url_list(&path, urls)?;
        tracing::info!(path = %path.display(), count, "Unique URLs written");
        Ok(path)
    }
}
