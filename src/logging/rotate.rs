use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeDelta};
use rayon::prelude::*;

use crate::logging;

/// 預設單檔最大大小：10 MB
const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
/// 預設保留天數：7 天
const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// 依日期與檔案大小輪轉的日誌檔
pub struct Rotate {
    /// 檔名模式，例如 "log/%Y-%m-%d-gold.log"
    fn_pattern: String,
    /// 當前基礎檔名（不含 generation，由日期決定）
    cur_base_fn: String,
    /// 當前完整檔名（含 generation）
    cur_fn: String,
    out_fh: Option<BufWriter<File>>,
    /// 當前世代編號，同一天內只增不減
    generation: u32,
    max_size: u64,
    current_size: u64,
    max_age: TimeDelta,
}

impl Rotate {
    pub fn new(fn_pattern: String) -> Self {
        Self::with_options(fn_pattern, DEFAULT_MAX_SIZE, DEFAULT_MAX_AGE_DAYS)
    }

    pub fn with_options(fn_pattern: String, max_size: u64, max_age_days: i64) -> Self {
        Rotate {
            fn_pattern,
            cur_base_fn: String::new(),
            cur_fn: String::new(),
            out_fh: None,
            generation: 0,
            max_size,
            current_size: 0,
            max_age: TimeDelta::try_days(max_age_days).unwrap_or(TimeDelta::days(7)),
        }
    }

    /// 寫入日誌訊息，日期變更或超過大小上限時自動換檔
    pub fn write_msg(&mut self, now: DateTime<Local>, msg: &[u8]) -> Result<()> {
        let base_fn = now.format(&self.fn_pattern).to_string();

        if base_fn != self.cur_base_fn || self.out_fh.is_none() {
            self.generation = 0;
            self.cur_base_fn = base_fn;
            self.open_new_file()?;
            self.cleanup_old_files(now);
        }

        if self.current_size > 0 && self.current_size + msg.len() as u64 > self.max_size {
            self.generation += 1;
            self.open_new_file()?;
        }

        let writer = self
            .out_fh
            .as_mut()
            .ok_or_else(|| anyhow!("The log file {} is not opened", self.cur_fn))?;
        writer.write_all(msg)?;
        writer.flush()?;
        self.current_size += msg.len() as u64;

        Ok(())
    }

    /// 產生完整檔名
    ///
    /// generation = 0: "log/2025-02-03-gold.log"
    /// generation = 1: "log/2025-02-03-gold.1.log"
    fn generate_full_fn(base_fn: &str, generation: u32) -> String {
        if generation == 0 {
            return base_fn.to_string();
        }

        let path = Path::new(base_fn);
        let parent = path.parent().unwrap_or(Path::new(""));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("log");
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("log");

        parent
            .join(format!("{}.{}.{}", stem, generation, ext))
            .to_string_lossy()
            .to_string()
    }

    fn open_new_file(&mut self) -> Result<()> {
        if let Some(mut old) = self.out_fh.take() {
            let _ = old.flush();
        }

        let filename = Self::generate_full_fn(&self.cur_base_fn, self.generation);
        if let Some(parent) = Path::new(&filename).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&filename)?;

        self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.out_fh = Some(BufWriter::with_capacity(4096, file));
        self.cur_fn = filename;

        Ok(())
    }

    /// 刪除同目錄下超過保留天數的 .log 檔
    fn cleanup_old_files(&self, now: DateTime<Local>) {
        let files = match Self::files_in_directory(&self.cur_fn) {
            Ok(files) => files,
            Err(why) => {
                logging::error_console(format!(
                    "Failed to list the log directory because {:?}",
                    why
                ));
                return;
            }
        };

        let cut_off = (now - self.max_age).timestamp().max(0) as u64;
        let to_unlink: Vec<PathBuf> = files
            .into_iter()
            .filter(|file| file.extension().is_some_and(|ext| ext == "log"))
            .filter(|file| {
                fs::metadata(file)
                    .and_then(|metadata| metadata.modified())
                    .ok()
                    .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
                    .is_some_and(|duration| duration.as_secs() <= cut_off)
            })
            .collect();

        to_unlink
            .par_iter()
            .with_min_len(num_cpus::get())
            .for_each(|unlink| {
                if let Err(why) = fs::remove_file(unlink) {
                    logging::error_console(format!(
                        "couldn't remove the file({}). because {:?}",
                        unlink.display(),
                        why
                    ));
                }
            });
    }

    fn files_in_directory<P: AsRef<Path>>(file_path: P) -> Result<Vec<PathBuf>, io::Error> {
        let parent_dir = file_path
            .as_ref()
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Parent directory not found"))?;

        let mut files = Vec::new();
        for entry in fs::read_dir(parent_dir)? {
            files.push(entry?.path());
        }

        Ok(files)
    }
}

impl Drop for Rotate {
    fn drop(&mut self) {
        if let Some(ref mut writer) = self.out_fh {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_generation_filename() {
        let base = "log/2025-02-03-gold.log";
        assert_eq!(Rotate::generate_full_fn(base, 0), "log/2025-02-03-gold.log");
        assert_eq!(Rotate::generate_full_fn(base, 1), "log/2025-02-03-gold.1.log");
        assert_eq!(Rotate::generate_full_fn(base, 2), "log/2025-02-03-gold.2.log");
    }

    #[test]
    fn test_size_rotation() {
        let dir = TempDir::new().unwrap();
        let pattern = dir
            .path()
            .join("%Y-%m-%d-size.log")
            .to_string_lossy()
            .to_string();
        let mut r = Rotate::with_options(pattern, 256, 7);
        let now = Local::now();

        for i in 0..20 {
            let msg = format!("Line {:03} - {}\r\n", i, "X".repeat(50));
            r.write_msg(now, msg.as_bytes()).unwrap();
        }

        assert!(r.generation >= 3, "generation: {}", r.generation);
        let files = fs::read_dir(dir.path()).unwrap().count() as u32;
        assert_eq!(files, r.generation + 1);
    }

    #[test]
    fn test_date_rotation() {
        let dir = TempDir::new().unwrap();
        let pattern = dir
            .path()
            .join("%Y-%m-%d-date.log")
            .to_string_lossy()
            .to_string();
        let mut r = Rotate::new(pattern);
        let now = Local::now();

        r.write_msg(now, b"Day 1\r\n").unwrap();
        r.write_msg(now + TimeDelta::days(1), b"Day 2\r\n").unwrap();

        assert_eq!(r.generation, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
