use std::{thread, time::Duration};

use chrono::{format::DelayedFormat, DateTime, Local};
use concat_string::concat_string;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use once_cell::sync::Lazy;
use strum::Display;

use crate::logging::rotate::Rotate;

pub mod rotate;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("gold"));

/// 累積多少位元組後就寫入檔案
const BATCH_SIZE: usize = 4096;

#[derive(Display, Debug, Copy, Clone, PartialEq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

pub struct LogMessage {
    pub level: Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

enum Command {
    Write(LogMessage),
    /// 將緩衝區寫入檔案後回覆
    Flush(Sender<()>),
}

pub struct Logger {
    writer: Sender<Command>,
}

impl Logger {
    /// 建立寫入 `log/%Y-%m-%d-{log_name}.log` 的日誌
    pub fn new(log_name: &str) -> Self {
        let (tx, rx) = unbounded::<Command>();
        let fn_pattern = format!("log/%Y-%m-%d-{}.log", log_name);

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || Self::run(Rotate::new(fn_pattern), rx));

        Logger { writer: tx }
    }

    fn run(mut rotate: Rotate, rx: Receiver<Command>) {
        let mut together = String::with_capacity(BATCH_SIZE);

        for received in &rx {
            match received {
                Command::Write(received) => {
                    together.push_str(
                        concat_string!(
                            received.created_at.format("%F %X%.6f").to_string(),
                            " ",
                            received.level.to_string(),
                            " ",
                            received.msg,
                            "\r\n"
                        )
                        .as_str(),
                    );

                    if rx.is_empty() || together.len() >= BATCH_SIZE {
                        Self::write_batch(&mut rotate, &mut together);
                    }
                }
                Command::Flush(done) => {
                    Self::write_batch(&mut rotate, &mut together);
                    let _ = done.send(());
                }
            }
        }
    }

    fn write_batch(rotate: &mut Rotate, together: &mut String) {
        if together.is_empty() {
            return;
        }

        if let Err(why) = rotate.write_msg(Local::now(), together.as_bytes()) {
            error_console(format!("Failed to write log because {:?}\r\n{}", why, together));
        }

        together.clear();
    }

    pub fn info<S: Into<String>>(&self, log: S) {
        self.send(Level::Info, log.into());
    }

    pub fn warn<S: Into<String>>(&self, log: S) {
        self.send(Level::Warn, log.into());
    }

    pub fn error<S: Into<String>>(&self, log: S) {
        self.send(Level::Error, log.into());
    }

    pub fn debug<S: Into<String>>(&self, log: S) {
        self.send(Level::Debug, log.into());
    }

    fn send(&self, level: Level, msg: String) {
        if let Err(why) = self.writer.send(Command::Write(LogMessage::new(level, msg))) {
            error_console(why.to_string());
        }
    }

    /// 等待尚未寫入的日誌落地，最多等一秒
    pub fn flush(&self) {
        let (tx, rx) = bounded::<()>(1);
        if self.writer.send(Command::Flush(tx)).is_ok() {
            let _ = rx.recv_timeout(Duration::from_secs(1));
        }
    }
}

pub fn info_file_async<S: Into<String>>(log: S) {
    LOGGER.info(log);
}

pub fn warn_file_async<S: Into<String>>(log: S) {
    LOGGER.warn(log);
}

pub fn error_file_async<S: Into<String>>(log: S) {
    LOGGER.error(log);
}

pub fn debug_file_async<S: Into<String>>(log: S) {
    LOGGER.debug(log);
}

/// 程式結束前呼叫，確保預設日誌已寫入檔案
pub fn flush() {
    LOGGER.flush();
}

pub fn info_console<S: AsRef<str>>(log: S) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log.as_ref()
    );
}

pub fn error_console<S: AsRef<str>>(log: S) {
    println!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log.as_ref()
    );
}
