use std::{env, future::Future, sync::Arc};

use anyhow::{Error, Result};
use tokio::signal;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{config::App, event, logging};

/// 啟動排程，直到收到 Ctrl-C 才結束
pub async fn start(config: App) -> Result<()> {
    let mut sched = JobScheduler::new().await?;
    let config = Arc::new(config);
    let cron_expr = config.scheduler.cron.clone();

    //                 sec  min   hour   day of month   month   day of week
    // UTC 時間，預設 04:30 即印度時間 10:00
    let task_config = Arc::clone(&config);
    let job = create_job(&cron_expr, move || {
        let config = Arc::clone(&task_config);
        async move {
            event::gold_rate::execute(&config).await?;
            Ok(())
        }
    })?;

    sched.add(job).await?;
    sched.start().await?;

    logging::info_file_async(format!(
        "GoldCrawler 已啟動({}) Rust OS/Arch: {}/{}",
        cron_expr,
        env::consts::OS,
        env::consts::ARCH
    ));

    signal::ctrl_c().await?;
    sched.shutdown().await?;
    logging::info_file_async("GoldCrawler 已停止");

    Ok(())
}

fn create_job<F, Fut>(cron_expr: &str, task: F) -> Result<Job>
where
    F: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    let expr = cron_expr.to_string();
    Ok(Job::new_async(cron_expr, move |_uuid, _l| {
        let task = task.clone();
        let expr = expr.clone();
        Box::pin(async move {
            if let Err(why) = task().await {
                logging::error_file_async(format!(
                    "Failed to execute task({}) because {:?}",
                    expr, why
                ));
            }
        })
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_job() {
        assert!(create_job("0 30 4 * * *", || async { Ok(()) }).is_ok());
        assert!(create_job("every morning", || async { Ok(()) }).is_err());
    }
}
