//! courier worker binary.
//!
//! Run with the queue and API endpoints configured in the environment (see
//! `.env.example`). The process exits non-zero only when configuration is
//! invalid or the queue is unreachable at startup; once the loop is running
//! it survives any job failure.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use courier::config::Settings;
use courier::handlers::{CancelAppointmentHandler, SmsHandler};
use courier::queue::RedisQueue;
use courier::transport::{
    AppointmentApi, HttpAppointmentApi, HttpSmsSender, SmsSender,
};
use courier::worker::{shutdown_channel, wait_for_shutdown, Dispatcher, RunnerConfig, Worker};

fn display_error(err: &anyhow::Error) {
    eprintln!("Error: {err}");
    for cause in err.chain().skip(1) {
        eprintln!("Caused by: {cause}");
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        display_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let settings = Settings::from_env()?;

    let queue = RedisQueue::connect(
        &settings.redis_url,
        &settings.queue_name,
        settings.queue_settings(),
    )
    .await
    .with_context(|| format!("cannot connect to redis at {}", settings.redis_url))?;

    let sms = HttpSmsSender::new(&settings.sms_api_url, settings.http_timeout())
        .context("invalid SMS gateway configuration")?;
    let appointments = HttpAppointmentApi::new(
        &settings.appointments_api_url,
        &settings.appointments_api_key,
        settings.http_timeout(),
    )
    .context("invalid appointments API configuration")?;

    let dispatcher = Dispatcher::new(
        SmsHandler::new(Arc::new(sms) as Arc<dyn SmsSender>),
        CancelAppointmentHandler::new(Arc::new(appointments) as Arc<dyn AppointmentApi>),
        settings.handler_timeout(),
    );

    let worker = Worker::new(Arc::new(queue), dispatcher, RunnerConfig::default());

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(wait_for_shutdown(shutdown_tx));

    worker.run(shutdown_rx).await.with_context(|| {
        format!(
            "worker cannot start; make sure redis is running at {}",
            settings.redis_url
        )
    })?;

    Ok(())
}
