use std::io::{self, Write};
use std::time::Instant;

use anyhow::Context;
use tracing::{error, info};

use news_classifier::{
    config::{Config, ReportFormat},
    observability,
    pipeline::Pipeline,
    report,
};

fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(String::as_str)
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(message, "panic occurred without location information");
        }
    }));

    let config = Config::from_env().context("failed to load configuration")?;
    observability::tracing::init(config.log_format()).context("failed to initialize tracing")?;

    let started = Instant::now();
    let mut pipeline = Pipeline::from_paths(config.vectors_path(), config.corpus_dir())?;
    let groups = pipeline.run(config.class_count())?;

    let mut out = io::stdout().lock();
    let rendered = match config.report_format() {
        ReportFormat::Text => report::render(&groups, &mut out),
        ReportFormat::Json => report::render_json(&groups, &mut out).map_err(io::Error::from),
    };
    rendered.context("failed to write report")?;
    out.flush().context("failed to flush report")?;

    info!(
        groups = groups.len(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "classification finished"
    );
    Ok(())
}
