mod job;

use std::{env, path::Path};

use anyhow::{Context, bail};
use log::{info, warn};
use regression::GradientDescentBsp;
use tokio::signal;

use crate::job::{JobSpec, write_records};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = env::args().nth(1).context("usage: node <job.json>")?;
    let path = Path::new(&path);

    let job = JobSpec::load(path)?;
    let base = path.parent().unwrap_or(Path::new("."));
    let dataset = job.dataset(base)?;
    let cluster = job.cluster(&dataset)?;

    info!(peers = cluster.ids().len(), examples = dataset.len(); "starting job");

    let output = cluster.output();
    let conf = job.conf.clone();

    let run = cluster.run(move |mut peer| {
        let conf = conf.clone();
        async move {
            let gd = GradientDescentBsp::setup(&conf, &peer)?;
            gd.run(&mut peer).await
        }
    });

    let res = tokio::select! {
        res = run => res,
        _ = signal::ctrl_c() => {
            warn!("received SIGINT, aborting the job");
            bail!("interrupted");
        }
    };

    // Written before checking the outcome so a diverged run keeps its trace.
    if let Some(out) = &job.output {
        write_records(out, &output.records())?;
        info!("wrote {} records to {}", output.len(), out.display());
    }

    let summaries = res?;
    let iterations = summaries.first().map_or(0, |s| s.iterations);

    match output.last() {
        Some(last) => println!("{}", serde_json::to_string(&last)?),
        None => warn!("the job produced no output"),
    }

    info!(iterations = iterations; "job finished");
    Ok(())
}
