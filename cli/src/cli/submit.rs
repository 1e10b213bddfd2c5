use std::time::Duration;

use anyhow::anyhow;
use clap::Args;
use url::Url;
use uuid::Uuid;

use task_api::types::task::{Attachment, TaskRecord, TaskStatus, TaskSubmission};
use task_api::Client;

use super::DEFAULT_SERVER;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Args)]
pub struct SubmitArgs {
    /// Base URL of the server
    #[clap(long, default_value = DEFAULT_SERVER)]
    server: Url,
    /// Shared secret configured on the server
    #[clap(long, env = "STUDENT_SECRET", hide_env_values = true)]
    secret: String,
    /// Task identifier
    #[clap(long)]
    task: String,
    /// Description of the app to build
    #[clap(long)]
    brief: String,
    #[clap(long, default_value_t = 1)]
    round: u32,
    #[clap(long, default_value = "")]
    email: String,
    /// Correlation token echoed in the callback (random if omitted)
    #[clap(long)]
    nonce: Option<String>,
    /// Requirement the app must satisfy (repeatable)
    #[clap(long = "check")]
    checks: Vec<String>,
    /// Attachment as NAME=URL (repeatable)
    #[clap(long = "attachment", value_parser = parse_attachment)]
    attachments: Vec<Attachment>,
    /// URL to notify when the task completes
    #[clap(long, default_value = "")]
    evaluation_url: String,
    /// Wait until the task finishes
    #[clap(long)]
    wait: bool,
    /// Open the live site once it is published (implies --wait)
    #[clap(long)]
    open: bool,
}

fn parse_attachment(value: &str) -> Result<Attachment, String> {
    let (name, url) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=URL, got {value:?}"))?;
    Ok(Attachment {
        name: name.to_owned(),
        url: url.to_owned(),
    })
}

pub async fn submit(args: SubmitArgs) -> anyhow::Result<()> {
    let client = Client::new(args.server);
    let submission = TaskSubmission {
        task: args.task,
        email: args.email,
        secret: args.secret,
        round: args.round,
        nonce: args.nonce.unwrap_or_else(|| Uuid::now_v7().to_string()),
        brief: args.brief,
        checks: args.checks,
        evaluation_url: args.evaluation_url,
        attachments: args.attachments,
    };

    let accepted = client.submit(&submission).await?;
    println!("Task {} accepted as {}", accepted.id, accepted.repo_name);

    if !(args.wait || args.open) {
        return Ok(());
    }

    let record = wait_for_task(&client, &accepted.id).await?;
    print_record(&record);

    match (record.status, record.live_url) {
        (TaskStatus::Completed, Some(live_url)) if args.open => {
            if let Err(err) = webbrowser::open(&live_url) {
                eprintln!("Failed to open browser: {err}");
            }
            Ok(())
        }
        (TaskStatus::Failed, _) => Err(anyhow!("Task {} failed", accepted.id)),
        _ => Ok(()),
    }
}

pub async fn status(server: Url, task_id: &str) -> anyhow::Result<()> {
    let record = Client::new(server).status(task_id).await?;
    print_record(&record);
    Ok(())
}

async fn wait_for_task(client: &Client, task_id: &str) -> anyhow::Result<TaskRecord> {
    let mut last_status = None;
    loop {
        let record = client.status(task_id).await?;
        if last_status != Some(record.status) {
            println!("{}", record.status);
            last_status = Some(record.status);
        }
        if record.status.is_terminal() {
            return Ok(record);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn print_record(record: &TaskRecord) {
    println!("Task:   {}", record.id);
    println!("Status: {}", record.status);
    println!("Repo:   {}", record.repo_name);
    if let Some(repo_url) = &record.repo_url {
        println!("Source: {repo_url}");
    }
    if let Some(live_url) = &record.live_url {
        println!("Live:   {live_url}");
    }
    if let Some(error) = &record.error {
        println!("Error:  {error}");
    }
}
