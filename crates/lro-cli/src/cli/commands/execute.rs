//! `lro execute` – submit an arbitrary mutation.

use super::drive::{drive, print_completed, read_json_file};
use crate::cli::ExecuteArgs;
use anyhow::{bail, Result};
use lro_core::config::LroConfig;
use lro_core::lro::{FollowUp, OperationRequest, StateVocabulary, TerminalRule};

fn strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

pub(crate) fn build_request(args: &ExecuteArgs) -> Result<OperationRequest> {
    let completion = if args.status_only {
        TerminalRule::StatusOnly
    } else {
        let vocab =
            StateVocabulary::new(&args.state_path, &strs(&args.success), &strs(&args.failure));
        TerminalRule::StateField(if args.running.is_empty() {
            vocab
        } else {
            vocab.strict_running(&strs(&args.running))
        })
    };

    let mut req = OperationRequest::new(args.method, args.url.clone())
        .completion(completion)
        .resubmit_on_failure(args.resubmit_on_failure);
    for header in &args.headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("header {:?} is not in NAME:VALUE form", header);
        };
        req = req.header(name.trim(), value.trim());
    }
    if !args.accept.is_empty() {
        req = req.accept(args.accept.iter().copied());
    }
    if let Some(url) = &args.follow_up {
        req = req.follow_up(FollowUp::get(url.clone()));
    }
    if let Some(path) = &args.body {
        req = req.json(&read_json_file(path)?)?;
    }
    Ok(req)
}

pub async fn run_execute(cfg: &LroConfig, args: &ExecuteArgs) -> Result<()> {
    let req = build_request(args)?;
    let completed = drive(cfg, req).await?;
    tracing::info!(
        status = completed.status,
        polls = completed.polls,
        submissions = completed.submissions,
        "execute finished"
    );
    print_completed(&completed);
    Ok(())
}
