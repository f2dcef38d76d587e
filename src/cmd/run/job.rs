use futures::{AsyncBufReadExt, TryStreamExt};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{ListParams, LogParams};
use kube::runtime::wait::await_condition;
use kube::{Api, ResourceExt};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

use crate::cluster::{perform_get, ClusterAccess, KubeCluster};
use crate::constants::{BOOT_CHART_DIR, BOOT_CONTAINER, BOOT_JOB, BOOT_RELEASE};
use crate::error::Error;
use crate::exec::Command;
use crate::requirements::RequirementsConfig;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const POD_WAIT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, PartialEq)]
pub enum JobOutcome {
    Active,
    Succeeded,
    Failed,
}

/// The `helm install` that creates the boot Job from the installer chart
pub fn boot_job_command(requirements: &RequirementsConfig, git_url: &str) -> Command {
    let mut c = Command::new("helm", ["install", BOOT_RELEASE, BOOT_CHART_DIR]);
    let cluster = &requirements.cluster;
    let values = [
        ("boot.repositoryUrl", git_url),
        ("jxRequirements.cluster.provider", cluster.provider.as_str()),
        ("jxRequirements.cluster.clusterName", cluster.cluster_name.as_str()),
        ("jxRequirements.cluster.project", cluster.project_id.as_str()),
        ("jxRequirements.cluster.zone", cluster.zone.as_str()),
        ("jxRequirements.cluster.region", cluster.region.as_str()),
        ("jxRequirements.versionStream.url", requirements.version_stream.url.as_str()),
        ("jxRequirements.versionStream.ref", requirements.version_stream.ref_.as_str()),
        ("jxRequirements.ingress.domain", requirements.ingress.domain.as_str()),
    ];
    for (key, value) in values {
        if !value.is_empty() {
            c.args.push("--set".into());
            c.args.push(format!("{}={}", key, value));
        }
    }
    c
}

pub async fn has_helm_release(release_name: &str) -> Result<bool, Error> {
    let text = Command::new("helm", ["list", "--short"]).run().await?;
    Ok(release_listed(&text, release_name))
}

fn release_listed(text: &str, release_name: &str) -> bool {
    text.lines().any(|line| line.trim() == release_name)
}

pub fn job_outcome(job: &Job) -> JobOutcome {
    let status = match &job.status {
        Some(s) => s,
        None => return JobOutcome::Active,
    };
    if status.succeeded.unwrap_or(0) > 0 {
        return JobOutcome::Succeeded;
    }
    let conditions = status.conditions.as_deref().unwrap_or_default();
    let holds = |type_: &str| {
        conditions
            .iter()
            .any(|c| c.type_ == type_ && c.status == "True")
    };
    if holds("Failed") {
        JobOutcome::Failed
    } else if holds("Complete") {
        JobOutcome::Succeeded
    } else {
        JobOutcome::Active
    }
}

fn pod_phase(pod: &Pod) -> &str {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or("Pending")
}

/// Logs can be read once the pod is running or has finished
fn pod_started(pod: &Pod) -> bool {
    matches!(pod_phase(pod), "Running" | "Succeeded" | "Failed")
}

fn pod_finished(pod: &Pod) -> bool {
    matches!(pod_phase(pod), "Succeeded" | "Failed")
}

/// Follows the boot container logs of the Job's pods until the Job succeeds or fails
pub async fn tail_job_logs(cluster: &KubeCluster) -> Result<(), Error> {
    let ns = cluster.namespace().to_string();
    let pods: Api<Pod> = Api::namespaced(cluster.client(), &ns);
    let selector = format!("job-name={}", BOOT_JOB);

    let mut finished: HashSet<String> = HashSet::new();
    let mut resume: Option<(String, Instant)> = None;
    loop {
        let pod = match wait_for_pod(cluster, &pods, &selector, &finished).await? {
            Some(pod) => pod,
            None => {
                info!("Job {} succeeded", BOOT_JOB);
                return Ok(());
            }
        };
        let name = pod.name_any();
        let since_seconds = match &resume {
            // the gap since the last stream ended, plus a second
            Some((resumed, ended)) if *resumed == name => Some(ended.elapsed().as_secs() as i64 + 1),
            _ => {
                info!("tailing logs of pod {}", name);
                None
            }
        };
        stream_logs(&pods, &name, since_seconds).await?;
        let ended = Instant::now();

        let current = pods.get_opt(&name).await?;
        if current.as_ref().map_or(true, pod_finished) {
            debug!("pod {} of Job {} finished", name, BOOT_JOB);
            finished.insert(name);
            resume = None;
        } else {
            resume = Some((name, ended));
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// Reads the boot Job, `true` once it has succeeded
async fn job_succeeded(cluster: &KubeCluster) -> Result<bool, Error> {
    let job: Job = perform_get(cluster.client(), BOOT_JOB, cluster.namespace()).await?;
    match job_outcome(&job) {
        JobOutcome::Succeeded => Ok(true),
        JobOutcome::Failed => Err(Error::JobFailed(BOOT_JOB.to_string())),
        JobOutcome::Active => Ok(false),
    }
}

/// Waits for the newest pod matching `selector` that has not already finished,
/// or `None` once the Job has succeeded
async fn wait_for_pod(
    cluster: &KubeCluster,
    pods: &Api<Pod>,
    selector: &str,
    finished: &HashSet<String>,
) -> Result<Option<Pod>, Error> {
    let ns = cluster.namespace();
    let not_found = || Error::PodNotFound {
        namespace: ns.to_string(),
        selector: selector.to_string(),
    };
    let deadline = Instant::now() + POD_WAIT_TIMEOUT;
    let lp = ListParams::default().labels(selector);

    let pod = loop {
        if job_succeeded(cluster).await? {
            return Ok(None);
        }
        let newest = pods
            .list(&lp)
            .await?
            .items
            .into_iter()
            .filter(|p| !finished.contains(&p.name_any()))
            .max_by_key(|p| p.metadata.creation_timestamp.as_ref().map(|t| t.0));
        if let Some(pod) = newest {
            break pod;
        }
        if Instant::now() >= deadline {
            return Err(not_found());
        }
        debug!("waiting for a pod in namespace {} matching {}", ns, selector);
        sleep(POLL_INTERVAL).await;
    };

    if pod_started(&pod) {
        return Ok(Some(pod));
    }
    let name = pod.name_any();
    info!("waiting for pod {} to start", name);
    let started = await_condition(pods.clone(), &name, |p: Option<&Pod>| {
        p.map_or(false, pod_started)
    });
    match timeout(deadline.saturating_duration_since(Instant::now()), started).await {
        Ok(Ok(Some(pod))) => Ok(Some(pod)),
        Ok(Ok(None)) | Err(_) => Err(not_found()),
        Ok(Err(e)) => Err(e.into()),
    }
}

async fn stream_logs(pods: &Api<Pod>, name: &str, since_seconds: Option<i64>) -> Result<(), Error> {
    let lp = LogParams {
        follow: true,
        container: Some(BOOT_CONTAINER.to_string()),
        since_seconds,
        ..LogParams::default()
    };
    let mut lines = Box::pin(pods.log_stream(name, &lp).await?.lines());
    while let Some(line) = lines.try_next().await.map_err(|source| Error::LogStream {
        pod: name.to_string(),
        source,
    })? {
        println!("{}", line);
    }
    Ok(())
}
