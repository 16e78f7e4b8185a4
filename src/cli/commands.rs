use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::{Settings, NAMESPACE_ENV};
use crate::k8s::{K8sClient, KubePodDirectory, LabelSelector, Phase, PodDirectory};
use crate::wait::{Pending, Poller, WaitOutcome};
use crate::{PodSetError, PodSetView, Result};
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Resolve settings from the environment, letting CLI flags take precedence.
pub fn settings_from_cli(cli: &Cli) -> Result<Settings> {
    let settings = Settings::from_lookup(|key| match (key, &cli.namespace) {
        (NAMESPACE_ENV, Some(ns)) => Some(ns.clone()),
        _ => std::env::var(key).ok(),
    })?;

    let settings = match &cli.context {
        Some(ctx) => settings.with_context(ctx.clone()),
        None => settings,
    };

    Ok(settings
        .with_poll_interval(Duration::from_secs(cli.interval))
        .with_timeout(cli.timeout.map(Duration::from_secs)))
}

pub async fn handle_command(cli: &Cli, command: Commands, cancel: CancellationToken) -> Result<()> {
    let settings = settings_from_cli(cli)?;
    debug!("Resolved settings: {:?}", settings);

    let client = K8sClient::from_settings(&settings).await?;
    let view = PodSetView::new(KubePodDirectory::new(client, settings.namespace.clone()));
    let poller = Poller::new(settings.poll_interval)
        .with_timeout(settings.timeout)
        .with_cancellation(cancel);

    let output = run(&view, command, &poller, cli.local_ip).await?;
    if let Some(out) = output {
        println!("{}", out);
    }
    Ok(())
}

/// Execute one command against a view and return what it prints.
pub async fn run<D: PodDirectory>(
    view: &PodSetView<D>,
    command: Commands,
    poller: &Poller,
    local_ip: Option<IpAddr>,
) -> Result<Option<String>> {
    match command {
        Commands::FetchIps { label_selector } => {
            let selector = LabelSelector::from(label_selector);
            view.fetch_running_ips(&selector).await.map(Some)
        }
        Commands::FetchIpsString {
            label_selector,
            phase,
        } => {
            let selector = LabelSelector::from(label_selector);
            view.ip_csv(&selector, phase.as_ref()).await.map(Some)
        }
        Commands::FetchEndpoints {
            label_selector,
            port,
        } => {
            let selector = LabelSelector::from(label_selector);
            view.fetch_running_endpoints(&selector, port).await.map(Some)
        }
        Commands::FetchId { label_selector } => {
            let selector = LabelSelector::from(label_selector);
            let ordinal = match local_ip {
                Some(ip) => view.ordinal_of(&selector, Some(&Phase::Running), &ip).await?,
                None => view.fetch_running_ordinal(&selector).await?,
            }
            .ok_or_else(|| PodSetError::LocalPodNotFound {
                selector: selector.to_string(),
            })?;
            Ok(Some(ordinal.to_string()))
        }
        Commands::CountPodsByPhase {
            label_selector,
            phase,
        } => {
            let selector = LabelSelector::from(label_selector);
            let count = view.count_by_phase(&selector, &phase).await?;
            Ok(Some(count.to_string()))
        }
        Commands::WaitPodsRunning {
            label_selector,
            desired,
        } => {
            let selector = LabelSelector::from(label_selector);
            println!("label selector: {}, desired: {}", selector, desired);
            let outcome = view
                .wait_until_running_count_at_least(&selector, desired, poller, |pending| {
                    println!("{}", progress_line(pending, poller.interval()));
                })
                .await?;
            finish_wait(outcome)
        }
        Commands::WaitContainersReady { label_selector } => {
            let selector = LabelSelector::from(label_selector);
            println!("label selector: {}, wait all containers ready", selector);
            let outcome = view
                .wait_until_all_containers_ready(&selector, poller, |pending| {
                    println!("{}", progress_line(pending, poller.interval()));
                })
                .await?;
            finish_wait(outcome)
        }
        Commands::ListPods {
            label_selector,
            phase,
            output,
        } => {
            let selector = LabelSelector::from(label_selector);
            let pods = view.list_pods(&selector, phase.as_ref()).await?;
            let entries: Vec<PodEntry> = pods
                .into_iter()
                .map(|(phase, ip)| PodEntry { phase, ip })
                .collect();
            format_entries(&entries, output).map(Some)
        }
        Commands::ContainersReady { label_selector } => {
            let selector = LabelSelector::from(label_selector);
            let ready = view.all_containers_ready(&selector).await?;
            Ok(Some(ready.to_string()))
        }
    }
}

fn finish_wait(outcome: WaitOutcome) -> Result<Option<String>> {
    if outcome.is_satisfied() {
        info!("Wait finished");
        Ok(None)
    } else {
        Err(PodSetError::WaitIncomplete(outcome))
    }
}

pub fn progress_line(pending: &Pending, interval: Duration) -> String {
    match pending {
        Pending::RunningCount { current, .. } => format!(
            "current cnt: {} sleep for {} seconds...",
            current,
            interval.as_secs()
        ),
        Pending::ContainersNotReady => format!(
            "not all containers ready, sleep for {} seconds...",
            interval.as_secs()
        ),
    }
}

#[derive(Debug, Serialize)]
struct PodEntry {
    phase: Phase,
    ip: Option<String>,
}

fn format_entries(entries: &[PodEntry], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(entries
            .iter()
            .map(|e| format!("{}\t{}", e.phase, e.ip.as_deref().unwrap_or("<none>")))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => serde_json::to_string_pretty(entries)
            .map_err(|e| PodSetError::OutputError(format!("Failed to encode JSON: {}", e))),
        OutputFormat::Yaml => serde_yaml::to_string(entries)
            .map_err(|e| PodSetError::OutputError(format!("Failed to encode YAML: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lines() {
        let interval = Duration::from_secs(5);
        assert_eq!(
            progress_line(&Pending::RunningCount { current: 2, desired: 4 }, interval),
            "current cnt: 2 sleep for 5 seconds..."
        );
        assert_eq!(
            progress_line(&Pending::ContainersNotReady, interval),
            "not all containers ready, sleep for 5 seconds..."
        );
    }

    #[test]
    fn test_format_entries() {
        let entries = vec![
            PodEntry {
                phase: Phase::Running,
                ip: Some("10.0.0.1".to_string()),
            },
            PodEntry {
                phase: Phase::Pending,
                ip: None,
            },
        ];

        assert_eq!(
            format_entries(&entries, OutputFormat::Text).unwrap(),
            "Running\t10.0.0.1\nPending\t<none>"
        );

        let json: serde_json::Value =
            serde_json::from_str(&format_entries(&entries, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json[0]["phase"], "Running");
        assert!(json[1]["ip"].is_null());

        let yaml = format_entries(&entries, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("phase: Pending"));
    }

    #[test]
    fn test_unsatisfied_wait_is_error() {
        assert!(finish_wait(WaitOutcome::Satisfied).unwrap().is_none());
        assert!(matches!(
            finish_wait(WaitOutcome::Cancelled),
            Err(PodSetError::WaitIncomplete(WaitOutcome::Cancelled))
        ));
    }
}
