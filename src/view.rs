//! Read-through views over the pods matching a label selector
//!
//! Every query lists the pod set once from the [`PodDirectory`], maps each pod
//! to a [`PodRecord`] and derives the requested view. Nothing is cached.

use crate::k8s::{LabelSelector, Phase, PodDirectory, PodRecord};
use crate::net;
use crate::wait::{Check, Pending, Poller, WaitOutcome};
use crate::Result;
use std::net::IpAddr;
use tracing::{debug, info};

pub struct PodSetView<D> {
    directory: D,
}

impl<D: PodDirectory> PodSetView<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    async fn records(&self, selector: &LabelSelector) -> Result<Vec<PodRecord>> {
        let pods = self.directory.list(selector).await?;
        Ok(pods.iter().map(PodRecord::from_k8s_pod).collect())
    }

    /// True when every container of every matching pod is ready.
    ///
    /// A pod without container statuses counts as not ready. An empty pod set
    /// is vacuously ready, so a selector that matches nothing returns `true`.
    pub async fn all_containers_ready(&self, selector: &LabelSelector) -> Result<bool> {
        let records = self.records(selector).await?;

        if records.is_empty() {
            debug!("No pods match {}, treating containers as ready", selector);
        }

        Ok(records.iter().all(PodRecord::all_containers_ready))
    }

    /// `(phase, ip)` pairs in the order the directory returned them, keeping
    /// only pods whose effective phase equals `phase` when one is given.
    pub async fn list_pods(
        &self,
        selector: &LabelSelector,
        phase: Option<&Phase>,
    ) -> Result<Vec<(Phase, Option<String>)>> {
        let pods = self
            .records(selector)
            .await?
            .into_iter()
            .filter(|record| phase.map_or(true, |p| record.phase == *p))
            .map(|record| (record.phase, record.ip))
            .collect();

        Ok(pods)
    }

    pub async fn count_by_phase(&self, selector: &LabelSelector, phase: &Phase) -> Result<usize> {
        Ok(self.list_pods(selector, Some(phase)).await?.len())
    }

    /// Pod IPs sorted as plain strings, so `10.0.0.10` sorts before `10.0.0.2`.
    /// Pods that have no IP assigned yet are left out.
    pub async fn ip_list(&self, selector: &LabelSelector, phase: Option<&Phase>) -> Result<Vec<String>> {
        let mut ips: Vec<String> = self
            .list_pods(selector, phase)
            .await?
            .into_iter()
            .filter_map(|(_, ip)| ip)
            .collect();
        ips.sort();
        Ok(ips)
    }

    pub async fn ip_csv(&self, selector: &LabelSelector, phase: Option<&Phase>) -> Result<String> {
        Ok(self.ip_list(selector, phase).await?.join(","))
    }

    pub async fn endpoint_csv(
        &self,
        selector: &LabelSelector,
        port: u16,
        phase: Option<&Phase>,
    ) -> Result<String> {
        let endpoints: Vec<String> = self
            .ip_list(selector, phase)
            .await?
            .into_iter()
            .map(|ip| format!("{}:{}", ip, port))
            .collect();
        Ok(endpoints.join(","))
    }

    /// Index of `ip` within the sorted IP list, first match wins.
    pub async fn ordinal_of(
        &self,
        selector: &LabelSelector,
        phase: Option<&Phase>,
        ip: &IpAddr,
    ) -> Result<Option<usize>> {
        let ip = ip.to_string();
        let ordinal = self
            .ip_list(selector, phase)
            .await?
            .iter()
            .position(|candidate| *candidate == ip);

        debug!("Ordinal of {} among {}: {:?}", ip, selector, ordinal);
        Ok(ordinal)
    }

    /// Ordinal of this machine, resolved through its hostname.
    pub async fn local_ordinal(
        &self,
        selector: &LabelSelector,
        phase: Option<&Phase>,
    ) -> Result<Option<usize>> {
        let local_ip = net::resolve_local_ip().await?;
        self.ordinal_of(selector, phase, &local_ip).await
    }

    pub async fn fetch_running_ips(&self, selector: &LabelSelector) -> Result<String> {
        self.ip_csv(selector, Some(&Phase::Running)).await
    }

    pub async fn fetch_running_endpoints(&self, selector: &LabelSelector, port: u16) -> Result<String> {
        self.endpoint_csv(selector, port, Some(&Phase::Running)).await
    }

    pub async fn fetch_running_ordinal(&self, selector: &LabelSelector) -> Result<Option<usize>> {
        self.local_ordinal(selector, Some(&Phase::Running)).await
    }

    /// Poll the running-pod count until it reaches `desired`.
    ///
    /// The set may be scaled past `desired`, so any count at or above it
    /// satisfies the wait.
    pub async fn wait_until_running_count_at_least<F>(
        &self,
        selector: &LabelSelector,
        desired: usize,
        poller: &Poller,
        on_pending: F,
    ) -> Result<WaitOutcome>
    where
        F: FnMut(&Pending),
    {
        info!("Waiting for {} running pods matching {}", desired, selector);

        let outcome = poller
            .poll_until(
                move || async move {
                    let current = self.count_by_phase(selector, &Phase::Running).await?;
                    if current >= desired {
                        Ok(Check::Ready)
                    } else {
                        Ok(Check::NotYet(Pending::RunningCount { current, desired }))
                    }
                },
                on_pending,
            )
            .await?;

        info!("Wait for running pods matching {} {}", selector, outcome);
        Ok(outcome)
    }

    /// Poll until every container of every matching pod is ready.
    pub async fn wait_until_all_containers_ready<F>(
        &self,
        selector: &LabelSelector,
        poller: &Poller,
        on_pending: F,
    ) -> Result<WaitOutcome>
    where
        F: FnMut(&Pending),
    {
        info!("Waiting for all containers of pods matching {} to be ready", selector);

        let outcome = poller
            .poll_until(
                move || async move {
                    if self.all_containers_ready(selector).await? {
                        Ok(Check::Ready)
                    } else {
                        Ok(Check::NotYet(Pending::ContainersNotReady))
                    }
                },
                on_pending,
            )
            .await?;

        info!("Wait for ready containers matching {} {}", selector, outcome);
        Ok(outcome)
    }
}
