pub mod commands;

use crate::k8s::Phase;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;

#[derive(Parser)]
#[command(name = "podset")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Discover addresses and readiness of a labeled Kubernetes pod set", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Kubernetes namespace (overrides NAMESPACE)")]
    pub namespace: Option<String>,

    #[arg(long, global = true, help = "Kubeconfig context to use outside the cluster")]
    pub context: Option<String>,

    #[arg(long, global = true, default_value_t = 5, help = "Seconds between polls while waiting")]
    pub interval: u64,

    #[arg(long, global = true, help = "Give up waiting after this many seconds")]
    pub timeout: Option<u64>,

    #[arg(long, global = true, help = "Local pod IP, skips hostname resolution")]
    pub local_ip: Option<IpAddr>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(name = "fetch_ips", about = "Print running pod IPs, comma separated")]
    FetchIps { label_selector: String },

    #[command(name = "fetch_ips_string", about = "Print pod IPs, optionally filtered by phase")]
    FetchIpsString {
        label_selector: String,
        phase: Option<Phase>,
    },

    #[command(name = "fetch_endpoints", about = "Print running pod endpoints as ip:port")]
    FetchEndpoints { label_selector: String, port: u16 },

    #[command(
        name = "fetch_id",
        about = "Print the ordinal of the local pod among running pods; exits 1 with nothing on stdout if the local pod is not running"
    )]
    FetchId { label_selector: String },

    #[command(name = "count_pods_by_phase", about = "Print the number of pods in a phase")]
    CountPodsByPhase { label_selector: String, phase: Phase },

    #[command(name = "wait_pods_running", about = "Block until enough pods are running")]
    WaitPodsRunning { label_selector: String, desired: usize },

    #[command(name = "wait_containers_ready", about = "Block until all containers are ready")]
    WaitContainersReady { label_selector: String },

    #[command(name = "list_pods", about = "Print phase and IP of each matching pod")]
    ListPods {
        label_selector: String,
        phase: Option<Phase>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    #[command(name = "containers_ready", about = "Print whether all containers are ready")]
    ContainersReady { label_selector: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}
