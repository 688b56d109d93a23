mod api_types;
mod config;
mod error;
mod http_client;
mod orchestrator;
mod poller;
mod prompt;
mod request_builder;
mod resolver;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{default_config_path, Config};
use crate::error::{StretchError, EXIT_GENERIC_FAILURE};
use crate::http_client::Client;
use crate::orchestrator::WorkflowRequest;
use crate::poller::PollPolicy;
use crate::request_builder::{
    build_expansion_spec, build_stretch_spec, split_host_list, HostInput, SiteNetworks,
    WitnessInput,
};

#[derive(Parser, Debug)]
#[command(name = "vcf-stretch")]
#[command(
    about = "vSAN stretched cluster workflows for VMware Cloud Foundation on VxRail",
    long_about = None
)]
struct Args {
    /// Base URL of the SDDC Manager API (default: http://localhost)
    #[arg(long, env = "VCF_BASE_URL")]
    base_url: Option<String>,

    /// SSO username (prompted when omitted)
    #[arg(long, env = "VCF_SSO_USERNAME")]
    username: Option<String>,

    /// SSO password (prompted with confirmation when omitted; never saved)
    #[arg(long, env = "VCF_SSO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Skip TLS certificate verification (self-signed appliances);
    /// `--insecure=false` re-enables it over a saved config
    #[arg(
        long,
        env = "VCF_INSECURE",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    insecure: Option<bool>,

    /// Load config from this path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save base url, username, TLS and poll settings into config
    #[arg(long, default_value_t = false)]
    save_config: bool,

    /// HTTP timeout seconds (default: 60)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Seconds between validation status checks (default: 10)
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    /// Give up waiting for validation after this many seconds (default: wait indefinitely)
    #[arg(long)]
    poll_timeout_secs: Option<u64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prepare a cluster for stretching (single request, no validation)
    PrepareStretch {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Validate and then stretch a vSAN cluster across two availability zones
    StretchVsan {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        hosts: HostArgs,
        /// Non-preferred site overlay VLAN id (prompted when omitted)
        #[arg(long)]
        overlay_vlan_id: Option<u16>,
    },

    /// Validate and then add hosts to an existing stretched cluster
    ExpandStretchCluster {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        hosts: HostArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct TargetArgs {
    /// Workload domain name
    #[arg(long)]
    sc_domain: String,
    /// Cluster name within the domain
    #[arg(long)]
    sc_cluster: String,
}

#[derive(ClapArgs, Debug)]
struct HostArgs {
    /// Host FQDNs, comma separated (e.g. esx1.vsphere.local,esx-2.vsphere.local); details are prompted
    #[arg(long, required_unless_present = "hosts_json", conflicts_with = "hosts_json")]
    sc_hosts: Option<String>,
    /// Host records as JSON (string) or @/path/to/file.json:
    /// [{"fqdn":..,"ip":..,"password":..,"faultDomain":..}]
    #[arg(long)]
    hosts_json: Option<String>,
    /// Witness host FQDN or IP address
    #[arg(long)]
    witness_host_fqdn: String,
    /// Witness host vSAN IP address
    #[arg(long)]
    witness_vsan_ip: String,
    /// Witness host vSAN CIDR
    #[arg(long)]
    witness_vsan_cidr: String,
    #[arg(long)]
    preferred_vsan_gateway: Option<String>,
    #[arg(long)]
    preferred_vsan_cidr: Option<String>,
    #[arg(long)]
    secondary_vsan_gateway: Option<String>,
    #[arg(long)]
    secondary_vsan_cidr: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logging
    let lvl = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(lvl)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: failed to install logger: {}", e);
    }

    if let Err(err) = run(args).await {
        eprintln!("error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<StretchError>()
        .map(StretchError::exit_code)
        .unwrap_or(EXIT_GENERIC_FAILURE)
}

async fn run(args: Args) -> Result<()> {
    let cfg_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut cfg = Config::load(&cfg_path)?;
    apply_overrides(&mut cfg, &args);
    if args.save_config {
        cfg.save(&cfg_path)
            .with_context(|| format!("Failed to save config to {}", cfg_path.display()))?;
        info!(path = %cfg_path.display(), "config saved");
    }

    let username = prompt::sso_username(cfg.username.clone())?;
    let password = prompt::sso_password(args.password.clone())?;

    let (target, request) = match args.cmd {
        Command::PrepareStretch { target } => (target, WorkflowRequest::PrepareStretch),
        Command::StretchVsan {
            target,
            hosts,
            overlay_vlan_id,
        } => {
            let host_inputs = collect_hosts(&hosts, false)?;
            let networks = collect_networks(&hosts)?;
            let vlan = prompt::overlay_vlan_id(overlay_vlan_id)?;
            let spec = build_stretch_spec(&host_inputs, &witness(&hosts), &networks, vlan)?;
            (target, WorkflowRequest::StretchCreate(spec))
        }
        Command::ExpandStretchCluster { target, hosts } => {
            let host_inputs = collect_hosts(&hosts, true)?;
            let networks = collect_networks(&hosts)?;
            let spec = build_expansion_spec(&host_inputs, &witness(&hosts), &networks)?;
            (target, WorkflowRequest::StretchExpand(spec))
        }
    };

    let client = Client::new(
        cfg.base_url(),
        Duration::from_secs(cfg.timeout_secs()),
        cfg.insecure(),
    )?;
    info!(base_url = client.base_url(), user = %username, "authenticating");
    let session = client.authenticate(&username, &password).await?;

    let cluster_id =
        resolver::resolve_cluster(&session, &target.sc_domain, &target.sc_cluster).await?;

    let poll = PollPolicy::from_config(&cfg);
    let ack = orchestrator::run(&session, &cluster_id, &request, poll).await?;
    print_json_value(&ack.0)?;
    Ok(())
}

// CLI args override config.
fn apply_overrides(cfg: &mut Config, args: &Args) {
    if args.base_url.is_some() {
        cfg.base_url = args.base_url.clone();
    }
    if args.username.is_some() {
        cfg.username = args.username.clone();
    }
    if args.insecure.is_some() {
        cfg.insecure = args.insecure;
    }
    if args.timeout_secs.is_some() {
        cfg.timeout_secs = args.timeout_secs;
    }
    if args.poll_interval_secs.is_some() {
        cfg.poll_interval_secs = args.poll_interval_secs;
    }
    if args.poll_timeout_secs.is_some() {
        cfg.poll_timeout_secs = args.poll_timeout_secs;
    }
}

fn collect_hosts(args: &HostArgs, with_fault_domain: bool) -> Result<Vec<HostInput>> {
    if let Some(raw) = &args.hosts_json {
        let v = parse_json_arg(raw)?;
        let hosts: Vec<HostInput> =
            serde_json::from_value(v).context("Invalid host records in --hosts-json")?;
        return Ok(hosts);
    }
    let fqdns = split_host_list(args.sc_hosts.as_deref().unwrap_or_default());
    fqdns
        .iter()
        .map(|fqdn| prompt::host(fqdn, with_fault_domain))
        .collect()
}

fn collect_networks(args: &HostArgs) -> Result<SiteNetworks> {
    Ok([
        prompt::site_network(
            "preferred",
            args.preferred_vsan_gateway.clone(),
            args.preferred_vsan_cidr.clone(),
        )?,
        prompt::site_network(
            "non-preferred",
            args.secondary_vsan_gateway.clone(),
            args.secondary_vsan_cidr.clone(),
        )?,
    ])
}

fn witness(args: &HostArgs) -> WitnessInput {
    WitnessInput {
        fqdn: args.witness_host_fqdn.clone(),
        vsan_ip: args.witness_vsan_ip.clone(),
        vsan_cidr: args.witness_vsan_cidr.clone(),
    }
}

fn parse_json_arg(s: &str) -> Result<serde_json::Value> {
    if let Some(path) = s.strip_prefix('@') {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;
        let v =
            serde_json::from_slice(&bytes).with_context(|| format!("Invalid JSON in {}", path))?;
        return Ok(v);
    }
    let v = serde_json::from_str(s).context("Invalid JSON")?;
    Ok(v)
}

fn print_json_value(v: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn stretch_requires_hosts_from_flag_or_file() {
        let res = Args::try_parse_from([
            "vcf-stretch",
            "stretch-vsan",
            "--sc-domain",
            "wld",
            "--sc-cluster",
            "cl",
            "--witness-host-fqdn",
            "w",
            "--witness-vsan-ip",
            "10.0.0.1",
            "--witness-vsan-cidr",
            "10.0.0.0/24",
        ]);
        assert!(res.is_err());
    }

    fn prepare_args(extra: &[&str]) -> Args {
        let mut argv = vec!["vcf-stretch"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&["prepare-stretch", "--sc-domain", "wld", "--sc-cluster", "cl"]);
        Args::try_parse_from(argv).expect("args")
    }

    #[test]
    fn insecure_flag_toggles_tls_in_both_directions() {
        let saved = Config {
            insecure: Some(true),
            ..Config::default()
        };

        let mut cfg = saved.clone();
        apply_overrides(&mut cfg, &prepare_args(&[]));
        assert!(cfg.insecure(), "saved setting kept without a flag");

        let mut cfg = saved.clone();
        apply_overrides(&mut cfg, &prepare_args(&["--insecure=false"]));
        assert!(!cfg.insecure(), "flag re-enables verification");

        let mut cfg = Config::default();
        assert!(!cfg.insecure());
        apply_overrides(&mut cfg, &prepare_args(&["--insecure"]));
        assert!(cfg.insecure());
    }

    #[test]
    fn bare_insecure_flag_does_not_swallow_subcommand() {
        let args = prepare_args(&["--insecure"]);
        assert_eq!(args.insecure, Some(true));
        assert!(matches!(args.cmd, Command::PrepareStretch { .. }));
    }

    #[test]
    fn parse_json_arg_reads_inline_and_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let f = dir.path().join("hosts.json");
        std::fs::write(&f, r#"[{"fqdn":"esx-1","ip":"10.0.0.1","password":"pw"}]"#)
            .expect("write");

        let from_file = parse_json_arg(&format!("@{}", f.display())).expect("file");
        let inline = parse_json_arg(r#"[{"fqdn":"esx-1","ip":"10.0.0.1","password":"pw"}]"#)
            .expect("inline");
        assert_eq!(from_file, inline);
        assert!(parse_json_arg("{not json").is_err());
    }

    #[test]
    fn exit_code_follows_wrapped_core_error() {
        let err = anyhow::Error::new(StretchError::ValidationFailed {
            id: "v-1".to_string(),
            execution_status: "COMPLETED".to_string(),
            result_status: Some("FAILED".to_string()),
        })
        .context("stretch-vsan");
        assert_eq!(exit_code(&err), crate::error::EXIT_VALIDATION_FAILURE);
        assert_eq!(exit_code(&anyhow::anyhow!("plain")), EXIT_GENERIC_FAILURE);
    }
}
