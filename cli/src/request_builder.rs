//! Typed request bodies for the stretch and expansion workflows.
//!
//! Inputs arrive from flags, a hosts file or prompts; everything is checked
//! here so a malformed value is rejected before any call reaches the API.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::error::{Result, StretchError};

const HOST_USERNAME: &str = "root";
const MAX_VLAN_ID: u16 = 4094;

/// One ESXi host as supplied by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInput {
    pub fqdn: String,
    pub ip: String,
    pub password: String,
    /// Availability zone the host joins; expansion only.
    #[serde(default)]
    pub fault_domain: Option<String>,
}

/// vSAN gateway and CIDR for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteNetwork {
    pub gateway_ip: String,
    pub cidr: String,
}

/// `[preferred, non-preferred]`
pub type SiteNetworks = [SiteNetwork; 2];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessInput {
    pub fqdn: String,
    pub vsan_ip: String,
    pub vsan_cidr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSpec {
    pub ip_address: String,
    pub host_name: String,
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub az_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WitnessSpec {
    pub vsan_ip: String,
    pub fqdn: String,
    pub vsan_cidr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VsanNetworkSpec {
    #[serde(rename = "vsanGatewayIP")]
    pub vsan_gateway_ip: String,
    #[serde(rename = "vsanCidr")]
    pub vsan_cidr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStretchSpec {
    pub host_specs: Vec<HostSpec>,
    pub witness_spec: WitnessSpec,
    pub vsan_network_specs: Vec<VsanNetworkSpec>,
    pub secondary_az_overlay_vlan_id: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterExpansionSpec {
    pub host_specs: Vec<HostSpec>,
    pub witness_spec: WitnessSpec,
    pub vsan_network_specs: Vec<VsanNetworkSpec>,
}

pub fn build_stretch_spec(
    hosts: &[HostInput],
    witness: &WitnessInput,
    networks: &SiteNetworks,
    overlay_vlan_id: u16,
) -> Result<ClusterStretchSpec> {
    if overlay_vlan_id > MAX_VLAN_ID {
        return Err(StretchError::InvalidInput(format!(
            "overlay VLAN id {} out of range 0..={}",
            overlay_vlan_id, MAX_VLAN_ID
        )));
    }
    if let Some(h) = hosts.iter().find(|h| h.fault_domain.is_some()) {
        return Err(StretchError::InvalidInput(format!(
            "host {} has a fault domain; fault domains only apply to expand-stretch-cluster",
            h.fqdn
        )));
    }
    Ok(ClusterStretchSpec {
        host_specs: host_specs(hosts)?,
        witness_spec: witness_spec(witness)?,
        vsan_network_specs: network_specs(networks)?,
        secondary_az_overlay_vlan_id: overlay_vlan_id,
    })
}

pub fn build_expansion_spec(
    hosts: &[HostInput],
    witness: &WitnessInput,
    networks: &SiteNetworks,
) -> Result<ClusterExpansionSpec> {
    if let Some(h) = hosts
        .iter()
        .find(|h| h.fault_domain.as_deref().map_or(true, |f| f.trim().is_empty()))
    {
        return Err(StretchError::InvalidInput(format!(
            "host {} needs a fault domain for expand-stretch-cluster",
            h.fqdn
        )));
    }
    Ok(ClusterExpansionSpec {
        host_specs: host_specs(hosts)?,
        witness_spec: witness_spec(witness)?,
        vsan_network_specs: network_specs(networks)?,
    })
}

/// Split a `--sc-hosts` style list, dropping blanks.
pub fn split_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn host_specs(hosts: &[HostInput]) -> Result<Vec<HostSpec>> {
    if hosts.is_empty() {
        return Err(StretchError::InvalidInput(
            "at least one host is required".to_string(),
        ));
    }
    hosts
        .iter()
        .map(|h| {
            let fqdn = non_empty("host fqdn", &h.fqdn)?;
            let ip = ip_address(&format!("ip address for host {}", fqdn), &h.ip)?;
            if h.password.is_empty() {
                return Err(StretchError::InvalidInput(format!(
                    "password for host {} cannot be empty",
                    fqdn
                )));
            }
            Ok(HostSpec {
                ip_address: ip,
                host_name: fqdn,
                username: HOST_USERNAME.to_string(),
                password: h.password.clone(),
                az_name: h.fault_domain.as_deref().map(|f| f.trim().to_string()),
            })
        })
        .collect()
}

fn witness_spec(w: &WitnessInput) -> Result<WitnessSpec> {
    Ok(WitnessSpec {
        vsan_ip: ip_address("witness vSAN ip", &w.vsan_ip)?,
        fqdn: non_empty("witness host fqdn", &w.fqdn)?,
        vsan_cidr: cidr("witness vSAN cidr", &w.vsan_cidr)?,
    })
}

fn network_specs(networks: &SiteNetworks) -> Result<Vec<VsanNetworkSpec>> {
    networks
        .iter()
        .zip(["preferred", "non-preferred"])
        .map(|(n, site)| {
            Ok(VsanNetworkSpec {
                vsan_gateway_ip: ip_address(&format!("{} site vSAN gateway", site), &n.gateway_ip)?,
                vsan_cidr: cidr(&format!("{} site vSAN cidr", site), &n.cidr)?,
            })
        })
        .collect()
}

fn non_empty(what: &str, v: &str) -> Result<String> {
    let v = v.trim();
    if v.is_empty() {
        return Err(StretchError::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(v.to_string())
}

fn ip_address(what: &str, v: &str) -> Result<String> {
    let v = non_empty(what, v)?;
    v.parse::<IpAddr>()
        .map_err(|_| StretchError::InvalidInput(format!("{} '{}' is not an IP address", what, v)))?;
    Ok(v)
}

fn cidr(what: &str, v: &str) -> Result<String> {
    let v = non_empty(what, v)?;
    let invalid = || StretchError::InvalidInput(format!("{} '{}' is not a CIDR (addr/prefix)", what, v));
    let (addr, prefix) = v.split_once('/').ok_or_else(invalid)?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid());
    }
    Ok(v)
}
