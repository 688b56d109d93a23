//! Terminal prompts for values not given on the command line.
//!
//! dialoguer renders on stderr, so stdout stays reserved for the result JSON.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use crate::request_builder::{HostInput, SiteNetwork};

pub fn sso_username(given: Option<String>) -> Result<String> {
    if let Some(u) = given.filter(|u| !u.trim().is_empty()) {
        return Ok(u);
    }
    text("Please enter SSO username")
}

pub fn sso_password(given: Option<String>) -> Result<String> {
    if let Some(p) = given.filter(|p| !p.is_empty()) {
        return Ok(p);
    }
    Password::new()
        .with_prompt("Please provide SSO password")
        .with_confirmation(
            "Please confirm SSO password",
            "SSO password mismatch, please try again",
        )
        .interact()
        .context("Failed to read SSO password")
}

pub fn host(fqdn: &str, with_fault_domain: bool) -> Result<HostInput> {
    let ip = text(&format!("Please enter ip address for host {}", fqdn))?;
    let password = Password::new()
        .with_prompt(format!("Please provide root user password for host {}", fqdn))
        .with_confirmation(
            format!("Please confirm root user password for host {}", fqdn),
            format!("Passwords for host {} do not match, please try again", fqdn),
        )
        .interact()
        .with_context(|| format!("Failed to read password for host {}", fqdn))?;
    let fault_domain = if with_fault_domain {
        Some(text(&format!("Please provide fault domain for host {}", fqdn))?)
    } else {
        None
    };
    Ok(HostInput {
        fqdn: fqdn.to_string(),
        ip,
        password,
        fault_domain,
    })
}

/// `site` is "preferred" or "non-preferred".
pub fn site_network(
    site: &str,
    gateway_ip: Option<String>,
    cidr: Option<String>,
) -> Result<SiteNetwork> {
    let gateway_ip = match gateway_ip {
        Some(g) => g,
        None => text(&format!(
            "For {} site: Please enter vSAN Gateway IP (ex: 172.18.93.1)",
            site
        ))?,
    };
    let cidr = match cidr {
        Some(c) => c,
        None => text(&format!(
            "For {} site: Please enter vSAN CIDR (ex: 172.18.93.0/24)",
            site
        ))?,
    };
    Ok(SiteNetwork { gateway_ip, cidr })
}

pub fn overlay_vlan_id(given: Option<u16>) -> Result<u16> {
    if let Some(v) = given {
        return Ok(v);
    }
    Input::<u16>::new()
        .with_prompt("Please enter non-preferred site overlay vlan id")
        .interact_text()
        .context("Failed to read overlay vlan id")
}

fn text(prompt: &str) -> Result<String> {
    let v: String = Input::new()
        .with_prompt(prompt)
        .interact_text()
        .with_context(|| format!("Failed to read input for '{}'", prompt))?;
    Ok(v.trim().to_string())
}
