use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stackctl_core::NodeInfo;
use stackctl_device_sensestack::{discover, DiscoveryOptions, NodeClient};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Discover SenseStack nodes on the local network and inspect their status.
#[derive(Parser)]
#[command(name = "stackctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the local network for SenseStack nodes
    Discover {
        /// Receive window per probe round, in seconds
        #[arg(long, default_value_t = 5)]
        timeout: u64,
        /// Number of probe rounds
        #[arg(long, default_value_t = 1)]
        retries: u32,
        /// Maximum response delay devices may pick (MX header)
        #[arg(long, default_value_t = 3)]
        mx: u8,
        /// SSDP search target
        #[arg(long, default_value = "upnp:rootdevice")]
        service: String,
    },
    /// Fetch and print the status of one node
    Status {
        /// Node base address (http://host[:port]) or a bare IPv4 address
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stackctl=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Discover {
            timeout,
            retries,
            mx,
            service,
        } => {
            let options = DiscoveryOptions {
                service_type: service,
                timeout: Duration::from_secs(timeout),
                retries,
                mx,
                ..DiscoveryOptions::default()
            };
            let nodes = discover(&options).await.context("discovery failed")?;
            if nodes.is_empty() {
                println!("No node found");
                return Ok(());
            }

            println!();
            println!("IP address\t\t\tNode name");
            println!("=======================================================");
            for (base, name) in &nodes {
                println!("{}\t\t\t{}", strip_scheme(base), name);
            }
            println!();
        }
        Command::Status { address } => {
            let base = normalize_address(&address)?;
            tracing::debug!("querying node at {}", base);
            let client = NodeClient::new(base)?;
            let info = client
                .status()
                .await
                .with_context(|| format!("status fetch from {} failed", client.base()))?;
            print_status(&info);
        }
    }
    Ok(())
}

/// Accept either a full base URL or a bare IPv4 literal.
fn normalize_address(address: &str) -> Result<String> {
    if address.starts_with("http://") || address.starts_with("https://") {
        return Ok(address.trim_end_matches('/').to_string());
    }
    if address.parse::<Ipv4Addr>().is_ok() {
        return Ok(format!("http://{}", address));
    }
    bail!("{:?} is neither a base URL nor an IPv4 address", address);
}

fn strip_scheme(base: &str) -> &str {
    base.trim_start_matches("http://").trim_start_matches("https://")
}

fn print_status(info: &NodeInfo) {
    println!("===== Node status =====");
    println!("name:\t\t{}", info.name);
    println!("UUID:\t\t{}", info.uuid);
    println!("LAT:\t\t{}", info.lat);
    println!("LNG:\t\t{}", info.long);
    println!("Endpoint:\t{}", info.current_endpoint);
    println!("Token:\t\t{}", info.redacted_token());
    println!("Latest post reply:\t{}", info.latest_post_reply);
    println!("Update interval:\t{}", info.update_interval);
    println!("Uptime (s):\t{}", info.uptime);
    println!("Connected sensors:\t{}", info.connected_sensors);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("http://192.168.1.40").unwrap(),
            "http://192.168.1.40"
        );
        assert_eq!(
            normalize_address("http://192.168.1.40/").unwrap(),
            "http://192.168.1.40"
        );
        assert_eq!(
            normalize_address("192.168.1.40").unwrap(),
            "http://192.168.1.40"
        );
        assert!(normalize_address("not-an-address").is_err());
        assert!(normalize_address("999.1.1.1").is_err());
    }

    #[test]
    fn test_strip_scheme() {
        assert_eq!(strip_scheme("http://192.168.1.40"), "192.168.1.40");
        assert_eq!(strip_scheme("https://192.168.1.40:8080"), "192.168.1.40:8080");
    }
}
