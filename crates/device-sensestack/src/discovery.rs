//! SSDP discovery engine: probe, drain, deduplicate, resolve.

use crate::description::{DescriptionFetcher, SENSESTACK_MANUFACTURER};
use crate::error::Error;
use crate::ssdp::{build_msearch, open_probe_socket, SsdpResponse, SSDP_ADDR};
use stackctl_core::NodeMap;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Parameters for one discovery run.
///
/// Constructed fresh per invocation; the engine keeps no state between runs.
#[derive(Clone, Debug)]
pub struct DiscoveryOptions {
    /// SSDP search target.
    pub service_type: String,
    /// Receive window per probe round.
    pub timeout: Duration,
    /// Number of probe rounds, each on a fresh socket.
    pub retries: u32,
    /// MX header value: the maximum response delay devices may pick.
    pub mx: u8,
    /// Manufacturer a device description must report to be included.
    pub manufacturer: String,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            service_type: "upnp:rootdevice".to_string(),
            timeout: Duration::from_secs(5),
            retries: 1,
            mx: 3,
            manufacturer: SENSESTACK_MANUFACTURER.to_string(),
        }
    }
}

/// Discover SenseStack nodes on the local network.
///
/// Sends one M-SEARCH probe per retry round, drains responses until each
/// round's receive window closes, deduplicates by location, then resolves
/// every distinct location's description document. An empty map is a normal
/// outcome, not an error.
pub async fn discover(options: &DiscoveryOptions) -> Result<NodeMap, Error> {
    info!(
        "starting SenseStack discovery ({:?} window, {} round(s))",
        options.timeout, options.retries
    );

    let probe_options = options.clone();
    let responses = match tokio::task::spawn_blocking(move || collect_responses(&probe_options)).await
    {
        Ok(result) => result?,
        Err(e) => return Err(Error::Io(std::io::Error::other(e))),
    };

    info!("collected {} distinct response location(s)", responses.len());

    let fetcher = DescriptionFetcher::new(options.manufacturer.clone())?;
    let nodes = resolve_nodes(responses.into_keys(), &fetcher).await;

    info!("discovery complete, {} matching node(s)", nodes.len());
    Ok(nodes)
}

/// Send one probe per round and drain datagrams until the receive window
/// closes or the peer resets; both end that round only.
fn collect_responses(options: &DiscoveryOptions) -> Result<HashMap<String, SsdpResponse>, Error> {
    let message = build_msearch(&options.service_type, options.mx);
    let mut responses = HashMap::new();

    for round in 0..options.retries {
        let socket = open_probe_socket(options.timeout)?;
        socket.send_to(message.as_bytes(), SSDP_ADDR)?;
        debug!("round {}: M-SEARCH sent to {}", round + 1, SSDP_ADDR);

        let mut buf = [0u8; 2048];
        loop {
            match socket.recv_from(&mut buf) {
                Ok((len, peer)) => match SsdpResponse::parse(&buf[..len]) {
                    Ok(response) => {
                        debug!("response from {} for {}", peer, response.location);
                        fold_response(&mut responses, response);
                    }
                    Err(e) => debug!("dropping datagram from {}: {}", peer, e),
                },
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::ConnectionReset
                    ) =>
                {
                    break;
                }
                Err(e) => {
                    warn!("receive failed, ending round early: {}", e);
                    break;
                }
            }
        }
    }

    Ok(responses)
}

/// Fold one parsed response into the location-keyed aggregate. The last
/// response received for a given location wins within a run.
fn fold_response(responses: &mut HashMap<String, SsdpResponse>, response: SsdpResponse) {
    responses.insert(response.location.clone(), response);
}

/// Resolve response locations into the final node map, keyed by base
/// address. Locations that do not resolve to a matching device contribute
/// nothing; the rest of the scan is unaffected.
pub async fn resolve_nodes<I>(locations: I, fetcher: &DescriptionFetcher) -> NodeMap
where
    I: IntoIterator<Item = String>,
{
    let mut nodes = NodeMap::new();
    for location in locations {
        let Some(base) = base_address(&location) else {
            debug!("ignoring unparseable location {:?}", location);
            continue;
        };
        if let Some(description) = fetcher.fetch(&location).await {
            info!("found {:?} at {}", description.friendly_name, base);
            nodes.insert(base, description.friendly_name);
        }
    }
    nodes
}

/// Reduce a description-document URL to its grouping key: scheme + host,
/// keeping an explicit non-default port. The URL parser normalises default
/// ports away, so plain-HTTP device locations on port 80 all group under
/// `http://<host>`; IPv6 hosts keep their brackets.
pub fn base_address(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
