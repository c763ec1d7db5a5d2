//! Device description fetching and decoding.
//!
//! Discovery hands every distinct response location to a
//! [`DescriptionFetcher`]; anything that is not a reachable, well-formed,
//! matching SenseStack device is skipped rather than failing the scan.

use crate::error::Error;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use reqwest::{Client, StatusCode};
use stackctl_core::{DescriptionDecoder, DeviceDescription};
use std::time::Duration;
use tracing::debug;

/// Manufacturer string a device must report to count as a SenseStack node.
pub const SENSESTACK_MANUFACTURER: &str = "SenseStack";

/// XML namespace of UPnP device description documents.
pub const UPNP_DEVICE_NS: &str = "urn:schemas-upnp-org:device-1-0";

/// Decoder for UPnP `device-1-0` description documents.
///
/// Reads `manufacturer` and `friendlyName` from the `device` element,
/// requiring every element to live in the expected namespace.
pub struct UpnpDecoder {
    namespace: String,
}

impl UpnpDecoder {
    pub fn new() -> Self {
        Self::with_namespace(UPNP_DEVICE_NS)
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl Default for UpnpDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptionDecoder for UpnpDecoder {
    fn decode(&self, body: &str) -> Option<DeviceDescription> {
        let mut reader = NsReader::from_str(body);
        reader.config_mut().trim_text(true);

        let mut in_device = false;
        let mut current_text = String::new();
        let mut manufacturer = None;
        let mut friendly_name = None;

        loop {
            match reader.read_resolved_event() {
                Ok((ns, Event::Start(e))) => {
                    if in_namespace(&ns, &self.namespace) && e.local_name().as_ref() == b"device" {
                        in_device = true;
                    }
                    current_text.clear();
                }
                Ok((ns, Event::End(e))) => {
                    if in_device && in_namespace(&ns, &self.namespace) {
                        match e.local_name().as_ref() {
                            b"manufacturer" => {
                                manufacturer = Some(current_text.trim().to_string())
                            }
                            b"friendlyName" => {
                                friendly_name = Some(current_text.trim().to_string())
                            }
                            b"device" => in_device = false,
                            _ => {}
                        }
                    }
                    current_text.clear();
                }
                Ok((_, Event::Text(e))) => {
                    current_text.push_str(&e.unescape().ok()?);
                }
                Ok((_, Event::Eof)) => break,
                Err(_) => return None,
                _ => {}
            }
        }

        Some(DeviceDescription {
            manufacturer: manufacturer?,
            friendly_name: friendly_name?,
        })
    }
}

fn in_namespace(resolved: &ResolveResult, expected: &str) -> bool {
    matches!(resolved, ResolveResult::Bound(Namespace(ns)) if *ns == expected.as_bytes())
}

/// Fetches and filters device description documents during a discovery run.
pub struct DescriptionFetcher {
    client: Client,
    decoder: Box<dyn DescriptionDecoder>,
    manufacturer: String,
}

impl DescriptionFetcher {
    pub fn new(manufacturer: impl Into<String>) -> Result<Self, Error> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            client,
            decoder: Box::new(UpnpDecoder::new()),
            manufacturer: manufacturer.into(),
        })
    }

    /// Swap in a decoder for a different description schema.
    pub fn with_decoder(mut self, decoder: Box<dyn DescriptionDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Fetch the description document at `url` and decode it.
    ///
    /// `None` covers every way a location can fail to be a matching device:
    /// unreachable, non-200 answer, undecodable document, or a manufacturer
    /// other than the expected one.
    pub async fn fetch(&self, url: &str) -> Option<DeviceDescription> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("description fetch from {} failed: {}", url, e);
                return None;
            }
        };
        if response.status() != StatusCode::OK {
            debug!(
                "description fetch from {} answered {}",
                url,
                response.status()
            );
            return None;
        }

        let body = response.text().await.ok()?;
        let description = self.decoder.decode(&body)?;
        if description.manufacturer != self.manufacturer {
            debug!(
                "skipping {} (manufacturer {:?})",
                url, description.manufacturer
            );
            return None;
        }
        Some(description)
    }
}
