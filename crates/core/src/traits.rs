use crate::models::DeviceDescription;

/// Decoder for a device self-description document.
///
/// Discovery only needs the manufacturer and friendly name out of the
/// document; keeping the schema behind this trait lets alternate description
/// formats plug in without touching the discovery engine.
pub trait DescriptionDecoder: Send + Sync {
    /// Decode a description body.
    ///
    /// `None` means the document does not carry the expected structure;
    /// discovery treats that as "not our device", never as a hard failure.
    fn decode(&self, body: &str) -> Option<DeviceDescription>;
}
