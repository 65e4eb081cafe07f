// ── Device catalog ──
//
// Ordered snapshot of every device the gateway reported, built feature by
// feature. Lookups are linear scans; plants have tens of devices.

use strum::IntoEnumIterator;
use tracing::{debug, warn};

use etidomo_api::{DeviceState, Feature, Reply};

use crate::model::{Device, DeviceKind, SensorKind};

/// Device kind for the records of a feature list.
pub fn kind_for(feature: Feature) -> DeviceKind {
    match feature {
        Feature::Lights => DeviceKind::Light,
        Feature::Openings => DeviceKind::Opening,
        Feature::Relays => DeviceKind::Relay,
        Feature::Thermoregulation => DeviceKind::Thermostat,
        Feature::Energy => DeviceKind::EnergySensor,
        Feature::DigitalIn => DeviceKind::DigitalIn,
    }
}

/// Wrap every record of a `<feature>_list_resp` in a typed device.
///
/// Thermoregulation replies also carry `temperature`, `humidity` and
/// `pressure` records, which become analog sensors.
pub fn devices_from_reply(feature: Feature, reply: &Reply) -> Vec<Device> {
    let kind = kind_for(feature);
    let mut devices: Vec<Device> = reply
        .records("array")
        .into_iter()
        .map(|record| Device::new(kind, record))
        .collect();

    if feature == Feature::Thermoregulation {
        for sensor in SensorKind::iter() {
            let field: &'static str = sensor.into();
            if let Some(record) = reply.get(field).and_then(|v| v.as_object()) {
                let fallback = capitalize(field);
                devices.push(Device::with_fallback_name(
                    DeviceKind::AnalogSensor(sensor),
                    record.clone(),
                    &fallback,
                ));
            }
        }
    }

    debug!(%feature, count = devices.len(), "built devices");
    devices
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// Cached device list for one gateway session.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<Device>,
}

impl DeviceCatalog {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn into_devices(self) -> Vec<Device> {
        self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn unique_ids(&self) -> Vec<String> {
        self.devices.iter().map(Device::unique_id).collect()
    }

    pub fn by_unique_id(&self, unique_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.unique_id() == unique_id)
    }

    pub(crate) fn by_unique_id_mut(&mut self, unique_id: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.unique_id() == unique_id)
    }

    pub fn by_act_id(&self, act_id: i64) -> Option<&Device> {
        self.devices.iter().find(|d| d.act_id() == Some(act_id))
    }

    pub fn by_name(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name() == Some(name))
    }

    pub fn by_floor(&self, floor_id: i64) -> Vec<&Device> {
        self.devices
            .iter()
            .filter(|d| d.floor_id() == Some(floor_id))
            .collect()
    }

    pub fn by_room(&self, room_id: i64) -> Vec<&Device> {
        self.devices
            .iter()
            .filter(|d| d.room_id() == Some(room_id))
            .collect()
    }

    /// Route a status delta to the device it addresses.
    ///
    /// Returns whether that device's snapshot changed. Records that match
    /// no device are logged and ignored.
    pub fn apply(&mut self, record: DeviceState) -> bool {
        match self.devices.iter_mut().find(|d| d.matches(&record)) {
            Some(device) => device.update_state(record),
            None => {
                warn!(record = ?record.get("act_id"), "status update for unknown device");
                false
            }
        }
    }
}
