// ── Domain model ──
//
// Devices are a single struct tagged with a closed `DeviceKind`; the
// per-type behaviour lives in borrowed views (`Light`, `Thermostat`, ...)
// taken with `Device::as_*`.

pub mod device;
pub mod light;
pub mod switch;
pub mod thermo;
pub mod topology;

pub use device::{Device, DeviceKind, SensorKind, type_name};
pub use light::{Light, LightState, LightType};
pub use switch::{DigitalIn, Opening, OpeningState, Relay, RelayState, Sensor};
pub use thermo::{FanMode, FanSpeed, Season, ThermoMode, Thermostat};
pub use topology::{Floor, Room};
