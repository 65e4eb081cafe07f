use serde_json::Value;
use strum::{Display, EnumString};
use tracing::debug;

use etidomo_api::ActionRequest;

use crate::convert;
use crate::error::CoreError;
use crate::model::device::Device;

/// Hardware type reported in the light record's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum LightType {
    StepStep,
    Dimmer,
    Rgb,
}

/// Switching states understood by `light_switch_req`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LightState {
    Off,
    On,
    Auto,
}

impl LightState {
    pub fn code(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::On => 1,
            Self::Auto => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::On),
            4 => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Light view over a [`Device`].
///
/// Brightness is a 0–100 percentage here; use [`convert`] for the 0–255
/// scale. RGB lights derive brightness from the HSV value of their colour.
#[derive(Debug, Clone, Copy)]
pub struct Light<'a> {
    device: &'a Device,
}

impl<'a> Light<'a> {
    pub(crate) fn new(device: &'a Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &'a Device {
        self.device
    }

    pub fn light_type(&self) -> Option<LightType> {
        self.device
            .field("type")
            .and_then(Value::as_str)
            .and_then(|t| t.parse().ok())
    }

    pub fn support_color(&self) -> bool {
        self.light_type() == Some(LightType::Rgb)
    }

    pub fn support_brightness(&self) -> bool {
        matches!(self.light_type(), Some(LightType::Dimmer | LightType::Rgb))
    }

    pub fn status(&self) -> Option<i64> {
        self.device.int_field("status")
    }

    pub fn state(&self) -> Option<LightState> {
        self.status().and_then(LightState::from_code)
    }

    pub fn is_on(&self) -> bool {
        self.status().is_some_and(|s| s != LightState::Off.code())
    }

    /// Raw `perc` field, defaulting to full brightness.
    fn percent(&self) -> i64 {
        self.device.int_field("perc").unwrap_or(100)
    }

    /// Current colour. Lights without an `rgb` field report a grey
    /// matching their brightness.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    pub fn rgb_color(&self) -> [u8; 3] {
        if let Some(Value::Array(rgb)) = self.device.field("rgb")
            && let [r, g, b, ..] = rgb.as_slice()
        {
            let ch = |v: &Value| v.as_f64().map_or(0, convert::channel);
            return [ch(r), ch(g), ch(b)];
        }
        let grey = (self.percent().clamp(0, 100) * 255 / 100) as u8;
        [grey, grey, grey]
    }

    fn hsv(&self) -> [u16; 3] {
        convert::rgb_to_hsv_percent(self.rgb_color())
    }

    /// `[hue°, saturation%]`.
    pub fn hs_color(&self) -> [u16; 2] {
        let [h, s, _] = self.hsv();
        [h, s]
    }

    /// Brightness in percent.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    pub fn brightness(&self) -> u8 {
        if self.support_color() {
            return self.hsv()[2].min(100) as u8;
        }
        self.percent().clamp(0, 100) as u8
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Build a `light_switch_req`. At least one argument is required; an
    /// unset state keeps the current one.
    pub fn switch(
        &self,
        state: Option<LightState>,
        brightness: Option<u8>,
        rgb: Option<[u8; 3]>,
    ) -> Result<ActionRequest, CoreError> {
        if state.is_none() && brightness.is_none() && rgb.is_none() {
            return Err(CoreError::InvalidArgument {
                message: "At least one parameter is required".into(),
            });
        }
        let act_id = self.device.require_act_id()?;
        debug!(
            name = self.device.name().unwrap_or_default(),
            ?state,
            ?brightness,
            ?rgb,
            "set new light state"
        );
        Ok(ActionRequest::LightSwitch {
            act_id,
            wanted_status: state.map(LightState::code).or_else(|| self.status()),
            perc: brightness,
            rgb,
        })
    }

    pub fn turn_on(&self) -> Result<ActionRequest, CoreError> {
        self.switch(Some(LightState::On), None, None)
    }

    pub fn turn_off(&self) -> Result<ActionRequest, CoreError> {
        self.switch(Some(LightState::Off), None, None)
    }

    pub fn turn_auto(&self) -> Result<ActionRequest, CoreError> {
        self.switch(Some(LightState::Auto), None, None)
    }

    /// Set brightness in percent (clamped to 0–100). `None` when the light
    /// cannot dim. RGB lights keep their hue and saturation.
    pub fn set_brightness(&self, percent: i64) -> Result<Option<ActionRequest>, CoreError> {
        if !self.support_brightness() {
            return Ok(None);
        }
        let percent = percent.clamp(0, 100);
        if self.support_color() {
            let [h, s, _] = self.hsv();
            #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
            let rgb = convert::hsv_percent_to_rgb(f64::from(h), f64::from(s), percent as f64);
            return self.switch(None, None, Some(rgb)).map(Some);
        }
        let percent = u8::try_from(percent).unwrap_or(100);
        self.switch(None, Some(percent), None).map(Some)
    }

    /// Set the colour from an RGB triple (each channel clamped to 0–255).
    /// `None` when the light has no colour support.
    pub fn set_rgb_color(&self, rgb: [i64; 3]) -> Result<Option<ActionRequest>, CoreError> {
        if !self.support_color() {
            return Ok(None);
        }
        let clamp = |v: i64| u8::try_from(v.clamp(0, 255)).unwrap_or(u8::MAX);
        self.switch(None, None, Some(rgb.map(clamp))).map(Some)
    }

    /// Set hue (0–360°) and saturation (0–100%) keeping the brightness.
    /// `None` when the light has no colour support.
    pub fn set_hs_color(&self, hue: f64, saturation: f64) -> Result<Option<ActionRequest>, CoreError> {
        if !self.support_color() {
            return Ok(None);
        }
        let value = f64::from(self.hsv()[2]);
        let rgb = convert::hsv_percent_to_rgb(hue.clamp(0.0, 360.0), saturation.clamp(0.0, 100.0), value);
        self.switch(None, None, Some(rgb)).map(Some)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::model::device::DeviceKind;

    fn light(v: serde_json::Value) -> Device {
        Device::new(DeviceKind::Light, v.as_object().cloned().unwrap())
    }

    #[test]
    fn light_type_is_case_insensitive() {
        let dev = light(json!({"act_id": 1, "type": "rgb"}));
        let l = dev.as_light().unwrap();
        assert!(l.support_color());
        assert!(l.support_brightness());

        let dev = light(json!({"act_id": 1, "type": "STEP_STEP"}));
        let l = dev.as_light().unwrap();
        assert!(!l.support_brightness());
        assert_eq!(l.light_type(), Some(LightType::StepStep));
    }

    #[test]
    fn grey_colour_follows_percentage() {
        let dev = light(json!({"act_id": 1, "type": "DIMMER", "perc": 40}));
        let l = dev.as_light().unwrap();
        assert_eq!(l.rgb_color(), [102, 102, 102]);
        assert_eq!(l.brightness(), 40);
    }

    #[test]
    fn switch_without_arguments_fails() {
        let dev = light(json!({"act_id": 1, "type": "DIMMER"}));
        let err = dev.as_light().unwrap().switch(None, None, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
    }

    #[test]
    fn switch_keeps_current_status() {
        let dev = light(json!({"act_id": 3, "type": "DIMMER", "status": 1}));
        let req = dev.as_light().unwrap().switch(None, Some(30), None).unwrap();
        assert_eq!(
            req,
            ActionRequest::LightSwitch {
                act_id: 3,
                wanted_status: Some(1),
                perc: Some(30),
                rgb: None
            }
        );
    }

    #[test]
    fn unmanaged_light_rejects_commands() {
        let dev = light(json!({"name": "Ghost", "type": "DIMMER"}));
        let err = dev.as_light().unwrap().turn_on().unwrap_err();
        assert!(matches!(err, CoreError::UnmanagedDevice { .. }));
    }

    #[test]
    fn brightness_is_clamped_and_skipped_when_unsupported() {
        let dimmer = light(json!({"act_id": 2, "type": "DIMMER", "status": 1}));
        let req = dimmer.as_light().unwrap().set_brightness(140).unwrap().unwrap();
        assert!(matches!(req, ActionRequest::LightSwitch { perc: Some(100), .. }));

        let step = light(json!({"act_id": 2, "type": "STEP_STEP"}));
        assert_eq!(step.as_light().unwrap().set_brightness(50).unwrap(), None);
    }

    #[test]
    fn rgb_brightness_keeps_hue() {
        let dev = light(json!({"act_id": 4, "type": "RGB", "status": 1, "rgb": [255, 0, 0]}));
        let req = dev.as_light().unwrap().set_brightness(50).unwrap().unwrap();
        assert!(matches!(req, ActionRequest::LightSwitch { rgb: Some([127, 0, 0]), .. }));
    }

    #[test]
    fn hs_color_round_trips_through_the_snapshot() {
        let mut dev = light(json!({"act_id": 4, "type": "RGB", "status": 1, "rgb": [255, 255, 255]}));
        let req = dev.as_light().unwrap().set_hs_color(210.0, 60.0).unwrap().unwrap();
        let ActionRequest::LightSwitch { rgb: Some(rgb), .. } = req else {
            panic!("expected an rgb switch, got {req:?}");
        };
        dev.update_state(
            json!({"act_id": 4, "type": "RGB", "status": 1, "rgb": rgb})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let [h, s] = dev.as_light().unwrap().hs_color();
        assert!(h.abs_diff(210) <= 2, "hue {h}");
        assert!(s.abs_diff(60) <= 2, "saturation {s}");
        assert_eq!(dev.as_light().unwrap().brightness(), 100);
    }

    #[test]
    fn colour_commands_skip_non_rgb_lights() {
        let dev = light(json!({"act_id": 4, "type": "DIMMER"}));
        let l = dev.as_light().unwrap();
        assert_eq!(l.set_hs_color(10.0, 10.0).unwrap(), None);
        assert_eq!(l.set_rgb_color([1, 2, 3]).unwrap(), None);
    }

    #[test]
    fn rgb_channels_are_clamped() {
        let dev = light(json!({"act_id": 4, "type": "RGB"}));
        let req = dev.as_light().unwrap().set_rgb_color([-5, 300, 12]).unwrap().unwrap();
        assert!(matches!(req, ActionRequest::LightSwitch { rgb: Some([0, 255, 12]), .. }));
    }
}
