//! RenderingControl operations: volume, mute and brightness.
//!
//! Setters are void at the protocol level; on success they echo the
//! requested value instead of re-reading the device state.

use std::ops::Deref;
use std::sync::Arc;

use crate::channel::{ActionArguments, ActionOutput, ControlChannel};
use crate::config::ControlSettings;
use crate::delivery::Marshaler;
use crate::errors::ControlError;
use crate::executor::{Completion, ServiceExecutor};
use crate::response::Listener;
use crate::service::ServiceHandle;

pub const SET_VOLUME: &str = "SetVolume";
pub const GET_VOLUME: &str = "GetVolume";
pub const SET_MUTE: &str = "SetMute";
pub const GET_MUTE: &str = "GetMute";
pub const SET_BRIGHTNESS: &str = "SetBrightness";
pub const GET_BRIGHTNESS: &str = "GetBrightness";

/// Volume, mute and brightness control of a renderer.
///
/// Levels are passed through unchecked; the renderer decides what is in
/// range.
pub trait RenderingActions {
    fn set_volume(&self, listener: Option<Listener<u16>>, level: u16);

    fn get_volume(&self, listener: Option<Listener<u16>>);

    fn set_mute(&self, listener: Option<Listener<bool>>, mute: bool);

    fn is_mute(&self, listener: Option<Listener<bool>>);

    fn set_brightness(&self, listener: Option<Listener<u16>>, percent: u16);

    fn get_brightness(&self, listener: Option<Listener<u16>>);
}

/// Executor for a RenderingControl service.
#[derive(Clone, Debug)]
pub struct RenderingControlExecutor {
    base: ServiceExecutor,
}

impl RenderingControlExecutor {
    pub fn new(
        channel: Arc<dyn ControlChannel>,
        service: Option<ServiceHandle>,
        marshaler: Marshaler,
        settings: ControlSettings,
    ) -> Self {
        Self {
            base: ServiceExecutor::new(channel, service, marshaler, settings),
        }
    }

    fn instance_args(&self) -> ActionArguments {
        ActionArguments::new().with("InstanceID", self.base.instance_id().to_string())
    }

    fn channel_args(&self) -> ActionArguments {
        self.instance_args()
            .with("Channel", self.base.channel_name().to_string())
    }
}

impl Deref for RenderingControlExecutor {
    type Target = ServiceExecutor;

    fn deref(&self) -> &ServiceExecutor {
        &self.base
    }
}

fn decode_volume(output: &ActionOutput) -> Result<u16, ControlError> {
    output.parse_u16("CurrentVolume")
}

fn decode_mute(output: &ActionOutput) -> Result<bool, ControlError> {
    output.parse_bool("CurrentMute")
}

fn decode_brightness(output: &ActionOutput) -> Result<u16, ControlError> {
    output.parse_u16("CurrentBrightness")
}

impl RenderingActions for RenderingControlExecutor {
    fn set_volume(&self, listener: Option<Listener<u16>>, level: u16) {
        let args = self.channel_args().with("DesiredVolume", level.to_string());
        self.base.invoke(
            listener,
            SET_VOLUME,
            args,
            Completion::Echo(level),
            "setVolume failed.",
        );
    }

    fn get_volume(&self, listener: Option<Listener<u16>>) {
        self.base.invoke(
            listener,
            GET_VOLUME,
            self.channel_args(),
            Completion::Decode(decode_volume),
            "getVolume failed.",
        );
    }

    fn set_mute(&self, listener: Option<Listener<bool>>, mute: bool) {
        let args = self
            .channel_args()
            .with("DesiredMute", if mute { "1" } else { "0" });
        self.base.invoke(
            listener,
            SET_MUTE,
            args,
            Completion::Echo(mute),
            "setMute failed.",
        );
    }

    fn is_mute(&self, listener: Option<Listener<bool>>) {
        self.base.invoke(
            listener,
            GET_MUTE,
            self.channel_args(),
            Completion::Decode(decode_mute),
            "isMute failed.",
        );
    }

    fn set_brightness(&self, listener: Option<Listener<u16>>, percent: u16) {
        let args = self
            .instance_args()
            .with("DesiredBrightness", percent.to_string());
        self.base.invoke(
            listener,
            SET_BRIGHTNESS,
            args,
            Completion::Echo(percent),
            "setBrightness failed.",
        );
    }

    fn get_brightness(&self, listener: Option<Listener<u16>>) {
        self.base.invoke(
            listener,
            GET_BRIGHTNESS,
            self.instance_args(),
            Completion::Decode(decode_brightness),
            "getBrightness failed.",
        );
    }
}
