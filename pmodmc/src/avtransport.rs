//! AVTransport operations: cast, play, pause, stop, seek and state queries.

use std::ops::Deref;
use std::sync::Arc;

use crate::channel::{ActionArguments, ControlChannel};
use crate::config::ControlSettings;
use crate::delivery::Marshaler;
use crate::executor::{Completion, ServiceExecutor};
use crate::model::{MediaInfo, PositionInfo, TransportInfo};
use crate::response::Listener;
use crate::service::ServiceHandle;
use crate::time_utils::format_hhmmss_ms;

pub const SET_AV_TRANSPORT_URI: &str = "SetAVTransportURI";
pub const PLAY: &str = "Play";
pub const PAUSE: &str = "Pause";
pub const STOP: &str = "Stop";
pub const SEEK: &str = "Seek";
pub const GET_POSITION_INFO: &str = "GetPositionInfo";
pub const GET_MEDIA_INFO: &str = "GetMediaInfo";
pub const GET_TRANSPORT_INFO: &str = "GetTransportInfo";

/// Transport control of a renderer.
///
/// Every method returns immediately; the outcome reaches `listener` on the
/// delivery context. Void actions echo a value identifying the request:
/// the URI for `cast`, the operation name for `play`/`pause`/`stop`, the
/// requested position for `seek`.
pub trait TransportActions {
    /// Loads `uri` on the renderer. `metadata` is DIDL-Lite, may be absent.
    fn cast(&self, listener: Option<Listener<String>>, uri: &str, metadata: Option<&str>);

    fn play(&self, listener: Option<Listener<String>>);

    fn pause(&self, listener: Option<Listener<String>>);

    fn stop(&self, listener: Option<Listener<String>>);

    /// Seeks to `position_ms` milliseconds from the start of the track.
    fn seek(&self, listener: Option<Listener<u64>>, position_ms: u64);

    fn get_position_info(&self, listener: Option<Listener<PositionInfo>>);

    fn get_media_info(&self, listener: Option<Listener<MediaInfo>>);

    fn get_transport_info(&self, listener: Option<Listener<TransportInfo>>);
}

/// Executor for an AVTransport service.
#[derive(Clone, Debug)]
pub struct AvTransportExecutor {
    base: ServiceExecutor,
}

impl AvTransportExecutor {
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
}

impl Deref for AvTransportExecutor {
    type Target = ServiceExecutor;

    fn deref(&self) -> &ServiceExecutor {
        &self.base
    }
}

impl TransportActions for AvTransportExecutor {
    fn cast(&self, listener: Option<Listener<String>>, uri: &str, metadata: Option<&str>) {
        let args = self
            .instance_args()
            .with("CurrentURI", uri)
            .with("CurrentURIMetaData", metadata.unwrap_or_default());
        self.base.invoke(
            listener,
            SET_AV_TRANSPORT_URI,
            args,
            Completion::Echo(uri.to_string()),
            "cast failed.",
        );
    }

    fn play(&self, listener: Option<Listener<String>>) {
        let args = self.instance_args().with("Speed", "1");
        self.base.invoke(
            listener,
            PLAY,
            args,
            Completion::Echo(PLAY.to_string()),
            "play failed.",
        );
    }

    fn pause(&self, listener: Option<Listener<String>>) {
        self.base.invoke(
            listener,
            PAUSE,
            self.instance_args(),
            Completion::Echo(PAUSE.to_string()),
            "pause failed.",
        );
    }

    fn stop(&self, listener: Option<Listener<String>>) {
        self.base.invoke(
            listener,
            STOP,
            self.instance_args(),
            Completion::Echo(STOP.to_string()),
            "stop failed.",
        );
    }

    fn seek(&self, listener: Option<Listener<u64>>, position_ms: u64) {
        let args = self
            .instance_args()
            .with("Unit", "REL_TIME")
            .with("Target", format_hhmmss_ms(position_ms));
        self.base.invoke(
            listener,
            SEEK,
            args,
            Completion::Echo(position_ms),
            "seek failed.",
        );
    }

    fn get_position_info(&self, listener: Option<Listener<PositionInfo>>) {
        self.base.invoke(
            listener,
            GET_POSITION_INFO,
            self.instance_args(),
            Completion::Decode(PositionInfo::from_output),
            "getPosition failed.",
        );
    }

    fn get_media_info(&self, listener: Option<Listener<MediaInfo>>) {
        self.base.invoke(
            listener,
            GET_MEDIA_INFO,
            self.instance_args(),
            Completion::Decode(MediaInfo::from_output),
            "getMedia failed.",
        );
    }

    fn get_transport_info(&self, listener: Option<Listener<TransportInfo>>) {
        self.base.invoke(
            listener,
            GET_TRANSPORT_INFO,
            self.instance_args(),
            Completion::Decode(TransportInfo::from_output),
            "getTransport failed.",
        );
    }
}
