//! # pmodmc
//!
//! Control-action execution layer for a media renderer controller.
//!
//! Executors validate that the renderer's service exposes an action, submit
//! a one-shot request through a [`ControlChannel`], and hand the outcome,
//! wrapped in a [`Response`], to the caller's listener on a single
//! [`DeliveryContext`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use pmodmc::{
//!     AvTransportExecutor, ControlChannel, LoopContext, Marshaler, Response, Settings, StaticService,
//!     TransportActions, listener,
//! };
//!
//! # fn demo(channel: Arc<dyn ControlChannel>) -> anyhow::Result<()> {
//! let settings = Settings::load(None)?;
//! let context = LoopContext::spawn(&settings.delivery.thread_name)?;
//! let service = StaticService::avtransport(["SetAVTransportURI", "Play"]).into_handle();
//!
//! let avt = AvTransportExecutor::new(
//!     channel,
//!     Some(service),
//!     Marshaler::new(context),
//!     settings.control.clone(),
//! );
//! avt.cast(listener(|r: Response<String>| println!("{:?}", r)), "http://x/video.mp4", None);
//! # Ok(())
//! # }
//! ```

pub mod avtransport;
pub mod channel;
pub mod config;
pub mod delivery;
pub mod device;
pub mod errors;
pub mod executor;
pub mod logging;
pub mod model;
pub mod registry_events;
pub mod rendering_control;
pub mod response;
pub mod service;
pub mod subscription;
pub mod time_utils;

pub use avtransport::{AvTransportExecutor, TransportActions};
pub use channel::{ActionArguments, ActionOutput, ActionRequest, ControlChannel};
pub use config::{ControlSettings, DeliverySettings, LogSettings, Settings};
pub use delivery::{DeliveryContext, InlineContext, LoopContext, Marshaler, PumpedContext, Task};
pub use device::RendererDevice;
pub use errors::{ControlError, UNSUPPORTED_ACTION};
pub use executor::ServiceExecutor;
pub use logging::init_logging;
pub use model::{MediaInfo, PositionInfo, TransportInfo, TransportState};
pub use registry_events::{RegistryEvents, RegistryListener};
pub use rendering_control::{RenderingActions, RenderingControlExecutor};
pub use response::{Listener, Response, listener};
pub use service::{ServiceDescriptor, ServiceHandle, ServiceKind, StaticService};
pub use subscription::{
    EventParser, LastChange, LastChangeParser, SubscriptionListener, SubscriptionRequest,
};
