// examples/simulated_renderer.rs
//
// Drives an AVTransport and a RenderingControl executor against an in-process
// renderer that completes every request from its own worker thread:
//   - configuration via `Settings::load` (PMODMC_CONFIG__* overrides apply)
//   - listener delivery on a `LoopContext`
//   - a LastChange subscription fed with one synthetic event
//
// Run (from the pmodmc crate root):
//   cargo run --example simulated_renderer
//   RUST_LOG=debug cargo run --example simulated_renderer

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Sender, unbounded};
use parking_lot::Mutex;
use pmodmc::{
    ActionOutput, ActionRequest, ControlChannel, LastChange, LastChangeParser, LoopContext,
    Marshaler, RenderingActions, RendererDevice, Response, Settings, StaticService,
    SubscriptionListener, SubscriptionRequest, TransportActions, init_logging, listener,
    time_utils,
};

/// Renderer state kept by the fake device.
#[derive(Default)]
struct RendererState {
    uri: String,
    playing: bool,
    position_ms: u64,
    volume: u16,
    mute: bool,
}

enum Job {
    Action(ActionRequest),
    Subscribe(SubscriptionRequest),
}

struct SimulatedChannel {
    jobs: Sender<Job>,
}

impl SimulatedChannel {
    fn spawn() -> std::io::Result<Arc<Self>> {
        let (tx, rx) = unbounded::<Job>();
        thread::Builder::new()
            .name("simulated-renderer".into())
            .spawn(move || {
                let mut state = RendererState::default();
                for job in rx.iter() {
                    match job {
                        Job::Action(request) => answer(&mut state, request),
                        Job::Subscribe(subscription) => {
                            subscription.established();
                            subscription.event_received(
                                r#"<Event><InstanceID val="0"><TransportState val="STOPPED"/></InstanceID></Event>"#,
                            );
                        }
                    }
                }
            })?;
        Ok(Arc::new(Self { jobs: tx }))
    }
}

impl ControlChannel for SimulatedChannel {
    fn execute(&self, request: ActionRequest) {
        if let Err(err) = self.jobs.send(Job::Action(request)) {
            if let Job::Action(request) = err.into_inner() {
                request.fail(Some("renderer offline".into()));
            }
        }
    }

    fn subscribe(&self, request: SubscriptionRequest) {
        if let Err(err) = self.jobs.send(Job::Subscribe(request)) {
            if let Job::Subscribe(request) = err.into_inner() {
                request.failed("renderer offline");
            }
        }
    }
}

fn answer(state: &mut RendererState, request: ActionRequest) {
    let arg = |name: &str| request.arguments().get(name).unwrap_or("").to_string();

    match request.action() {
        "SetAVTransportURI" => {
            state.uri = arg("CurrentURI");
            state.position_ms = 0;
            request.succeed();
        }
        "Play" => {
            state.playing = true;
            request.succeed();
        }
        "Pause" | "Stop" => {
            state.playing = false;
            request.succeed();
        }
        "Seek" => {
            state.position_ms = time_utils::parse_hhmmss_ms(&arg("Target"));
            request.succeed();
        }
        "GetPositionInfo" => {
            let output = ActionOutput::new()
                .with("Track", "1")
                .with("TrackDuration", "00:03:00")
                .with("TrackURI", state.uri.clone())
                .with("RelTime", time_utils::format_hhmmss_ms(state.position_ms))
                .with("AbsTime", time_utils::format_hhmmss_ms(state.position_ms));
            request.receive(output);
        }
        "GetTransportInfo" => {
            let transport = if state.playing { "PLAYING" } else { "PAUSED_PLAYBACK" };
            request.receive(ActionOutput::new().with("CurrentTransportState", transport));
        }
        "SetVolume" => match arg("DesiredVolume").parse() {
            Ok(volume) => {
                state.volume = volume;
                request.succeed();
            }
            Err(_) => request.fail(Some("Error 402: Invalid Args".into())),
        },
        "GetVolume" => {
            request.receive(ActionOutput::new().with("CurrentVolume", state.volume.to_string()));
        }
        "SetMute" => {
            state.mute = arg("DesiredMute") == "1";
            request.succeed();
        }
        "GetMute" => {
            let mute = if state.mute { "1" } else { "0" };
            request.receive(ActionOutput::new().with("CurrentMute", mute));
        }
        _ => request.fail(None),
    }
}

struct PrintEvents;

impl SubscriptionListener for PrintEvents {
    fn on_established(&self) {
        println!("[event] subscription established");
    }

    fn on_event(&self, change: &LastChange) {
        println!("[event] transport state = {:?}", change.transport_state(0));
    }
}

fn print<T: std::fmt::Debug + Send + 'static>(
    label: &'static str,
    done: &Arc<Mutex<usize>>,
) -> Option<pmodmc::Listener<T>> {
    let done = Arc::clone(done);
    listener(move |response: Response<T>| {
        println!("{:<16} -> {:?}", label, response);
        *done.lock() += 1;
    })
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(None)?;
    init_logging(&settings.log);

    let context = LoopContext::spawn(&settings.delivery.thread_name)?;
    let marshaler = Marshaler::new(context.clone());
    let channel: Arc<dyn ControlChannel> = SimulatedChannel::spawn()?;

    let device = RendererDevice::new("uuid:simulated-renderer", "Simulated renderer")
        .with_service(
            StaticService::avtransport([
                "SetAVTransportURI",
                "Play",
                "Pause",
                "Stop",
                "Seek",
                "GetPositionInfo",
                "GetTransportInfo",
            ])
            .into_handle(),
        )
        .with_service(
            StaticService::rendering_control(["SetVolume", "GetVolume", "SetMute", "GetMute"])
                .into_handle(),
        );

    let avt = device.av_transport(&channel, &marshaler, &settings.control);
    let rc = device.rendering_control(&channel, &marshaler, &settings.control);

    avt.subscribe(Arc::new(PrintEvents), Arc::new(LastChangeParser));

    let done = Arc::new(Mutex::new(0usize));
    avt.cast(print("cast", &done), "http://192.168.1.10/movie.mp4", None);
    avt.play(print("play", &done));
    avt.seek(print("seek", &done), 95_000);
    avt.get_position_info(print("position", &done));
    avt.get_media_info(print("media (unsup.)", &done));
    avt.get_transport_info(print("transport", &done));
    rc.set_volume(print("set volume", &done), 35);
    rc.get_volume(print("volume", &done));
    rc.set_mute(print("set mute", &done), true);
    rc.is_mute(print("mute", &done));
    rc.set_brightness(print("brightness", &done), 80);

    let expected = 11;
    for _ in 0..50 {
        if *done.lock() >= expected {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }

    context.shutdown();
    println!("{} of {} responses delivered", *done.lock(), expected);
    Ok(())
}
