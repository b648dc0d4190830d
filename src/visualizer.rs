use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::analysis::cache::fetch_analysis;
use crate::color::ColorSampler;
use crate::config::Config;
use crate::error::MountError;
use crate::host::{HostEvent, PlaybackHost, SubscriptionId};
use crate::source::SourceRef;
use crate::surface::BarSurface;
use crate::viz::{AnimationDriver, FrameLoop, Update, BAR_COUNT};

/// Starts analysis and artwork refreshes off the frame loop.
///
/// One long-lived worker per kind takes requests from a channel and only
/// serves the newest one pending, so bursts of host events cost at most one
/// extra fetch. Each request gets a new generation; the two workers report
/// back independently and the driver drops anything older than what it has.
/// Workers exit once every `Refresher` clone is gone.
#[derive(Clone)]
pub struct Refresher {
    host: Arc<dyn PlaybackHost>,
    generation: Arc<AtomicU64>,
    analysis_jobs: Sender<(u64, Option<String>)>,
    artwork_jobs: Sender<(u64, Option<SourceRef>)>,
}

impl Refresher {
    pub fn start(
        host: Arc<dyn PlaybackHost>,
        sampler: Arc<ColorSampler>,
        updates: Sender<Update>,
    ) -> io::Result<Self> {
        let (analysis_jobs, analysis_rx) = mpsc::channel();
        let fetch_host = Arc::clone(&host);
        let analysis_updates = updates.clone();
        spawn_worker("islandviz-analysis", analysis_rx, move |generation, track_id: Option<String>| {
            let analysis = track_id.as_deref().and_then(|id| fetch_analysis(&*fetch_host, id));
            analysis_updates
                .send(Update::Analysis {
                    generation,
                    track_id,
                    analysis,
                })
                .is_ok()
        })?;

        let (artwork_jobs, artwork_rx) = mpsc::channel();
        spawn_worker("islandviz-artwork", artwork_rx, move |generation, artwork: Option<SourceRef>| {
            let color = sampler.sample(artwork.as_ref());
            updates.send(Update::Color { generation, color }).is_ok()
        })?;

        Ok(Self {
            host,
            generation: Arc::new(AtomicU64::new(0)),
            analysis_jobs,
            artwork_jobs,
        })
    }

    /// Queue both refreshes for the host's current track. Returns the generation.
    pub fn request(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let track = self.host.current_track();
        log::debug!(
            "Refresh #{} for {}",
            generation,
            track.as_ref().map_or("<no track>", |t| t.id.as_str())
        );

        let track_id = track.as_ref().map(|t| t.id.clone());
        let artwork = track.and_then(|t| t.artwork);
        if self.analysis_jobs.send((generation, track_id)).is_err()
            || self.artwork_jobs.send((generation, artwork)).is_err()
        {
            log::warn!("Refresh #{} dropped: worker gone", generation);
        }
        generation
    }
}

/// Run `work` for each job, skipping to the newest when several are queued.
/// Stops when the sender side closes or `work` reports the receiver is gone.
fn spawn_worker<J, F>(name: &str, jobs: Receiver<(u64, J)>, mut work: F) -> io::Result<()>
where
    J: Send + 'static,
    F: FnMut(u64, J) -> bool + Send + 'static,
{
    let name = name.to_string();
    thread::Builder::new().name(name.clone()).spawn(move || {
        while let Ok(mut job) = jobs.recv() {
            let mut skipped = 0;
            while let Ok(newer) = jobs.try_recv() {
                job = newer;
                skipped += 1;
            }
            if skipped > 0 {
                log::debug!("{}: skipped {} superseded requests", name, skipped);
            }
            let (generation, input) = job;
            if !work(generation, input) {
                break;
            }
        }
        log::debug!("{} worker stopped", name);
    })?;
    Ok(())
}

struct Mounted<S> {
    frame_loop: FrameLoop<S>,
    subscriptions: Vec<SubscriptionId>,
    refresher: Refresher,
}

/// The bar indicator attached to a playback host.
///
/// `mount` is idempotent. `unmount` unsubscribes from the host, stops the
/// frame loop and keeps the surface so the indicator can be mounted again.
pub struct Visualizer<S: BarSurface + Send + 'static> {
    host: Arc<dyn PlaybackHost>,
    config: Config,
    sampler: Arc<ColorSampler>,
    surface: Option<S>,
    mounted: Option<Mounted<S>>,
}

impl<S: BarSurface + Send + 'static> Visualizer<S> {
    pub fn new(host: Arc<dyn PlaybackHost>, surface: S, config: Config) -> Self {
        let sampler = Arc::new(ColorSampler::new(&config.color));
        Self {
            host,
            config,
            sampler,
            surface: Some(surface),
            mounted: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Attach to the host. `Ok(false)` if already mounted.
    ///
    /// The config is validated first; an invalid one leaves the surface in place.
    pub fn mount(&mut self) -> Result<bool, MountError> {
        if self.mounted.is_some() {
            log::debug!("Visualizer already mounted");
            return Ok(false);
        }
        self.config.validate()?;
        if !self.host.is_ready() {
            return Err(MountError::HostNotReady { attempts: 1 });
        }
        if self.surface.is_none() {
            return Err(MountError::SurfaceLost);
        }

        let (tx, rx) = mpsc::channel();
        let refresher = Refresher::start(Arc::clone(&self.host), Arc::clone(&self.sampler), tx)?;
        let mut surface = self.surface.take().ok_or(MountError::SurfaceLost)?;
        surface.attach();
        surface.set_color(&self.sampler.fallback_sample());
        surface.set_scales(&[self.config.physics.floor; BAR_COUNT]);

        let driver = AnimationDriver::new(Arc::clone(&self.host), surface, &self.config, rx);
        let frame_loop = FrameLoop::start(driver, self.config.driver.fps)?;

        let subscriptions = [HostEvent::TrackChanged, HostEvent::PlayPauseToggled]
            .into_iter()
            .map(|event| {
                let refresher = refresher.clone();
                self.host.subscribe(
                    event,
                    Box::new(move |event: HostEvent| {
                        log::debug!("{:?}: refreshing analysis and color", event);
                        refresher.request();
                    }),
                )
            })
            .collect();
        refresher.request();

        log::info!("Visualizer mounted");
        self.mounted = Some(Mounted {
            frame_loop,
            subscriptions,
            refresher,
        });
        Ok(true)
    }

    /// Mount, retrying while the host is not ready.
    pub fn mount_with_retry(&mut self) -> Result<bool, MountError> {
        let attempts = self.config.driver.mount_attempts.max(1);
        let delay = Duration::from_millis(self.config.driver.mount_retry_ms);
        for attempt in 1..=attempts {
            match self.mount() {
                Err(MountError::HostNotReady { .. }) if attempt < attempts => {
                    log::debug!("Host not ready (attempt {}/{}), retrying", attempt, attempts);
                    thread::sleep(delay);
                }
                Err(MountError::HostNotReady { .. }) => {
                    return Err(MountError::HostNotReady { attempts });
                }
                other => return other,
            }
        }
        Err(MountError::HostNotReady { attempts })
    }

    /// Detach from the host. Returns `false` if nothing was mounted.
    pub fn unmount(&mut self) -> bool {
        let mounted = match self.mounted.take() {
            Some(m) => m,
            None => return false,
        };
        for id in mounted.subscriptions {
            self.host.unsubscribe(id);
        }
        match mounted.frame_loop.stop() {
            Some(driver) => {
                let mut surface = driver.into_surface();
                surface.detach();
                self.surface = Some(surface);
            }
            None => log::warn!("Surface lost with the frame loop; remounting will fail"),
        }
        log::info!("Visualizer unmounted");
        true
    }

    /// Trigger a refresh by hand. `None` when not mounted.
    pub fn refresh(&self) -> Option<u64> {
        self.mounted.as_ref().map(|m| m.refresher.request())
    }

    /// The surface, while unmounted.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }
}

impl<S: BarSurface + Send + 'static> Drop for Visualizer<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
