#![forbid(unsafe_code)]

//! Portfolio page behavior model.
//!
//! [`Page`] wires the timing and visibility primitives to the page's
//! interactive surfaces: the rain and particle layers, the navbar, the mobile
//! menu, reveal-on-scroll elements and skill bars. The host forwards input as
//! [`PageEvent`]s, runs the scheduler, and renders from the exposed
//! observables. Anything the host must perform itself (scrolling) comes back
//! as a [`PageCommand`].
//!
//! # Timing
//!
//! | Source | Primitive | Default | Effect |
//! |--------|-----------|---------|--------|
//! | Resize | Debounce | 300 ms | Regenerate raindrops |
//! | Resize | Debounce | 250 ms | Re-evaluate mobile background |
//! | Orientation change | Delay | 100 ms | Re-evaluate mobile background |
//! | Scroll | Throttle (trailing) | 16 ms | Update navbar from the live offset |
//! | Startup | Delay | 1000 ms | Set `loaded` |
//! | Reveal targets | One-shot, 0.1 | | Mark revealed |
//! | Skills section | One-shot, 0.3 | | Fill skill bars |
//!
//! Performance mode and the effect budget are decided once at construction.

pub mod effects;
pub mod keys;
pub mod menu;
pub mod navbar;
pub mod performance;

pub use effects::{NeonColor, ParticleSpec, RaindropSpec};
pub use keys::{Key, KeyAction};
pub use menu::MobileMenu;
pub use navbar::{Navbar, NavbarStyle};
pub use performance::{
    DeviceProfile, EffectBudget, EffectiveConnection, UnknownConnection, detect_performance_mode,
    is_mobile_width,
};

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::{Rc, Weak};

use folio_core::{Debouncer, Edge, Scheduler, Throttle, TimingError};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, debug_span, warn};

use crate::config::PageConfig;
use crate::reactive::Observable;
use crate::visibility::{DetectorFactory, OneShotDispatcher, TargetId};

/// A skill bar and its `data-level` percentage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkillBar {
    pub id: TargetId,
    /// Fill percentage, written through as given; bars without one are left
    /// untouched.
    pub level: Option<f64>,
}

impl SkillBar {
    #[must_use]
    pub const fn new(id: TargetId, level: Option<f64>) -> Self {
        Self { id, level }
    }

    /// Build from a raw attribute value. Empty, non-numeric or non-finite
    /// values mean no level.
    #[must_use]
    pub fn from_attribute(id: TargetId, level: Option<&str>) -> Self {
        Self {
            id,
            level: level
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite()),
        }
    }
}

/// Elements the page attaches behavior to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageLayout {
    /// Elements revealed on first scroll into view.
    pub reveal_targets: Vec<TargetId>,
    /// Section whose visibility fills the skill bars. Without it the bars
    /// are never filled.
    pub skills_section: Option<TargetId>,
    pub skill_bars: Vec<SkillBar>,
}

/// Background treatment of the page backdrop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Background {
    /// Stylesheet default.
    #[default]
    Default,
    /// Mobile viewport: image forced with a dark overlay, scrolling attachment.
    MobileImage,
    /// Mobile viewport and the image failed to load: gradient only.
    MobileFallback,
}

/// Input forwarded from the host.
#[derive(Clone, Debug, PartialEq)]
pub enum PageEvent {
    Resize { width: f64, height: f64 },
    OrientationChange,
    /// Vertical scroll offset changed.
    Scroll { offset: f64 },
    Key(Key),
    HamburgerClick,
    /// A navigation link was clicked; `href` is its raw attribute.
    NavLinkClick { href: String },
    /// The mobile background image failed to load.
    BackgroundLoadFailed,
}

impl PageEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::OrientationChange => "orientation_change",
            Self::Scroll { .. } => "scroll",
            Self::Key(_) => "key",
            Self::HamburgerClick => "hamburger_click",
            Self::NavLinkClick { .. } => "nav_link_click",
            Self::BackgroundLoadFailed => "background_load_failed",
        }
    }
}

/// Work the host must perform in response to an event.
#[derive(Clone, Debug, PartialEq)]
pub enum PageCommand {
    /// Smoothly scroll the window by `dy` pixels.
    ScrollBy { dy: f64 },
    /// Smoothly scroll the element with this id to the top of the viewport.
    ScrollIntoView { id: String },
}

/// State shared with timer and visibility callbacks.
struct PageState {
    config: PageConfig,
    budget: EffectBudget,
    width: Cell<f64>,
    height: Cell<f64>,
    scroll_offset: Cell<f64>,
    rng: RefCell<SmallRng>,
    raindrops: Observable<Vec<RaindropSpec>>,
    particles: Observable<Vec<ParticleSpec>>,
    background: Observable<Background>,
    navbar: Navbar,
    revealed: Observable<BTreeSet<TargetId>>,
    skill_widths: Observable<BTreeMap<TargetId, f64>>,
    loaded: Observable<bool>,
}

impl PageState {
    fn regenerate_rain(&self) {
        let drops = effects::raindrops(&mut *self.rng.borrow_mut(), self.budget.raindrops);
        debug!(count = drops.len(), "rain layer regenerated");
        self.raindrops.set(drops);
    }

    fn ensure_background(&self) {
        if !is_mobile_width(self.width.get(), &self.config) {
            return;
        }
        // Each evaluation re-requests the image, so a later success clears
        // an earlier fallback.
        self.background.set(Background::MobileImage);
    }

    fn fill_skill_bars(&self, bars: &[SkillBar]) {
        self.skill_widths.update(|widths| {
            for bar in bars {
                if let Some(level) = bar.level {
                    widths.insert(bar.id, level);
                }
            }
        });
    }
}

/// The page behavior model.
pub struct Page {
    state: Rc<PageState>,
    scheduler: Rc<dyn Scheduler>,
    menu: MobileMenu,
    performance_mode: bool,
    rain_resize: Debouncer<()>,
    background_resize: Debouncer<()>,
    scroll: Throttle<()>,
    reveal: OneShotDispatcher,
    skills: Option<OneShotDispatcher>,
}

impl Page {
    /// Build the page and run its startup work: effect layers are generated,
    /// the background is evaluated, dispatchers start watching, and the
    /// `loaded` timer is scheduled.
    ///
    /// # Errors
    ///
    /// [`TimingError`] if `config` fails validation.
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        detection: &dyn DetectorFactory,
        config: PageConfig,
        device: DeviceProfile,
        viewport_height: f64,
        layout: PageLayout,
        seed: u64,
    ) -> Result<Self, TimingError> {
        config.validate()?;
        let reveal_options = config.reveal_options()?;
        let skills_options = config.skills_options()?;

        let performance_mode = detect_performance_mode(&device, &config);
        let budget = EffectBudget::select(performance_mode, &config);
        let mut rng = SmallRng::seed_from_u64(seed);
        let raindrops = effects::raindrops(&mut rng, budget.raindrops);
        let particles = effects::particles(&mut rng, budget.particles);

        let state = Rc::new(PageState {
            budget,
            width: Cell::new(device.viewport_width),
            height: Cell::new(viewport_height),
            scroll_offset: Cell::new(0.0),
            rng: RefCell::new(rng),
            raindrops: Observable::new(raindrops),
            particles: Observable::new(particles),
            background: Observable::new(Background::Default),
            navbar: Navbar::new(config.navbar_solid_after_px),
            revealed: Observable::new(BTreeSet::new()),
            skill_widths: Observable::new(BTreeMap::new()),
            loaded: Observable::new(false),
            config,
        });
        state.ensure_background();

        let config = &state.config;
        let rain_resize = {
            let state = Rc::clone(&state);
            Debouncer::new(Rc::clone(&scheduler), config.resize_debounce(), move |()| {
                state.regenerate_rain();
            })
        };
        let background_resize = {
            let state = Rc::clone(&state);
            Debouncer::new(Rc::clone(&scheduler), config.background_debounce(), move |()| {
                state.ensure_background();
            })
        };
        let scroll = {
            let state = Rc::clone(&state);
            Throttle::with_edge(
                Rc::clone(&scheduler),
                config.scroll_throttle(),
                Edge::Trailing,
                move |()| state.navbar.update(state.scroll_offset.get()),
            )?
        };

        let reveal = {
            let state = Rc::clone(&state);
            OneShotDispatcher::with_targets(
                "reveal",
                detection,
                reveal_options,
                layout.reveal_targets.iter().copied(),
                move |target| state.revealed.update(|set| {
                    set.insert(target);
                }),
            )
        };

        let skills = layout.skills_section.map(|section| {
            let dispatcher = OneShotDispatcher::new("skills", detection, skills_options);
            let state = Rc::clone(&state);
            let bars = layout.skill_bars.clone();
            dispatcher.watch(section, move |_| state.fill_skill_bars(&bars));
            dispatcher
        });

        let weak = Rc::downgrade(&state);
        scheduler.schedule(
            config.loaded_delay(),
            Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.loaded.set(true);
                }
            }),
        );

        Ok(Self {
            state,
            scheduler,
            menu: MobileMenu::new(),
            performance_mode,
            rain_resize,
            background_resize,
            scroll,
            reveal,
            skills,
        })
    }

    /// Apply one host event.
    pub fn handle(&self, event: PageEvent) -> Option<PageCommand> {
        let _span = debug_span!("page_event", kind = event.kind()).entered();
        match event {
            PageEvent::Resize { width, height } => {
                self.state.width.set(width);
                self.state.height.set(height);
                self.rain_resize.trigger(());
                self.background_resize.trigger(());
                None
            }
            PageEvent::OrientationChange => {
                let weak: Weak<PageState> = Rc::downgrade(&self.state);
                self.scheduler.schedule(
                    self.state.config.orientation_delay(),
                    Box::new(move || {
                        if let Some(state) = weak.upgrade() {
                            state.ensure_background();
                        }
                    }),
                );
                None
            }
            PageEvent::Scroll { offset } => {
                self.state.scroll_offset.set(offset);
                self.scroll.trigger(());
                None
            }
            PageEvent::Key(key) => match key.action() {
                KeyAction::CloseMenu => {
                    self.menu.close();
                    None
                }
                KeyAction::ScrollPages(pages) => Some(PageCommand::ScrollBy {
                    dy: f64::from(pages) * self.state.height.get(),
                }),
            },
            PageEvent::HamburgerClick => {
                self.menu.toggle();
                None
            }
            PageEvent::NavLinkClick { href } => {
                self.menu.close();
                href.strip_prefix('#')
                    .filter(|id| !id.is_empty())
                    .map(|id| PageCommand::ScrollIntoView { id: id.to_string() })
            }
            PageEvent::BackgroundLoadFailed => {
                if self.state.background.get() == Background::MobileImage {
                    warn!("background image failed to load; using gradient fallback");
                    self.state.background.set(Background::MobileFallback);
                }
                None
            }
        }
    }

    /// Whether reduced effects were selected at startup.
    #[must_use]
    pub fn performance_mode(&self) -> bool {
        self.performance_mode
    }

    #[must_use]
    pub fn budget(&self) -> EffectBudget {
        self.state.budget
    }

    #[must_use]
    pub fn config(&self) -> &PageConfig {
        &self.state.config
    }

    #[must_use]
    pub fn raindrops(&self) -> &Observable<Vec<RaindropSpec>> {
        &self.state.raindrops
    }

    #[must_use]
    pub fn particles(&self) -> &Observable<Vec<ParticleSpec>> {
        &self.state.particles
    }

    #[must_use]
    pub fn background(&self) -> &Observable<Background> {
        &self.state.background
    }

    #[must_use]
    pub fn navbar(&self) -> &Navbar {
        &self.state.navbar
    }

    #[must_use]
    pub fn menu(&self) -> &MobileMenu {
        &self.menu
    }

    /// Reveal targets that have been marked visible.
    #[must_use]
    pub fn revealed(&self) -> &Observable<BTreeSet<TargetId>> {
        &self.state.revealed
    }

    /// Filled skill bars and their width percentages.
    #[must_use]
    pub fn skill_widths(&self) -> &Observable<BTreeMap<TargetId, f64>> {
        &self.state.skill_widths
    }

    #[must_use]
    pub fn loaded(&self) -> &Observable<bool> {
        &self.state.loaded
    }

    /// Whether any timer-driven update is still waiting to run.
    #[must_use]
    pub fn has_pending_updates(&self) -> bool {
        self.rain_resize.is_pending()
            || self.background_resize.is_pending()
            || self.scroll.is_cooling_down()
    }

    /// Whether visibility detection is unavailable and every one-shot
    /// effect ran at startup.
    #[must_use]
    pub fn is_visibility_degraded(&self) -> bool {
        self.reveal.is_degraded()
    }

    /// Reveal targets still waiting to scroll into view.
    #[must_use]
    pub fn pending_reveals(&self) -> usize {
        self.reveal.watching_count()
    }

    /// Whether the skill bars have been filled.
    #[must_use]
    pub fn skills_filled(&self) -> bool {
        self.skills
            .as_ref()
            .is_some_and(|d| d.watching_count() == 0)
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("performance_mode", &self.performance_mode)
            .field("budget", &self.state.budget)
            .field("menu_open", &self.menu.is_open())
            .field("navbar", &self.state.navbar.style())
            .field("loaded", &self.state.loaded.get())
            .field("reveal", &self.reveal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::NoDetection;
    use folio_core::{Duration, ManualClock, TimerQueue};

    fn page(width: f64) -> (Rc<TimerQueue<ManualClock>>, Page) {
        let queue = Rc::new(TimerQueue::manual());
        let page = Page::new(
            queue.clone(),
            &NoDetection,
            PageConfig::default(),
            DeviceProfile::new(width).with_cores(8),
            900.0,
            PageLayout::default(),
            7,
        )
        .unwrap();
        (queue, page)
    }

    #[test]
    fn nav_link_closes_menu_and_scrolls_to_anchor() {
        let (_queue, page) = page(1200.0);
        page.handle(PageEvent::HamburgerClick);
        assert!(page.menu().is_open());
        let cmd = page.handle(PageEvent::NavLinkClick {
            href: "#projects".into(),
        });
        assert_eq!(cmd, Some(PageCommand::ScrollIntoView { id: "projects".into() }));
        assert!(!page.menu().is_open());
        assert_eq!(page.handle(PageEvent::NavLinkClick { href: "#".into() }), None);
        assert_eq!(
            page.handle(PageEvent::NavLinkClick {
                href: "/resume.pdf".into()
            }),
            None
        );
    }

    #[test]
    fn keys_scroll_by_viewport_height() {
        let (_queue, page) = page(1200.0);
        assert_eq!(
            page.handle(PageEvent::Key(Key::PageDown)),
            Some(PageCommand::ScrollBy { dy: 900.0 })
        );
        page.handle(PageEvent::Resize {
            width: 1200.0,
            height: 700.0,
        });
        assert_eq!(
            page.handle(PageEvent::Key(Key::ArrowUp)),
            Some(PageCommand::ScrollBy { dy: -700.0 })
        );
    }

    #[test]
    fn escape_closes_menu() {
        let (_queue, page) = page(1200.0);
        page.handle(PageEvent::HamburgerClick);
        assert_eq!(page.handle(PageEvent::Key(Key::Escape)), None);
        assert!(!page.menu().is_open());
    }

    #[test]
    fn loaded_after_delay() {
        let (queue, page) = page(1200.0);
        queue.advance(Duration::from_millis(999));
        assert!(!page.loaded().get());
        queue.advance(Duration::from_millis(1));
        assert!(page.loaded().get());
    }

    #[test]
    fn skill_bar_attribute_parsing() {
        let id = TargetId(1);
        assert_eq!(SkillBar::from_attribute(id, Some("85")).level, Some(85.0));
        assert_eq!(SkillBar::from_attribute(id, Some(" 85.5 ")).level, Some(85.5));
        assert_eq!(SkillBar::from_attribute(id, Some("300")).level, Some(300.0));
        assert_eq!(SkillBar::from_attribute(id, Some("-5")).level, Some(-5.0));
        assert_eq!(SkillBar::from_attribute(id, Some("NaN")).level, None);
        assert_eq!(SkillBar::from_attribute(id, Some("inf")).level, None);
        assert_eq!(SkillBar::from_attribute(id, Some("")).level, None);
        assert_eq!(SkillBar::from_attribute(id, Some("high")).level, None);
        assert_eq!(SkillBar::from_attribute(id, None).level, None);
    }

    #[test]
    fn background_fallback_only_on_mobile() {
        let (_queue, desktop) = page(1200.0);
        desktop.handle(PageEvent::BackgroundLoadFailed);
        assert_eq!(desktop.background().get(), Background::Default);

        let (_queue, mobile) = page(400.0);
        assert_eq!(mobile.background().get(), Background::MobileImage);
        mobile.handle(PageEvent::BackgroundLoadFailed);
        assert_eq!(mobile.background().get(), Background::MobileFallback);
    }

    #[test]
    fn invalid_config_rejected() {
        let queue = Rc::new(TimerQueue::manual());
        let config = PageConfig {
            scroll_throttle_ms: 0,
            ..PageConfig::default()
        };
        let result = Page::new(
            queue,
            &NoDetection,
            config,
            DeviceProfile::new(1200.0),
            900.0,
            PageLayout::default(),
            0,
        );
        assert!(result.is_err());
    }
}
