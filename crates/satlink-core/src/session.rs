//! Driver session: registry materialization and selection
//!
//! A [`Session`] owns the driver catalog handed to it at construction, the
//! registry derived from it, and the identity of the single active driver.
//! It is an explicit object the caller owns and passes around; there is no
//! hidden process-wide state. The session is not internally locked - callers
//! that share one across threads wrap it in a `Mutex` and treat each
//! operation as one critical section.
//!
//! State machine: `Uninitialized` -> [`init`] -> `NoneActive` -> [`select`] /
//! [`detect`] -> `Active` -> [`deselect`] -> `NoneActive`; [`deinit`] returns
//! to `Uninitialized` from anywhere, forcing deselection on the way.
//!
//! [`init`]: Session::init
//! [`deinit`]: Session::deinit
//! [`select`]: Session::select
//! [`detect`]: Session::detect
//! [`deselect`]: Session::deselect

use crate::driver::{bounded_name, DeviceDriver, DriverInfo};
use crate::error::{Error, Result};

/// Owns the catalog, the registry view derived from it, and the selection
/// state. See the module docs for the lifecycle.
pub struct Session {
    catalog: Box<[Box<dyn DeviceDriver>]>,
    registry: Vec<DriverInfo>,
    initialized: bool,
    selected: Option<usize>,
}

impl Session {
    /// Create an uninitialized session over a fixed driver catalog.
    ///
    /// Catalog order is significant: it is the order the registry lists
    /// drivers in and the priority order [`detect`](Self::detect) probes
    /// them in. Names are assumed unique within the catalog; the session
    /// does not validate this.
    pub fn new(catalog: Vec<Box<dyn DeviceDriver>>) -> Self {
        Self {
            catalog: catalog.into_boxed_slice(),
            registry: Vec::new(),
            initialized: false,
            selected: None,
        }
    }

    /// Initialize (or reinitialize) the session.
    ///
    /// Any prior state is torn down first, so calling this on an already
    /// initialized session rebuilds the registry from scratch and deselects
    /// whatever driver was active. The registry mirrors the catalog 1:1 in
    /// catalog order.
    pub fn init(&mut self) {
        self.deinit();

        self.registry = self
            .catalog
            .iter()
            .map(|driver| DriverInfo {
                name: driver.name(),
                description: driver.description(),
            })
            .collect();

        self.initialized = true;
    }

    /// Tear the session down. No-op when not initialized; safe to call
    /// repeatedly.
    ///
    /// Forces deselection of the active driver as part of teardown. A
    /// failure from that driver's `deinit` cannot stop teardown, so it is
    /// logged and discarded rather than reported.
    pub fn deinit(&mut self) {
        if !self.initialized {
            return;
        }

        if let Err(e) = self.deselect() {
            log::warn!("driver deinit failed during session teardown: {e}");
        }

        self.registry.clear();
        self.initialized = false;
    }

    /// Whether the session is currently initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The live registry: one entry per catalog driver, in catalog order.
    pub fn drivers(&self) -> Result<&[DriverInfo]> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        Ok(&self.registry)
    }

    /// Select a driver by name and run its `init`.
    ///
    /// Whatever driver was active is deselected first, before the lookup
    /// even happens, so two drivers are never active at once - not even
    /// transiently. A `deinit` failure from that prior driver aborts the
    /// selection (the prior driver is already deselected at that point).
    ///
    /// Name matching is exact, bounded to [`DRIVER_NAME_MAX`] characters.
    /// If the matched driver's `init` fails, its `deinit` is invoked to
    /// unwind any partial setup (that outcome is logged, not reported) and
    /// the failure surfaces as [`Error::SelectInit`] with no driver active.
    ///
    /// [`DRIVER_NAME_MAX`]: crate::driver::DRIVER_NAME_MAX
    pub fn select(&mut self, name: &str) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        if name.is_empty() {
            return Err(Error::InvalidName);
        }

        self.deselect()?;

        let index = self.lookup(name).ok_or(Error::NotFound)?;
        let driver = &mut self.catalog[index];

        if let Err(e) = driver.init() {
            if let Err(unwind) = driver.deinit() {
                log::warn!(
                    "{}: deinit after failed init also failed: {unwind}",
                    driver.name()
                );
            }
            return Err(Error::SelectInit(e));
        }

        self.selected = Some(index);

        Ok(())
    }

    /// Deselect the active driver, if any.
    ///
    /// Trivially succeeds when nothing is active. The active slot is cleared
    /// even when the driver's `deinit` fails - a broken teardown must not
    /// leave a half-active driver - but the failure is still reported as
    /// [`Error::DeselectDeinit`].
    pub fn deselect(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        let Some(index) = self.selected.take() else {
            return Ok(());
        };

        self.catalog[index].deinit().map_err(Error::DeselectDeinit)
    }

    /// Probe the registry in catalog order and select the first driver whose
    /// `init` succeeds.
    ///
    /// This is a scan-and-commit walk, not a dry run: each candidate really
    /// goes through its lifecycle via [`select`](Self::select), and a failed
    /// candidate is unwound before the next is tried. The walk stops at the
    /// first success, leaving that driver active, and returns its name.
    /// Returns [`Error::NotFound`] when every candidate fails.
    pub fn detect(&mut self) -> Result<&'static str> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        let candidates: Vec<&'static str> =
            self.registry.iter().map(|info| info.name).collect();

        for name in candidates {
            log::debug!("detecting {name}...");

            match self.select(name) {
                Ok(()) => {
                    log::debug!("found {name}");
                    return Ok(name);
                }
                Err(e) => log::debug!("{name}: {e}"),
            }
        }

        log::debug!("no transfer device found");

        Err(Error::NotFound)
    }

    /// The active driver, if any.
    pub fn active(&self) -> Result<Option<&dyn DeviceDriver>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        Ok(self.selected.map(|index| self.catalog[index].as_ref()))
    }

    /// Mutable access to the active driver, for running device operations.
    pub fn active_mut(&mut self) -> Result<Option<&mut dyn DeviceDriver>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        match self.selected {
            Some(index) => Ok(Some(self.catalog[index].as_mut())),
            None => Ok(None),
        }
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        let wanted = bounded_name(name);

        self.catalog
            .iter()
            .position(|driver| bounded_name(driver.name()) == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DriverError, DriverResult};
    use std::sync::{Arc, Mutex};

    /// Shared record of lifecycle calls, in invocation order.
    #[derive(Clone, Default)]
    struct EventLog(Arc<Mutex<Vec<String>>>);

    impl EventLog {
        fn push(&self, event: String) {
            self.0.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.0.lock().unwrap().clear();
        }
    }

    struct MockDriver {
        name: &'static str,
        fail_init: bool,
        fail_deinit: bool,
        log: EventLog,
    }

    impl MockDriver {
        fn boxed(
            name: &'static str,
            fail_init: bool,
            fail_deinit: bool,
            log: &EventLog,
        ) -> Box<dyn DeviceDriver> {
            Box::new(Self {
                name,
                fail_init,
                fail_deinit,
                log: log.clone(),
            })
        }
    }

    impl DeviceDriver for MockDriver {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "mock transfer device"
        }

        fn init(&mut self) -> DriverResult<()> {
            self.log.push(format!("{}:init", self.name));
            if self.fail_init {
                Err(DriverError::NotConnected)
            } else {
                Ok(())
            }
        }

        fn deinit(&mut self) -> DriverResult<()> {
            self.log.push(format!("{}:deinit", self.name));
            if self.fail_deinit {
                Err(DriverError::Io("teardown failed".into()))
            } else {
                Ok(())
            }
        }

        fn read(&mut self, _buf: &mut [u8]) -> DriverResult<()> {
            Err(DriverError::NotReady)
        }

        fn download(&mut self, _addr: u32, _buf: &mut [u8]) -> DriverResult<()> {
            Err(DriverError::NotReady)
        }

        fn upload(&mut self, _addr: u32, _data: &[u8]) -> DriverResult<()> {
            Err(DriverError::NotReady)
        }

        fn execute(&mut self, _addr: u32, _data: &[u8]) -> DriverResult<()> {
            Err(DriverError::NotReady)
        }
    }

    /// alpha / beta / gamma, all healthy.
    fn healthy_session(log: &EventLog) -> Session {
        Session::new(vec![
            MockDriver::boxed("alpha", false, false, log),
            MockDriver::boxed("beta", false, false, log),
            MockDriver::boxed("gamma", false, false, log),
        ])
    }

    fn active_name(session: &Session) -> Option<&'static str> {
        session.active().unwrap().map(|driver| driver.name())
    }

    #[test]
    fn registry_matches_catalog_order() {
        let log = EventLog::default();
        let mut session = healthy_session(&log);
        session.init();

        let names: Vec<&str> = session
            .drivers()
            .unwrap()
            .iter()
            .map(|info| info.name)
            .collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn operations_require_initialized_session() {
        let log = EventLog::default();
        let mut session = healthy_session(&log);

        assert_eq!(session.drivers().unwrap_err(), Error::NotInitialized);
        assert_eq!(session.select("alpha").unwrap_err(), Error::NotInitialized);
        assert_eq!(session.deselect().unwrap_err(), Error::NotInitialized);
        assert_eq!(session.detect().unwrap_err(), Error::NotInitialized);
        assert!(session.active().is_err());
        assert!(log.events().is_empty());
    }

    #[test]
    fn select_empty_name_is_invalid() {
        let log = EventLog::default();
        let mut session = healthy_session(&log);
        session.init();
        session.select("beta").unwrap();

        assert_eq!(session.select("").unwrap_err(), Error::InvalidName);
        assert_eq!(active_name(&session), Some("beta"));
    }

    #[test]
    fn select_unknown_name_is_not_found() {
        let log = EventLog::default();
        let mut session = healthy_session(&log);
        session.init();

        assert_eq!(session.select("delta").unwrap_err(), Error::NotFound);
        assert_eq!(active_name(&session), None);
    }

    #[test]
    fn reselect_deinits_previous_before_new_init() {
        let log = EventLog::default();
        let mut session = healthy_session(&log);
        session.init();

        session.select("alpha").unwrap();
        session.select("beta").unwrap();

        assert_eq!(active_name(&session), Some("beta"));
        assert_eq!(log.events(), ["alpha:init", "alpha:deinit", "beta:init"]);
    }

    #[test]
    fn deselect_without_active_driver_is_noop() {
        let log = EventLog::default();
        let mut session = healthy_session(&log);
        session.init();

        session.deselect().unwrap();
        assert!(log.events().is_empty());
    }

    #[test]
    fn deinit_is_idempotent() {
        let log = EventLog::default();
        let mut session = healthy_session(&log);
        session.init();

        session.deinit();
        session.deinit();

        assert!(!session.is_initialized());
        assert_eq!(session.drivers().unwrap_err(), Error::NotInitialized);
    }

    #[test]
    fn select_init_failure_unwinds_and_leaves_none_active() {
        let log = EventLog::default();
        let mut session = Session::new(vec![MockDriver::boxed("alpha", true, false, &log)]);
        session.init();

        assert_eq!(
            session.select("alpha").unwrap_err(),
            Error::SelectInit(DriverError::NotConnected)
        );
        assert_eq!(active_name(&session), None);
        // failed candidate gets its lifecycle reversed
        assert_eq!(log.events(), ["alpha:init", "alpha:deinit"]);
    }

    #[test]
    fn deselect_reports_deinit_error_but_clears_active() {
        let log = EventLog::default();
        let mut session = Session::new(vec![MockDriver::boxed("alpha", false, true, &log)]);
        session.init();
        session.select("alpha").unwrap();

        assert!(matches!(
            session.deselect().unwrap_err(),
            Error::DeselectDeinit(_)
        ));
        assert_eq!(active_name(&session), None);
        // no driver left to tear down, so this succeeds trivially
        session.deselect().unwrap();
    }

    #[test]
    fn select_propagates_prior_driver_deinit_failure() {
        let log = EventLog::default();
        let mut session = Session::new(vec![
            MockDriver::boxed("alpha", false, true, &log),
            MockDriver::boxed("beta", false, false, &log),
        ]);
        session.init();
        session.select("alpha").unwrap();

        assert!(matches!(
            session.select("beta").unwrap_err(),
            Error::DeselectDeinit(_)
        ));
        // alpha was cleared regardless; beta was never reached
        assert_eq!(active_name(&session), None);
        assert_eq!(log.events(), ["alpha:init", "alpha:deinit"]);
    }

    #[test]
    fn detect_probes_failed_candidates_then_commits() {
        let log = EventLog::default();
        let mut session = Session::new(vec![
            MockDriver::boxed("alpha", true, false, &log),
            MockDriver::boxed("beta", true, false, &log),
            MockDriver::boxed("gamma", false, false, &log),
        ]);
        session.init();

        assert_eq!(session.detect().unwrap(), "gamma");
        assert_eq!(active_name(&session), Some("gamma"));
        assert_eq!(
            log.events(),
            [
                "alpha:init",
                "alpha:deinit",
                "beta:init",
                "beta:deinit",
                "gamma:init"
            ]
        );
    }

    #[test]
    fn detect_first_success_wins() {
        let log = EventLog::default();
        let mut session = Session::new(vec![
            MockDriver::boxed("alpha", true, false, &log),
            MockDriver::boxed("beta", false, false, &log),
            MockDriver::boxed("gamma", false, false, &log),
        ]);
        session.init();

        assert_eq!(session.detect().unwrap(), "beta");
        assert_eq!(active_name(&session), Some("beta"));
        // gamma was never probed
        assert!(!log.events().iter().any(|event| event.starts_with("gamma")));
    }

    #[test]
    fn detect_with_no_device_found_is_not_found() {
        let log = EventLog::default();
        let mut session = Session::new(vec![
            MockDriver::boxed("alpha", true, false, &log),
            MockDriver::boxed("beta", true, false, &log),
        ]);
        session.init();

        assert_eq!(session.detect().unwrap_err(), Error::NotFound);
        assert_eq!(active_name(&session), None);
    }

    #[test]
    fn reinit_rebuilds_registry_and_forces_deselection() {
        let log = EventLog::default();
        let mut session = healthy_session(&log);
        session.init();
        session.select("alpha").unwrap();
        log.clear();

        session.init();

        assert_eq!(active_name(&session), None);
        assert_eq!(session.drivers().unwrap().len(), 3);
        assert_eq!(log.events(), ["alpha:deinit"]);
    }

    #[test]
    fn lookup_is_bounded_to_name_limit() {
        // Oversized input is compared within the bound, so it neither
        // matches nor scans past the limit.
        let log = EventLog::default();
        let mut session = Session::new(vec![MockDriver::boxed("alpha", false, false, &log)]);
        session.init();

        let mut oversized = String::from("alpha");
        oversized.push_str(&"x".repeat(crate::driver::DRIVER_NAME_MAX));
        assert_eq!(session.select(&oversized).unwrap_err(), Error::NotFound);

        // a name that matches within the bound still selects
        session.select("alpha").unwrap();
        assert_eq!(active_name(&session), Some("alpha"));
    }
}
