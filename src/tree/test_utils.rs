// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains fakes
//! that are shared by all tests of the `tree` module:
//!
//! - `TestMeter`, `FailingMeter` and `PowerOnlyMeter`, meters with and without
//!   phase-current support.
//! - `TestConsumer` and `FailingConsumer`, stand-ins for load points.
//! - `TestProvider`, a meter registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{ConfigProvider, Consumer, Error, Meter, MeterCurrent};

/// A meter reporting fixed, adjustable phase currents.
pub(crate) struct TestMeter(Mutex<(f64, f64, f64)>);

impl TestMeter {
    /// Creates a meter with the same current on all phases.
    pub(crate) fn new(current: f64) -> Self {
        Self::with_phases(current, current, current)
    }

    pub(crate) fn with_phases(i1: f64, i2: f64, i3: f64) -> Self {
        TestMeter(Mutex::new((i1, i2, i3)))
    }

    pub(crate) fn set(&self, current: f64) {
        *self.0.lock() = (current, current, current);
    }
}

impl MeterCurrent for TestMeter {
    fn currents(&self) -> Result<(f64, f64, f64), Error> {
        Ok(*self.0.lock())
    }
}

impl Meter for TestMeter {
    fn current_power(&self) -> Result<f64, Error> {
        let (i1, i2, i3) = *self.0.lock();
        Ok((i1 + i2 + i3) * 230.0)
    }

    fn as_meter_current(self: Arc<Self>) -> Option<Arc<dyn MeterCurrent>> {
        Some(self)
    }
}

/// A meter whose reads always fail.
pub(crate) struct FailingMeter;

impl MeterCurrent for FailingMeter {
    fn currents(&self) -> Result<(f64, f64, f64), Error> {
        Err(Error::meter_read("modbus: i/o timeout"))
    }
}

/// A meter that only reports power, not phase currents.
pub(crate) struct PowerOnlyMeter;

impl Meter for PowerOnlyMeter {
    fn current_power(&self) -> Result<f64, Error> {
        Ok(1500.0)
    }
}

/// A consumer with an adjustable current.
pub(crate) struct TestConsumer(Mutex<f64>);

impl TestConsumer {
    pub(crate) fn new(current: f64) -> Self {
        TestConsumer(Mutex::new(current))
    }

    pub(crate) fn set(&self, current: f64) {
        *self.0.lock() = current;
    }
}

impl Consumer for TestConsumer {
    fn get_current(&self) -> Result<f64, Error> {
        Ok(*self.0.lock())
    }
}

/// A consumer that can't report its current.
pub(crate) struct FailingConsumer;

impl Consumer for FailingConsumer {
    fn get_current(&self) -> Result<f64, Error> {
        Err(Error::consumer_read("charger offline"))
    }
}

/// A meter registry backed by a map.
pub(crate) struct TestProvider {
    grid_meter_ref: Option<String>,
    meters: HashMap<String, Arc<dyn Meter>>,
}

impl TestProvider {
    pub(crate) fn new(grid_meter_ref: Option<&str>) -> Self {
        TestProvider {
            grid_meter_ref: grid_meter_ref.map(String::from),
            meters: HashMap::new(),
        }
    }

    pub(crate) fn with_meter(mut self, name: &str, meter: Arc<dyn Meter>) -> Self {
        self.meters.insert(name.to_string(), meter);
        self
    }
}

impl ConfigProvider for TestProvider {
    fn meter(&self, name: &str) -> Result<Arc<dyn Meter>, Error> {
        self.meters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::meter_not_found(format!("Meter {} not found.", name)))
    }

    fn grid_meter_ref(&self) -> Option<&str> {
        self.grid_meter_ref.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() -> Result<(), Error> {
        let meter: Arc<dyn Meter> = Arc::new(TestMeter::new(2.0));
        assert_eq!(meter.current_power()?, 1380.0);
        assert!(meter.as_meter_current().is_some());

        let meter: Arc<dyn Meter> = Arc::new(PowerOnlyMeter);
        assert_eq!(meter.current_power()?, 1500.0);
        assert!(meter.as_meter_current().is_none());

        let provider = TestProvider::new(None);
        assert!(provider.grid_meter().is_err());

        Ok(())
    }
}
