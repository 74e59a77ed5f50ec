// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the traits that need to be implemented by meter
//! drivers, load points and the configuration registry, so that they can be
//! used with a [`CircuitTree`][crate::CircuitTree].

use std::sync::Arc;

use crate::Error;

/**
A meter that can report the instantaneous current on each of the three
phases.

Read failures are returned as errors and are never fatal to the tree: the
affected query logs the error and the next control cycle tries again.
Bounding the latency of a read is the responsibility of the driver.

<details>
<summary>Example implementation for a Modbus meter:</summary>

```ignore
impl site_circuit_tree::MeterCurrent for ModbusMeter {
    fn currents(&self) -> Result<(f64, f64, f64), site_circuit_tree::Error> {
        let regs = self
            .client
            .read_input_registers(self.current_register, 6)
            .map_err(|e| site_circuit_tree::Error::meter_read(e.to_string()))?;
        Ok((
            decode_f32(&regs[0..2]) as f64,
            decode_f32(&regs[2..4]) as f64,
            decode_f32(&regs[4..6]) as f64,
        ))
    }
}
```

</details>
*/
pub trait MeterCurrent: Send + Sync {
    /// Returns the current in amps on phases 1, 2 and 3.
    fn currents(&self) -> Result<(f64, f64, f64), Error>;
}

/// A device resolved from the site's meter registry.
///
/// Not every meter measures phase currents.  Those that do expose it through
/// [`as_meter_current`][Meter::as_meter_current], which is what a circuit
/// needs.
pub trait Meter: Send + Sync {
    /// Returns the power in watts currently flowing through the meter.
    fn current_power(&self) -> Result<f64, Error>;

    /// Returns the meter's phase-current capability, if it has one.
    ///
    /// Implementors that also implement [`MeterCurrent`] should return
    /// `Some(self)`.
    fn as_meter_current(self: Arc<Self>) -> Option<Arc<dyn MeterCurrent>> {
        None
    }
}

/// Anything that draws current and can report its own instantaneous draw.
///
/// Load points implement this, so that they can be registered with a
/// circuit that has no physical meter.  A circuit without a meter also
/// counts each of its sub-circuits as one consumer.
pub trait Consumer: Send + Sync {
    /// Returns the current in amps drawn by the consumer, as the max over
    /// all phases.
    fn get_current(&self) -> Result<f64, Error>;
}

/// The site's registry of configured meters.
pub trait ConfigProvider {
    /// Returns the meter with the given reference.
    fn meter(&self, name: &str) -> Result<Arc<dyn Meter>, Error>;

    /// Returns the reference of the site's grid meter, if one is configured.
    fn grid_meter_ref(&self) -> Option<&str>;

    /// Returns the site's grid meter instance.
    ///
    /// This is the instance handed to the single circuit that claims the grid
    /// meter.  The default implementation resolves it like any other meter.
    fn grid_meter(&self) -> Result<Arc<dyn Meter>, Error> {
        match self.grid_meter_ref() {
            Some(name) => self.meter(name),
            None => Err(Error::meter_not_found("No grid meter configured.")),
        }
    }
}
