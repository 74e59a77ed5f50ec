// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Site Circuit Tree

This is a library for sharing the limited current of a site's electrical
installation between the loads connected to it, typically EV charging points.

The circuits of a site form a tree that mirrors its circuit breakers.  Every
circuit has a max current, and the tree answers one question for any circuit:
how much more current can be drawn here without exceeding the limit of this
circuit or of any circuit between it and the grid connection?

## Meters and consumers

A circuit learns its present current in one of two ways:

- from a physical meter implementing [`MeterCurrent`], or
- by summing up the currents of its [`Consumer`]s, if it has no meter.

Load points are registered as consumers of the circuit they are connected to.
A sub-circuit is registered as a single consumer of a parent without a meter,
so the current of a whole subtree rolls up to the parent.  When a circuit has
a meter, the meter's readings win and registered consumers are ignored.

Only the most loaded phase is considered.  Phases are not balanced
individually.

## Creation

A [`CircuitTree`] is created from [`CircuitConfig`]s with
[`try_new`][CircuitTree::try_new], which resolves meter references through a
[`ConfigProvider`].  Creation fails, and no tree is returned, if:

- a circuit has an empty or duplicate name,
- a meter can't be found, or doesn't support phase currents,
- more than one circuit uses the site's grid meter.

## Allocation

[`remaining_current`][CircuitTree::remaining_current] returns the circuit's
own headroom (max current minus present current), capped by the remaining
current of its parent.  A negative value means an overload somewhere on the
way to the root.  Meter read failures are logged and count as zero draw for
that query, so a single faulty meter never stalls the whole tree.

## Telemetry

Circuits publish [`Param`]s to an optional [`TelemetrySink`], for example the
sender of a [`telemetry::channel`] drained into a [`Cache`].  Publishing never
blocks, and without a sink it is a no-op.
*/

mod capabilities;
pub use capabilities::{ConfigProvider, Consumer, Meter, MeterCurrent};

pub mod cache;
pub use cache::Cache;

pub mod config;
pub use config::{CircuitConfig, SiteConfig, TelemetryConfig};

mod error;
pub use error::{Error, ErrorKind};

pub mod telemetry;
pub use telemetry::{Param, Scope, TelemetrySink};

mod tree;
pub use tree::{iterators, Circuit, CircuitTree, LoadPointRef, VirtualMeter};
