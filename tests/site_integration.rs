// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use site_circuit_tree::{
    telemetry, Cache, CircuitTree, ConfigProvider, Consumer, Error, LoadPointRef, Meter,
    MeterCurrent, SiteConfig,
};

const CONFIG: &str = r#"
[[circuits]]
name = "main"
maxCurrent = 35.0
meter = "grid"

[[circuits.circuits]]
name = "garage"
maxCurrent = 20.0

[[circuits.circuits.circuits]]
name = "wallbox"
maxCurrent = 16.0

[[circuits.circuits]]
name = "carport"
maxCurrent = 16.0
meter = "carport"

[telemetry]
channelCapacity = 1024
"#;

struct PhaseMeter(Mutex<(f64, f64, f64)>);

impl MeterCurrent for PhaseMeter {
    fn currents(&self) -> Result<(f64, f64, f64), Error> {
        Ok(*self.0.lock())
    }
}

impl Meter for PhaseMeter {
    fn current_power(&self) -> Result<f64, Error> {
        let (i1, i2, i3) = *self.0.lock();
        Ok((i1 + i2 + i3) * 230.0)
    }

    fn as_meter_current(self: Arc<Self>) -> Option<Arc<dyn MeterCurrent>> {
        Some(self)
    }
}

struct Charger(Mutex<f64>);

impl Consumer for Charger {
    fn get_current(&self) -> Result<f64, Error> {
        Ok(*self.0.lock())
    }
}

struct Meters(HashMap<String, Arc<dyn Meter>>);

impl ConfigProvider for Meters {
    fn meter(&self, name: &str) -> Result<Arc<dyn Meter>, Error> {
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| Error::meter_not_found(name))
    }

    fn grid_meter_ref(&self) -> Option<&str> {
        Some("grid")
    }
}

#[tokio::test]
async fn test_site() -> Result<(), Error> {
    let config = SiteConfig::from_toml_str(CONFIG)?;

    let grid = Arc::new(PhaseMeter(Mutex::new((18.0, 21.0, 19.5))));
    let carport_meter = Arc::new(PhaseMeter(Mutex::new((6.0, 0.0, 0.0))));
    let meters = Meters(HashMap::from([
        ("grid".to_string(), grid.clone() as Arc<dyn Meter>),
        ("carport".to_string(), carport_meter as Arc<dyn Meter>),
    ]));

    let mut tree = CircuitTree::try_new(&config.circuits, &meters)?;

    let wallbox = Arc::new(Charger(Mutex::new(11.0)));
    tree.register_load_points([
        LoadPointRef {
            title: "Wallbox".to_string(),
            circuit: Some("wallbox".to_string()),
            consumer: wallbox.clone(),
        },
        LoadPointRef {
            title: "Carport".to_string(),
            circuit: Some("carport".to_string()),
            consumer: Arc::new(Charger(Mutex::new(6.0))),
        },
    ])?;

    // the channel holds every value published below, it is drained at the end
    assert_eq!(config.telemetry.channel_capacity, 1024);
    let cache = Arc::new(Cache::new());
    let (tx, rx) = telemetry::channel(&config.telemetry);
    tree.prepare(Arc::new(tx));

    // main: 35 - 21 = 14, garage: 20 - 11 = 9, wallbox: 16 - 11 = 5
    assert_eq!(tree.remaining_current("wallbox")?, 5.0);
    // carport: 16 - 6 = 10, capped by main
    assert_eq!(tree.remaining_current("carport")?, 10.0);

    // the grid is loaded beyond main's limit
    *grid.0.lock() = (30.0, 38.0, 30.0);
    *wallbox.0.lock() = 16.0;
    assert_eq!(tree.remaining_current("wallbox")?, -3.0);

    // dropping the tree closes the channel and stops the cache
    drop(tree);
    cache.run(rx).await;

    let state = cache.state();
    let circuits = state["circuits"].as_array().cloned().unwrap_or_default();
    let names = circuits
        .iter()
        .map(|c| c["name"].as_str().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(names, ["carport", "garage", "main", "wallbox"]);

    let main = &circuits[2];
    assert_eq!(main["actualCurrent"], json!(38.0));
    assert_eq!(main["meterCurrents"], json!([30.0, 38.0, 30.0]));
    assert_eq!(main["overload"], json!(true));
    assert_eq!(main["virtualMeter"], json!(false));

    let garage = &circuits[1];
    assert_eq!(garage["actualCurrent"], json!(16.0));
    assert_eq!(garage["overload"], json!(false));
    assert_eq!(garage["consumers"], json!(0));

    let wallbox = &circuits[3];
    assert_eq!(wallbox["actualCurrent"], json!(16.0));
    assert_eq!(wallbox["consumers"], json!(1));
    assert_eq!(wallbox["overload"], json!(false));

    assert_eq!(state["loadpoints"], json!([]));

    Ok(())
}

#[test]
fn test_invalid_site() -> Result<(), Error> {
    let config = SiteConfig::from_toml_str(
        r#"
        [[circuits]]
        name = "main"
        maxCurrent = 35.0
        meter = "grid"

        [[circuits.circuits]]
        name = "garage"
        maxCurrent = 20.0
        meter = "grid"
        "#,
    )?;

    let grid = Arc::new(PhaseMeter(Mutex::new((0.0, 0.0, 0.0))));
    let meters = Meters(HashMap::from([("grid".to_string(), grid as Arc<dyn Meter>)]));

    let result = CircuitTree::try_new(&config.circuits, &meters);
    assert!(result.is_err_and(|e| e.kind().is_config_error()));

    Ok(())
}
