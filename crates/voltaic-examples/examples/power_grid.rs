//! Power grid example: a cable ring with a solar panel, a motor, a lamp and
//! an accumulator, driven by a fixed-cadence clock.
//!
//! Demonstrates surplus charging the accumulator, a nightfall brownout the
//! accumulator covers, and a cable break that splits the network.
//!
//! Run with: `cargo run -p voltaic-examples --example power_grid [config.toml]`
//! Set `RUST_LOG=voltaic_core=debug` to watch merges and rebuilds.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use voltaic_core::capability::{Accumulator, Consumer, ConsumptionRange, Energy, Producer};
use voltaic_core::clock::TickClock;
use voltaic_core::grid::PowerGrid;
use voltaic_core::id::AccumulatorId;
use voltaic_core::mask::ConnectionMask;
use voltaic_core::pos::{BlockPos, Face};
use voltaic_data::GridConfig;

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// Output follows a shared sunlight level.
#[derive(Debug)]
struct SolarPanel {
    sunlight: Rc<Cell<Energy>>,
}

impl Producer for SolarPanel {
    fn produce(&mut self) -> Energy {
        self.sunlight.get()
    }
}

#[derive(Debug)]
struct Machine {
    name: &'static str,
    range: ConsumptionRange,
    running: bool,
}

impl Consumer for Machine {
    fn consumption_range(&self) -> ConsumptionRange {
        self.range
    }

    fn consume(&mut self, granted: Energy) {
        self.running = granted >= self.range.min && granted > 0;
        tracing::trace!(machine = self.name, granted, running = self.running);
    }
}

#[derive(Debug)]
struct Capacitor {
    stored: Energy,
}

impl Accumulator for Capacitor {
    fn max_capacity(&self) -> Energy {
        16_000
    }

    fn capacity(&self) -> Energy {
        self.stored
    }

    fn store(&mut self, amount: Energy) {
        self.stored += amount;
    }

    fn release(&mut self, amount: Energy) {
        self.stored -= amount;
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn load_config() -> Result<GridConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(GridConfig::load(Path::new(&path))?),
        None => Ok(GridConfig::default()),
    }
}

fn floor(directions: &[Face]) -> ConnectionMask {
    ConnectionMask::from_slots(directions.iter().map(|d| (Face::Down, *d)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut grid = PowerGrid::new();

    // A 3x3 ring of floor cable, so one break does not split it.
    //
    //   (0,0,0) - (1,0,0) - (2,0,0)
    //      |                  |
    //   (0,0,1)            (2,0,1)
    //      |                  |
    //   (0,0,2) - (1,0,2) - (2,0,2)
    use Face::{East, North, South, West};
    let ring = [
        (BlockPos::new(0, 0, 0), floor(&[East, South])),
        (BlockPos::new(1, 0, 0), floor(&[East, West])),
        (BlockPos::new(2, 0, 0), floor(&[West, South])),
        (BlockPos::new(2, 0, 1), floor(&[North, South])),
        (BlockPos::new(2, 0, 2), floor(&[North, West])),
        (BlockPos::new(1, 0, 2), floor(&[East, West])),
        (BlockPos::new(0, 0, 2), floor(&[East, North])),
        (BlockPos::new(0, 0, 1), floor(&[North, South])),
    ];
    for (pos, mask) in ring {
        grid.set_connection(pos, mask);
    }
    info!(networks = grid.network_count(), "ring laid");

    let sunlight = Rc::new(Cell::new(150));
    let panel = grid.add_producer(Box::new(SolarPanel {
        sunlight: Rc::clone(&sunlight),
    }));
    let motor = grid.add_consumer(Box::new(Machine {
        name: "motor",
        range: ConsumptionRange::new(10, 100),
        running: false,
    }));
    let lamp = grid.add_consumer(Box::new(Machine {
        name: "lamp",
        range: ConsumptionRange::new(1, 8),
        running: false,
    }));
    let capacitor = grid.add_accumulator(Box::new(Capacitor { stored: 0 }));

    grid.set_producer(BlockPos::new(0, 0, 0), Some(panel))?;
    grid.set_consumer(BlockPos::new(2, 0, 0), Some(motor))?;
    grid.set_consumer(BlockPos::new(0, 0, 2), Some(lamp))?;
    grid.set_accumulator(BlockPos::new(2, 0, 2), Some(capacitor))?;

    let mut clock = TickClock::new(config.tick_interval()?);
    let frame = Duration::from_millis(100);

    // --- Daytime: surplus charges the capacitor ---
    run(&mut grid, &mut clock, frame, 20);
    report(&grid, capacitor, "daytime");

    // --- Nightfall: the capacitor covers the deficit ---
    sunlight.set(20);
    run(&mut grid, &mut clock, frame, 20);
    report(&grid, capacitor, "night");

    // --- Break a cable: the ring survives as a line ---
    grid.remove(BlockPos::new(1, 0, 0));
    info!(networks = grid.network_count(), "broke the north cable");

    // --- Break the opposite side: the panel no longer reaches the motor ---
    grid.remove(BlockPos::new(1, 0, 2));
    info!(networks = grid.network_count(), "broke the south cable");
    run(&mut grid, &mut clock, frame, 10);
    for (id, network) in grid.networks() {
        info!(
            network = ?id,
            blocks = network.positions.len(),
            production = network.production,
            consumption = network.consumption,
            overflow = network.overflow,
            "network"
        );
    }

    Ok(())
}

fn run(grid: &mut PowerGrid, clock: &mut TickClock, frame: Duration, frames: u32) {
    for _ in 0..frames {
        for _ in 0..clock.advance(frame) {
            let summary = grid.tick();
            tracing::debug!(?summary, "tick");
        }
    }
}

fn report(grid: &PowerGrid, capacitor: AccumulatorId, phase: &str) {
    let info = grid.network_info(BlockPos::new(1, 0, 2), ConnectionMask::ALL);
    let stored = grid.accumulator(capacitor).map_or(0, |a| a.capacity());
    info!(
        phase,
        production = info.production,
        consumption = info.consumption,
        overflow = info.overflow,
        stored,
        "grid status"
    );
}
