//! Stand-in for the selection UI and connectivity monitor: a background
//! thread that periodically asks for new colors.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::info;

pub enum BackdropCommand {
    ApplyPalette {
        bubbles: Vec<u32>,
        background: Option<u32>,
    },
    NetworkIssue(bool),
}

pub struct Preset {
    pub name: &'static str,
    pub bubbles: &'static [u32],
    pub background: u32,
}

pub const PRESETS: [Preset; 4] = [
    Preset {
        name: "ember",
        bubbles: &[0xFF6B35, 0xF7C59F, 0xD7263D, 0xFFB400],
        background: 0x1B0F0A,
    },
    Preset {
        name: "lagoon",
        bubbles: &[0x0FA3B1, 0xB5E2FA, 0x2E86AB, 0x5CC8FF],
        background: 0x06141B,
    },
    Preset {
        name: "orchard",
        bubbles: &[0x8AC926, 0xFFCA3A, 0x6A994E, 0xC5D86D],
        background: 0x0F1608,
    },
    Preset {
        name: "dusk",
        bubbles: &[0x9D4EDD, 0xFF7AA2, 0x5A189A, 0xE0AAFF],
        background: 0x120A1C,
    },
];

/// Every this many palette changes the driver simulates a network drop.
const OUTAGE_EVERY: usize = 3;

pub struct DriverHandles {
    pub commands: Receiver<BackdropCommand>,
    pub thread: JoinHandle<()>,
}

pub fn spawn_demo_driver(interval: Duration) -> DriverHandles {
    let (sender, commands) = crossbeam_channel::unbounded::<BackdropCommand>();
    let thread = thread::spawn(move || drive(sender, interval));
    DriverHandles { commands, thread }
}

fn drive(sender: Sender<BackdropCommand>, interval: Duration) {
    for (step, preset) in PRESETS.iter().cycle().enumerate().skip(1) {
        thread::sleep(interval);
        let outage = step % OUTAGE_EVERY == 0;
        let mut batch = vec![BackdropCommand::ApplyPalette {
            bubbles: preset.bubbles.to_vec(),
            background: Some(preset.background),
        }];
        if outage {
            batch.push(BackdropCommand::NetworkIssue(true));
        }
        info!("demo driver: {} (outage: {outage})", preset.name);
        for command in batch {
            if sender.send(command).is_err() {
                return;
            }
        }
        if outage {
            thread::sleep(interval / 2);
            if sender.send(BackdropCommand::NetworkIssue(false)).is_err() {
                return;
            }
        }
    }
}
