//! Fuzz target for the [`Station`] device arena
//!
//! Drive a seeded station through arbitrary operation sequences
//!
//! # Strategy
//!
//! - Operation sequences: the model-based test operations, plus card reader
//!   interactions and forced device failures
//! - Seeded faults: a [`SimEnv`] seed decides every false rejection and
//!   card read failure
//!
//! # Invariants
//!
//! - No transition FROM the error phase (terminal invariant)
//! - A fatal error always leaves some device in the error phase
//! - Stores and dispensers never hold more than their capacity
//! - A card stays seated after any insert that got past the seat check
//! - NEVER panic on any operation sequence

#![no_main]

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scs_core::{Card, CardKind, Device, DeviceError, DeviceId, Phase, Station};
use scs_harness::{ModelWorld, Operation, SimEnv, StationDriver};

const PIN: &str = "1357";

#[derive(Debug, Clone, Arbitrary)]
enum FuzzEvent {
    Op(Operation),
    Tap { tap_enabled: bool },
    Swipe,
    Insert { has_chip: bool, correct_pin: bool },
    RemoveCard,
    ForceError { device: u8 },
}

/// Fuzz input with deterministic seed for fault injection.
#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    /// Seed for the simulation environment.
    seed: u64,
    /// Event sequence to process.
    events: Vec<FuzzEvent>,
}

fuzz_target!(|input: FuzzInput| {
    let config = ModelWorld::station_config();
    let Ok(mut driver) = StationDriver::new(SimEnv::with_seed(input.seed), config.clone()) else {
        panic!("model configuration must be valid");
    };

    for event in input.events {
        let failed_before = failed(driver.station());

        let fatal = match event {
            FuzzEvent::Op(op) => {
                let result = driver.apply(&op);
                result == scs_harness::OperationResult::Error(scs_harness::OperationError::Fatal)
            },
            FuzzEvent::Tap { tap_enabled } => {
                let card = card(tap_enabled, true);
                is_fatal(driver.station_mut().card_reader_mut().tap(&card).map(|_| ()))
            },
            FuzzEvent::Swipe => {
                let card = card(true, true);
                is_fatal(driver.station_mut().card_reader_mut().swipe(&card).map(|_| ()))
            },
            FuzzEvent::Insert { has_chip, correct_pin } => {
                let card = card(true, has_chip);
                let pin = if correct_pin { PIN } else { "0000" };
                let reader = driver.station_mut().card_reader_mut();
                let was_seated = reader.is_card_inserted();
                let result = reader.insert(&card, pin);
                if reader.phase() == Phase::Normal && !was_seated {
                    assert!(reader.is_card_inserted(), "card must stay seated after insert");
                }
                is_fatal(result.map(|_| ()))
            },
            FuzzEvent::RemoveCard => is_fatal(driver.station_mut().card_reader_mut().remove()),
            FuzzEvent::ForceError { device } => {
                force_error(driver.station_mut(), device);
                false
            },
        };

        let failed_after = failed(driver.station());

        // Invariant: the error phase is terminal
        assert!(
            failed_before.is_subset(&failed_after),
            "device left the error phase: before {failed_before:?}, after {failed_after:?}"
        );

        // Invariant: fatal errors are backed by a failed device
        if fatal {
            assert!(!failed_after.is_empty(), "fatal error without a failed device");
        }

        // Invariant: capacities hold
        let station = driver.station();
        assert!(station.coin_tray().items().len() <= config.coin_tray_capacity);
        assert!(station.coin_storage().items().len() <= config.coin_storage_capacity);
        assert!(station.banknote_storage().items().len() <= config.banknote_storage_capacity);
        for &value in station.coin_validator().denominations() {
            if let Some(dispenser) = station.coin_dispenser(value) {
                assert!(dispenser.size() <= dispenser.capacity());
            }
        }
        for &value in station.banknote_validator().denominations() {
            if let Some(dispenser) = station.banknote_dispenser(value) {
                assert!(dispenser.size() <= dispenser.capacity());
            }
        }
    }
});

fn card(tap_enabled: bool, has_chip: bool) -> Card {
    let number = "4111111111111111";
    Card::new(CardKind::Credit, number, "Fuzz Shopper", "999", PIN, tap_enabled, has_chip)
}

fn is_fatal(result: Result<(), DeviceError>) -> bool {
    matches!(result, Err(DeviceError::Fatal { .. }))
}

fn failed(station: &Station<SimEnv>) -> BTreeSet<DeviceId> {
    station
        .phases()
        .into_iter()
        .filter(|(_, phase)| *phase == Phase::Error)
        .map(|(id, _)| id)
        .collect()
}

fn force_error(station: &mut Station<SimEnv>, device: u8) {
    match device % 6 {
        0 => station.coin_validator_mut().force_error(),
        1 => station.coin_tray_mut().force_error(),
        2 => station.banknote_output_mut().force_error(),
        3 => station.banknote_storage_mut().force_error(),
        4 => station.card_reader_mut().force_error(),
        _ => station.scale_mut().force_error(),
    }
}
