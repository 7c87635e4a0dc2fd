//! Coin tray scenarios driven through the public API.

#![allow(clippy::unwrap_used)]

use std::{cell::RefCell, rc::Rc};

use scs_core::{
    Banknote, Coin, Currency, Device, DeviceError, DeviceId, Environment, Notification, Phase,
    Station, StationConfig,
    devices::{StoreEvent, Tray, Verdict},
    shared,
};

#[derive(Clone, Debug)]
struct AlwaysPass;

impl Environment for AlwaysPass {
    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(0xFF);
    }
}

fn coin(value: u64) -> Coin {
    Coin::new(Currency::CAD, value).unwrap()
}

fn record(tray: &mut Tray<Coin>) -> Rc<RefCell<Vec<StoreEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    tray.attach(shared(move |_: DeviceId, n: &Notification<StoreEvent>| {
        if let Notification::Device(e) = n {
            sink.borrow_mut().push(e.clone());
        }
    }))
    .unwrap();
    log
}

#[test]
fn five_coin_tray_fills_overflows_and_collects() {
    let mut tray = Tray::new(DeviceId::new(1), 5).unwrap();
    let log = record(&mut tray);
    tray.end_configuration();

    let coins: Vec<Coin> = [5, 10, 25, 100, 200].into_iter().map(coin).collect();
    for c in &coins {
        tray.accept(c.clone()).unwrap();
    }

    assert!(matches!(tray.accept(coin(5)), Err(DeviceError::Overload { .. })));
    assert_eq!(tray.count().unwrap(), 5);

    let mut expected = vec![StoreEvent::ItemAdded; 4];
    expected.push(StoreEvent::Full);
    assert_eq!(*log.borrow(), expected);

    assert_eq!(tray.collect().unwrap(), coins);
    assert!(tray.has_space());
    assert_eq!(tray.count().unwrap(), 0);
}

#[test]
fn rejected_coins_fill_station_tray_then_validator_fails() {
    let config = StationConfig { coin_tray_capacity: 5, ..StationConfig::default() };
    let mut station = Station::new(AlwaysPass, config).unwrap();
    let log = record(station.coin_tray_mut());
    station.end_configuration();

    for _ in 0..5 {
        assert_eq!(station.insert_coin(coin(3)).unwrap(), Some(Verdict::Rejected));
    }
    assert_eq!(log.borrow().last(), Some(&StoreEvent::Full));

    // The sixth reject has nowhere to go.
    let err = station.insert_coin(coin(3)).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(station.coin_validator().phase(), Phase::Error);

    // A broken validator has no space, so the slot now refuses coins.
    assert!(matches!(station.insert_coin(coin(25)), Err(DeviceError::Overload { .. })));

    assert_eq!(station.collect_coins().unwrap().len(), 5);
}

#[test]
fn disabled_tray_refuses_dispensed_coins_without_losing_them() {
    let mut station = Station::new(AlwaysPass, StationConfig::default()).unwrap();
    station.coin_dispenser_mut(100).unwrap().load(vec![coin(100)]).unwrap();
    station.end_configuration();

    station.coin_tray_mut().disable().unwrap();
    assert!(matches!(station.dispense_coin(100), Err(DeviceError::Disabled { .. })));
    assert_eq!(station.coin_dispenser(100).unwrap().size(), 1);
    assert_eq!(station.coin_dispenser(100).unwrap().phase(), Phase::Normal);

    station.coin_tray_mut().enable().unwrap();
    station.dispense_coin(100).unwrap();
    assert_eq!(station.collect_coins().unwrap(), vec![coin(100)]);
}

#[test]
fn rejected_coin_with_disabled_tray_breaks_validator() {
    let mut station = Station::new(AlwaysPass, StationConfig::default()).unwrap();
    station.end_configuration();
    station.coin_tray_mut().disable().unwrap();

    let err = station.insert_coin(Coin::new(Currency::USD, 25).unwrap()).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(station.coin_validator().phase(), Phase::Error);
    assert!(station.coin_storage().items().is_empty());
}

#[test]
fn valid_coin_with_full_storage_and_disabled_tray_breaks_validator() {
    let config = StationConfig { coin_storage_capacity: 1, ..StationConfig::default() };
    let mut station = Station::new(AlwaysPass, config).unwrap();
    station.end_configuration();

    assert_eq!(station.insert_coin(coin(25)).unwrap(), Some(Verdict::Accepted));
    station.coin_tray_mut().disable().unwrap();
    assert!(station.insert_coin(coin(25)).unwrap_err().is_fatal());
    assert_eq!(station.coin_validator().phase(), Phase::Error);
}

#[test]
fn valid_coin_refused_by_storage_falls_into_tray() {
    let mut station = Station::new(AlwaysPass, StationConfig::default()).unwrap();
    station.end_configuration();
    station.coin_storage_mut().disable().unwrap();

    assert_eq!(station.insert_coin(coin(100)).unwrap(), Some(Verdict::Returned));
    assert_eq!(station.coin_tray().items(), &[coin(100)]);
    assert_eq!(station.coin_validator().phase(), Phase::Normal);
}

#[test]
fn valid_banknote_refused_by_storage_dangles() {
    let mut station = Station::new(AlwaysPass, StationConfig::default()).unwrap();
    station.end_configuration();
    station.banknote_storage_mut().disable().unwrap();

    let note = Banknote::new(Currency::CAD, 20).unwrap();
    assert_eq!(station.insert_banknote(note.clone()).unwrap(), Some(Verdict::Returned));
    assert_eq!(station.banknote_input().dangling(), Some(&note));
    assert_eq!(station.remove_dangling_banknote().unwrap(), note);
}

#[test]
fn disabled_validator_leaves_items_with_their_slots() {
    let mut station = Station::new(AlwaysPass, StationConfig::default()).unwrap();
    station.end_configuration();
    station.coin_validator_mut().disable().unwrap();
    station.banknote_validator_mut().disable().unwrap();

    // The coin never enters the machine.
    assert!(matches!(station.insert_coin(coin(25)), Err(DeviceError::Overload { .. })));
    assert!(station.coin_tray().items().is_empty());

    let note = Banknote::new(Currency::CAD, 5).unwrap();
    assert_eq!(station.insert_banknote(note.clone()).unwrap(), None);
    assert_eq!(station.banknote_input().dangling(), Some(&note));
    assert_eq!(station.coin_validator().phase(), Phase::Normal);
}
