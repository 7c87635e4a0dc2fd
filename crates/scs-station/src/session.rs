//! Scripted demonstration sessions.
//!
//! Each session plays one customer interaction against a configured
//! station. Recoverable device errors (false rejections, card read faults)
//! are logged and retried; anything else ends the session.

use scs_core::{
    Banknote, Card, CardKind, Coin, DeviceError, Environment, Item, ItemId, Station,
    devices::{Dispenser, Verdict},
};

use crate::error::StationError;

/// Price of the demonstration purchase, minor units.
pub const PRICE_MINOR: u64 = 1_835;

/// Minor units per banknote unit.
const MINOR_PER_UNIT: u64 = 100;

/// Insertions before a cash payment is abandoned.
const PAYMENT_ATTEMPTS: usize = 40;

/// Attempts per card read mode.
const CARD_ATTEMPTS: usize = 3;

/// Stock placed in each dispenser before the cash session.
const COINS_PER_DISPENSER: usize = 10;
const BANKNOTES_PER_DISPENSER: usize = 5;

const DEMO_PIN: &str = "4321";

/// Which interaction to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Session {
    /// Pay in cash and receive change.
    Cash,
    /// Read a card by tap, swipe and insert.
    Card,
    /// Weigh items in the bagging area.
    Scale,
    /// All of the above, in that order.
    All,
}

/// What happened during a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    /// Cash accepted, minor units.
    pub paid_minor: u64,
    /// Change dispensed, minor units.
    pub change_minor: u64,
    /// Change owed but not dispensable, minor units.
    pub change_short_minor: u64,
    /// Coins and banknotes handed back to the customer.
    pub rejected: usize,
    /// Successful card reads.
    pub card_reads: usize,
    /// Failed card reads.
    pub card_failures: usize,
    /// Weight left on the scale, grams.
    pub weighed_grams: f64,
}

/// Play `session` against a station in normal operation.
pub fn run<E: Environment>(
    station: &mut Station<E>,
    session: Session,
) -> Result<SessionReport, StationError> {
    let mut report = SessionReport::default();
    match session {
        Session::Cash => cash(station, &mut report)?,
        Session::Card => card(station, &mut report)?,
        Session::Scale => scale(station, &mut report)?,
        Session::All => {
            cash(station, &mut report)?;
            card(station, &mut report)?;
            scale(station, &mut report)?;
        },
    }
    tracing::info!(?session, ?report, "session complete");
    Ok(report)
}

/// Fill every dispenser of the station.
pub fn stock_dispensers<E: Environment>(station: &mut Station<E>) -> Result<(), StationError> {
    let currency = station.config().currency;

    for value in station.coin_validator().denominations().to_vec() {
        let coins = (0..COINS_PER_DISPENSER)
            .map(|_| Coin::new(currency, value))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(dispenser) = station.coin_dispenser_mut(value) {
            dispenser.load(coins)?;
        }
    }

    for value in station.banknote_validator().denominations().to_vec() {
        let notes = (0..BANKNOTES_PER_DISPENSER)
            .map(|_| Banknote::new(currency, value))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(dispenser) = station.banknote_dispenser_mut(value) {
            dispenser.load(notes)?;
        }
    }
    Ok(())
}

fn cash<E: Environment>(
    station: &mut Station<E>,
    report: &mut SessionReport,
) -> Result<(), StationError> {
    stock_dispensers(station)?;

    let currency = station.config().currency;
    let notes = station.banknote_validator().denominations().to_vec();
    let coins = station.coin_validator().denominations().to_vec();

    let mut paid = 0;
    for _ in 0..PAYMENT_ATTEMPTS {
        if paid >= PRICE_MINOR {
            break;
        }
        let due = PRICE_MINOR - paid;

        // Whole banknotes while they fit, then the smallest coin covering
        // the rest (or the largest coin).
        if let Some(&note) = notes.iter().rev().find(|&&v| v * MINOR_PER_UNIT <= due) {
            let verdict = station.insert_banknote(Banknote::new(currency, note)?)?;
            if verdict == Some(Verdict::Accepted) {
                paid += note * MINOR_PER_UNIT;
            } else {
                tracing::warn!(value = note, ?verdict, "banknote handed back");
                report.rejected += 1;
                station.remove_dangling_banknote()?;
            }
        } else {
            let coin =
                coins.iter().find(|&&v| v >= due).or_else(|| coins.last()).copied().unwrap_or(due);
            empty_full_tray(station)?;
            let verdict = station.insert_coin(Coin::new(currency, coin)?)?;
            if verdict == Some(Verdict::Accepted) {
                paid += coin;
            } else {
                tracing::warn!(value = coin, ?verdict, "coin fell into the tray");
                report.rejected += 1;
            }
        }
    }

    report.paid_minor += paid;
    if paid < PRICE_MINOR {
        let reason = format!("payment incomplete: {paid} of {PRICE_MINOR}");
        return Err(StationError::Session(reason));
    }

    make_change(station, paid - PRICE_MINOR, report)
}

fn make_change<E: Environment>(
    station: &mut Station<E>,
    mut owed: u64,
    report: &mut SessionReport,
) -> Result<(), StationError> {
    let notes = station.banknote_validator().denominations().to_vec();
    for &note in notes.iter().rev() {
        while owed >= note * MINOR_PER_UNIT && in_stock(station.banknote_dispenser(note)) {
            station.dispense_banknote(note)?;
            station.collect_banknote()?;
            owed -= note * MINOR_PER_UNIT;
            report.change_minor += note * MINOR_PER_UNIT;
        }
    }

    let coins = station.coin_validator().denominations().to_vec();
    for &coin in coins.iter().rev() {
        while owed >= coin && in_stock(station.coin_dispenser(coin)) {
            empty_full_tray(station)?;
            station.dispense_coin(coin)?;
            owed -= coin;
            report.change_minor += coin;
        }
    }

    let collected = station.collect_coins()?;
    tracing::info!(coins = collected.len(), "customer emptied the coin tray");

    if owed > 0 {
        tracing::warn!(owed, "exact change unavailable");
        report.change_short_minor += owed;
    }
    Ok(())
}

fn in_stock<T: Clone>(dispenser: Option<&Dispenser<T>>) -> bool {
    dispenser.is_some_and(|d| d.size() > 0)
}

/// The customer scoops out a tray with no room for another coin.
fn empty_full_tray<E: Environment>(station: &mut Station<E>) -> Result<(), StationError> {
    if !station.coin_tray().has_space() {
        let collected = station.collect_coins()?;
        tracing::debug!(coins = collected.len(), "coin tray full, customer emptied it");
    }
    Ok(())
}

fn card<E: Environment>(
    station: &mut Station<E>,
    report: &mut SessionReport,
) -> Result<(), StationError> {
    let number = "4506445000000000";
    let card = Card::new(CardKind::Debit, number, "A. Shopper", "123", DEMO_PIN, true, true);
    let reader = station.card_reader_mut();

    retry(report, "tap", || reader.tap(&card))?;
    retry(report, "swipe", || reader.swipe(&card).map(Some))?;
    retry(report, "insert", || {
        let read = reader.insert(&card, DEMO_PIN);
        reader.remove()?;
        read.map(Some)
    })
}

/// Run `attempt` until it reads the card or fails unrecoverably.
///
/// `Ok(None)` means the mode does not apply to the card.
fn retry<T>(
    report: &mut SessionReport,
    mode: &'static str,
    mut attempt: impl FnMut() -> Result<Option<T>, DeviceError>,
) -> Result<(), StationError> {
    for _ in 0..CARD_ATTEMPTS {
        match attempt() {
            Ok(Some(_)) => {
                report.card_reads += 1;
                return Ok(());
            },
            Ok(None) => return Ok(()),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(mode, error = %e, "card read failed, retrying");
                report.card_failures += 1;
            },
            Err(e) => return Err(e.into()),
        }
    }
    tracing::warn!(mode, attempts = CARD_ATTEMPTS, "giving up on card mode");
    Ok(())
}

fn scale<E: Environment>(
    station: &mut Station<E>,
    report: &mut SessionReport,
) -> Result<(), StationError> {
    let scale = station.scale_mut();
    let basket = [(1, 350.0), (2, 1_200.0), (3, 95.5), (4, 3_600.0)];

    for (id, grams) in basket {
        scale.add(Item::new(ItemId(id), grams)?)?;
    }

    if scale.is_overloaded() {
        let limit = scale.weight_limit();
        tracing::warn!(limit, "bagging area overloaded, lifting the heaviest item");
        let heaviest = scale
            .items()
            .iter()
            .max_by(|a, b| a.weight_grams().total_cmp(&b.weight_grams()))
            .map(Item::id)
            .ok_or_else(|| StationError::Session("overloaded scale holds no items".into()))?;
        scale.remove(heaviest)?;
    }

    report.weighed_grams = scale.current_weight()?;
    Ok(())
}
