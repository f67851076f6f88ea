// tests/engine_cycle.rs
//
// Multi-cycle behaviour of the classification engine: each cycle's
// snapshots are fed back in as the next cycle's ledgers, the same way the
// monitor persists and reloads them.

use chrono::NaiveDateTime;
use quake_monitor::quake::parse_timestamp;
use quake_monitor::{Classifier, CycleOutcome, IgnoreReason, KeyKind, Label, Ledger, QuakeRecord};

// Davao Oriental, well outside the default 110 km reference radius
const LAT: &str = "7.07";
const LON: &str = "126.61";

fn now() -> NaiveDateTime {
    parse_timestamp("01 October 2025 - 08:00:00 AM").unwrap()
}

fn bulletin(seq: u32) -> String {
    format!(
        "https://earthquake.phivolcs.dost.gov.ph/2025_Earthquake_Information/September/2025_0930_134854_B{seq}.html"
    )
}

fn quake(ts: &str, mag: &str, loc: &str, seq: u32) -> QuakeRecord {
    QuakeRecord::new(ts, LAT, LON, "010", mag, loc, bulletin(seq))
}

struct State {
    last_poll: Ledger,
    notified: Ledger,
}

impl State {
    fn empty() -> Self {
        Self {
            last_poll: Ledger::new(KeyKind::Coarse),
            notified: Ledger::new(KeyKind::Fine),
        }
    }

    fn cycle(&mut self, c: &Classifier, batch: Vec<QuakeRecord>) -> CycleOutcome {
        let out = c.classify_cycle(batch, &self.last_poll, &self.notified, now());
        self.last_poll = Ledger::from_records(KeyKind::Coarse, out.last_poll.clone());
        if let Some(n) = &out.notified {
            self.notified = Ledger::from_records(KeyKind::Fine, n.clone());
        }
        out
    }
}

const T: &str = "30 September 2025 - 09:48:54 PM";
const LOC: &str = "023 km S 72° E of Manay (Davao Oriental)";

#[test]
fn new_then_duplicate_then_revised() {
    let c = Classifier::default();
    let mut st = State::empty();

    let first = st.cycle(&c, vec![quake(T, "4.6", LOC, 1)]);
    assert_eq!(first.classifications[0].label(), Label::New);
    assert_eq!(first.alerts().len(), 1);

    let second = st.cycle(&c, vec![quake(T, "4.6", LOC, 1)]);
    assert_eq!(second.classifications[0].label(), Label::Duplicate);
    assert!(second.notified.is_none());
    assert!(second.alerts().is_empty());

    let third = st.cycle(&c, vec![quake(T, "5.1", LOC, 2)]);
    assert_eq!(third.classifications[0].label(), Label::Revised);
    let alerts = third.alerts();
    let alert = &alerts[0];
    assert!(alert.is_revision);
    assert_eq!(alert.previous.magnitude, "4.6");
    assert_eq!(alert.current.magnitude, "5.1");

    // re-observing the announced revision is quiet
    let fourth = st.cycle(&c, vec![quake(T, "5.1", LOC, 2)]);
    assert_eq!(fourth.classifications[0].label(), Label::Duplicate);
}

#[test]
fn weak_far_quake_is_insignificant_but_remembered() {
    let c = Classifier::default();
    let mut st = State::empty();

    let out = st.cycle(&c, vec![quake(T, "3.0", LOC, 1)]);
    assert_eq!(out.classifications[0].label(), Label::Insignificant);
    assert!(out.alerts().is_empty());
    assert_eq!(st.last_poll.len(), 1);
    assert!(st.notified.is_empty());

    // an upgrade over the threshold is then reported as a revision
    let out = st.cycle(&c, vec![quake(T, "4.8", LOC, 2)]);
    assert_eq!(out.classifications[0].label(), Label::Revised);
}

#[test]
fn follow_up_bulletin_with_jittered_seconds_is_revision() {
    let c = Classifier::default();
    let mut st = State::empty();
    st.cycle(&c, vec![quake(T, "4.6", LOC, 1)]);

    // coarse key misses (seconds changed), same origin, same minute, seq 2
    let jittered = quake("30 September 2025 - 09:48:21 PM", "4.7", LOC, 2);
    let out = st.cycle(&c, vec![jittered]);
    assert_eq!(out.classifications[0].label(), Label::Revised);
    assert_eq!(out.alerts()[0].previous.timestamp, T);
}

#[test]
fn reworded_origin_with_moved_time_is_revision() {
    let c = Classifier::default();
    let mut st = State::empty();
    st.cycle(
        &c,
        vec![quake(T, "4.9", "012 km N 30° E of Bogo City (Cebu)", 1)],
    );

    let moved = quake(
        "30 September 2025 - 09:50:05 PM",
        "5.0",
        "014 km N 31° E of Bogo (Cebu)",
        2,
    );
    let out = st.cycle(&c, vec![moved]);
    assert_eq!(out.classifications[0].label(), Label::Revised);
}

#[test]
fn first_bulletin_with_new_time_is_not_merged() {
    let c = Classifier::default();
    let mut st = State::empty();
    st.cycle(&c, vec![quake(T, "4.6", LOC, 1)]);

    // a distinct quake a minute later at the same place, first bulletin
    let other = quake("30 September 2025 - 09:49:58 PM", "4.9", LOC, 1);
    let out = st.cycle(&c, vec![other]);
    assert_eq!(out.classifications[0].label(), Label::New);
}

#[test]
fn vanished_then_reappearing_record_is_not_realerted() {
    let c = Classifier::default();
    let mut st = State::empty();
    st.cycle(&c, vec![quake(T, "4.6", LOC, 1)]);
    // upstream drops the row for one poll
    st.cycle(&c, vec![]);
    let out = st.cycle(&c, vec![quake(T, "4.6", LOC, 1)]);
    assert!(matches!(
        &out.classifications[0],
        quake_monitor::Classification::Ignored {
            reason: IgnoreReason::AlreadyNotified,
            ..
        }
    ));
}

#[test]
fn local_quake_uses_lower_threshold() {
    let c = Classifier::default();
    let mut st = State::empty();
    let near = QuakeRecord::new(T, "10.45", "123.95", "005", "4.1", "010 km N of Cebu City (Cebu)", bulletin(1));
    let far = quake(T, "4.1", LOC, 1);
    let out = st.cycle(&c, vec![near, far]);
    assert_eq!(out.classifications[0].label(), Label::New);
    assert_eq!(out.classifications[1].label(), Label::Insignificant);
}

#[test]
fn same_timestamp_revision_survives_ledger_reload() {
    let c = Classifier::default();
    let mut st = State::empty();

    st.cycle(&c, vec![quake(T, "4.6", LOC, 1)]);
    let out = st.cycle(&c, vec![quake(T, "5.0", LOC, 2)]);
    assert_eq!(out.classifications[0].label(), Label::Revised);

    // the reloaded notified ledger must hold the B2 announcement, not B1
    let posted: Vec<_> = st.notified.iter().map(|q| q.bulletin_reference.clone()).collect();
    assert_eq!(posted, vec![bulletin(2)]);

    // a later field change on the same bulletin is not announced again
    let mut deeper = quake(T, "5.0", LOC, 2);
    deeper.depth = "012".into();
    let out = st.cycle(&c, vec![deeper]);
    assert!(matches!(
        &out.classifications[0],
        quake_monitor::Classification::Ignored {
            reason: IgnoreReason::BulletinAlreadyAnnounced,
            ..
        }
    ));
    assert_eq!(out.classifications[0].label(), Label::Duplicate);
}
