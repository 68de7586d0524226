//! Host-level tests for the report burst and sleep transitions.

mod common;

use common::{LogicalDelay, PanickingPower, RecordingSerial, ScriptedNtp, clock};
use embassy_futures::block_on;
use embassy_time::Duration;
use time_beacon::duty_cycle::{DutyCycle, DutyState, SleepMode};
use time_beacon::time_source::{FetchFallback, TimeSource};
use time_beacon::Configuration;

// 2024-03-05T14:07:09Z, a Tuesday.
const TUESDAY: i64 = 1_709_647_629;

fn controller(
    replies: impl IntoIterator<Item = Option<i64>>,
    hours: f32,
    fallback: FetchFallback,
    sleep_mode: SleepMode,
) -> (
    DutyCycle<ScriptedNtp, RecordingSerial, LogicalDelay>,
    common::Clock,
) {
    let clock = clock();
    let configuration = Configuration {
        utc_offset_hours: hours,
        ..Configuration::default()
    };
    let time_source = TimeSource::new(ScriptedNtp::new(replies), &configuration, fallback);
    let duty_cycle = DutyCycle::new(
        time_source,
        RecordingSerial::new(clock.clone()),
        LogicalDelay {
            clock: clock.clone(),
        },
        sleep_mode,
    );
    (duty_cycle, clock)
}

#[test]
fn burst_writes_three_spaced_lines_then_sleeps() {
    let (mut duty_cycle, clock) = controller(
        [Some(TUESDAY), Some(TUESDAY + 1), Some(TUESDAY + 2)],
        0.0,
        FetchFallback::LastKnownGood,
        SleepMode::DeepSleep,
    );

    let next = block_on(duty_cycle.step(DutyState::Burst));
    assert_eq!(next, DutyState::Sleep);
    assert_eq!(
        duty_cycle.serial().texts(),
        [
            "T05032024-2-140709\n",
            "T05032024-2-140710\n",
            "T05032024-2-140711\n",
        ]
    );

    let times: Vec<u64> = duty_cycle.serial().lines.iter().map(|(at, _)| *at).collect();
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= 1_000_000, "lines {pair:?} closer than 1 s");
    }
    assert!(clock.get() >= 3_000_000);
    assert_eq!(duty_cycle.reports_written(), 3);
}

#[test]
fn configured_offset_shifts_every_line() {
    let (mut duty_cycle, _clock) = controller(
        [Some(TUESDAY); 3],
        -5.0,
        FetchFallback::LastKnownGood,
        SleepMode::DeepSleep,
    );
    assert_eq!(duty_cycle.time_source().utc_offset_seconds(), -18_000);

    block_on(duty_cycle.step(DutyState::Burst));
    assert!(
        duty_cycle
            .serial()
            .texts()
            .iter()
            .all(|line| *line == "T05032024-2-090709\n")
    );
}

#[test]
fn every_report_asks_the_configured_server() {
    let clock = clock();
    let ntp = ScriptedNtp::new([Some(TUESDAY); 3]);
    let servers = ntp.servers.clone();
    let mut configuration = Configuration::default();
    configuration.time_server.clear();
    configuration.time_server.push_str("192.168.1.10").expect("fits");
    let time_source = TimeSource::new(ntp, &configuration, FetchFallback::LastKnownGood);
    let mut duty_cycle = DutyCycle::new(
        time_source,
        RecordingSerial::new(clock.clone()),
        LogicalDelay { clock },
        SleepMode::DeepSleep,
    );

    block_on(duty_cycle.run_burst());
    assert_eq!(*servers.borrow(), ["192.168.1.10"; 3]);
}

#[test]
fn failed_fetch_repeats_last_known_good() {
    let (mut duty_cycle, _clock) = controller(
        [Some(TUESDAY), None, None],
        0.0,
        FetchFallback::LastKnownGood,
        SleepMode::DeepSleep,
    );
    block_on(duty_cycle.step(DutyState::Burst));
    assert_eq!(duty_cycle.serial().texts(), ["T05032024-2-140709\n"; 3]);
}

#[test]
fn failed_fetch_without_history_reports_offset_epoch() {
    let (mut duty_cycle, _clock) = controller(
        [None, None, None],
        1.0,
        FetchFallback::Unavailable,
        SleepMode::DeepSleep,
    );
    block_on(duty_cycle.step(DutyState::Burst));
    assert_eq!(duty_cycle.serial().texts(), ["T01011970-4-010000\n"; 3]);
}

#[test]
fn serial_errors_do_not_stop_the_burst() {
    let clock = clock();
    let mut serial = RecordingSerial::new(clock.clone());
    serial.fail = true;
    let time_source = TimeSource::new(
        ScriptedNtp::new([Some(TUESDAY); 3]),
        &Configuration::default(),
        FetchFallback::LastKnownGood,
    );
    let mut duty_cycle = DutyCycle::new(
        time_source,
        serial,
        LogicalDelay {
            clock: clock.clone(),
        },
        SleepMode::DeepSleep,
    );

    let next = block_on(duty_cycle.step(DutyState::Burst));
    assert_eq!(next, DutyState::Sleep);
    assert_eq!(duty_cycle.reports_written(), 0);
    assert!(clock.get() >= 3_000_000);
}

#[test]
fn deep_sleep_mode_goes_dormant_and_stays_there() {
    let (mut duty_cycle, _clock) = controller(
        [],
        0.0,
        FetchFallback::LastKnownGood,
        SleepMode::DeepSleep,
    );
    assert_eq!(block_on(duty_cycle.step(DutyState::Sleep)), DutyState::Dormant);
    assert_eq!(block_on(duty_cycle.step(DutyState::Dormant)), DutyState::Dormant);
    assert!(duty_cycle.serial().lines.is_empty());
}

#[test]
fn bench_mode_rests_then_bursts_again() {
    let (mut duty_cycle, clock) = controller(
        [Some(TUESDAY); 6],
        0.0,
        FetchFallback::LastKnownGood,
        SleepMode::Bench {
            rest: Duration::from_secs(10),
        },
    );

    let mut state = DutyState::Burst;
    for _ in 0..3 {
        state = block_on(duty_cycle.step(state));
    }
    assert_eq!(state, DutyState::Sleep);
    assert_eq!(duty_cycle.serial().lines.len(), 6);

    let (first_burst_end, _) = duty_cycle.serial().lines[2];
    let (second_burst_start, _) = duty_cycle.serial().lines[3];
    assert!(second_burst_start - first_burst_end >= 11_000_000);
    assert!(clock.get() >= 16_000_000);
}

#[test]
#[should_panic(expected = "deep sleep with radio off")]
fn run_switches_the_radio_off_before_deep_sleep() {
    let (duty_cycle, clock) = controller(
        [Some(TUESDAY); 3],
        0.0,
        FetchFallback::LastKnownGood,
        SleepMode::DeepSleep,
    );
    let mut power = PanickingPower::new(clock);
    block_on(duty_cycle.run(&mut power));
}

#[cfg(not(feature = "bench"))]
#[test]
fn build_selects_deep_sleep_without_bench_feature() {
    assert_eq!(SleepMode::from_build(), SleepMode::DeepSleep);
}
