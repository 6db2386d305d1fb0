//! Property-based tests for trigger loop invariants.

#![cfg(test)]

mod common;

use common::{KeyAfter, RecordingClock, RecordingDevice};
use proptest::prelude::*;
use wdog_core::prelude::*;
use wdog_driver::{StatusCode, TRIG_PAT_A, TRIG_PAT_B};

fn run_loop(
    device: &RecordingDevice,
    clock: &RecordingClock,
    keys: &mut KeyAfter,
    config: TriggerConfig,
) -> Result<LoopOutcome, WdogError> {
    let mut out = Vec::new();
    let mut io = LoopIo {
        clock,
        keys,
        out: &mut out,
    };
    TriggerLoop::new(device, config).run(&mut io)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_patterns_alternate_starting_opposite_last(
        last_is_a in any::<bool>(),
        passes in 1u32..40,
    ) {
        let device = RecordingDevice::new().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let last = if last_is_a { TRIG_PAT_A } else { TRIG_PAT_B };
        device.sim().preset_last_pattern(last);
        let config = TriggerConfig::builder()
            .interval_ms(10)
            .mode(TriggerMode::Pattern)
            .abort_after(passes)
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let outcome = run_loop(&device, &RecordingClock::default(), &mut KeyAfter::never(), config)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(outcome.is_ok());

        let written = device.set_values(StatusCode::TrigPat);
        prop_assert_eq!(written.len(), passes as usize);
        prop_assert_ne!(written.first().copied(), Some(last));
        for pair in written.windows(2) {
            if let [a, b] = pair {
                prop_assert_ne!(a, b);
                prop_assert!(*a == TRIG_PAT_A || *a == TRIG_PAT_B);
            }
        }
    }

    #[test]
    fn prop_interval_grows_by_increment_without_clamp(
        start in 1u32..5_000,
        increment in 0u32..10_000,
        passes in 1u32..30,
    ) {
        let device = RecordingDevice::new().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let clock = RecordingClock::default();
        let config = TriggerConfig::builder()
            .interval_ms(start)
            .increment_ms(increment)
            .abort_after(passes)
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let outcome = run_loop(&device, &clock, &mut KeyAfter::never(), config)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let expected: Vec<u64> = (0..u64::from(passes))
            .map(|k| u64::from(start) + k * u64::from(increment))
            .collect();
        prop_assert_eq!(clock.delays(), expected);
        prop_assert_eq!(
            outcome.next_interval_ms,
            u64::from(start) + u64::from(passes) * u64::from(increment)
        );
    }

    #[test]
    fn prop_pass_limit_gives_exact_triggers_and_one_stop(passes in 1u32..60) {
        let device = RecordingDevice::new().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let config = TriggerConfig::builder()
            .interval_ms(5)
            .abort_after(passes)
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let outcome = run_loop(&device, &RecordingClock::default(), &mut KeyAfter::never(), config)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(outcome.stop_reason, Some(StopReason::PassLimit));
        prop_assert_eq!(device.set_count(StatusCode::Start), 1);
        prop_assert_eq!(device.set_count(StatusCode::Trig), passes as usize);
        prop_assert_eq!(device.set_count(StatusCode::Stop), 1);
    }

    #[test]
    fn prop_key_press_stops_before_pass_limit(
        key_pass in 1u64..20,
        extra in 1u32..20,
    ) {
        let device = RecordingDevice::new().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let limit = u32::try_from(key_pass).map_err(|e| TestCaseError::fail(e.to_string()))? + extra;
        let config = TriggerConfig::builder()
            .interval_ms(5)
            .abort_after(limit)
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let outcome = run_loop(&device, &RecordingClock::default(), &mut KeyAfter::polls(key_pass), config)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(outcome.stop_reason, Some(StopReason::KeyPressed));
        prop_assert_eq!(outcome.passes, key_pass);
        prop_assert_eq!(device.set_count(StatusCode::Trig) as u64, key_pass);
        prop_assert_eq!(device.set_count(StatusCode::Stop), 1);
    }

    #[test]
    fn prop_validation_rejects_before_device_access(
        trigger in proptest::option::of(0u32..1000),
        pattern in proptest::option::of(0u32..1000),
        increment in 0u32..100,
        reset in proptest::option::of(0u32..1000),
        irq in proptest::option::of(0u32..1000),
    ) {
        let params = LoopParams {
            trigger_ms: trigger,
            pattern_ms: pattern,
            increment_ms: increment,
            reset_delay_ms: reset,
            irq_time_ms: irq,
            ..LoopParams::default()
        };
        let interval = trigger.or(pattern);
        let result = params.validate();
        if trigger.is_some() && pattern.is_some() {
            prop_assert_eq!(result, Err(ParamError::TriggerModeConflict));
        } else if increment != 0 && interval.is_none() {
            prop_assert_eq!(result, Err(ParamError::IncrementWithoutTrigger));
        } else if reset.is_some() && (interval.is_none() || !irq.is_some_and(|q| q > 0)) {
            prop_assert_eq!(result, Err(ParamError::ResetDelayRequirements));
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
