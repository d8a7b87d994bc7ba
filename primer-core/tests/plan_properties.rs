//! Ordering properties of startup plans

use proptest::prelude::*;

use primer_core::{BoardManifest, PlanError, StartupPlan, Step, STM32F4_DISCOVERY};
use primer_hal::gpio::{PinConfig, PinId, PinMode, Port, Pull};

const PORTS: [Port; 9] = [
    Port::A,
    Port::B,
    Port::C,
    Port::D,
    Port::E,
    Port::F,
    Port::G,
    Port::H,
    Port::I,
];

fn pin_config() -> impl Strategy<Value = (PinMode, Pull)> {
    (
        prop_oneof![
            Just(PinMode::Input),
            Just(PinMode::OutputPushPull),
            Just(PinMode::OutputOpenDrain),
        ],
        prop_oneof![Just(Pull::None), Just(Pull::Up), Just(Pull::Down)],
    )
}

/// Between 1 and 24 distinct GPIO pins in random order
fn pin_table() -> impl Strategy<Value = Vec<PinConfig>> {
    let all: Vec<PinId> = PORTS
        .iter()
        .flat_map(|&port| (0..16).map(move |n| PinId::new(port, n)))
        .collect();

    proptest::sample::subsequence(all, 1..=24)
        .prop_shuffle()
        .prop_flat_map(|ids| {
            let n = ids.len();
            (Just(ids), proptest::collection::vec(pin_config(), n))
        })
        .prop_map(|(ids, cfgs)| {
            ids.into_iter()
                .zip(cfgs)
                .map(|(pin, (mode, pull))| PinConfig {
                    mode,
                    pull,
                    ..PinConfig::input(pin)
                })
                .collect()
        })
}

/// Discovery plan with the step at `from` moved to `to`
fn moved(from: usize, to: usize) -> StartupPlan {
    let reference = StartupPlan::from_manifest(&STM32F4_DISCOVERY).unwrap();
    let mut steps: Vec<Step> = reference.steps().to_vec();
    let step = steps.remove(from);
    steps.insert(to, step);

    let mut plan = StartupPlan::new();
    for step in steps {
        plan.push(step).unwrap();
    }
    plan
}

fn index_of(pred: impl Fn(&Step) -> bool) -> usize {
    StartupPlan::from_manifest(&STM32F4_DISCOVERY)
        .unwrap()
        .steps()
        .iter()
        .position(pred)
        .unwrap()
}

proptest! {
    #[test]
    fn generated_plans_pass_check(pins in pin_table()) {
        let board = BoardManifest {
            pins: &pins,
            uarts: &[],
            i2cs: &[],
            ..STM32F4_DISCOVERY
        };
        let plan = StartupPlan::from_manifest(&board).unwrap();
        prop_assert_eq!(plan.check(), Ok(()));

        // One clock per distinct port, each ahead of every pin on it
        let mut seen: Vec<Port> = Vec::new();
        let mut configured = 0;
        for step in plan.steps() {
            match step {
                Step::EnablePortClock(port) => {
                    prop_assert!(!seen.contains(port));
                    seen.push(*port);
                }
                Step::ConfigurePin(cfg) => {
                    prop_assert!(seen.contains(&cfg.pin.port));
                    prop_assert_eq!(cfg, &pins[configured]);
                    configured += 1;
                }
                _ => {}
            }
        }
        prop_assert_eq!(configured, pins.len());
        let order = board.port_clock_order();
        prop_assert_eq!(seen.as_slice(), order.as_slice());
    }

    #[test]
    fn serial_step_needs_its_pins(to in 0usize..13) {
        let from = index_of(|s| matches!(s, Step::InitUart(_)));
        let last_pin = index_of(|s| matches!(s, Step::ConfigurePin(p) if p.pin.number == 10));

        // After removal, everything up to and including PA10 sits below last_pin + 1
        let ok = to > last_pin;
        let result = moved(from, to).check();
        prop_assert_eq!(result.is_ok(), ok, "to {} -> {:?}", to, result);
        if !ok {
            let is_unsatisfied = matches!(result, Err(PlanError::Unsatisfied { .. }));
            prop_assert!(is_unsatisfied);
        }
    }

    #[test]
    fn timers_have_no_ordering_constraint(to in 0usize..13) {
        let from = index_of(|s| matches!(s, Step::InitTimer(_)));
        prop_assert_eq!(moved(from, to).check(), Ok(()));
    }

    #[test]
    fn pin_must_follow_clock_and_precede_peripheral(to in 0usize..13) {
        // PA9: needs the GPIOA clock (step 0), needed by USART1
        let from = index_of(|s| matches!(s, Step::ConfigurePin(p) if p.pin.number == 9));
        let uart = index_of(|s| matches!(s, Step::InitUart(_)));

        // Removing PA9 shifts USART1 down by one
        let ok = to >= 1 && to < uart;
        prop_assert_eq!(moved(from, to).check().is_ok(), ok);
    }
}
