use super::{SimEvent, Simulator};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Owns the simulator for the lifetime of a session.
///
/// Lines from `input` go to `on_line`; every tick's events go to `on_events`.
/// Returns once `input` is closed and the last marker is gone, or as soon as
/// `cancel` fires.
pub async fn drive<L, E>(
    mut sim: Simulator,
    mut input: mpsc::Receiver<String>,
    cancel: CancellationToken,
    mut on_line: L,
    mut on_events: E,
) -> Simulator
where
    L: FnMut(&mut Simulator, &str),
    E: FnMut(&Simulator, &[SimEvent]),
{
    let period = sim.config().tick();
    let mut tick = interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut open = true;

    info!("Driver started, tick every {:?}", period);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                info!("Driver cancelled with {} tick(s) run", sim.ticks());
                break;
            }
            line = input.recv(), if open => match line {
                Some(line) => on_line(&mut sim, &line),
                None => {
                    debug!("Input closed, waiting for the queue to drain");
                    open = false;
                    if sim.is_settled() {
                        break;
                    }
                }
            },
            _ = tick.tick() => {
                let events = sim.tick();
                if !events.is_empty() {
                    on_events(&sim, &events);
                }
                if !open && sim.is_settled() {
                    break;
                }
            }
        }
    }

    sim
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Scenario, SimConfig};

    fn example() -> Simulator {
        let mut sim = Simulator::new(SimConfig::default().with_seed(2));
        Scenario::Example.build(&mut sim, 0).unwrap();
        sim
    }

    fn send(sim: &mut Simulator, line: &str) {
        let ips: Vec<_> = line.split_whitespace().collect();
        let src = sim.resolve_ip(ips[0]).unwrap();
        let dst = sim.resolve_ip(ips[1]).unwrap();
        sim.submit_transmission(src, dst, true).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn runs_until_the_marker_is_gone() {
        let (tx, rx) = mpsc::channel(8);
        tx.send("192.168.0.1 192.168.0.3".to_string()).await.unwrap();
        drop(tx);

        let start = Instant::now();
        let mut seen = Vec::new();
        let sim = drive(example(), rx, CancellationToken::new(), send, |_, events| {
            seen.extend_from_slice(events)
        })
        .await;

        // four hops, then three ticks of linger
        assert_eq!(sim.ticks(), 7);
        assert_eq!(start.elapsed(), std::time::Duration::from_secs(7));
        assert!(sim.is_settled());
        assert_eq!(seen.iter().filter(|e| matches!(e, SimEvent::HopAdvanced(_))).count(), 4);
        assert!(matches!(seen.last(), Some(SimEvent::MarkerRemoved { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_idle_input_returns_at_once() {
        let (tx, rx) = mpsc::channel::<String>(1);
        drop(tx);
        let sim = drive(example(), rx, CancellationToken::new(), |_, _| {}, |_, _| {}).await;
        assert_eq!(sim.ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_mid_walk() {
        let (tx, rx) = mpsc::channel(8);
        tx.send("192.168.0.1 192.168.0.3".to_string()).await.unwrap();

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        let mut ticks = 0;
        let sim = drive(example(), rx, cancel, send, |_, _| {
            ticks += 1;
            if ticks == 2 {
                stopper.cancel();
            }
        })
        .await;

        assert_eq!(sim.ticks(), 2);
        assert!(sim.is_busy());
        drop(tx);
    }
}
