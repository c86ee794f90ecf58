//! Spins the reels at a few bias angles and prints the JSON bodies a front end
//! would receive.
//!
//! Configuration is read from the environment (`IBM_QUANTUM_TOKEN`,
//! `USE_SIMULATOR_FALLBACK`, `MAX_QUEUE_WAIT`, ...); with no token every spin
//! runs on the local simulator. Set `RUST_LOG=debug` to follow backend selection.

use qspin::{GateSequence, QspinError, SpinConfig, SpinRequest, SpinService};
use std::f64::consts::PI;
use tracing_subscriber::EnvFilter;

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

#[tokio::main]
async fn main() -> Result<(), QspinError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("--- qspin Example: Quantum Slot Machine ---");

    let service = SpinService::from_config(SpinConfig::from_env()?)?;
    println!("\nStatus:\n{}", to_json(&service.status()));

    println!("\nCircuit Definition (θ = π/2, entangled):\n{}", GateSequence::for_spin(PI / 2.0, true));

    let requests = [
        ("Never pays", SpinRequest { theta: 0.0, entanglement: false }),
        ("Fair reels", SpinRequest::default()),
        ("Always stars", SpinRequest { theta: PI, entanglement: false }),
        ("Chained reels", SpinRequest { theta: PI / 2.0, entanglement: true }),
        ("Chained at π", SpinRequest { theta: PI, entanglement: true }),
        ("Out of range", SpinRequest { theta: 4.0, entanglement: false }),
    ];

    for (label, request) in requests {
        println!("\n{} (θ = {:.4}, entanglement = {}):", label, request.theta, request.entanglement);
        match service.spin(request).await {
            Ok(response) => println!("{}", to_json(&response)),
            Err(error) => println!("rejected: {}", to_json(&error)),
        }
    }

    println!("\nInfo:\n{}", to_json(&service.info().await));
    Ok(())
}
