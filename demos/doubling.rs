//! Print the doubled values of `0..limit`, driving the generator by hand.
//!
//! ```text
//! cargo run --example doubling -- --limit 10 --backend coro
//! ```
use clap::{Parser, ValueEnum};
use jumpback::{Advance, Coro, Doubled, GeneratorState, Handle, advance};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Backend {
    /// The hand written state machine
    #[default]
    Manual,
    /// The compiler generated state machine
    Coro,
}

/// Print doubled integers produced one at a time by a resumable generator.
#[derive(Debug, Parser)]
struct Args {
    /// How many values to produce.
    #[arg(long, default_value_t = jumpback::doubling::DEFAULT_LIMIT)]
    limit: i32,

    /// Which generator implementation to drive.
    #[arg(long, value_enum, default_value_t)]
    backend: Backend,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Args { limit, backend } = Args::parse();

    match backend {
        Backend::Manual => {
            let body = Doubled::up_to(limit);
            let mut state = GeneratorState::default();
            loop {
                let value = advance(&body, &mut state);
                if state.is_exhausted() {
                    break;
                }
                if let Advance::Yielded(value) = value {
                    println!("Output: {value}");
                }
            }
        }

        Backend::Coro => {
            let mut coro = Coro::from(async move |handle: Handle<i64>| {
                let mut n = 0;
                while n < limit {
                    handle.yield_value(i64::from(n) * 2).await;
                    n += 1;
                }
            });

            while let Advance::Yielded(value) = coro.resume()? {
                println!("Output: {value}");
            }
        }
    }

    Ok(())
}
