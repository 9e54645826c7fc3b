use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use coinselect_sim::{PendingPayment, SimulationConfig, Wallet, SEGWIT_OUTPUT_WEIGHT};

fn setup_wallet() -> Wallet {
    let mut wallet = match Wallet::new(SimulationConfig::default()) {
        Ok(wallet) => wallet,
        Err(e) => panic!("default config rejected: {}", e),
    };
    for i in 0..200u64 {
        if let Err(e) = wallet.deposit(10_000 + (i * 7_919) % 2_000_000) {
            panic!("deposit rejected: {}", e);
        }
    }
    wallet
}

fn benchmark_withdraw(c: &mut Criterion) {
    let payments = [PendingPayment {
        amount: 3_500_000,
        weight: SEGWIT_OUTPUT_WEIGHT,
    }];

    c.bench_function("withdraw", |b| {
        b.iter_batched(
            setup_wallet,
            |mut wallet| {
                let record = wallet.withdraw(black_box(&payments), black_box(0.0001));
                black_box(record)
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, benchmark_withdraw);
criterion_main!(benches);
