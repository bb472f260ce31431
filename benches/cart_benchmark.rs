use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use holiday_market::cart::{CartItem, CartStore, ItemKind};
use holiday_market::currency::{convert, Currency};
use holiday_market::storage::MemoryStore;
use rand::{seq::SliceRandom, thread_rng, Rng};
use std::sync::Arc;
use std::thread;

// Benchmark the cart store under concurrent mutation plus total/convert reads
pub fn cart_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("trip_cart");

    for item_pool in [50usize, 500, 5000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(item_pool),
            item_pool,
            |b, &item_pool| {
                b.iter(|| {
                    let cart = Arc::new(CartStore::new(Arc::new(MemoryStore::new())));

                    let ids = (0..item_pool)
                        .map(|i| format!("item-{}", i))
                        .collect::<Vec<_>>();
                    let kinds = [
                        ItemKind::Rental,
                        ItemKind::Tour,
                        ItemKind::Transfer,
                        ItemKind::Product,
                    ];

                    let mut handles = vec![];
                    for _ in 0..4 {
                        let cart = Arc::clone(&cart);
                        let ids = ids.clone();

                        let handle = thread::spawn(move || {
                            let mut rng = thread_rng();

                            for _ in 0..250 {
                                let id = ids.choose(&mut rng).unwrap();
                                let roll: f64 = rng.gen();

                                if roll < 0.4 {
                                    // 40% adds (duplicates are no-ops)
                                    let kind = *kinds.choose(&mut rng).unwrap();
                                    let price = rng.gen_range(10.0..1000.0);
                                    cart.add(CartItem::new(id.clone(), kind, "bench item", price));
                                } else if roll < 0.6 {
                                    // 20% removes
                                    cart.remove(id);
                                } else {
                                    // 40% price reads in a display currency
                                    let total = cart.total();
                                    black_box(convert(total, Currency::Eur, Currency::Usd));
                                }
                            }
                        });

                        handles.push(handle);
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }

                    black_box(cart.total())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, cart_benchmark);
criterion_main!(benches);
