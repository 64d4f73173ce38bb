// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatch Overhead Benchmark
//!
//! Measures the proxy layer on top of the in-process loopback session:
//! - property get and method call through a generated proxy
//! - the same call served by a static override (no session round trip)
//! - cast (re-view without remote traffic)
//! - enumeration of a 1000-element collection

use autoproxy::{
    contract, LocalObject, LoopbackSession, OverrideTable, ProxyFactory, Result, Value,
    ValueType, Variant,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

#[contract]
pub trait Counter {
    #[property]
    fn count(&self) -> Result<i32>;

    fn add(&self, a: i32, b: i32) -> Result<i32>;

    fn tag(&self, text: &str) -> Result<String>;
}

#[contract(iterable = i32)]
pub trait Numbers {}

fn counter(factory: &ProxyFactory) -> CounterProxy {
    let session = LoopbackSession::new();
    let obj = session.insert(
        LocalObject::new()
            .property("Count", 7)
            .method("Add", |args| {
                let a = args[0].as_int().unwrap_or(0);
                let b = args[1].as_int().unwrap_or(0);
                Ok(Variant::Int(a.wrapping_add(b)))
            })
            .method("Tag", |args| Ok(args[0].clone())),
    );
    factory.wrap_object(&obj).expect("wrap counter")
}

fn bench_property_get(c: &mut Criterion) {
    let proxy = counter(&ProxyFactory::new());
    c.bench_function("dispatch_property_get", |b| {
        b.iter(|| black_box(proxy.count().expect("count")));
    });
}

fn bench_method_call(c: &mut Criterion) {
    let proxy = counter(&ProxyFactory::new());
    c.bench_function("dispatch_method_call", |b| {
        b.iter(|| black_box(proxy.add(black_box(20), black_box(22)).expect("add")));
    });

    c.bench_function("dispatch_string_round_trip", |b| {
        b.iter(|| black_box(proxy.tag(black_box("Win32_Process")).expect("tag")));
    });
}

fn bench_static_override(c: &mut Criterion) {
    let factory = ProxyFactory::builder()
        .override_table(OverrideTable::for_proxy::<CounterProxy>().with(
            "Add",
            &[ValueType::Int, ValueType::Int],
            |_, args| match args {
                [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a.wrapping_add(*b))),
                _ => Ok(Value::Int(0)),
            },
        ))
        .build();
    let proxy = counter(&factory);
    c.bench_function("dispatch_override_call", |b| {
        b.iter(|| black_box(proxy.add(black_box(20), black_box(22)).expect("add")));
    });
}

fn bench_cast(c: &mut Criterion) {
    let proxy = counter(&ProxyFactory::new());
    c.bench_function("dispatch_cast", |b| {
        b.iter(|| black_box(proxy.cast::<CounterProxy>().expect("cast")));
    });
}

fn bench_enumeration(c: &mut Criterion) {
    let session = LoopbackSession::new();
    let obj = session.insert(LocalObject::new().collection((0..1000).map(Variant::Int).collect()));
    let numbers: NumbersProxy = ProxyFactory::new().wrap_object(&obj).expect("wrap numbers");

    c.bench_function("enumerate_1000", |b| {
        b.iter(|| {
            let sum: i64 = numbers
                .iter()
                .expect("iter")
                .map(|v| i64::from(v.expect("element")))
                .sum();
            black_box(sum)
        });
    });
}

criterion_group!(
    benches,
    bench_property_get,
    bench_method_call,
    bench_static_override,
    bench_cast,
    bench_enumeration
);
criterion_main!(benches);
