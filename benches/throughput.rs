use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use termstatus::{Term, Terminal};

/// Interactive device that discards everything.
struct NullTerminal;

impl Write for NullTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Terminal for NullTerminal {
    fn is_interactive(&self) -> bool {
        true
    }
}

const LINE: &[u8] = b"2026-10-17T12:00:00Z INFO fetched chunk 42 of 1000 (4.00 MiB)\n";

fn bench_write_with_status(c: &mut Criterion) {
    let term = Term::builder(NullTerminal).spawn().unwrap();
    term.set_status(b"downloading: 42%\nETA 3s").unwrap();

    let mut group = c.benchmark_group("termstatus");
    group.throughput(Throughput::Bytes(LINE.len() as u64));
    group.bench_function("write_with_status", |b| {
        b.iter(|| term.write(LINE).unwrap());
    });
    group.bench_function("set_status", |b| {
        b.iter(|| term.set_status(b"downloading: 43%\nETA 2s").unwrap());
    });
    group.finish();
}

fn bench_contended_writes(c: &mut Criterion) {
    const WRITERS: usize = 4;
    const PER_WRITER: usize = 256;

    c.bench_function("termstatus/contended_writes", |b| {
        b.iter_custom(|iters| {
            let term = Arc::new(Term::builder(NullTerminal).spawn().unwrap());
            term.set_status(b"status").unwrap();

            let started = std::time::Instant::now();
            for _ in 0..iters {
                let handles: Vec<_> = (0..WRITERS)
                    .map(|_| {
                        let term = Arc::clone(&term);
                        thread::spawn(move || {
                            for _ in 0..PER_WRITER {
                                term.write(LINE).unwrap();
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
            }
            started.elapsed()
        });
    });
}

criterion_group!(benches, bench_write_with_status, bench_contended_writes);
criterion_main!(benches);
