//! Integration benchmark for the recording pipeline.
//!
//! Benchmarks the full application loop using the same patterns as the
//! tests in app.rs - with a scripted session feeding readings through
//! run_with_io into a real (temporary) output file.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use daq_recorder::app::{Options, SessionOpener, run_with_io};
use daq_recorder::{Backend, CancelToken, ConnectOptions, Connected, Session, SessionError};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;

/// A session that replays a fixed list of readings, one per round-trip.
struct ReplaySession {
    responses: VecDeque<String>,
}

impl Session for ReplaySession {
    fn clear(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn write_command(&mut self, _command: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn read_response(&mut self) -> Result<String, SessionError> {
        self.responses
            .pop_front()
            .ok_or_else(|| SessionError::Read("script exhausted".to_string()))
    }

    fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// An opener that hands out a fresh replay session on every call.
struct ReplayOpener {
    readings: Vec<String>,
}

impl SessionOpener for ReplayOpener {
    fn open(
        &self,
        _backend: Backend,
        _options: &ConnectOptions,
    ) -> Result<Connected, SessionError> {
        Ok(Connected {
            session: Box::new(ReplaySession {
                responses: self.readings.clone().into(),
            }),
            resource: "USB0::0x2A8D::0x5101::MY000001::INSTR".parse().unwrap(),
            identity: "Keysight Technologies,DAQ970A,MY000001,A.03.02".to_string(),
        })
    }
}

fn readings(count: u32) -> Vec<String> {
    (0..count)
        .map(|i| format!("1.{:03},10,24,2024,16,00,{}", i, i % 60))
        .collect()
}

fn options(count: u32, output: PathBuf) -> Options {
    Options {
        resource: None,
        filter: "USB?*INSTR".to_string(),
        expect_idn: None,
        count,
        channel: 301,
        output,
        timeout: Duration::from_secs(5),
        interval: None,
        line_delimited: false,
        backend: Backend::default(),
        verbose: false,
    }
}

/// Benchmark the full run: configure -> acquire -> format -> write to disk.
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let rt = Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();

    for count in [10u32, 100] {
        let opener = ReplayOpener {
            readings: readings(count),
        };
        let path = dir.path().join(format!("bench_{count}.csv"));

        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut out = io::sink();
                let mut err = io::sink();
                rt.block_on(run_with_io(
                    options(count, path.clone()),
                    &opener,
                    CancelToken::new(),
                    &mut out,
                    &mut err,
                ))
                .unwrap();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
