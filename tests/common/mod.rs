//! Common test utilities for limitwatch integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// 16 byte records: time, Mode, HVPS, a temperature and a current.
pub const LAYOUT: &str = r#"{
    "record_size": 16,
    "time_offset": 0,
    "context": [
        { "name": "Mode", "offset": 8, "labels": ["WOM", "SBM"] },
        { "name": "HVPS", "offset": 9, "labels": ["OFF", "ON"] }
    ],
    "parameters": [
        { "name": "TWT Temp", "unit": "degC", "kind": "i32", "offset": 10 },
        { "name": "HV Current", "unit": "raw", "kind": "u16", "offset": 14 }
    ]
}"#;

pub const LIMITS: &str = r#"# test limits
"TWT Temp" "degC" Caution:(10, 20) Action:(0, 30) 1
"HV Current" "raw" Caution:(100, 200) Action:(50, 300) 1 HVPS=ON
"#;

pub const RECORD_SIZE: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub millis: i64,
    pub mode: u8,
    pub hvps: u8,
    pub temp: i32,
    pub current: u16,
}

impl Sample {
    pub fn temp(millis: i64, temp: i32) -> Self {
        Sample {
            millis,
            mode: 0,
            hvps: 0,
            temp,
            current: 0,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut rec = Vec::with_capacity(RECORD_SIZE);
        rec.extend_from_slice(&self.millis.to_le_bytes());
        rec.push(self.mode);
        rec.push(self.hvps);
        rec.extend_from_slice(&self.temp.to_le_bytes());
        rec.extend_from_slice(&self.current.to_le_bytes());
        rec
    }
}

/// The temperature excursion 5, 15, 25, 35, 25, 15 at 1s, 2s, ... 6s.
pub fn excursion() -> Vec<Sample> {
    [5, 15, 25, 35, 25, 15]
        .iter()
        .enumerate()
        .map(|(i, temp)| Sample::temp((i as i64 + 1) * 1000, *temp))
        .collect()
}

/// Layout, limits and telemetry files in a temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub layout: PathBuf,
    pub limits: PathBuf,
    pub telemetry: PathBuf,
}

impl Fixture {
    pub fn new(samples: &[Sample]) -> Self {
        Self::with_limits(samples, LIMITS)
    }

    pub fn with_limits(samples: &[Sample], limits: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let layout = dir.path().join("layout.json");
        let limits_path = dir.path().join("limits.txt");
        let telemetry = dir.path().join("telemetry.bin");

        fs::write(&layout, LAYOUT).expect("Failed to write layout");
        fs::write(&limits_path, limits).expect("Failed to write limits");
        let data: Vec<u8> = samples.iter().flat_map(Sample::encode).collect();
        fs::write(&telemetry, data).expect("Failed to write telemetry");

        Fixture {
            dir,
            layout,
            limits: limits_path,
            telemetry,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
