//! Fuzz target: persisted config record
//!
//! Feeds arbitrary bytes to the NVS-backed `ConfigPort` and checks:
//! - `load` never panics
//! - Anything it accepts is exactly one record wide and re-encodes
//!   to a record that loads back the same credentials
//!
//! cargo fuzz run fuzz_config_record

#![no_main]

use boilernode::adapters::nvs::{CONFIG_KEY, CONFIG_NAMESPACE, NvsAdapter};
use boilernode::app::ports::{ConfigPort, StoragePort};
use boilernode::config::{CONFIG_RECORD_LEN, ConfigRecord};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };
    if nvs.write(CONFIG_NAMESPACE, CONFIG_KEY, data).is_err() {
        return;
    }

    let Ok(cfg) = nvs.load() else {
        return;
    };

    assert_eq!(data.len(), CONFIG_RECORD_LEN);

    // Bytes after a NUL in a credential field are dropped, so compare
    // decoded values rather than images.
    let image = ConfigRecord::from(&cfg).encode().unwrap();
    let reloaded = ConfigRecord::decode(&image).unwrap().to_config().unwrap();
    assert_eq!(reloaded.credentials, cfg.credentials);
    assert_eq!(reloaded.desired_temp.to_bits(), cfg.desired_temp.to_bits());
});
