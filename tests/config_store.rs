//! Host-level tests for loading and saving the stored configuration.

mod common;

use common::MemoryFs;
use time_beacon::block_fs::{BlockFileSystem, RamBlocks};
use time_beacon::config_store::{load, save};
use time_beacon::storage::Mounted;
use time_beacon::{CONFIG_PATH, Configuration, Error};

fn load_from(fs: &mut MemoryFs) -> Configuration {
    let mut storage = Mounted::new(fs).expect("mounts");
    load(&mut storage, CONFIG_PATH)
}

#[test]
fn missing_file_yields_defaults() {
    let mut fs = MemoryFs::default();
    let config = load_from(&mut fs);
    assert_eq!(config, Configuration::default());
    assert_eq!(config.time_server.as_str(), "pool.ntp.org");
    assert_eq!(config.utc_offset_seconds(), 3_600);
}

#[test]
fn unparsable_file_yields_defaults() {
    let mut fs = MemoryFs::with_file(CONFIG_PATH, "not json {");
    assert_eq!(load_from(&mut fs), Configuration::default());
}

#[test]
fn missing_fields_default_independently() {
    let mut fs = MemoryFs::with_file(CONFIG_PATH, r#"{"timezone":2}"#);
    let config = load_from(&mut fs);
    assert_eq!(config.time_server.as_str(), "pool.ntp.org");
    assert_eq!(config.utc_offset_seconds(), 7_200);

    let mut fs = MemoryFs::with_file(CONFIG_PATH, r#"{"timeserver":"time.google.com"}"#);
    let config = load_from(&mut fs);
    assert_eq!(config.time_server.as_str(), "time.google.com");
    assert_eq!(config.utc_offset_seconds(), 3_600);
}

#[test]
fn overlong_server_is_truncated() {
    let long = "a".repeat(300);
    let json = format!(r#"{{"timeserver":"{long}","timezone":0}}"#);
    let mut fs = MemoryFs::with_file(CONFIG_PATH, &json);
    let config = load_from(&mut fs);
    assert_eq!(config.time_server.len(), 255);
}

#[test]
fn saved_configuration_loads_back() {
    let mut fs = MemoryFs::default();
    let mut config = Configuration::default();
    config.time_server.clear();
    config.time_server.push_str("time.nist.gov").expect("fits");
    config.utc_offset_hours = -5.0;

    {
        let mut storage = Mounted::new(&mut fs).expect("mounts");
        save(&mut storage, CONFIG_PATH, &config).expect("saves");
    }
    let text = fs.text(CONFIG_PATH).expect("file written");
    assert!(text.contains(r#""timeserver":"time.nist.gov""#));
    assert!(text.contains(r#""timezone":-5"#));

    let loaded = load_from(&mut fs);
    assert_eq!(loaded, config);
    assert_eq!(loaded.utc_offset_seconds(), -18_000);
}

#[test]
fn zero_byte_write_is_reported() {
    let mut fs = MemoryFs {
        zero_writes: true,
        ..MemoryFs::default()
    };
    let mut storage = Mounted::new(&mut fs).expect("mounts");
    assert!(matches!(
        save(&mut storage, CONFIG_PATH, &Configuration::default()),
        Err(Error::ConfigurationWriteFailed)
    ));
}

#[test]
fn guard_unmounts_on_drop() {
    let mut fs = MemoryFs::default();
    {
        let mut storage = Mounted::new(&mut fs).expect("mounts");
        let _ = load(&mut storage, CONFIG_PATH);
    }
    assert!(!fs.mounted);
    assert_eq!((fs.mounts, fs.unmounts), (1, 1));
}

#[test]
fn flash_backed_store_round_trips() {
    let mut fs = BlockFileSystem::new(RamBlocks::<2>::default());
    let config = Configuration {
        utc_offset_hours: 5.5,
        ..Configuration::default()
    };
    {
        let mut storage = Mounted::new(&mut fs).expect("mounts");
        save(&mut storage, CONFIG_PATH, &config).expect("saves");
    }
    let mut storage = Mounted::new(&mut fs).expect("mounts again");
    assert_eq!(load(&mut storage, CONFIG_PATH), config);
}

#[test]
fn corrupted_flash_yields_defaults() {
    let mut fs = BlockFileSystem::new(RamBlocks::<2>::default());
    let config = Configuration {
        utc_offset_hours: 3.0,
        ..Configuration::default()
    };
    {
        let mut storage = Mounted::new(&mut fs).expect("mounts");
        save(&mut storage, CONFIG_PATH, &config).expect("saves");
    }
    if let Some(block) = fs.device_mut().block_mut(0) {
        block[12] ^= 0xFF;
    }
    let mut storage = Mounted::new(&mut fs).expect("mounts");
    assert_eq!(load(&mut storage, CONFIG_PATH), Configuration::default());
}

#[test]
fn unreadable_flash_cannot_mount() {
    let mut fs = BlockFileSystem::new(RamBlocks::<2>::default());
    fs.device_mut().fail_reads = true;
    assert!(matches!(Mounted::new(&mut fs), Err(Error::StorageMount)));
}
