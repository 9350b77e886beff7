//! Default configuration document written by `--config-gen`

/// File name used when generating a new configuration
pub const DEFAULT_CONFIG_FILE: &str = "tenable.json";

/// Every account and directory is disabled so a fresh file never moves data
pub const DEFAULT_CONFIG_DOCUMENT: &str = r#"{
  "downloads": {
    "tenable_io": [
      {
        "enabled": false,
        "id": "person@company.com",
        "access_key": "",
        "secret_key": "",
        "proxies": {"https": "127.0.0.1:8080"},
        "ssl_verify": true,
        "scan_ids": [100, 101, 102]
      }
    ],
    "tenable_sc": [
      {
        "enabled": false,
        "id": "person@tsc1.company.local",
        "host": "tsc1.company.local",
        "access_key": "",
        "secret_key": "",
        "proxies": {"https": "127.0.0.1:8080"},
        "ssl_verify": true,
        "scan_ids": [100, 101, 102]
      }
    ],
    "completed_within_days": 1,
    "nessus_files": [
      {
        "enabled": false,
        "directory": ""
      }
    ]
  },
  "uploads": {
    "tenable_io": [
      {
        "enabled": false,
        "id": "person@company2.com",
        "access_key": "",
        "secret_key": "",
        "proxies": null,
        "ssl_verify": true,
        "folder_id": 100,
        "dashboards": true
      }
    ],
    "tenable_sc": [
      {
        "enabled": false,
        "id": "person@tsc2.company.local",
        "host": "tsc2.company.local",
        "access_key": "",
        "secret_key": "",
        "proxies": null,
        "ssl_verify": true,
        "repository_id": 1,
        "dhcp": true,
        "virtual_hosts": false,
        "dead_hosts_wait": 0
      }
    ]
  }
}
"#;

/// Tenable.io cloud API root
pub const TENABLE_IO_URL: &str = "https://cloud.tenable.com";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_EXPORT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_EXPORT_POLL_ATTEMPTS: u32 = 120;
pub const DEFAULT_UPLOAD_RETRY_ATTEMPTS: usize = 1;
pub const DEFAULT_UPLOAD_RETRY_DELAY_SECS: u64 = 5;
