//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements         | Connects to                    |
//! |------------------|--------------------|--------------------------------|
//! | `boiler_link`    | BoilerLinkPort     | Link GPIOs / simulated boiler  |
//! | `http`           | (transport)        | Configuration page, `/temp`    |
//! | `log_sink`       | EventSink          | Serial log output              |
//! |                  | UpdateHandler      |                                |
//! | `nvs`            | ConfigPort         | NVS / in-memory store          |
//! |                  | StoragePort        |                                |
//! | `request_queue`  | RequestPort        | Configuration page hand-off    |
//! | `time`           | TimePort           | ESP32 system timer             |
//! | `update_channel` | UpdateChannelPort  | Wireless update listener       |
//! | `wifi`           | ConnectivityPort   | ESP-IDF WiFi STA + soft AP     |

pub mod boiler_link;
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod request_queue;
pub mod time;
pub mod update_channel;
pub mod wifi;
