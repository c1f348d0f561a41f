#![no_main]

use drda_client::Config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = Config::from_connection_string(s) {
            let _ = config.session();
        }
    }
});
