#![no_main]

use bytes::Bytes;
use drda_client::response::ResponseParser;
use drda_protocol::{Dialect, DssUnit, SessionConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let dialect = if first & 1 == 0 { Dialect::Derby } else { Dialect::Db2 };
    let Ok(session) = SessionConfig::new(dialect, "FUZZDB", Some("u"), Some("p")) else {
        return;
    };

    let mut src = Bytes::copy_from_slice(rest);
    let mut parser = ResponseParser::for_session(&session);
    while !src.is_empty() && !parser.is_done() {
        let Ok(unit) = DssUnit::decode(&mut src) else {
            return;
        };
        if parser.feed(&unit).is_err() {
            return;
        }
    }
    let _ = parser.finish().into_result_set();
});
