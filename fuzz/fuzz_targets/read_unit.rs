#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Read units until the input runs out or framing fails
    let mut stream = data;
    while let Ok(unit) = drda_codec::read_unit(&mut stream) {
        for object in unit.objects() {
            if object.is_err() {
                break;
            }
        }
    }
});
