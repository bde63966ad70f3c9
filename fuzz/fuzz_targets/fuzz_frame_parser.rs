#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Frames arrive from an untrusted serial line; the parser must never
    // panic. A malformed-frame error is the only acceptable rejection.
    match rover_core::parse_frame(data) {
        Ok(cmd) => {
            // Well-formed frames echo through the protocol formatter too.
            let _ = rover_core::protocol::echo_line(&cmd);
        }
        Err(_e) => {
            // malformed frame is acceptable
        }
    }
    // The wireless vocabulary decoder always yields a command.
    let _ = rover_core::arbiter::decode_short(data);
});
