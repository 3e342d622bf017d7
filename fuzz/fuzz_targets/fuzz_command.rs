#![no_main]

use ecs_rollout::domain::value_objects::ParsedCommand;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        // Shell-word and JSON-array command parsing should never panic
        let _ = ParsedCommand::parse(raw);
    }
});
