#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Config parsing and rule compilation should never panic
        if let Ok(config) = toml::from_str::<ecs_rollout::Config>(content) {
            let _ = config.monitor_settings();
            let _ = config.default_timeout();
        }
    }
});
